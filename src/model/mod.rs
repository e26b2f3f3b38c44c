//! Report model: everything the renderer needs, in chronological fight order.

use crate::aggregate::{RaidPlayerRow, ThreatSummary};
use crate::combat_log::CombatLogInsights;
use crate::config::SegmentThresholds;
use crate::diagnostics::Diagnostics;
use crate::raid;
use crate::segment::FightSegment;
use serde::Serialize;
use std::collections::BTreeSet;

/// Where the raid label in the header came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RaidSource {
    Override,
    FightTargets,
    CombatLog,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaidLabel {
    pub name: String,
    pub source: RaidSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsView {
    pub fights: usize,
    pub targets: usize,
    pub snapshots: usize,
    pub players: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticsView {
    pub malformed_lines: usize,
    pub dropped_entries: usize,
    pub unreadable_files: usize,
    pub fights_needing_review: usize,
    pub no_threat_logs: bool,
    pub combat_log_unavailable: bool,
}

impl From<&Diagnostics> for DiagnosticsView {
    fn from(d: &Diagnostics) -> Self {
        Self {
            malformed_lines: d.malformed_lines,
            dropped_entries: d.dropped_entries,
            unreadable_files: d.unreadable_files.len(),
            fights_needing_review: d.segments_needing_review,
            no_threat_logs: d.no_threat_logs,
            combat_log_unavailable: d.combat_log_unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportData {
    pub raid: RaidLabel,
    pub fights: Vec<ThreatSummary>,
    pub raid_summary: Vec<RaidPlayerRow>,
    pub totals: TotalsView,
    pub source_files: Vec<String>,
    pub thresholds: SegmentThresholds,
    /// Raw timestamp that fight times are measured from.
    pub time_origin: Option<f64>,
    pub guilds: Vec<String>,
    pub diagnostics: DiagnosticsView,
}

/// Pick the header label: explicit override, then the raid whose bosses match
/// the fight targets, then the combat-log zone.
pub fn resolve_raid_label(
    raid_override: Option<&str>,
    fights: &[FightSegment],
    insights: Option<&CombatLogInsights>,
) -> RaidLabel {
    if let Some(name) = raid_override {
        return RaidLabel {
            name: name.to_string(),
            source: RaidSource::Override,
        };
    }
    if let Some(name) = raid::infer_raid_from_targets(fights.iter().map(|f| f.target_name.as_str())) {
        return RaidLabel {
            name: name.to_string(),
            source: RaidSource::FightTargets,
        };
    }
    if let Some(name) = insights.and_then(|i| i.raid_zone.as_deref()) {
        return RaidLabel {
            name: name.to_string(),
            source: RaidSource::CombatLog,
        };
    }
    RaidLabel {
        name: raid::UNKNOWN_RAID.to_string(),
        source: RaidSource::Unknown,
    }
}

/// Keep only fights against bosses of `raid_name` and renumber them.
///
/// Raids without a boss catalog keep every fight.
pub fn retain_boss_fights(fights: Vec<FightSegment>, raid_name: &str) -> Vec<FightSegment> {
    if raid::bosses_of(raid_name).is_none() {
        log::warn!("no boss list for {:?}; keeping all fights", raid_name);
        return fights;
    }

    let before = fights.len();
    let kept: Vec<FightSegment> = fights
        .into_iter()
        .filter(|f| raid::is_boss(raid_name, &f.target_name))
        .enumerate()
        .map(|(i, mut f)| {
            f.id = i + 1;
            f
        })
        .collect();
    log::info!(
        "kept {} of {} fight(s) against {} bosses",
        kept.len(),
        before,
        raid_name
    );
    kept
}

pub struct ReportInputs<'a> {
    pub raid: RaidLabel,
    pub fights: Vec<ThreatSummary>,
    pub raid_summary: Vec<RaidPlayerRow>,
    pub source_files: Vec<String>,
    pub thresholds: SegmentThresholds,
    pub time_origin: Option<f64>,
    pub guilds: &'a [String],
    pub diagnostics: &'a Diagnostics,
}

pub fn build_report_data(inputs: ReportInputs<'_>) -> ReportData {
    let targets: BTreeSet<&str> = inputs
        .fights
        .iter()
        .map(|s| s.fight.target_name.as_str())
        .collect();
    let totals = TotalsView {
        fights: inputs.fights.len(),
        targets: targets.len(),
        snapshots: inputs.fights.iter().map(|s| s.fight.snapshots).sum(),
        players: inputs.raid_summary.len(),
    };

    ReportData {
        raid: inputs.raid,
        totals,
        fights: inputs.fights,
        raid_summary: inputs.raid_summary,
        source_files: inputs.source_files,
        thresholds: inputs.thresholds,
        time_origin: inputs.time_origin,
        guilds: inputs.guilds.to_vec(),
        diagnostics: DiagnosticsView::from(inputs.diagnostics),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fight(id: usize, target: &str) -> FightSegment {
        FightSegment {
            id,
            start_time: 0.0,
            end_time: 0.0,
            snapshots: Vec::new(),
            target_name: target.to_string(),
            target_guid: String::new(),
            needs_review: false,
        }
    }

    #[test]
    fn override_wins_over_inference() {
        let fights = vec![fight(1, "Patchwerk")];
        let label = resolve_raid_label(Some("Naxx Tuesday"), &fights, None);
        assert_eq!(label.name, "Naxx Tuesday");
        assert_eq!(label.source, RaidSource::Override);

        let label = resolve_raid_label(None, &fights, None);
        assert_eq!(label.name, "Naxxramas");
        assert_eq!(label.source, RaidSource::FightTargets);
    }

    #[test]
    fn combat_log_zone_is_the_fallback() {
        let insights = CombatLogInsights {
            raid_zone: Some("Molten Core".to_string()),
            ..Default::default()
        };
        let label = resolve_raid_label(None, &[fight(1, "Core Hound")], Some(&insights));
        assert_eq!(label.name, "Molten Core");
        assert_eq!(label.source, RaidSource::CombatLog);

        let label = resolve_raid_label(None, &[], None);
        assert_eq!(label.name, raid::UNKNOWN_RAID);
        assert_eq!(label.source, RaidSource::Unknown);
    }

    #[test]
    fn boss_filter_renumbers() {
        let fights = vec![
            fight(1, "Deathknight Captain"),
            fight(2, "Instructor Razuvious"),
            fight(3, "Unknown"),
            fight(4, "Gothik the Harvester"),
        ];
        let kept = retain_boss_fights(fights.clone(), "Naxxramas");
        assert_eq!(
            kept.iter()
                .map(|f| (f.id, f.target_name.as_str()))
                .collect::<Vec<_>>(),
            vec![(1, "Instructor Razuvious"), (2, "Gothik the Harvester")]
        );
        assert_eq!(retain_boss_fights(fights, "Unknown Raid").len(), 4);
    }

    #[test]
    fn empty_report_has_zero_totals() {
        let data = build_report_data(ReportInputs {
            raid: resolve_raid_label(None, &[], None),
            fights: Vec::new(),
            raid_summary: Vec::new(),
            source_files: Vec::new(),
            thresholds: SegmentThresholds::default(),
            time_origin: None,
            guilds: &[],
            diagnostics: &Diagnostics::default(),
        });
        assert_eq!(
            data.totals,
            TotalsView {
                fights: 0,
                targets: 0,
                snapshots: 0,
                players: 0,
            }
        );
    }
}
