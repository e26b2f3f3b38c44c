//! Per-fight threat aggregation.
//!
//! Every container here is ordered (`BTreeMap`, sorted `Vec`) so the same
//! fight always aggregates to the same bytes.

use crate::combat_log::{CombatLogInsights, RoleSignals};
use crate::segment::FightSegment;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Dps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FightOutcome {
    /// The target was seen dying in the combat log.
    Kill,
    Unknown,
}

/// Identity of the fight a summary was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FightRef {
    pub id: usize,
    pub target_name: String,
    pub target_guid: String,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub snapshots: usize,
    pub needs_review: bool,
    pub outcome: FightOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    pub peak_threat: f64,
    /// Mean over the snapshots the player appears in, not over the fight.
    pub average_threat: f64,
    pub samples_seen: usize,
    /// Peak threat over the sum of every reported player's peak; 0 when
    /// nobody generated threat.
    pub threat_share: f64,
    /// 1-based position in `ranking_order`.
    pub rank: usize,
    /// Last observed threat minus first observed threat.
    pub threat_done: f64,
    pub active_seconds: f64,
    pub tps: f64,
    pub average_top_percent: f64,
    /// Share of samples in which the player held aggro.
    pub tank_ratio: f64,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatSummary {
    pub fight: FightRef,
    pub player_stats: BTreeMap<String, PlayerStats>,
    /// Peak threat descending, then name ascending.
    pub ranking_order: Vec<String>,
}

/// Optional combat-log inputs shared by all fights of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregationContext<'a> {
    pub insights: Option<&'a CombatLogInsights>,
    /// When set, only these players are reported.
    pub roster: Option<&'a BTreeSet<String>>,
}

impl AggregationContext<'_> {
    fn signals(&self, player: &str) -> RoleSignals {
        self.insights
            .map(|i| i.signals_for(player))
            .unwrap_or_default()
    }

    fn admits(&self, player: &str) -> bool {
        self.roster.is_none_or(|r| r.contains(player))
    }
}

pub fn classify_role(average_top_percent: f64, tank_ratio: f64, signals: RoleSignals) -> Role {
    if signals.taunts >= 2
        || tank_ratio >= 0.55
        || (signals.tank_abilities >= 8 && average_top_percent >= 60.0)
    {
        return Role::Tank;
    }
    if signals.heals >= 10u32.max((signals.tank_abilities + signals.taunts) * 2) {
        return Role::Healer;
    }
    Role::Dps
}

#[derive(Debug)]
struct Accumulator {
    first_time: f64,
    first_threat: f64,
    last_time: f64,
    last_threat: f64,
    peak: f64,
    sum: f64,
    samples: usize,
    percent_sum: f64,
    top_count: usize,
}

impl Accumulator {
    fn new(time: f64, threat: f64) -> Self {
        Self {
            first_time: time,
            first_threat: threat,
            last_time: time,
            last_threat: threat,
            peak: threat,
            sum: 0.0,
            samples: 0,
            percent_sum: 0.0,
            top_count: 0,
        }
    }

    fn observe(&mut self, time: f64, threat: f64, percent: f64, is_top: bool) {
        if time < self.first_time {
            self.first_time = time;
            self.first_threat = threat;
        } else if time == self.first_time {
            self.first_threat = self.first_threat.min(threat);
        }
        if time > self.last_time {
            self.last_time = time;
            self.last_threat = threat;
        } else if time == self.last_time {
            self.last_threat = self.last_threat.max(threat);
        }
        self.peak = self.peak.max(threat);
        self.sum += threat;
        self.samples += 1;
        self.percent_sum += percent;
        self.top_count += usize::from(is_top);
    }
}

/// Sort players by peak threat descending, breaking ties by name.
pub fn ranking(stats: &BTreeMap<String, PlayerStats>) -> Vec<String> {
    let mut names: Vec<&String> = stats.keys().collect();
    names.sort_by(|a, b| {
        stats[*b]
            .peak_threat
            .total_cmp(&stats[*a].peak_threat)
            .then_with(|| a.cmp(b))
    });
    names.into_iter().cloned().collect()
}

/// Aggregate one fight into per-player stats and a ranking.
pub fn aggregate_fight(fight: &FightSegment, ctx: &AggregationContext) -> ThreatSummary {
    let mut acc: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for snap in &fight.snapshots {
        for entry in &snap.entries {
            if !ctx.admits(&entry.player) {
                continue;
            }
            acc.entry(entry.player.as_str())
                .or_insert_with(|| Accumulator::new(snap.timestamp, entry.threat))
                .observe(snap.timestamp, entry.threat, entry.percent, entry.is_top_threat);
        }
    }

    let mut player_stats: BTreeMap<String, PlayerStats> = acc
        .into_iter()
        .map(|(player, a)| {
            let samples = a.samples as f64;
            let active_seconds = (a.last_time - a.first_time).max(0.0);
            let threat_done = (a.last_threat - a.first_threat).max(0.0);
            let average_top_percent = a.percent_sum / samples;
            let tank_ratio = a.top_count as f64 / samples;
            let stats = PlayerStats {
                peak_threat: a.peak,
                average_threat: a.sum / samples,
                samples_seen: a.samples,
                threat_share: 0.0,
                rank: 0,
                threat_done,
                active_seconds,
                tps: if active_seconds > 0.0 {
                    threat_done / active_seconds
                } else {
                    0.0
                },
                average_top_percent,
                tank_ratio,
                role: classify_role(average_top_percent, tank_ratio, ctx.signals(player)),
            };
            (player.to_string(), stats)
        })
        .collect();

    let peak_total: f64 = player_stats.values().map(|s| s.peak_threat).sum();
    if peak_total > 0.0 {
        for stats in player_stats.values_mut() {
            stats.threat_share = stats.peak_threat / peak_total;
        }
    }

    let ranking_order = ranking(&player_stats);
    for (position, name) in ranking_order.iter().enumerate() {
        if let Some(stats) = player_stats.get_mut(name) {
            stats.rank = position + 1;
        }
    }

    let outcome = match ctx.insights {
        Some(i) if i.saw_death(&fight.target_name) => FightOutcome::Kill,
        _ => FightOutcome::Unknown,
    };

    ThreatSummary {
        fight: FightRef {
            id: fight.id,
            target_name: fight.target_name.clone(),
            target_guid: fight.target_guid.clone(),
            start_time: fight.start_time,
            end_time: fight.end_time,
            duration: fight.duration(),
            snapshots: fight.sample_count(),
            needs_review: fight.needs_review,
            outcome,
        },
        player_stats,
        ranking_order,
    }
}

pub fn aggregate_fights(fights: &[FightSegment], ctx: &AggregationContext) -> Vec<ThreatSummary> {
    fights.iter().map(|f| aggregate_fight(f, ctx)).collect()
}

/// One player's totals across every reported fight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaidPlayerRow {
    pub player: String,
    pub fights: usize,
    pub threat_done: f64,
    /// Total threat done over total active time.
    pub tps: f64,
    pub average_top_percent: f64,
    pub role: Role,
    pub heals: u32,
    pub taunts: u32,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn summarize_raid(summaries: &[ThreatSummary], ctx: &AggregationContext) -> Vec<RaidPlayerRow> {
    #[derive(Default)]
    struct Totals {
        fights: usize,
        threat: f64,
        seconds: f64,
        percent: Vec<f64>,
        tank_ratio: Vec<f64>,
    }

    let mut totals: BTreeMap<&str, Totals> = BTreeMap::new();
    for summary in summaries {
        for (player, stats) in &summary.player_stats {
            let t = totals.entry(player.as_str()).or_default();
            t.fights += 1;
            t.threat += stats.threat_done;
            t.seconds += stats.active_seconds;
            t.percent.push(stats.average_top_percent);
            t.tank_ratio.push(stats.tank_ratio);
        }
    }

    let mut rows: Vec<RaidPlayerRow> = totals
        .into_iter()
        .map(|(player, t)| {
            let signals = ctx.signals(player);
            let average_top_percent = mean(&t.percent);
            RaidPlayerRow {
                player: player.to_string(),
                fights: t.fights,
                threat_done: t.threat,
                tps: if t.seconds > 0.0 {
                    t.threat / t.seconds
                } else {
                    0.0
                },
                average_top_percent,
                role: classify_role(average_top_percent, mean(&t.tank_ratio), signals),
                heals: signals.heals,
                taunts: signals.taunts,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.threat_done
            .total_cmp(&a.threat_done)
            .then_with(|| a.player.cmp(&b.player))
    });
    rows
}
