//! Raid threat report engine.
//!
//! Pipeline: locate part files → parse snapshots → merge, split and filter
//! into fights → aggregate threat per fight → render one report file.

use anyhow::Context;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

pub mod aggregate;
pub mod combat_log;
pub mod config;
pub mod diagnostics;
pub mod locate;
pub mod log;
pub mod model;
pub mod raid;
pub mod render;
pub mod segment;

use crate::aggregate::AggregationContext;
use crate::config::ReportConfig;
use crate::diagnostics::Diagnostics;
use crate::locate::{CombatLogSource, LocateError, PartFile};
use crate::model::{ReportData, ReportInputs};

pub type Result<T> = anyhow::Result<T>;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: PathBuf,
    pub report: ReportData,
    pub snapshots: usize,
    pub diagnostics: Diagnostics,
}

/// Find the part files; a missing directory or no matches degrades to an
/// empty list.
pub fn locate_parts(config: &ReportConfig, diagnostics: &mut Diagnostics) -> Result<Vec<PartFile>> {
    match locate::locate_part_files(&config.log_dir, &config.prefix) {
        Ok(parts) => Ok(parts),
        Err(e @ (LocateError::NoLogFilesFound { .. } | LocateError::Unreadable { .. })) => {
            ::log::warn!("{}", e);
            diagnostics.no_threat_logs = true;
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the whole pipeline and write the report to `config.output`.
pub fn run_report(config: &ReportConfig) -> Result<RunOutcome> {
    config.validate()?;
    let mut diagnostics = Diagnostics::default();

    let parts = locate_parts(config, &mut diagnostics)?;
    let mut parsed: Vec<_> = parts
        .iter()
        .map(|part| log::parse_part_file(part).unpack(&mut diagnostics))
        .collect();
    let time_base = log::normalize_time_base(&mut parsed);
    let snapshots: usize = parsed.iter().map(Vec::len).sum();

    let fights = segment::segment_fights(parsed, &config.thresholds).unpack(&mut diagnostics);

    let insights = combat_log::load_combat_log(&CombatLogSource::new(&config.combat_log))?
        .unpack(&mut diagnostics);

    let raid = model::resolve_raid_label(config.raid_label_override(), &fights, insights.as_ref());
    let fights = if config.bosses_only {
        model::retain_boss_fights(fights, &raid.name)
    } else {
        fights
    };

    let roster: Option<BTreeSet<String>> = match (&insights, config.guilds.is_empty()) {
        (_, true) => None,
        (Some(i), false) => Some(i.guild_members(&config.guilds)),
        (None, false) => {
            ::log::warn!("guild filter requested but the combat log is unavailable; reporting everyone");
            None
        }
    };
    let ctx = AggregationContext {
        insights: insights.as_ref(),
        roster: roster.as_ref(),
    };

    let summaries = aggregate::aggregate_fights(&fights, &ctx);
    let raid_summary = aggregate::summarize_raid(&summaries, &ctx);

    let report = model::build_report_data(ReportInputs {
        raid,
        fights: summaries,
        raid_summary,
        source_files: parts.iter().map(PartFile::file_name).collect(),
        thresholds: config.thresholds,
        time_origin: time_base.map(|t| t.origin),
        guilds: &config.guilds,
        diagnostics: &diagnostics,
    });

    let rendered = render::render_report(&report, config.format)?;
    if let Some(dir) = config.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
    }
    fs::write(&config.output, rendered)
        .with_context(|| format!("write report {}", config.output.display()))?;

    diagnostics.log_summary();
    Ok(RunOutcome {
        output: config.output.clone(),
        report,
        snapshots,
        diagnostics,
    })
}
