//! Run diagnostics collected stage by stage and reported once at the end.
//!
//! Stages never touch shared state; each returns a [`Staged`] pair and the
//! caller folds the diagnostics together with [`Diagnostics::merge`].

use serde::Serialize;
use std::path::PathBuf;

/// Cap on retained per-line warnings; counters keep counting past it.
const MAX_KEPT_WARNINGS: usize = 200;

/// A snapshot line that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MalformedRecordWarning {
    pub file: PathBuf,
    pub line: usize,
    pub reason: String,
    /// The offending text, clipped.
    pub raw: String,
}

const MAX_RAW_CHARS: usize = 120;

impl MalformedRecordWarning {
    pub fn new(file: PathBuf, line: usize, reason: String, raw: &str) -> Self {
        Self {
            file,
            line,
            reason,
            raw: raw.chars().take(MAX_RAW_CHARS).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub malformed_lines: usize,
    pub dropped_entries: usize,
    pub unreadable_files: Vec<PathBuf>,
    pub out_of_order_timestamps: usize,
    pub no_threat_logs: bool,
    pub combat_log_unavailable: bool,
    pub segments_too_short: usize,
    pub segments_too_sparse: usize,
    pub segments_needing_review: usize,
    pub warnings: Vec<MalformedRecordWarning>,
}

/// Output of a pipeline stage together with what went wrong along the way.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    pub output: T,
    pub diagnostics: Diagnostics,
}

impl<T> Staged<T> {
    pub fn new(output: T, diagnostics: Diagnostics) -> Self {
        Self {
            output,
            diagnostics,
        }
    }

    /// Fold this stage's diagnostics into `into` and hand back the output.
    pub fn unpack(self, into: &mut Diagnostics) -> T {
        into.merge(self.diagnostics);
        self.output
    }
}

impl Diagnostics {
    pub fn record_malformed(&mut self, warning: MalformedRecordWarning) {
        self.malformed_lines += 1;
        log::debug!(
            "skipping malformed snapshot line {}:{}: {} ({:?})",
            warning.file.display(),
            warning.line,
            warning.reason,
            warning.raw
        );
        if self.warnings.len() < MAX_KEPT_WARNINGS {
            self.warnings.push(warning);
        }
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.malformed_lines += other.malformed_lines;
        self.dropped_entries += other.dropped_entries;
        self.unreadable_files.extend(other.unreadable_files);
        self.out_of_order_timestamps += other.out_of_order_timestamps;
        self.no_threat_logs |= other.no_threat_logs;
        self.combat_log_unavailable |= other.combat_log_unavailable;
        self.segments_too_short += other.segments_too_short;
        self.segments_too_sparse += other.segments_too_sparse;
        self.segments_needing_review += other.segments_needing_review;

        let room = MAX_KEPT_WARNINGS.saturating_sub(self.warnings.len());
        self.warnings.extend(other.warnings.into_iter().take(room));
    }

    /// Emit the end-of-run summary.
    pub fn log_summary(&self) {
        if self.no_threat_logs {
            log::warn!("no threat snapshot logs were found; the report contains no threat data");
        }
        if self.combat_log_unavailable {
            log::warn!("combat log unavailable; raid, roster and role detection were skipped");
        }
        if self.malformed_lines > 0 {
            log::warn!("skipped {} malformed snapshot line(s)", self.malformed_lines);
        }
        if self.dropped_entries > 0 {
            log::warn!("dropped {} malformed threat entr(ies)", self.dropped_entries);
        }
        for path in &self.unreadable_files {
            log::warn!("skipped unreadable threat log {}", path.display());
        }
        if self.out_of_order_timestamps > 0 {
            log::warn!(
                "{} snapshot(s) were out of order within their file",
                self.out_of_order_timestamps
            );
        }
        if self.segments_needing_review > 0 {
            log::warn!(
                "{} fight(s) mixed several targets; check their labels manually",
                self.segments_needing_review
            );
        }
        if self.segments_too_short + self.segments_too_sparse > 0 {
            log::info!(
                "discarded {} short and {} sparse segment(s)",
                self.segments_too_short,
                self.segments_too_sparse
            );
        }
    }
}
