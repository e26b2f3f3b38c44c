//! Fight segmentation: merge every part into one timeline, cut it wherever
//! snapshots stop for longer than the gap threshold, and drop the noise.

use crate::config::SegmentThresholds;
use crate::diagnostics::{Diagnostics, Staged};
use crate::log::SnapshotRecord;
use crate::log::row::UNKNOWN_GUID;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used when no single target dominates a fight.
pub const UNKNOWN_FIGHT_TARGET: &str = "Unknown";

/// A contiguous run of snapshots attributed to one encounter.
#[derive(Debug, Clone, PartialEq)]
pub struct FightSegment {
    /// 1-based, chronological among retained fights.
    pub id: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub snapshots: Vec<SnapshotRecord>,
    pub target_name: String,
    pub target_guid: String,
    /// Snapshots in this fight pointed at more than one target.
    pub needs_review: bool,
}

impl FightSegment {
    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    pub fn sample_count(&self) -> usize {
        self.snapshots.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetInference {
    pub name: String,
    pub guid: String,
    pub needs_review: bool,
}

/// Merge per-file sequences into one ascending timeline.
///
/// Equal timestamps keep source file order, then line order.
pub fn merge_timeline(parts: Vec<Vec<SnapshotRecord>>) -> Vec<SnapshotRecord> {
    let mut merged: Vec<SnapshotRecord> = parts.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        a.timestamp
            .total_cmp(&b.timestamp)
            .then_with(|| a.source_file_index.cmp(&b.source_file_index))
            .then_with(|| a.line.cmp(&b.line))
    });
    merged
}

/// Split a merged timeline wherever consecutive snapshots are more than
/// `gap_seconds` apart.
pub fn split_on_gaps(timeline: Vec<SnapshotRecord>, gap_seconds: f64) -> Vec<Vec<SnapshotRecord>> {
    let mut segments: Vec<Vec<SnapshotRecord>> = Vec::new();
    let mut current: Vec<SnapshotRecord> = Vec::new();

    for snap in timeline {
        if let Some(prev) = current.last() {
            if snap.timestamp - prev.timestamp > gap_seconds {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(snap);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Why a raw segment did not make it into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    TooSparse,
}

pub fn check_thresholds(
    snapshots: &[SnapshotRecord],
    thresholds: &SegmentThresholds,
) -> Result<(), Rejection> {
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return Err(Rejection::TooSparse);
    };
    if last.timestamp - first.timestamp < thresholds.min_duration {
        return Err(Rejection::TooShort);
    }
    if snapshots.len() < thresholds.min_snapshots {
        return Err(Rejection::TooSparse);
    }
    Ok(())
}

/// Most frequent target label among the snapshots; a tie for first place
/// yields [`UNKNOWN_FIGHT_TARGET`].
pub fn infer_target(snapshots: &[SnapshotRecord]) -> TargetInference {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for snap in snapshots {
        *counts.entry(snap.target_name.as_str()).or_default() += 1;
    }

    let best = counts.values().copied().max().unwrap_or(0);
    let leaders: Vec<&str> = counts
        .iter()
        .filter(|(_, n)| **n == best)
        .map(|(name, _)| *name)
        .collect();
    let needs_review = counts.len() > 1;

    let [name] = leaders.as_slice() else {
        return TargetInference {
            name: UNKNOWN_FIGHT_TARGET.to_string(),
            guid: UNKNOWN_GUID.to_string(),
            needs_review,
        };
    };

    let mut guids: BTreeMap<&str, usize> = BTreeMap::new();
    for snap in snapshots.iter().filter(|s| s.target_name == *name) {
        *guids.entry(snap.target_guid.as_str()).or_default() += 1;
    }
    // Equal guid counts resolve to the lexicographically smallest guid.
    let guid = guids
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(g, _)| g.to_string())
        .unwrap_or_else(|| UNKNOWN_GUID.to_string());

    TargetInference {
        name: name.to_string(),
        guid,
        needs_review,
    }
}

/// Merge, split and filter all parsed parts into qualifying fights.
pub fn segment_fights(
    parts: Vec<Vec<SnapshotRecord>>,
    thresholds: &SegmentThresholds,
) -> Staged<Vec<FightSegment>> {
    let mut diagnostics = Diagnostics::default();
    let timeline = merge_timeline(parts);
    let total = timeline.len();
    let raw = split_on_gaps(timeline, thresholds.gap_seconds);
    let raw_count = raw.len();

    let mut fights: Vec<FightSegment> = Vec::new();
    for snapshots in raw {
        match check_thresholds(&snapshots, thresholds) {
            Err(Rejection::TooShort) => {
                diagnostics.segments_too_short += 1;
                continue;
            }
            Err(Rejection::TooSparse) => {
                diagnostics.segments_too_sparse += 1;
                continue;
            }
            Ok(()) => {}
        }

        let target = infer_target(&snapshots);
        let id = fights.len() + 1;
        if target.needs_review {
            diagnostics.segments_needing_review += 1;
            log::warn!(
                "fight {} labeled {:?} saw several targets; flagged for review",
                id,
                target.name
            );
        }

        let start_time = snapshots.first().map(|s| s.timestamp).unwrap_or_default();
        let end_time = snapshots.last().map(|s| s.timestamp).unwrap_or_default();
        fights.push(FightSegment {
            id,
            start_time,
            end_time,
            snapshots,
            target_name: target.name,
            target_guid: target.guid,
            needs_review: target.needs_review,
        });
    }

    log::info!(
        "segmented {} snapshot(s) into {} raw segment(s), {} qualifying fight(s)",
        total,
        raw_count,
        fights.len()
    );
    Staged::new(fights, diagnostics)
}
