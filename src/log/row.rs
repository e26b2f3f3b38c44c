use serde::Serialize;

pub const UNKNOWN_GUID: &str = "UNKNOWN_GUID";
pub const UNKNOWN_TARGET: &str = "Unknown Target";

/// One player's row in a threat table capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatEntry {
    pub player: String,
    pub threat: f64,
    /// Percent of the top threat holder, as reported by the add-on.
    pub percent: f64,
    /// The player held aggro at capture time.
    pub is_top_threat: bool,
    pub melee: bool,
}

/// A single capture of the threat table for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRecord {
    /// Seconds on the common time base once normalized.
    pub timestamp: f64,
    pub source_file_index: usize,
    /// 1-based line number inside the source file.
    pub line: usize,
    pub sender: String,
    pub target_guid: String,
    pub target_name: String,
    /// Player names are unique within one record.
    pub entries: Vec<ThreatEntry>,
}

/// Outcome of reading one physical line of a part file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Valid {
        record: SnapshotRecord,
        /// Entry chunks on the line that were unusable.
        dropped_entries: usize,
    },
    Malformed {
        line: usize,
        raw: String,
        reason: String,
    },
    /// Blank line or non-snapshot chatter.
    Ignored,
}

/// Offset subtracted from every raw timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeBase {
    pub origin: f64,
}
