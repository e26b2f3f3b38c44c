//! Parsing of TWThreat snapshot part files.

pub mod parse;
pub mod row;

pub use parse::{SnapshotLines, normalize_time_base, parse_part_file, parse_snapshot_line};
pub use row::{ParsedLine, SnapshotRecord, ThreatEntry, TimeBase};
