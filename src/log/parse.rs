use crate::diagnostics::{Diagnostics, MalformedRecordWarning, Staged};
use crate::locate::PartFile;
use crate::log::row::{
    ParsedLine, SnapshotRecord, ThreatEntry, TimeBase, UNKNOWN_GUID, UNKNOWN_TARGET,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

const LINE_MARKER: &str = "TWT_THREAT";
const PACKET_PREFIX: &str = "TWTv4=";

/// Parse one `unit:tank:threat:percent:melee` chunk.
fn parse_entry(chunk: &str) -> Option<ThreatEntry> {
    let fields: Vec<&str> = chunk.split(':').collect();
    let [unit, tank, threat, percent, melee] = fields.as_slice() else {
        return None;
    };

    let player = unit.trim();
    if player.is_empty() {
        return None;
    }
    // Flags are written as numbers and occasionally as "1.0".
    let tank: f64 = tank.trim().parse().ok()?;
    let threat: f64 = threat.trim().parse().ok()?;
    let percent: f64 = percent.trim().parse().ok()?;
    let melee: f64 = melee.trim().parse().ok()?;
    if !threat.is_finite() || threat < 0.0 || !percent.is_finite() {
        return None;
    }

    Some(ThreatEntry {
        player: player.to_string(),
        threat,
        percent,
        is_top_threat: tank.trunc() as i64 == 1,
        melee: melee.trunc() as i64 == 1,
    })
}

/// Parse one physical line of a part file.
///
/// Expected columns (tab-separated):
/// TWT_THREAT  time  sender  target_guid  target_name  TWTv4=entries
///
/// Example:
/// TWT_THREAT  1234.5  Tankadin  0xF13000  Patchwerk  TWTv4=Tankadin:1:5200:100:1;Rogue:0:4100:78.8:1
pub fn parse_snapshot_line(raw: &str, source_file_index: usize, line: usize) -> ParsedLine {
    let text = raw.trim_end_matches(['\r', '\n']);
    if text.trim().is_empty() {
        return ParsedLine::Ignored;
    }

    let malformed = |reason: &str| ParsedLine::Malformed {
        line,
        raw: text.to_string(),
        reason: reason.to_string(),
    };

    let cols: Vec<&str> = text.split('\t').collect();
    // Other add-on chatter shares the file.
    if cols[0] != LINE_MARKER {
        return ParsedLine::Ignored;
    }
    if cols.len() < 6 {
        return malformed("expected 6 tab-separated columns");
    }

    let timestamp = match cols[1].trim().parse::<f64>() {
        Ok(t) if t.is_finite() => t,
        _ => return malformed("bad timestamp"),
    };

    let Some(payload) = cols[5].strip_prefix(PACKET_PREFIX) else {
        return malformed("missing TWTv4= packet");
    };

    let mut entries: Vec<ThreatEntry> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut dropped_entries = 0usize;
    for chunk in payload.split(';') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        match parse_entry(chunk) {
            Some(entry) if seen.insert(entry.player.clone()) => entries.push(entry),
            _ => dropped_entries += 1,
        }
    }
    if entries.is_empty() {
        return malformed("no usable threat entries");
    }

    let non_empty = |s: &str, fallback: &str| {
        let s = s.trim();
        if s.is_empty() { fallback.to_string() } else { s.to_string() }
    };

    ParsedLine::Valid {
        record: SnapshotRecord {
            timestamp,
            source_file_index,
            line,
            sender: cols[2].trim().to_string(),
            target_guid: non_empty(cols[3], UNKNOWN_GUID),
            target_name: non_empty(cols[4], UNKNOWN_TARGET),
            entries,
        },
        dropped_entries,
    }
}

/// Lazy line-by-line reader over one part file.
///
/// Bytes that are not valid UTF-8 are replaced, matching how the game client
/// occasionally writes player names.
pub struct SnapshotLines<R> {
    reader: R,
    source_file_index: usize,
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> SnapshotLines<R> {
    pub fn new(reader: R, source_file_index: usize) -> Self {
        Self {
            reader,
            source_file_index,
            line: 0,
            buf: Vec::new(),
        }
    }
}

impl SnapshotLines<BufReader<File>> {
    pub fn open(part: &PartFile) -> io::Result<Self> {
        let file = File::open(&part.path)?;
        Ok(Self::new(BufReader::new(file), part.index))
    }
}

impl<R: BufRead> Iterator for SnapshotLines<R> {
    type Item = io::Result<ParsedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line += 1;
                let text = String::from_utf8_lossy(&self.buf);
                Some(Ok(parse_snapshot_line(
                    &text,
                    self.source_file_index,
                    self.line,
                )))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Collect records from any line source, tracking warnings against `file`.
pub fn collect_records<I>(lines: I, file: PathBuf) -> Staged<Vec<SnapshotRecord>>
where
    I: IntoIterator<Item = io::Result<ParsedLine>>,
{
    let mut diagnostics = Diagnostics::default();
    let mut records: Vec<SnapshotRecord> = Vec::new();
    let mut last_timestamp = f64::NEG_INFINITY;

    for parsed in lines {
        match parsed {
            Ok(ParsedLine::Valid {
                record,
                dropped_entries,
            }) => {
                diagnostics.dropped_entries += dropped_entries;
                if record.timestamp < last_timestamp {
                    diagnostics.out_of_order_timestamps += 1;
                }
                last_timestamp = last_timestamp.max(record.timestamp);
                records.push(record);
            }
            Ok(ParsedLine::Malformed { line, raw, reason }) => {
                diagnostics.record_malformed(MalformedRecordWarning::new(
                    file.clone(),
                    line,
                    reason,
                    &raw,
                ));
            }
            Ok(ParsedLine::Ignored) => {}
            Err(e) => {
                log::warn!(
                    "read error in {} after {} record(s): {}",
                    file.display(),
                    records.len(),
                    e
                );
                diagnostics.unreadable_files.push(file.clone());
                break;
            }
        }
    }

    Staged::new(records, diagnostics)
}

/// Parse one part file; an unreadable file yields no records and a warning.
pub fn parse_part_file(part: &PartFile) -> Staged<Vec<SnapshotRecord>> {
    let lines = match SnapshotLines::open(part) {
        Ok(lines) => lines,
        Err(e) => {
            log::warn!("cannot open threat log {}: {}", part.path.display(), e);
            return Staged::new(
                Vec::new(),
                Diagnostics {
                    unreadable_files: vec![part.path.clone()],
                    ..Default::default()
                },
            );
        }
    };

    let staged = collect_records(lines, part.path.clone());
    log::debug!(
        "parsed {} snapshot(s) from {} ({} malformed line(s))",
        staged.output.len(),
        part.path.display(),
        staged.diagnostics.malformed_lines
    );
    staged
}

/// Shift every record onto a clock that starts at the earliest snapshot seen
/// across all parts. Returns `None` when there are no records at all.
pub fn normalize_time_base(parts: &mut [Vec<SnapshotRecord>]) -> Option<TimeBase> {
    let origin = parts
        .iter()
        .flatten()
        .map(|r| r.timestamp)
        .min_by(f64::total_cmp)?;

    for record in parts.iter_mut().flatten() {
        record.timestamp -= origin;
    }
    Some(TimeBase { origin })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn line(time: f64, target: &str, entries: &str) -> String {
        format!("TWT_THREAT\t{time}\tTankadin\t0xF130{target}\t{target}\tTWTv4={entries}\n")
    }

    fn parse_all(text: &str) -> Staged<Vec<SnapshotRecord>> {
        collect_records(
            SnapshotLines::new(Cursor::new(text.as_bytes().to_vec()), 0),
            PathBuf::from("part1.txt"),
        )
    }

    #[test]
    fn parses_a_snapshot_line() {
        let parsed = parse_snapshot_line(
            &line(12.5, "Patchwerk", "Tankadin:1:5200:100:1;Rogue:0:4100.5:78.8:1;"),
            3,
            7,
        );
        let ParsedLine::Valid {
            record,
            dropped_entries,
        } = parsed
        else {
            panic!("expected a valid record, got {parsed:?}");
        };
        assert_eq!(dropped_entries, 0);
        assert_eq!(record.timestamp, 12.5);
        assert_eq!(record.source_file_index, 3);
        assert_eq!(record.line, 7);
        assert_eq!(record.target_name, "Patchwerk");
        assert_eq!(
            record.entries,
            vec![
                ThreatEntry {
                    player: "Tankadin".to_string(),
                    threat: 5200.0,
                    percent: 100.0,
                    is_top_threat: true,
                    melee: true,
                },
                ThreatEntry {
                    player: "Rogue".to_string(),
                    threat: 4100.5,
                    percent: 78.8,
                    is_top_threat: false,
                    melee: true,
                },
            ]
        );
    }

    #[test]
    fn bad_chunks_are_dropped_not_fatal() {
        let parsed = parse_snapshot_line(
            &line(1.0, "Gluth", "A:1:100:100:1;broken;B:0:-5:10:0;A:0:50:50:0;C:0:20:20:0"),
            0,
            1,
        );
        let ParsedLine::Valid {
            record,
            dropped_entries,
        } = parsed
        else {
            panic!("expected a valid record");
        };
        assert_eq!(dropped_entries, 3);
        assert_eq!(
            record
                .entries
                .iter()
                .map(|e| e.player.as_str())
                .collect::<Vec<_>>(),
            vec!["A", "C"]
        );
    }

    #[test]
    fn missing_target_fields_fall_back() {
        let parsed = parse_snapshot_line("TWT_THREAT\t1\tX\t\t\tTWTv4=A:0:1:1:0", 0, 1);
        let ParsedLine::Valid { record, .. } = parsed else {
            panic!("expected a valid record");
        };
        assert_eq!(record.target_guid, UNKNOWN_GUID);
        assert_eq!(record.target_name, UNKNOWN_TARGET);
    }

    #[test]
    fn malformed_lines_carry_a_reason() {
        let cases = [
            ("TWT_THREAT\t1\tX", "expected 6 tab-separated columns"),
            ("TWT_THREAT\tnow\tX\tG\tT\tTWTv4=A:0:1:1:0", "bad timestamp"),
            ("TWT_THREAT\t1\tX\tG\tT\tTWTv3=A:0:1:1:0", "missing TWTv4= packet"),
            ("TWT_THREAT\t1\tX\tG\tT\tTWTv4=;;", "no usable threat entries"),
        ];
        for (raw, expected) in cases {
            match parse_snapshot_line(raw, 0, 4) {
                ParsedLine::Malformed { line, reason, .. } => {
                    assert_eq!(line, 4);
                    assert_eq!(reason, expected, "for {raw:?}");
                }
                other => panic!("expected malformed for {raw:?}, got {other:?}"),
            }
        }
        assert_eq!(parse_snapshot_line("  \r\n", 0, 1), ParsedLine::Ignored);
    }

    #[test]
    fn chatter_lines_are_ignored() {
        assert_eq!(parse_snapshot_line("garbage###", 0, 1), ParsedLine::Ignored);

        let text = ["[TWThreat] session started\n".to_string(), line(1.0, "Gluth", "A:1:1:1:1")].concat();
        let staged = parse_all(&text);
        assert_eq!(staged.output.len(), 1);
        assert_eq!(staged.output[0].line, 2);
        assert_eq!(staged.diagnostics.malformed_lines, 0);
        assert!(staged.diagnostics.warnings.is_empty());
    }

    #[test]
    fn one_corrupted_line_among_fifty() {
        let mut text = String::new();
        for i in 0..50 {
            if i == 20 {
                text.push_str("TWT_THREAT\t###corrupted###\n");
            }
            text.push_str(&line(i as f64, "Patchwerk", "Tankadin:1:100:100:1"));
        }

        let staged = parse_all(&text);
        assert_eq!(staged.output.len(), 50);
        assert_eq!(staged.diagnostics.malformed_lines, 1);
        assert_eq!(staged.diagnostics.warnings.len(), 1);
        assert_eq!(staged.diagnostics.warnings[0].line, 21);
        assert_eq!(staged.diagnostics.warnings[0].raw, "TWT_THREAT\t###corrupted###");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut bytes = line(1.0, "Onyxia", "Tank:1:10:100:1").into_bytes();
        bytes.extend_from_slice(b"TWT_THREAT\t2\tX\tG\tOnyxia\tTWTv4=N\xffme:0:5:50:0\n");
        let staged = collect_records(
            SnapshotLines::new(Cursor::new(bytes), 0),
            PathBuf::from("part1.txt"),
        );
        assert_eq!(staged.output.len(), 2);
        assert_eq!(staged.output[1].entries[0].player, "N\u{fffd}me");
    }

    #[test]
    fn out_of_order_timestamps_are_kept_and_counted() {
        let text = [
            line(5.0, "Gluth", "A:1:1:1:1"),
            line(3.0, "Gluth", "A:1:2:1:1"),
            line(6.0, "Gluth", "A:1:3:1:1"),
        ]
        .concat();
        let staged = parse_all(&text);
        assert_eq!(staged.output.len(), 3);
        assert_eq!(staged.diagnostics.out_of_order_timestamps, 1);
    }

    #[test]
    fn missing_part_file_is_counted() {
        let part = PartFile {
            index: 0,
            part: Some(1),
            path: PathBuf::from("/definitely/not/here_part1.txt"),
        };
        let staged = parse_part_file(&part);
        assert!(staged.output.is_empty());
        assert_eq!(staged.diagnostics.unreadable_files, vec![part.path]);
    }

    #[test]
    fn time_base_starts_at_earliest_snapshot() {
        let mut parts = vec![
            parse_all(&[line(1005.0, "Gluth", "A:1:1:1:1"), line(1010.0, "Gluth", "A:1:1:1:1")].concat())
                .output,
            parse_all(&line(1000.0, "Gluth", "A:1:1:1:1")).output,
        ];
        let base = normalize_time_base(&mut parts).unwrap();
        assert_eq!(base.origin, 1000.0);
        assert_eq!(
            parts
                .iter()
                .flatten()
                .map(|r| r.timestamp)
                .collect::<Vec<_>>(),
            vec![5.0, 10.0, 0.0]
        );

        let mut empty: Vec<Vec<SnapshotRecord>> = vec![Vec::new()];
        assert_eq!(normalize_time_base(&mut empty), None);
    }
}
