//! Discovery of threat snapshot part files.
//!
//! The add-on writes `<prefix>ThreatLog<session>_part<N>.txt`, sometimes with a
//! doubled `.txt.txt` suffix. Parts are returned in numeric part order.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("no threat log files matching {pattern} found in {}", .dir.display())]
    NoLogFilesFound { dir: PathBuf, pattern: String },
    #[error("cannot list threat log directory {}: {source}", .dir.display())]
    Unreadable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid log file pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One snapshot log part, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartFile {
    /// Position in the ordered part list; ties in the merge fall back to it.
    pub index: usize,
    /// Part number embedded in the file name, if any.
    pub part: Option<u64>,
    pub path: PathBuf,
}

impl PartFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Name matcher for one file prefix.
#[derive(Debug, Clone)]
pub struct PartMatcher {
    name: Regex,
    part: Regex,
    pattern: String,
}

impl PartMatcher {
    pub fn new(prefix: &str) -> Result<Self, LocateError> {
        let name = Regex::new(&format!(
            r"^{}ThreatLog.*_part.*\.txt.*$",
            regex::escape(prefix)
        ))?;
        let part = RegexBuilder::new(r"_part(\d+)\.txt(?:\.txt)?$")
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            name,
            part,
            pattern: format!("{}ThreatLog*_part*.txt*", prefix),
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.name.is_match(file_name)
    }

    pub fn part_number(&self, file_name: &str) -> Option<u64> {
        self.part
            .captures(file_name)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Numbered parts first in numeric order, then unnumbered ones by name.
pub fn compare_parts(a: (Option<u64>, &str), b: (Option<u64>, &str)) -> Ordering {
    match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(b.1)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.1.cmp(b.1),
    }
}

/// List the part files of `dir` matching `prefix`, ordered by part number.
pub fn locate_part_files(dir: &Path, prefix: &str) -> Result<Vec<PartFile>, LocateError> {
    let matcher = PartMatcher::new(prefix)?;
    let not_found = || LocateError::NoLogFilesFound {
        dir: dir.to_path_buf(),
        pattern: matcher.pattern.clone(),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(source) => {
            return Err(LocateError::Unreadable {
                dir: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut found: Vec<(Option<u64>, String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if matcher.matches(&name) {
            found.push((matcher.part_number(&name), name, path));
        }
    }

    if found.is_empty() {
        return Err(not_found());
    }

    found.sort_by(|a, b| compare_parts((a.0, a.1.as_str()), (b.0, b.1.as_str())));
    let parts: Vec<PartFile> = found
        .into_iter()
        .enumerate()
        .map(|(index, (part, _, path))| PartFile { index, part, path })
        .collect();

    log::debug!(
        "found {} threat log part(s) in {}",
        parts.len(),
        dir.display()
    );
    Ok(parts)
}

/// The single combat log; only used for best-effort correlation.
#[derive(Debug, Clone)]
pub struct CombatLogSource {
    pub path: PathBuf,
}

impl CombatLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Whole file as lossy UTF-8, or `None` when it cannot be read.
    pub fn read_lossy(&self) -> Option<String> {
        match fs::read(&self.path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                log::warn!("cannot read combat log {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
