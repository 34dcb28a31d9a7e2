use crate::parser::canonical_key;
use std::path::PathBuf;
use tracing::debug;

/// Suffix of the compressed NZB files the download client keeps for every
/// job it has processed.
pub const ARCHIVE_SUFFIX: &str = ".nzb.gz";

/// Local archive of previously completed submissions.
#[derive(Debug, Clone)]
pub struct NzbArchive {
    dir: PathBuf,
}

impl NzbArchive {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Canonical keys of every archived record. A missing directory is empty.
    #[must_use]
    pub fn record_keys(&self) -> Vec<String> {
        if !self.dir.is_dir() {
            return Vec::new();
        }

        walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let stem = strip_suffix_ignore_case(&name, ARCHIVE_SUFFIX)?;
                Some(canonical_key(stem))
            })
            .collect()
    }

    /// Finds the first record matching any of the given titles.
    #[must_use]
    pub fn find(&self, titles: &[&str]) -> Option<String> {
        let wanted: Vec<String> = titles
            .iter()
            .map(|t| canonical_key(t.trim_end_matches('.')))
            .filter(|k| !k.is_empty())
            .collect();

        if wanted.is_empty() {
            return None;
        }

        let hit = self
            .record_keys()
            .into_iter()
            .find(|key| wanted.contains(key));

        if let Some(ref key) = hit {
            debug!(dir = %self.dir.display(), record = %key, "Archive record matched");
        }
        hit
    }
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_with(files: &[&str]) -> (NzbArchive, PathBuf) {
        let dir = std::env::temp_dir().join(format!("sabwatch-archive-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for f in files {
            std::fs::write(dir.join(f), b"").unwrap();
        }
        (NzbArchive::new(&dir), dir)
    }

    #[test]
    fn test_raw_title_matches_with_punctuation_folded() {
        let (archive, dir) = archive_with(&["Show_Name-S01E02-720p-GROUP.nzb.gz"]);
        assert!(archive.find(&["Show.Name.S01E02.720p-GROUP"]).is_some());
        assert!(archive.find(&["Show.Name.S01E03.720p-GROUP"]).is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_fixed_title_matches() {
        let (archive, dir) = archive_with(&["CSI- Miami - 1x02 - Pilot.nzb.gz", "notes.txt"]);
        assert!(archive.find(&["irrelevant", "CSI: Miami - 1x02 - Pilot"]).is_some());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_other_files_are_ignored() {
        let (archive, dir) = archive_with(&["Show Name - 1x02 - Pilot.nzb"]);
        assert!(archive.find(&["Show Name - 1x02 - Pilot"]).is_none());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_archive_dir() {
        let archive = NzbArchive::new(
            std::env::temp_dir().join(format!("sabwatch-missing-{}", uuid::Uuid::new_v4())),
        );
        assert!(archive.record_keys().is_empty());
        assert!(archive.find(&["anything"]).is_none());
    }

    #[test]
    fn test_strip_suffix_ignore_case() {
        assert_eq!(strip_suffix_ignore_case("a.NZB.GZ", ".nzb.gz"), Some("a"));
        assert_eq!(strip_suffix_ignore_case("gz", ".nzb.gz"), None);
    }
}
