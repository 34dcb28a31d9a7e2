use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Compiles a `*`/`?` wildcard pattern into a case-insensitive anchored regex.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            _ => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr).case_insensitive(true).build().ok()
}

/// Files directly inside `dir` whose names match `pattern`.
///
/// A missing directory yields no matches.
#[must_use]
pub fn matching_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let Some(re) = glob_to_regex(pattern) else {
        return Vec::new();
    };

    walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_str().is_some_and(|name| re.is_match(name)))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Looks up video files for one episode under a single root.
#[derive(Debug, Clone)]
pub struct DiskScanner {
    video_extensions: Vec<String>,
}

impl DiskScanner {
    #[must_use]
    pub const fn new(video_extensions: Vec<String>) -> Self {
        Self { video_extensions }
    }

    /// First file in `dir` matching `mask` followed by any video extension.
    #[must_use]
    pub fn find_by_mask(&self, dir: &Path, mask: &str) -> Option<PathBuf> {
        debug!(dir = %dir.display(), mask = %mask, "Checking directory");
        self.video_extensions
            .iter()
            .find_map(|ext| matching_files(dir, &format!("{mask}{ext}")).into_iter().next())
    }

    /// Template-independent patterns: `*1x02*`, `*S01E02*` and `*102*`.
    #[must_use]
    pub fn find_by_position(&self, dir: &Path, season: u32, episode: u32) -> Option<PathBuf> {
        positional_masks(season, episode)
            .iter()
            .find_map(|mask| self.find_by_mask(dir, mask))
    }

    /// Every video file in `dir` matching `mask`.
    #[must_use]
    pub fn all_by_mask(&self, dir: &Path, mask: &str) -> Vec<PathBuf> {
        self.video_extensions
            .iter()
            .flat_map(|ext| matching_files(dir, &format!("{mask}{ext}")))
            .collect()
    }

    /// Deletes every video file in `dir` matching `mask`, returning the
    /// removed paths.
    pub async fn delete_by_mask(&self, dir: &Path, mask: &str) -> Result<Vec<PathBuf>> {
        let files = self.all_by_mask(dir, mask);
        for file in &files {
            tokio::fs::remove_file(file)
                .await
                .with_context(|| format!("Failed to delete {}", file.display()))?;
            info!(event = "file_deleted", path = %file.display(), "Deleted for proper");
        }
        Ok(files)
    }
}

#[must_use]
pub fn positional_masks(season: u32, episode: u32) -> [String; 3] {
    [
        format!("*{season}x{episode:02}*"),
        format!("*S{season:02}E{episode:02}*"),
        format!("*{season}{episode:02}*"),
    ]
}
