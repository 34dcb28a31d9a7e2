use crate::models::{CanonicalTitle, ReleaseItem};
use crate::services::dedupe::DuplicateOracle;
use crate::services::sync::SyncError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Literal tag identifying a re-release.
pub const PROPER_MARKER: &str = "PROPER";

/// Clears a stale on-disk copy so that a re-release is not vetoed by the
/// disk check.
#[derive(Debug, Clone, Copy)]
pub struct ProperHandler {
    enabled: bool,
}

impl ProperHandler {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Case-sensitive: only the upper-case scene tag counts.
    #[must_use]
    pub fn is_proper(&self, title: &str) -> bool {
        self.enabled && title.contains(PROPER_MARKER)
    }

    /// Deletes the existing episode files when the proper is not already
    /// queued or archived. Returns the deleted paths.
    pub async fn prepare(
        &self,
        oracle: &DuplicateOracle,
        item: &ReleaseItem,
        canonical: &CanonicalTitle,
    ) -> Result<Vec<PathBuf>, SyncError> {
        if !self.is_proper(&item.title) {
            return Ok(Vec::new());
        }

        if matches!(oracle.in_queue(item, canonical).await, Ok(Some(_)))
            || oracle.in_archive(item, canonical).is_some()
        {
            debug!(title = %item.title, "Proper already queued or archived");
            return Ok(Vec::new());
        }

        let deleted = oracle
            .delete_on_disk(canonical)
            .await
            .map_err(SyncError::Filesystem)?;

        if !deleted.is_empty() {
            info!(
                event = "proper_replacing",
                title = %item.title,
                files = deleted.len(),
                "Deleted existing episode for proper"
            );
        }
        Ok(deleted)
    }
}
