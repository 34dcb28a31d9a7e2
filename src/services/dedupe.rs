use crate::clients::{DownloadQueue, SabError};
use crate::library::{DiskScanner, NamingTemplater, NzbArchive};
use crate::models::{CanonicalTitle, EpisodeMarker, ReleaseItem};
use crate::parser::canonical_key;
use crate::services::ledger::RunSummary;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which source of truth already knows about an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateSource {
    Disk,
    Queue,
    Archive,
    Session,
}

impl fmt::Display for DuplicateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disk => "on disk",
            Self::Queue => "in queue",
            Self::Archive => "in archive",
            Self::Session => "already queued this run",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHit {
    pub source: DuplicateSource,
    /// The matching file, queue entry or ledger line.
    pub detail: String,
}

/// Checks disk, download queue, archive and session ledger for an episode,
/// in that order, stopping at the first hit.
pub struct DuplicateOracle {
    roots: Vec<PathBuf>,
    templater: NamingTemplater,
    scanner: DiskScanner,
    queue: Arc<dyn DownloadQueue>,
    archive: Option<NzbArchive>,
}

impl DuplicateOracle {
    #[must_use]
    pub fn new(
        roots: Vec<PathBuf>,
        templater: NamingTemplater,
        scanner: DiskScanner,
        queue: Arc<dyn DownloadQueue>,
        archive: Option<NzbArchive>,
    ) -> Self {
        Self {
            roots,
            templater,
            scanner,
            queue,
            archive,
        }
    }

    /// A queue that cannot be read is noted in `summary` and counts as
    /// not containing the item.
    pub async fn check(
        &self,
        item: &ReleaseItem,
        canonical: &CanonicalTitle,
        summary: &mut RunSummary,
    ) -> Option<DuplicateHit> {
        if let Some(path) = self.on_disk(canonical) {
            return Some(DuplicateHit {
                source: DuplicateSource::Disk,
                detail: path.display().to_string(),
            });
        }

        match self.in_queue(item, canonical).await {
            Ok(Some(filename)) => {
                return Some(DuplicateHit {
                    source: DuplicateSource::Queue,
                    detail: filename,
                });
            }
            Ok(None) => {}
            Err(e) => summary.notice(format!("Download queue unavailable: {e}")),
        }

        if let Some(record) = self.in_archive(item, canonical) {
            return Some(DuplicateHit {
                source: DuplicateSource::Archive,
                detail: record,
            });
        }

        if summary.ledger.has_submitted(canonical.fixed_title()) {
            return Some(DuplicateHit {
                source: DuplicateSource::Session,
                detail: canonical.fixed_title().to_string(),
            });
        }

        None
    }

    /// Template mask first, then the positional patterns, in every root.
    #[must_use]
    pub fn on_disk(&self, canonical: &CanonicalTitle) -> Option<PathBuf> {
        let marker = canonical.marker();

        for root in &self.roots {
            let paths = self
                .templater
                .episode_paths(root, canonical.show(), marker);

            if let Some(found) = self.scanner.find_by_mask(&paths.dir, &paths.mask) {
                info!(event = "episode_on_disk", path = %found.display(), "Episode on disk");
                return Some(found);
            }

            if let EpisodeMarker::SeasonEpisode { season, .. } = marker
                && let Some(episode) = marker.first_episode()
                && let Some(found) = self.scanner.find_by_position(&paths.dir, *season, episode)
            {
                info!(event = "episode_on_disk", path = %found.display(), "Episode on disk");
                return Some(found);
            }
        }

        None
    }

    /// Matching queue entry, if any. Callers decide how to treat a queue
    /// that cannot be read.
    pub async fn in_queue(
        &self,
        item: &ReleaseItem,
        canonical: &CanonicalTitle,
    ) -> Result<Option<String>, SabError> {
        let slots = self.queue.queue().await.inspect_err(|e| {
            warn!(event = "queue_unavailable", error = %e, "Could not read download queue");
        })?;

        let mut keys = vec![canonical_key(&item.title), canonical_key(canonical.fixed_title())];
        if item.site.submits_by_id()
            && let Some(ref id) = item.report_id
        {
            keys.push(canonical_key(&item.site.fetching_placeholder(id)));
        }
        keys.retain(|k| !k.is_empty());

        let hit = slots.into_iter().find(|slot| {
            let key = canonical_key(&slot.filename);
            keys.contains(&key)
                || item
                    .report_id
                    .as_deref()
                    .is_some_and(|id| !id.is_empty() && slot.filename.contains(id))
        });

        if let Some(ref slot) = hit {
            info!(event = "episode_in_queue", title = %item.title, filename = %slot.filename, "Episode in queue");
        }
        Ok(hit.map(|slot| slot.filename))
    }

    #[must_use]
    pub fn in_archive(&self, item: &ReleaseItem, canonical: &CanonicalTitle) -> Option<String> {
        let Some(archive) = &self.archive else {
            debug!("No archive directory configured");
            return None;
        };

        let hit = archive.find(&[&item.title, canonical.fixed_title()]);
        if let Some(ref record) = hit {
            info!(event = "episode_in_archive", title = %item.title, record = %record, "Episode in archive");
        }
        hit
    }

    /// Removes every file matching the episode's template mask in all roots.
    pub async fn delete_on_disk(&self, canonical: &CanonicalTitle) -> anyhow::Result<Vec<PathBuf>> {
        let mut deleted = Vec::new();
        for root in &self.roots {
            let paths = self
                .templater
                .episode_paths(root, canonical.show(), canonical.marker());
            deleted.extend(self.scanner.delete_by_mask(&paths.dir, &paths.mask).await?);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::QueueSlot;
    use crate::config::LibraryConfig;
    use crate::models::Site;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeQueue {
        slots: Vec<String>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeQueue {
        fn with(slots: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                slots: slots.iter().map(ToString::to_string).collect(),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl DownloadQueue for FakeQueue {
        async fn queue(&self) -> Result<Vec<QueueSlot>, SabError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SabError::Service("API Key Incorrect".to_string()));
            }
            Ok(self
                .slots
                .iter()
                .map(|f| QueueSlot {
                    filename: f.clone(),
                })
                .collect())
        }

        async fn add_by_url(&self, _link: &str, _nzb_name: &str) -> Result<String, SabError> {
            Ok("ok".to_string())
        }

        async fn add_by_id(&self, _report_id: &str) -> Result<String, SabError> {
            Ok("ok".to_string())
        }
    }

    fn temp_root() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sabwatch-oracle-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn oracle(root: &std::path::Path, queue: Arc<FakeQueue>, archive: Option<NzbArchive>) -> DuplicateOracle {
        DuplicateOracle::new(
            vec![root.to_path_buf()],
            NamingTemplater::new("%sn/Season %s/%sn - %0sx%0e - %en.%ext", "%t/%t - %y-%0m-%0d.%ext", false),
            DiskScanner::new(vec![".mkv".to_string()]),
            queue,
            archive,
        )
    }

    fn canonical() -> CanonicalTitle {
        CanonicalTitle::new(
            "Show Name",
            EpisodeMarker::single(1, 2),
            vec![Some("Pilot".to_string())],
        )
    }

    fn item() -> ReleaseItem {
        ReleaseItem::new(
            "Show.Name.S01E02.720p-GROUP",
            "https://example.org/get/1",
            Site::Unknown,
        )
    }

    #[tokio::test]
    async fn test_disk_hit_short_circuits() {
        let root = temp_root();
        let season_dir = root.join("Show Name").join("Season 1");
        std::fs::create_dir_all(&season_dir).unwrap();
        std::fs::write(season_dir.join("Show Name - 01x02 - Pilot.mkv"), b"").unwrap();

        let queue = FakeQueue::with(&["Show Name - 1x02 - Pilot"]);
        let oracle = oracle(&root, queue.clone(), None);

        let hit = oracle.check(&item(), &canonical(), &mut RunSummary::default()).await;
        assert_eq!(hit.map(|h| h.source), Some(DuplicateSource::Disk));
        assert_eq!(queue.calls.load(Ordering::SeqCst), 0);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_positional_pattern_finds_unconventional_names() {
        let root = temp_root();
        let season_dir = root.join("Show Name").join("Season 1");
        std::fs::create_dir_all(&season_dir).unwrap();
        std::fs::write(season_dir.join("show.name.s01e02.hdtv.mkv"), b"").unwrap();

        let oracle = oracle(&root, FakeQueue::with(&[]), None);
        assert!(oracle.on_disk(&canonical()).is_some());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_queue_matches_fixed_or_raw_title() {
        let root = temp_root();
        let mut summary = RunSummary::default();

        let oracle1 = oracle(&root, FakeQueue::with(&["show name - 1x02 - pilot"]), None);
        let hit = oracle1.check(&item(), &canonical(), &mut summary).await.unwrap();
        assert_eq!(hit.source, DuplicateSource::Queue);

        let oracle2 = oracle(&root, FakeQueue::with(&["Show_Name_S01E02_720p_GROUP"]), None);
        assert!(oracle2.in_queue(&item(), &canonical()).await.unwrap().is_some());

        let oracle3 = oracle(&root, FakeQueue::with(&["Another Show - 1x02 - Pilot"]), None);
        assert!(oracle3.check(&item(), &canonical(), &mut summary).await.is_none());
        assert!(summary.notices.is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_queue_matches_report_id_and_placeholder() {
        let root = temp_root();
        let item = ReleaseItem::new(
            "Show Name - 1x02 - Pilot",
            "http://v3.newzbin.com/browse/post/4567890/",
            Site::Newzbin,
        );
        let canonical = CanonicalTitle::verbatim("Show Name", EpisodeMarker::single(1, 2), &item.title);

        let oracle1 = oracle(&root, FakeQueue::with(&["fetching msgid 4567890 from www.newzbin.com"]), None);
        assert!(oracle1.in_queue(&item, &canonical).await.unwrap().is_some());

        let oracle2 = oracle(&root, FakeQueue::with(&["msgid_4567890_something"]), None);
        assert!(oracle2.in_queue(&item, &canonical).await.unwrap().is_some());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_queue_error_fails_open() {
        let root = temp_root();
        let queue = Arc::new(FakeQueue {
            slots: vec!["Show Name - 1x02 - Pilot".to_string()],
            fail: true,
            calls: AtomicUsize::new(0),
        });
        let oracle = oracle(&root, queue.clone(), None);

        let mut summary = RunSummary::default();
        assert!(oracle.check(&item(), &canonical(), &mut summary).await.is_none());
        assert_eq!(queue.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            summary.notices,
            vec!["Download queue unavailable: SABnzbd error: API Key Incorrect".to_string()]
        );

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_archive_and_session_hits() {
        let root = temp_root();
        let archive_dir = root.join("archive");
        std::fs::create_dir_all(&archive_dir).unwrap();
        std::fs::write(archive_dir.join("Show.Name.S01E02.720p-GROUP.nzb.gz"), b"").unwrap();

        let with_archive = oracle(&root, FakeQueue::with(&[]), Some(NzbArchive::new(&archive_dir)));
        let hit = with_archive
            .check(&item(), &canonical(), &mut RunSummary::default())
            .await
            .unwrap();
        assert_eq!(hit.source, DuplicateSource::Archive);

        let without_archive = oracle(&root, FakeQueue::with(&[]), None);
        let mut summary = RunSummary::default();
        assert!(without_archive.check(&item(), &canonical(), &mut summary).await.is_none());

        summary.ledger.record("Show Name - 1x02 - Pilot", "ok");
        let hit = without_archive.check(&item(), &canonical(), &mut summary).await.unwrap();
        assert_eq!(hit.source, DuplicateSource::Session);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_daily_template_finds_existing_episode() {
        let root = temp_root();
        let show_dir = root.join("The Daily Show");
        std::fs::create_dir_all(&show_dir).unwrap();
        std::fs::write(show_dir.join("The Daily Show - 2010-01-25 - Guest Night.avi"), b"").unwrap();

        let library = LibraryConfig::default();
        let oracle = DuplicateOracle::new(
            vec![root.clone()],
            NamingTemplater::new(&library.tv_template, &library.tv_daily_template, false),
            DiskScanner::new(library.normalized_extensions()),
            FakeQueue::with(&[]),
            None,
        );

        let aired = |day| EpisodeMarker::Dated {
            date: NaiveDate::from_ymd_opt(2010, 1, day).unwrap(),
        };
        let found = CanonicalTitle::new("The Daily Show", aired(25), vec![None]);
        assert_eq!(
            oracle.on_disk(&found),
            Some(show_dir.join("The Daily Show - 2010-01-25 - Guest Night.avi"))
        );

        let other_day = CanonicalTitle::new("The Daily Show", aired(26), vec![None]);
        assert!(oracle.on_disk(&other_day).is_none());

        std::fs::remove_dir_all(&root).unwrap();
    }
}
