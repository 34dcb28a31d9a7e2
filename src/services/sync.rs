use crate::clients::{DownloadQueue, FeedSource, MetadataResolver, SabError};
use crate::config::{Config, FeedConfig};
use crate::library::{DiskScanner, NamingTemplater, NzbArchive};
use crate::models::{CanonicalTitle, EpisodeIdentity, EpisodeMarker, ReleaseItem};
use crate::parser::{ShowNormalizer, TitleParser, clean_string};
use crate::services::dedupe::{DuplicateOracle, DuplicateSource};
use crate::services::filter::{Candidate, StageOutcome, WantedFilter};
use crate::services::ledger::RunSummary;
use crate::services::proper::ProperHandler;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Why an item was not submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Unresolved,
    Passworded,
    NotWatched,
    SeasonIgnored,
    QualityRejected,
    Duplicate(DuplicateSource),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => write!(f, "title not recognised"),
            Self::Passworded => write!(f, "passworded"),
            Self::NotWatched => write!(f, "show not watched"),
            Self::SeasonIgnored => write!(f, "season ignored"),
            Self::QualityRejected => write!(f, "quality not wanted"),
            Self::Duplicate(source) => write!(f, "duplicate ({source})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Submitted {
        fixed_title: String,
        response: String,
    },
    Skipped(SkipReason),
}

/// Failures that abort the rest of the current feed.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to submit {title}: {source}")]
    Submission {
        title: String,
        #[source]
        source: SabError,
    },

    #[error("Filesystem error: {0:#}")]
    Filesystem(anyhow::Error),
}

/// One pass over every configured feed.
pub struct SyncJob {
    feeds: Vec<FeedConfig>,
    source: Arc<dyn FeedSource>,
    queue: Arc<dyn DownloadQueue>,
    metadata: Arc<dyn MetadataResolver>,
    parser: TitleParser,
    filter: WantedFilter,
    oracle: DuplicateOracle,
    proper: ProperHandler,
    replace_chars: bool,
}

impl SyncJob {
    #[must_use]
    pub fn new(
        config: &Config,
        source: Arc<dyn FeedSource>,
        queue: Arc<dyn DownloadQueue>,
        metadata: Arc<dyn MetadataResolver>,
    ) -> Self {
        let replace_chars = config.sabnzbd.replace_chars;
        let templater = NamingTemplater::new(
            &config.library.tv_template,
            &config.library.tv_daily_template,
            replace_chars,
        );
        let oracle = DuplicateOracle::new(
            config.library.tv_roots.clone(),
            templater,
            DiskScanner::new(config.library.normalized_extensions()),
            Arc::clone(&queue),
            config.library.archive_dir.clone().map(NzbArchive::new),
        );

        Self {
            feeds: config.feeds.clone(),
            source,
            queue,
            metadata,
            parser: TitleParser::new(ShowNormalizer::new(&config.watch.aliases)),
            filter: WantedFilter::new(config.watch.clone(), replace_chars),
            oracle,
            proper: ProperHandler::new(config.watch.download_propers),
            replace_chars,
        }
    }

    /// Processes feeds in configuration order with a fresh session ledger.
    pub async fn run(&self) -> RunSummary {
        let start = std::time::Instant::now();
        let mut summary = RunSummary::default();
        summary.stats.total_feeds = self.feeds.len();

        for feed in &self.feeds {
            if let Err(e) = self.process_feed(feed, &mut summary).await {
                summary.stats.failed_feeds += 1;
                error!(event = "feed_failed", feed_name = %feed.name, error = %e, "Feed processing aborted");
                summary.notice(format!("Feed {} aborted: {e}", feed.name));
            }
        }

        info!(
            event = "sync_finished",
            feeds = summary.stats.total_feeds,
            items = summary.stats.items,
            submitted = summary.stats.submitted,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Sync run finished"
        );
        summary
    }

    pub async fn process_feed(
        &self,
        feed: &FeedConfig,
        summary: &mut RunSummary,
    ) -> anyhow::Result<()> {
        let items = self.source.fetch(feed).await?;
        debug!(feed_name = %feed.name, items = items.len(), "Fetched feed");

        let submitted_before = summary.stats.submitted;
        for item in &items {
            summary.stats.items += 1;
            let verdict = self.process_item(item, summary).await?;
            if let Verdict::Skipped(reason) = verdict {
                debug!(title = %item.title, reason = %reason, "Skipped");
            }
        }

        info!(
            event = "rss_feed_checked",
            feed_name = %feed.name,
            items = items.len(),
            queued = summary.stats.submitted - submitted_before,
            "Checked feed"
        );
        Ok(())
    }

    /// Parse, filter, name, dedupe, submit. Decision outcomes come back as a
    /// [`Verdict`]; only submission and delete failures are errors.
    pub async fn process_item(
        &self,
        item: &ReleaseItem,
        summary: &mut RunSummary,
    ) -> Result<Verdict, SyncError> {
        let identity = self.parser.parse(&item.title, item.site);
        let EpisodeIdentity::Resolved { show, marker } = identity else {
            summary.stats.unresolved += 1;
            info!(event = "title_unresolved", title = %item.title, "Could not parse release title");
            return Ok(Verdict::Skipped(SkipReason::Unresolved));
        };

        let candidate = Candidate {
            title: &item.title,
            site: item.site,
            show: &show,
            season: marker.season(),
        };
        if let StageOutcome::Reject(reason) = self.filter.evaluate(&candidate) {
            summary.stats.filtered += 1;
            if reason == SkipReason::QualityRejected {
                summary.notice(format!("Quality not wanted: {}", item.title));
            }
            return Ok(Verdict::Skipped(reason));
        }

        let canonical = if item.site.submits_by_id() {
            CanonicalTitle::verbatim(show, marker, item.title.clone())
        } else {
            self.resolve_title(show, marker).await
        };

        let replaced = self.proper.prepare(&self.oracle, item, &canonical).await?;
        for path in &replaced {
            summary.notice(format!("Deleted for proper: {}", path.display()));
        }

        if let Some(hit) = self.oracle.check(item, &canonical, summary).await {
            summary.stats.duplicates += 1;
            info!(
                event = "duplicate_found",
                title = %item.title,
                source = %hit.source,
                detail = %hit.detail,
                "Skipping duplicate"
            );
            summary.notice(format!("Episode {}: {}", hit.source, hit.detail));
            return Ok(Verdict::Skipped(SkipReason::Duplicate(hit.source)));
        }

        let response = self.submit(item, &canonical).await?;
        summary.ledger.record(canonical.fixed_title(), &response);
        summary.stats.submitted += 1;
        info!(
            event = "release_queued",
            title = %item.title,
            fixed_title = %canonical.fixed_title(),
            response = %response,
            "Queued for download"
        );

        Ok(Verdict::Submitted {
            fixed_title: canonical.fixed_title().to_string(),
            response,
        })
    }

    /// Looks up episode names; any lookup failure degrades to `unknown`.
    async fn resolve_title(&self, show: String, marker: EpisodeMarker) -> CanonicalTitle {
        let names = match &marker {
            EpisodeMarker::SeasonEpisode { season, episodes } => {
                let mut names = Vec::with_capacity(episodes.len());
                for episode in episodes {
                    let lookup = self.metadata.episode_name(&show, *season, *episode).await;
                    names.push(lookup.found());
                }
                names
            }
            EpisodeMarker::Dated { date } => {
                vec![self.metadata.dated_episode_name(&show, *date).await.found()]
            }
        };

        if names.iter().any(Option::is_none) {
            warn!(event = "episode_name_unknown", show = %show, marker = %marker, "Episode name not found");
        }
        CanonicalTitle::new(show, marker, names)
    }

    async fn submit(
        &self,
        item: &ReleaseItem,
        canonical: &CanonicalTitle,
    ) -> Result<String, SyncError> {
        let result = match (item.site.submits_by_id(), item.report_id.as_deref()) {
            (true, Some(id)) => self.queue.add_by_id(id).await,
            _ => {
                let nzb_name = clean_string(canonical.fixed_title(), self.replace_chars);
                self.queue.add_by_url(&item.link, &nzb_name).await
            }
        };

        result
            .map(|response| response.replace(['\n', '\r'], ""))
            .map_err(|source| SyncError::Submission {
                title: item.title.clone(),
                source,
            })
    }
}
