use crate::config::WatchConfig;
use crate::models::Site;
use crate::parser::clean_string;
use crate::services::sync::SkipReason;
use tracing::{debug, info};

/// What the filter sees of an item: the raw title plus its parsed identity.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub title: &'a str,
    pub site: Site,
    pub show: &'a str,
    /// `None` for dated episodes.
    pub season: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Reject(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Password,
    WatchList,
    SeasonIgnore,
    Quality,
}

/// Decides whether a parsed release is wanted at all.
#[derive(Debug, Clone)]
pub struct WantedFilter {
    watch: WatchConfig,
    replace_chars: bool,
}

impl WantedFilter {
    /// Evaluation order; the first rejection wins.
    pub const STAGES: [FilterStage; 4] = [
        FilterStage::Password,
        FilterStage::WatchList,
        FilterStage::SeasonIgnore,
        FilterStage::Quality,
    ];

    #[must_use]
    pub const fn new(watch: WatchConfig, replace_chars: bool) -> Self {
        Self {
            watch,
            replace_chars,
        }
    }

    #[must_use]
    pub fn evaluate(&self, candidate: &Candidate<'_>) -> StageOutcome {
        Self::STAGES
            .iter()
            .map(|stage| self.run_stage(*stage, candidate))
            .find(|outcome| matches!(outcome, StageOutcome::Reject(_)))
            .unwrap_or(StageOutcome::Continue)
    }

    #[must_use]
    pub fn run_stage(&self, stage: FilterStage, candidate: &Candidate<'_>) -> StageOutcome {
        let passed = match stage {
            FilterStage::Password => !self.is_passworded(candidate.title),
            FilterStage::WatchList => self.is_watched(candidate.show),
            FilterStage::SeasonIgnore => candidate
                .season
                .is_none_or(|season| !self.is_season_ignored(candidate.show, season)),
            FilterStage::Quality => {
                candidate.site.bypasses_quality()
                    || self.is_quality_wanted(candidate.show, candidate.title)
            }
        };

        if passed {
            return StageOutcome::Continue;
        }

        let reason = match stage {
            FilterStage::Password => SkipReason::Passworded,
            FilterStage::WatchList => SkipReason::NotWatched,
            FilterStage::SeasonIgnore => SkipReason::SeasonIgnored,
            FilterStage::Quality => SkipReason::QualityRejected,
        };
        debug!(title = %candidate.title, stage = ?stage, "Rejected by filter");
        StageOutcome::Reject(reason)
    }

    #[must_use]
    pub fn is_passworded(&self, title: &str) -> bool {
        let marker = self.watch.passworded_marker.trim().to_lowercase();
        !marker.is_empty() && title.trim_end().to_lowercase().ends_with(&marker)
    }

    #[must_use]
    pub fn is_watched(&self, show: &str) -> bool {
        let cleaned = clean_string(show, self.replace_chars).to_lowercase();
        let watched = self
            .watch
            .shows
            .iter()
            .any(|s| s.trim().to_lowercase() == cleaned);

        if watched {
            debug!(show = %show, "Show is being watched");
        } else {
            debug!(show = %show, "Show is not being watched");
        }
        watched
    }

    /// Seasons at or below the configured threshold are skipped.
    #[must_use]
    pub fn is_season_ignored(&self, show: &str, season: u32) -> bool {
        let ignored = self
            .watch
            .ignore_seasons
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(show))
            .is_some_and(|(_, threshold)| season <= *threshold);

        if ignored {
            info!(event = "season_ignored", show = %show, season, "Ignoring season");
        }
        ignored
    }

    /// A per-show keyword list replaces the defaults entirely.
    #[must_use]
    pub fn is_quality_wanted(&self, show: &str, title: &str) -> bool {
        let title = title.to_lowercase();
        let contains_any =
            |keywords: &[String]| keywords.iter().any(|q| title.contains(&q.to_lowercase()));

        if let Some((_, keywords)) = self
            .watch
            .show_qualities
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(show))
        {
            return contains_any(keywords);
        }

        contains_any(&self.watch.download_quality)
    }
}
