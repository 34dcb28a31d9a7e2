use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Placeholder used when the episode name could not be resolved.
pub const UNKNOWN_EPISODE_NAME: &str = "unknown";

/// Position of an episode within its show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpisodeMarker {
    /// One episode, or a contiguous pair for multi-episode releases.
    SeasonEpisode { season: u32, episodes: Vec<u32> },

    /// Daily/talk-show style release identified by air date.
    Dated { date: NaiveDate },
}

impl EpisodeMarker {
    #[must_use]
    pub fn single(season: u32, episode: u32) -> Self {
        Self::SeasonEpisode {
            season,
            episodes: vec![episode],
        }
    }

    #[must_use]
    pub fn double(season: u32, first: u32, second: u32) -> Self {
        Self::SeasonEpisode {
            season,
            episodes: vec![first, second],
        }
    }

    #[must_use]
    pub const fn season(&self) -> Option<u32> {
        match self {
            Self::SeasonEpisode { season, .. } => Some(*season),
            Self::Dated { .. } => None,
        }
    }

    /// First episode number; on-disk lookups for multi-episode releases use it.
    #[must_use]
    pub fn first_episode(&self) -> Option<u32> {
        match self {
            Self::SeasonEpisode { episodes, .. } => episodes.first().copied(),
            Self::Dated { .. } => None,
        }
    }
}

impl fmt::Display for EpisodeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeasonEpisode { season, episodes } => {
                let parts: Vec<String> = episodes
                    .iter()
                    .map(|e| format!("{season}x{e:02}"))
                    .collect();
                write!(f, "{}", parts.join("-"))
            }
            Self::Dated { date } => write!(
                f,
                "{:04}-{:02}-{:02}",
                date.year(),
                date.month(),
                date.day()
            ),
        }
    }
}

/// Result of parsing a release title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EpisodeIdentity {
    Resolved { show: String, marker: EpisodeMarker },
    Unresolved,
}

impl EpisodeIdentity {
    #[must_use]
    pub fn new(show: impl Into<String>, marker: EpisodeMarker) -> Self {
        Self::Resolved {
            show: show.into(),
            marker,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    #[must_use]
    pub fn show(&self) -> Option<&str> {
        match self {
            Self::Resolved { show, .. } => Some(show),
            Self::Unresolved => None,
        }
    }

    #[must_use]
    pub const fn marker(&self) -> Option<&EpisodeMarker> {
        match self {
            Self::Resolved { marker, .. } => Some(marker),
            Self::Unresolved => None,
        }
    }
}

/// Outcome of a best-effort external lookup.
///
/// Every variant lets processing continue; only `Found` carries enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    ServiceUnavailable,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::ServiceUnavailable => None,
        }
    }
}

/// Canonical identity of an accepted episode, used as the matching key for
/// queue, archive and session checks and as the submission name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalTitle {
    show: String,
    marker: EpisodeMarker,
    episode_names: Vec<Option<String>>,
    fixed_title: String,
}

impl CanonicalTitle {
    /// Builds the fixed title `"<show> - <marker> - <names>"`.
    ///
    /// `episode_names` holds one entry per episode in the marker (one for
    /// dated episodes); missing names render as `unknown`.
    #[must_use]
    pub fn new(
        show: impl Into<String>,
        marker: EpisodeMarker,
        episode_names: Vec<Option<String>>,
    ) -> Self {
        let show = show.into();
        let names = episode_names
            .iter()
            .map(|n| n.as_deref().unwrap_or(UNKNOWN_EPISODE_NAME))
            .collect::<Vec<_>>()
            .join(" & ");
        let names = if names.is_empty() {
            UNKNOWN_EPISODE_NAME.to_string()
        } else {
            names
        };
        let fixed_title = format!("{show} - {marker} - {names}");

        Self {
            show,
            marker,
            episode_names,
            fixed_title,
        }
    }

    /// Canonical title for feeds whose release titles are already in
    /// `Show - 1x02 - Name` form.
    #[must_use]
    pub fn verbatim(
        show: impl Into<String>,
        marker: EpisodeMarker,
        title: impl Into<String>,
    ) -> Self {
        Self {
            show: show.into(),
            marker,
            episode_names: Vec::new(),
            fixed_title: title.into(),
        }
    }

    #[must_use]
    pub fn show(&self) -> &str {
        &self.show
    }

    #[must_use]
    pub const fn marker(&self) -> &EpisodeMarker {
        &self.marker
    }

    #[must_use]
    pub fn episode_names(&self) -> &[Option<String>] {
        &self.episode_names
    }

    #[must_use]
    pub fn fixed_title(&self) -> &str {
        &self.fixed_title
    }
}

impl fmt::Display for CanonicalTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fixed_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_title_single() {
        let title = CanonicalTitle::new(
            "Show Name",
            EpisodeMarker::single(1, 2),
            vec![Some("Pilot".to_string())],
        );
        assert_eq!(title.fixed_title(), "Show Name - 1x02 - Pilot");
    }

    #[test]
    fn test_fixed_title_multi_with_missing_name() {
        let title = CanonicalTitle::new(
            "Show Name",
            EpisodeMarker::double(3, 9, 10),
            vec![Some("Part One".to_string()), None],
        );
        assert_eq!(
            title.fixed_title(),
            "Show Name - 3x09-3x10 - Part One & unknown"
        );
    }

    #[test]
    fn test_fixed_title_dated() {
        let date = NaiveDate::from_ymd_opt(2010, 1, 25).unwrap();
        let title = CanonicalTitle::new("The Daily Show", EpisodeMarker::Dated { date }, vec![None]);
        assert_eq!(title.fixed_title(), "The Daily Show - 2010-01-25 - unknown");
    }

    #[test]
    fn test_lookup_found() {
        assert_eq!(Lookup::Found(3).found(), Some(3));
        assert_eq!(Lookup::<i32>::ServiceUnavailable.found(), None);
    }
}
