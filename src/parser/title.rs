use crate::models::{EpisodeIdentity, EpisodeMarker, Site};
use crate::parser::alias::ShowNormalizer;
use chrono::NaiveDate;
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

/// Titles on report-id feeds are cut to this many characters before splitting.
const MAX_SPLIT_TITLE_LEN: usize = 80;

/// Parses raw release titles into episode identities.
#[derive(Debug, Clone, Default)]
pub struct TitleParser {
    normalizer: ShowNormalizer,
}

impl TitleParser {
    #[must_use]
    pub const fn new(normalizer: ShowNormalizer) -> Self {
        Self { normalizer }
    }

    /// Parses a title using the strategy the site's feed format calls for.
    #[must_use]
    pub fn parse(&self, title: &str, site: Site) -> EpisodeIdentity {
        if site.submits_by_id() {
            self.parse_hyphenated(title)
        } else {
            self.parse_scene(title)
        }
    }

    /// Scene-style titles (`Show.Name.S01E02.720p-GROUP`). Markers are tried
    /// in order so the multi-episode form is never read as a single episode.
    #[must_use]
    pub fn parse_scene(&self, title: &str) -> EpisodeIdentity {
        let parsed = parse_multi(title)
            .or_else(|| parse_single(title))
            .or_else(|| parse_cross(title))
            .or_else(|| parse_daily(title));

        let Some((prefix, marker)) = parsed else {
            debug!(title = %title, "No episode marker found");
            return EpisodeIdentity::Unresolved;
        };

        self.identity(&prefix.replace('.', " "), marker)
    }

    /// `Show Name - 1x02 - Episode Name` titles from report-id feeds.
    #[must_use]
    pub fn parse_hyphenated(&self, title: &str) -> EpisodeIdentity {
        let title = if title.chars().count() > MAX_SPLIT_TITLE_LEN {
            title.chars().take(MAX_SPLIT_TITLE_LEN - 1).collect::<String>()
        } else {
            title.to_string()
        };

        let fields: Vec<&str> = title.split('-').map(str::trim).collect();

        let (show, token) = match fields.as_slice() {
            [show, token, _] => ((*show).to_string(), *token),
            [first, second, third, _] => {
                if parse_marker_token(second).is_some() {
                    ((*first).to_string(), *second)
                } else if parse_marker_token(third).is_some() {
                    (format!("{first}-{second}"), *third)
                } else {
                    debug!(title = %title, "No season/episode field in title");
                    return EpisodeIdentity::Unresolved;
                }
            }
            _ => {
                debug!(
                    title = %title,
                    fields = fields.len(),
                    "Unsupported number of title fields"
                );
                return EpisodeIdentity::Unresolved;
            }
        };

        match parse_marker_token(token) {
            Some((season, episode)) => self.identity(&show, EpisodeMarker::single(season, episode)),
            None => EpisodeIdentity::Unresolved,
        }
    }

    fn identity(&self, raw_show: &str, marker: EpisodeMarker) -> EpisodeIdentity {
        let show = raw_show.trim();
        if show.is_empty() {
            return EpisodeIdentity::Unresolved;
        }
        EpisodeIdentity::new(self.normalizer.normalize(show), marker)
    }
}

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn prefix<'t>(title: &'t str, caps: &Captures<'t>) -> Option<&'t str> {
    caps.get(0).map(|m| &title[..m.start()])
}

fn parse_multi(title: &str) -> Option<(&str, EpisodeMarker)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"[Ss](?P<season>\d{1,2})[Ee](?P<first>\d{1,2})[Ee](?P<second>\d{1,2})",
    );

    let caps = re.captures(title)?;
    let marker = EpisodeMarker::double(
        number(&caps, "season")?,
        number(&caps, "first")?,
        number(&caps, "second")?,
    );
    Some((prefix(title, &caps)?, marker))
}

fn parse_single(title: &str) -> Option<(&str, EpisodeMarker)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"[Ss](?P<season>\d{1,2})[Ee](?P<episode>\d{1,2})");

    let caps = re.captures(title)?;
    let marker = EpisodeMarker::single(number(&caps, "season")?, number(&caps, "episode")?);
    Some((prefix(title, &caps)?, marker))
}

fn parse_cross(title: &str) -> Option<(&str, EpisodeMarker)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"(?P<season>\d{1,2})[Xx](?P<episode>\d{1,2})");

    let caps = re.captures(title)?;
    let marker = EpisodeMarker::single(number(&caps, "season")?, number(&caps, "episode")?);
    Some((prefix(title, &caps)?, marker))
}

fn parse_daily(title: &str) -> Option<(&str, EpisodeMarker)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"(?P<year>\d{4}).(?P<month>\d{2}).(?P<day>\d{2})");

    // Digit runs that are not a calendar date are skipped in favour of a later match.
    re.captures_iter(title).find_map(|caps| {
        let year = i32::try_from(number(&caps, "year")?).ok()?;
        let date = NaiveDate::from_ymd_opt(year, number(&caps, "month")?, number(&caps, "day")?)?;
        Some((prefix(title, &caps)?, EpisodeMarker::Dated { date }))
    })
}

/// Parses a lone `1x02` or `S01E02` field.
fn parse_marker_token(token: &str) -> Option<(u32, u32)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(
        &RE,
        r"^(?:[Ss](?P<s>\d{1,2})[Ee](?P<e>\d{1,2})|(?P<xs>\d{1,2})[Xx](?P<xe>\d{1,2}))$",
    );

    let caps = re.captures(token.trim())?;
    if caps.name("s").is_some() {
        Some((number(&caps, "s")?, number(&caps, "e")?))
    } else {
        Some((number(&caps, "xs")?, number(&caps, "xe")?))
    }
}
