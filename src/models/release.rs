use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Indexer a feed comes from.
///
/// Sites are a closed set; anything not in [`SITES`] is [`Site::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Newzbin,
    NzbMatrix,
    NzbsRus,
    NzbsDotOrg,
    Unknown,
}

/// Static per-site behaviour.
#[derive(Debug)]
pub struct SiteProfile {
    pub site: Site,
    /// Substring of the feed URL identifying the site.
    pub url_fragment: &'static str,
    /// Host used in the placeholder name the queue shows while fetching a report.
    pub host: &'static str,
    /// Pattern extracting the report identifier from an item link.
    pub id_pattern: &'static str,
    /// Feed is quality-filtered upstream.
    pub bypass_quality: bool,
    /// Items are submitted by report id and titled `Show - 1x02 - Name`.
    pub submit_by_id: bool,
}

const DEFAULT_ID_PATTERN: &str = r"\d{6,10}";

pub const SITES: &[SiteProfile] = &[
    SiteProfile {
        site: Site::Newzbin,
        url_fragment: "newzbin",
        host: "www.newzbin.com",
        id_pattern: DEFAULT_ID_PATTERN,
        bypass_quality: true,
        submit_by_id: true,
    },
    SiteProfile {
        site: Site::NzbMatrix,
        url_fragment: "nzbmatrix",
        host: "nzbmatrix.com",
        id_pattern: DEFAULT_ID_PATTERN,
        bypass_quality: true,
        submit_by_id: false,
    },
    SiteProfile {
        site: Site::NzbsRus,
        url_fragment: "nzbsrus",
        host: "www.nzbsrus.com",
        id_pattern: DEFAULT_ID_PATTERN,
        bypass_quality: true,
        submit_by_id: false,
    },
    SiteProfile {
        site: Site::NzbsDotOrg,
        url_fragment: "nzbs.org",
        host: "nzbs.org",
        id_pattern: DEFAULT_ID_PATTERN,
        bypass_quality: true,
        submit_by_id: false,
    },
];

const UNKNOWN_PROFILE: SiteProfile = SiteProfile {
    site: Site::Unknown,
    url_fragment: "",
    host: "unknown",
    id_pattern: DEFAULT_ID_PATTERN,
    bypass_quality: false,
    submit_by_id: false,
};

impl Site {
    /// Resolves the site from a feed URL (case-insensitive substring match).
    #[must_use]
    pub fn from_feed_url(url: &str) -> Self {
        let lower = url.to_lowercase();
        SITES
            .iter()
            .find(|p| lower.contains(p.url_fragment))
            .map_or(Self::Unknown, |p| p.site)
    }

    #[must_use]
    pub fn profile(self) -> &'static SiteProfile {
        SITES
            .iter()
            .find(|p| p.site == self)
            .unwrap_or(&UNKNOWN_PROFILE)
    }

    #[must_use]
    pub fn bypasses_quality(self) -> bool {
        self.profile().bypass_quality
    }

    #[must_use]
    pub fn submits_by_id(self) -> bool {
        self.profile().submit_by_id
    }

    /// Extracts the site's report identifier from an item link.
    #[must_use]
    pub fn extract_report_id(self, link: &str) -> Option<String> {
        self.id_regex()?
            .find(link)
            .map(|m| m.as_str().to_string())
    }

    fn id_regex(self) -> Option<&'static Regex> {
        static COMPILED: OnceLock<Vec<(Site, Regex)>> = OnceLock::new();
        COMPILED
            .get_or_init(|| {
                SITES
                    .iter()
                    .chain(std::iter::once(&UNKNOWN_PROFILE))
                    .filter_map(|p| Regex::new(p.id_pattern).ok().map(|re| (p.site, re)))
                    .collect()
            })
            .iter()
            .find(|(site, _)| *site == self)
            .map(|(_, re)| re)
    }

    /// Name the queue shows for a report that is still being fetched by id.
    #[must_use]
    pub fn fetching_placeholder(self, report_id: &str) -> String {
        format!("fetching msgid {report_id} from {}", self.profile().host)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Newzbin => "newzbin",
            Self::NzbMatrix => "nzbmatrix",
            Self::NzbsRus => "nzbsrus",
            Self::NzbsDotOrg => "nzbsDotOrg",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One feed entry. Never mutated after it is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseItem {
    pub title: String,

    pub link: String,

    pub site: Site,

    pub report_id: Option<String>,
}

impl ReleaseItem {
    #[must_use]
    pub fn new(title: impl Into<String>, link: impl Into<String>, site: Site) -> Self {
        let link = link.into();
        let report_id = site.extract_report_id(&link);
        Self {
            title: title.into(),
            link,
            site,
            report_id,
        }
    }
}
