use crate::clients::MetadataResolver;
use crate::config::TvDbConfig;
use crate::models::Lookup;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum TvDbError {
    #[error("Invalid TheTVDB URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Parse(#[from] quick_xml::de::DeError),
}

#[derive(Debug, Default, Deserialize)]
struct SeriesData {
    #[serde(rename = "Series", default)]
    series: Vec<SeriesEntry>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    #[serde(default)]
    seriesid: String,

    #[serde(rename = "SeriesName", default)]
    series_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EpisodeData {
    #[serde(rename = "Episode", default)]
    episodes: Vec<EpisodeEntry>,
}

#[derive(Debug, Deserialize)]
struct EpisodeEntry {
    #[serde(rename = "EpisodeName", default)]
    name: String,

    #[serde(rename = "FirstAired", default)]
    first_aired: String,
}

/// Picks the series whose name matches exactly (ignoring case), falling
/// back to the first search result.
pub fn select_series_id(xml: &str, show_name: &str) -> Result<Option<String>, TvDbError> {
    let data: SeriesData = quick_xml::de::from_str(xml)?;
    let wanted = show_name.to_lowercase();

    let id = data
        .series
        .iter()
        .find(|s| s.series_name.to_lowercase() == wanted)
        .or_else(|| data.series.first())
        .map(|s| s.seriesid.trim().to_lowercase())
        .filter(|id| !id.is_empty());

    Ok(id)
}

pub fn parse_episode_name(xml: &str) -> Result<Option<String>, TvDbError> {
    let data: EpisodeData = quick_xml::de::from_str(xml)?;
    Ok(data
        .episodes
        .into_iter()
        .next()
        .map(|e| e.name.trim().to_string())
        .filter(|n| !n.is_empty()))
}

/// Scans a full series record for the episode that first aired on `date`.
pub fn find_episode_by_air_date(xml: &str, date: NaiveDate) -> Result<Option<String>, TvDbError> {
    let data: EpisodeData = quick_xml::de::from_str(xml)?;
    let aired = date.format("%Y-%m-%d").to_string();

    Ok(data
        .episodes
        .into_iter()
        .find(|e| e.first_aired.trim() == aired)
        .map(|e| e.name.trim().to_string())
        .filter(|n| !n.is_empty()))
}

#[derive(Debug, Clone)]
pub struct TvDbClient {
    client: Client,
    config: TvDbConfig,
}

impl TvDbClient {
    #[must_use]
    pub const fn new(client: Client, config: TvDbConfig) -> Self {
        Self { client, config }
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn series_url(&self, series_id: &str, rest: &str) -> Result<Url, TvDbError> {
        Ok(Url::parse(&format!(
            "{}/{}/series/{}/{rest}",
            self.base(),
            urlencoding::encode(&self.config.api_key),
            urlencoding::encode(series_id),
        ))?)
    }

    async fn get(&self, url: Url) -> Result<String, TvDbError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    pub async fn series_id(&self, show_name: &str) -> Result<Option<String>, TvDbError> {
        let mut url = Url::parse(&format!("{}/GetSeries.php", self.base()))?;
        url.query_pairs_mut().append_pair("seriesname", show_name);

        let xml = self.get(url).await?;
        select_series_id(&xml, show_name)
    }

    pub async fn fetch_episode_name(
        &self,
        series_id: &str,
        season: u32,
        episode: u32,
    ) -> Result<Option<String>, TvDbError> {
        let url = self.series_url(series_id, &format!("default/{season}/{episode}"))?;
        let xml = self.get(url).await?;
        parse_episode_name(&xml)
    }

    pub async fn fetch_dated_episode_name(
        &self,
        series_id: &str,
        date: NaiveDate,
    ) -> Result<Option<String>, TvDbError> {
        let url = self.series_url(series_id, "all/")?;
        let xml = self.get(url).await?;
        find_episode_by_air_date(&xml, date)
    }

    async fn lookup_series(&self, show_name: &str) -> Lookup<String> {
        if !self.config.enabled {
            return Lookup::NotFound;
        }

        match self.series_id(show_name).await {
            Ok(Some(id)) => Lookup::Found(id),
            Ok(None) => {
                debug!(show = %show_name, "No series found");
                Lookup::NotFound
            }
            Err(e) => {
                warn!(show = %show_name, error = %e, "Series lookup failed");
                Lookup::ServiceUnavailable
            }
        }
    }
}

fn into_lookup(result: Result<Option<String>, TvDbError>, show_name: &str) -> Lookup<String> {
    match result {
        Ok(Some(name)) => {
            debug!(show = %show_name, episode_name = %name, "Resolved episode name");
            Lookup::Found(name)
        }
        Ok(None) => Lookup::NotFound,
        Err(e) => {
            warn!(show = %show_name, error = %e, "Episode lookup failed");
            Lookup::ServiceUnavailable
        }
    }
}

#[async_trait::async_trait]
impl MetadataResolver for TvDbClient {
    async fn episode_name(&self, show_name: &str, season: u32, episode: u32) -> Lookup<String> {
        let series_id = match self.lookup_series(show_name).await {
            Lookup::Found(id) => id,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::ServiceUnavailable => return Lookup::ServiceUnavailable,
        };

        into_lookup(
            self.fetch_episode_name(&series_id, season, episode).await,
            show_name,
        )
    }

    async fn dated_episode_name(&self, show_name: &str, date: NaiveDate) -> Lookup<String> {
        let series_id = match self.lookup_series(show_name).await {
            Lookup::Found(id) => id,
            Lookup::NotFound => return Lookup::NotFound,
            Lookup::ServiceUnavailable => return Lookup::ServiceUnavailable,
        };

        into_lookup(
            self.fetch_dated_episode_name(&series_id, date).await,
            show_name,
        )
    }
}
