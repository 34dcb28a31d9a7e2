use crate::clients::DownloadQueue;
use crate::config::SabnzbdConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum SabError {
    #[error("Invalid SABnzbd URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed queue response: {0}")]
    Parse(#[from] quick_xml::de::DeError),

    #[error("SABnzbd error: {0}")]
    Service(String),
}

/// One job in the download queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSlot {
    pub filename: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueueResponse {
    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    slots: Option<QueueSlots>,
}

#[derive(Debug, Default, Deserialize)]
struct QueueSlots {
    #[serde(default)]
    slot: Vec<RawSlot>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    #[serde(default)]
    filename: String,
}

/// Parses the `mode=queue&output=xml` document.
pub fn parse_queue(xml: &str) -> Result<Vec<QueueSlot>, SabError> {
    let response: QueueResponse = quick_xml::de::from_str(xml)?;

    if let Some(error) = response.error.filter(|e| !e.trim().is_empty()) {
        return Err(SabError::Service(error.trim().to_string()));
    }

    Ok(response
        .slots
        .unwrap_or_default()
        .slot
        .into_iter()
        .filter(|s| !s.filename.trim().is_empty())
        .map(|s| QueueSlot {
            filename: s.filename,
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct SabnzbdClient {
    client: Client,
    config: SabnzbdConfig,
}

impl SabnzbdClient {
    #[must_use]
    pub const fn new(client: Client, config: SabnzbdConfig) -> Self {
        Self { client, config }
    }

    fn api_url(&self, params: &[(&str, &str)]) -> Result<Url, SabError> {
        let mut url = Url::parse(&format!("{}/api", self.config.url.trim_end_matches('/')))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            if !self.config.api_key.is_empty() {
                query.append_pair("apikey", &self.config.api_key);
            }
        }
        Ok(url)
    }

    async fn fetch(&self, url: Url) -> Result<String, SabError> {
        Ok(self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }

    /// Sends a command, returning the response with line breaks removed.
    async fn send(&self, url: Url) -> Result<String, SabError> {
        Ok(self.fetch(url).await?.replace(['\n', '\r'], ""))
    }
}

#[async_trait::async_trait]
impl DownloadQueue for SabnzbdClient {
    async fn queue(&self) -> Result<Vec<QueueSlot>, SabError> {
        let url = self.api_url(&[("mode", "queue"), ("output", "xml")])?;
        let xml = self.fetch(url).await?;

        let slots = parse_queue(&xml)?;
        debug!(count = slots.len(), "Fetched download queue");
        Ok(slots)
    }

    async fn add_by_url(&self, link: &str, nzb_name: &str) -> Result<String, SabError> {
        let url = self.api_url(&[
            ("mode", "addurl"),
            ("name", link),
            ("cat", self.config.category.as_str()),
            ("nzbname", nzb_name),
        ])?;

        info!(event = "queue_add", name = %nzb_name, "Adding report to the queue");
        let response = self.send(url).await?;
        if response.trim() != "ok" {
            warn!(event = "queue_add_response", response = %response, "Unexpected queue response");
        }
        Ok(response)
    }

    async fn add_by_id(&self, report_id: &str) -> Result<String, SabError> {
        let url = self.api_url(&[("mode", "addid"), ("name", report_id)])?;

        info!(event = "queue_add", report_id = %report_id, "Adding report to the queue");
        self.send(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str, api_key: &str) -> SabnzbdClient {
        SabnzbdClient::new(
            Client::new(),
            SabnzbdConfig {
                url: url.to_string(),
                api_key: api_key.to_string(),
                ..SabnzbdConfig::default()
            },
        )
    }

    #[test]
    fn test_parse_queue_slots() {
        let xml = r"<?xml version='1.0' encoding='UTF-8'?>
<queue>
  <paused>False</paused>
  <slots>
    <slot><status>Downloading</status><filename>Show Name - 1x02 - Pilot</filename><mb>350</mb></slot>
    <slot><status>Queued</status><filename>fetching msgid 1234567 from www.newzbin.com</filename></slot>
  </slots>
</queue>";
        let slots = parse_queue(xml).unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].filename, "Show Name - 1x02 - Pilot");
    }

    #[test]
    fn test_parse_empty_queue() {
        let xml = "<queue><paused>False</paused><slots></slots></queue>";
        assert!(parse_queue(xml).unwrap().is_empty());

        let xml = "<queue><paused>False</paused></queue>";
        assert!(parse_queue(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_queue_error() {
        let xml = "<result><status>False</status><error>API Key Incorrect</error></result>";
        assert!(matches!(parse_queue(xml), Err(SabError::Service(e)) if e == "API Key Incorrect"));
    }

    #[test]
    fn test_api_url_escapes_parameters() {
        let url = client("http://localhost:8080/sabnzbd/", "abc")
            .api_url(&[
                ("mode", "addurl"),
                ("name", "http://nzb.example/get?id=1&key=2"),
                ("nzbname", "Show - 1x02 - A & B"),
            ])
            .unwrap();

        assert!(url.as_str().starts_with("http://localhost:8080/sabnzbd/api?mode=addurl"));
        assert!(url.as_str().contains("id%3D1%26key%3D2"));
        assert!(url.as_str().ends_with("&apikey=abc"));

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("nzbname".to_string(), "Show - 1x02 - A & B".to_string())));
    }

    #[test]
    fn test_api_url_without_key() {
        let url = client("http://localhost:8080/sabnzbd", "")
            .api_url(&[("mode", "queue"), ("output", "xml")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/sabnzbd/api?mode=queue&output=xml"
        );
    }
}
