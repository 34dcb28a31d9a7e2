use crate::clients::FeedSource;
use crate::config::FeedConfig;
use crate::models::{ReleaseItem, Site};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Malformed feed: {0}")]
    Parse(#[from] quick_xml::de::DeError),
}

#[derive(Debug, Default, Deserialize)]
struct Rss {
    #[serde(default)]
    channel: Channel,
}

#[derive(Debug, Default, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(default)]
    title: String,

    #[serde(default)]
    link: String,
}

/// Parses an RSS 2.0 document into release items, in feed order.
///
/// Titles are entity-decoded once more after XML unescaping since several
/// indexers double-escape them.
pub fn parse_feed(xml: &str, site: Site) -> Result<Vec<ReleaseItem>, FeedError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .map(|item| {
            let title = html_escape::decode_html_entities(item.title.trim()).to_string();
            ReleaseItem::new(title, item.link.trim(), site)
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct RssFeedClient {
    client: Client,
}

impl RssFeedClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FeedSource for RssFeedClient {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<ReleaseItem>, FeedError> {
        let xml = self
            .client
            .get(&feed.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let site = Site::from_feed_url(&feed.url);
        let items = parse_feed(&xml, site)?;
        debug!(feed = %feed.name, site = %site, count = items.len(), "Fetched feed");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_items_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0">
  <channel>
    <title>TV</title>
    <link>https://nzbmatrix.com</link>
    <item>
      <title>Show.Name.S01E02.720p.HDTV-GRP</title>
      <link>https://nzbmatrix.com/api-nzb-download.php?id=626526&amp;key=x</link>
      <category>TV: HD</category>
    </item>
    <item>
      <title>Other.Show.S03E04.HDTV.XviD-GRP</title>
      <link>https://nzbmatrix.com/api-nzb-download.php?id=626527&amp;key=x</link>
    </item>
  </channel>
</rss>"#;

        let items = parse_feed(xml, Site::NzbMatrix).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Show.Name.S01E02.720p.HDTV-GRP");
        assert_eq!(
            items[0].link,
            "https://nzbmatrix.com/api-nzb-download.php?id=626526&key=x"
        );
        assert_eq!(items[0].report_id.as_deref(), Some("626526"));
        assert_eq!(items[1].title, "Other.Show.S03E04.HDTV.XviD-GRP");
    }

    #[test]
    fn test_double_escaped_titles() {
        let xml = "<rss><channel><item><title>Law &amp;amp; Order - 1x02 - Pilot</title>\
                   <link>http://v3.newzbin.com/browse/post/4567890/</link></item></channel></rss>";
        let items = parse_feed(xml, Site::Newzbin).unwrap();
        assert_eq!(items[0].title, "Law & Order - 1x02 - Pilot");
        assert_eq!(items[0].report_id.as_deref(), Some("4567890"));
    }

    #[test]
    fn test_empty_channel() {
        let xml = "<rss><channel><title>Empty</title></channel></rss>";
        assert!(parse_feed(xml, Site::Unknown).unwrap().is_empty());
    }
}
