pub mod feed;
pub mod sabnzbd;
pub mod tvdb;

use crate::config::FeedConfig;
use crate::models::{Lookup, ReleaseItem};
use anyhow::Context;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;

pub use feed::{FeedError, RssFeedClient};
pub use sabnzbd::{QueueSlot, SabError, SabnzbdClient};
pub use tvdb::{TvDbClient, TvDbError};

/// Produces the ordered entries of one configured feed.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<ReleaseItem>, FeedError>;
}

/// The remote download queue.
#[async_trait::async_trait]
pub trait DownloadQueue: Send + Sync {
    /// Current queue snapshot.
    async fn queue(&self) -> Result<Vec<QueueSlot>, SabError>;

    /// Submits an NZB by URL under the given job name. Returns the raw
    /// response text.
    async fn add_by_url(&self, link: &str, nzb_name: &str) -> Result<String, SabError>;

    /// Submits a report by its indexer id. Returns the raw response text.
    async fn add_by_id(&self, report_id: &str) -> Result<String, SabError>;
}

/// Best-effort episode name lookup.
#[async_trait::async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn episode_name(&self, show_name: &str, season: u32, episode: u32) -> Lookup<String>;

    async fn dated_episode_name(&self, show_name: &str, date: NaiveDate) -> Lookup<String>;
}

/// HTTP client shared by every collaborator.
pub fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("sabwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}
