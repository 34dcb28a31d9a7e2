use crate::clients::{DownloadQueue, SabnzbdClient, http_client};
use crate::config::Config;

pub async fn cmd_queue(config: &Config) -> anyhow::Result<()> {
    let client = SabnzbdClient::new(http_client()?, config.sabnzbd.clone());
    let slots = client.queue().await?;

    if slots.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    println!("{} item(s) in queue:", slots.len());
    for (i, slot) in slots.iter().enumerate() {
        println!("{:>3}. {}", i + 1, slot.filename);
    }

    Ok(())
}
