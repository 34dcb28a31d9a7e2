use crate::config::Config;

pub async fn cmd_check(config: &Config, json: bool) -> anyhow::Result<()> {
    config.validate()?;

    if config.feeds.is_empty() {
        println!("No feeds configured.");
        println!();
        println!("Add a [[feeds]] entry with a name and url to your config file.");
        return Ok(());
    }

    let job = crate::build_sync_job(config)?;
    let summary = job.run().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    for line in summary.render() {
        println!("{line}");
    }

    if summary.stats.failed_feeds > 0 {
        println!();
        println!(
            "{} of {} feeds failed, see the log for details.",
            summary.stats.failed_feeds, summary.stats.total_feeds
        );
    }

    Ok(())
}
