use crate::config::Config;
use crate::models::{EpisodeIdentity, EpisodeMarker, Site};
use crate::parser::{ShowNormalizer, TitleParser};

pub fn cmd_parse(config: &Config, title: &str, site: Option<&str>) -> anyhow::Result<()> {
    let site = site.map_or(Site::Unknown, Site::from_feed_url);
    let parser = TitleParser::new(ShowNormalizer::new(&config.watch.aliases));

    println!("Title: {title}");
    println!("Site:  {site}");

    match parser.parse(title, site) {
        EpisodeIdentity::Resolved { show, marker } => {
            println!("Show:  {show}");
            match &marker {
                EpisodeMarker::SeasonEpisode { season, episodes } => {
                    println!("Season: {season}");
                    let episodes: Vec<String> = episodes.iter().map(ToString::to_string).collect();
                    println!("Episodes: {}", episodes.join(", "));
                }
                EpisodeMarker::Dated { date } => {
                    println!("Aired: {date}");
                }
            }
            println!("Marker: {marker}");
        }
        EpisodeIdentity::Unresolved => {
            println!("Title not recognised.");
        }
    }

    Ok(())
}
