use crate::models::EpisodeMarker;
use crate::parser::clean_string;
use chrono::Datelike;
use std::path::{Path, PathBuf};

const MASK_TRIM: &[char] = &[' ', '*', '.', '-', '_'];

/// Where an episode is expected to live under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodePaths {
    pub dir: PathBuf,
    /// Glob matching the episode file regardless of title text, e.g. `*01x02*`.
    pub mask: String,
}

/// Expands the configured naming templates into directory/mask pairs.
///
/// Season/episode tokens: `%sn` `%s.n` `%s_n` (show), `%0s` `%s` (season),
/// `%0e` `%e` (episode), `%en` `%e.n` `%e_n` (episode name).
/// Daily tokens: `%t` `%.t` `%_t` (show), `%y`, `%0m` `%m`, `%0d` `%d`,
/// `%desc` `%.desc` `%_desc` (episode name).
#[derive(Debug, Clone)]
pub struct NamingTemplater {
    tv_template: String,
    daily_template: String,
    replace_chars: bool,
}

impl NamingTemplater {
    #[must_use]
    pub fn new(
        tv_template: impl Into<String>,
        daily_template: impl Into<String>,
        replace_chars: bool,
    ) -> Self {
        Self {
            tv_template: tv_template.into(),
            daily_template: daily_template.into(),
            replace_chars,
        }
    }

    /// Multi-episode markers resolve to their first episode.
    #[must_use]
    pub fn episode_paths(&self, root: &Path, show: &str, marker: &EpisodeMarker) -> EpisodePaths {
        let show = clean_string(show, self.replace_chars);

        match marker {
            EpisodeMarker::SeasonEpisode { season, .. } => {
                let episode = marker.first_episode().unwrap_or_default();
                let (dirs, file) = split_template(&self.tv_template);
                EpisodePaths {
                    dir: join_dirs(root, &dirs, |part| {
                        season_dir_component(part, &show, *season, episode)
                    }),
                    mask: season_mask(file, *season, episode),
                }
            }
            EpisodeMarker::Dated { date } => {
                let (year, month, day) = (date.year(), date.month(), date.day());
                let (dirs, file) = split_template(&self.daily_template);
                EpisodePaths {
                    dir: join_dirs(root, &dirs, |part| {
                        daily_dir_component(part, &show, year, month, day)
                    }),
                    mask: daily_mask(file, year, month, day),
                }
            }
        }
    }
}

/// Splits a template on either path separator into directory components and
/// the trailing file component.
#[must_use]
pub fn split_template(template: &str) -> (Vec<&str>, &str) {
    let mut parts: Vec<&str> = template.split(['/', '\\']).collect();
    let file = parts.pop().unwrap_or_default();
    parts.retain(|p| !p.is_empty());
    (parts, file)
}

fn join_dirs(root: &Path, dirs: &[&str], expand: impl Fn(&str) -> String) -> PathBuf {
    dirs.iter()
        .fold(root.to_path_buf(), |path, part| path.join(expand(part)))
}

fn season_dir_component(part: &str, show: &str, season: u32, episode: u32) -> String {
    part.replace(".%ext", "")
        .replace("%sn", show)
        .replace("%s.n", &show.replace(' ', "."))
        .replace("%s_n", &show.replace(' ', "_"))
        .replace("%0s", &format!("{season:02}"))
        .replace("%s", &season.to_string())
        .replace("%0e", &format!("{episode:02}"))
        .replace("%e", &episode.to_string())
}

fn daily_dir_component(part: &str, show: &str, year: i32, month: u32, day: u32) -> String {
    part.replace(".%ext", "")
        .replace("%t", show)
        .replace("%.t", &show.replace(' ', "."))
        .replace("%_t", &show.replace(' ', "_"))
        .replace("%y", &year.to_string())
        .replace("%0m", &format!("{month:02}"))
        .replace("%m", &month.to_string())
        .replace("%0d", &format!("{day:02}"))
        .replace("%d", &day.to_string())
}

fn season_mask(file: &str, season: u32, episode: u32) -> String {
    let mask = file
        .replace(".%ext", "")
        .replace("%en", "*")
        .replace("%e.n", "*")
        .replace("%e_n", "*")
        .replace("%sn", "*")
        .replace("%s.n", "*")
        .replace("%s_n", "*")
        .replace("%0s", &format!("{season:02}"))
        .replace("%s", &season.to_string())
        .replace("%0e", &format!("{episode:02}"))
        .replace("%e", &episode.to_string());
    wrap_mask(&mask)
}

fn daily_mask(file: &str, year: i32, month: u32, day: u32) -> String {
    let mask = file
        .replace(".%ext", "*")
        .replace("%desc", "*")
        .replace("%.desc", "*")
        .replace("%_desc", "*")
        .replace("%t", "*")
        .replace("%.t", "*")
        .replace("%_t", "*")
        .replace("%y", &year.to_string())
        .replace("%0m", &format!("{month:02}"))
        .replace("%m", &month.to_string())
        .replace("%0d", &format!("{day:02}"))
        .replace("%d", &day.to_string());
    wrap_mask(&mask)
}

fn wrap_mask(mask: &str) -> String {
    format!("*{}*", mask.trim_matches(MASK_TRIM))
}
