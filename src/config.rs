use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub sabnzbd: SabnzbdConfig,

    pub tvdb: TvDbConfig,

    pub library: LibraryConfig,

    pub watch: WatchConfig,

    pub scheduler: SchedulerConfig,

    /// Processed in file order.
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SabnzbdConfig {
    pub url: String,

    pub api_key: String,

    pub category: String,

    /// Substitute filename-illegal characters instead of dropping them.
    pub replace_chars: bool,
}

impl Default for SabnzbdConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/sabnzbd".to_string(),
            api_key: String::new(),
            category: "tv".to_string(),
            replace_chars: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TvDbConfig {
    pub enabled: bool,

    pub base_url: String,

    pub api_key: String,
}

impl Default for TvDbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://thetvdb.com/api".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub tv_roots: Vec<PathBuf>,

    pub video_extensions: Vec<String>,

    pub tv_template: String,

    pub tv_daily_template: String,

    /// Where the download client keeps `.nzb.gz` copies of processed jobs.
    pub archive_dir: Option<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            tv_roots: Vec::new(),
            video_extensions: vec![
                ".mkv".to_string(),
                ".avi".to_string(),
                ".mp4".to_string(),
                ".wmv".to_string(),
            ],
            tv_template: "%sn/Season %s/%sn - %sx%0e - %en.%ext".to_string(),
            tv_daily_template: "%t/%t - %y-%0m-%0d - %desc.%ext".to_string(),
            archive_dir: None,
        }
    }
}

impl LibraryConfig {
    /// Extensions with a leading dot, ready to append to a file mask.
    #[must_use]
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.video_extensions
            .iter()
            .map(|ext| ext.trim())
            .filter(|ext| !ext.is_empty())
            .map(|ext| {
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{ext}")
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub shows: Vec<String>,

    /// Show name -> highest season to skip.
    pub ignore_seasons: BTreeMap<String, u32>,

    /// Name as it appears in release titles -> canonical name.
    pub aliases: BTreeMap<String, String>,

    /// Default quality keywords; a title must contain one of them.
    pub download_quality: Vec<String>,

    /// Per-show keyword lists replacing `download_quality`.
    pub show_qualities: BTreeMap<String, Vec<String>>,

    pub download_propers: bool,

    pub passworded_marker: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            shows: Vec::new(),
            ignore_seasons: BTreeMap::new(),
            aliases: BTreeMap::new(),
            download_quality: vec!["720p".to_string()],
            show_qualities: BTreeMap::new(),
            download_propers: false,
            passworded_marker: "(Passworded)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,

    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    pub check_interval_minutes: u32,

    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_minutes: 15,
            cron_expression: None,
        }
    }
}

impl Config {
    /// Loads from `explicit` when given, otherwise from the first existing
    /// file on the search path, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!("Loading config from: {}", path.display());
            return Self::load_from_path(path);
        }

        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("sabwatch").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".sabwatch").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` (or `./config.toml`). Returns
    /// `false` when a file already exists there.
    pub fn create_default_if_missing(path: Option<&Path>) -> Result<bool> {
        let path = path.map_or_else(Self::default_config_path, Path::to_path_buf);
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sabnzbd.url.trim().is_empty() {
            anyhow::bail!("SABnzbd URL cannot be empty");
        }

        if self.scheduler.enabled
            && self.scheduler.check_interval_minutes == 0
            && self.scheduler.cron_expression.is_none()
        {
            anyhow::bail!("Scheduler interval must be > 0 or cron expression must be set");
        }

        if self.library.tv_roots.is_empty() {
            anyhow::bail!("At least one TV root directory must be configured");
        }

        for (name, template) in [
            ("tv_template", &self.library.tv_template),
            ("tv_daily_template", &self.library.tv_daily_template),
        ] {
            let (_, file) = crate::library::naming::split_template(template);
            if file.trim().is_empty() {
                anyhow::bail!("{name} must end with a file name component");
            }
        }

        Ok(())
    }
}
