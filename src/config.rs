use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::title::VIDEO_EXTENSIONS;

/// Configuration for the catalog pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Message archive settings
    pub archive: ArchiveConfig,

    /// Metadata lookup service settings
    pub lookup: LookupConfig,

    /// Persistent lookup cache settings
    pub cache: CacheConfig,

    /// Output document and logging settings
    pub output: OutputConfig,

    /// HTTP endpoint settings
    pub server: ServerConfig,
}

/// Which reader backs the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// JSON message export
    Export,
    /// Local directory of files
    Directory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Export file or directory to scan
    pub path: PathBuf,

    /// Reader used for `path`
    pub source: ArchiveKind,

    /// Channel id used for message links; overrides the export's own id
    pub channel_id: Option<i64>,

    /// Category qualifying identifiers when several catalogs share titles
    pub category: Option<String>,

    /// Recognised video file extensions for document attachments
    pub video_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Query the catalog service at all
    pub enabled: bool,

    /// TMDB v3 API key or v4 read access token
    pub api_key: Option<String>,

    /// API base URL
    pub base_url: String,

    /// Poster image base URL
    pub image_base_url: String,

    /// Search language
    pub language: String,

    /// Include adult results
    pub include_adult: bool,

    /// Per-query timeout in seconds
    pub timeout_seconds: u64,

    /// Try drop-first-word / drop-last-word queries as a last resort
    pub word_dropping: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist successful lookups between runs
    pub enabled: bool,

    /// Cache directory
    pub dir: PathBuf,

    /// Cache TTL in hours
    pub ttl_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Catalog document to write
    pub path: PathBuf,

    /// Prior document to read overrides from; defaults to `path`
    pub prior: Option<PathBuf>,

    /// Log level
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Directory with the presentation layer's static files
    pub static_dir: Option<PathBuf>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("export/result.json"),
            source: ArchiveKind::Export,
            channel_id: None,
            category: None,
            video_extensions: VIDEO_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            language: "en-US".to_string(),
            include_adult: false,
            timeout_seconds: 10,
            word_dropping: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: PathBuf::from(".flix_cache"),
            ttl_hours: 168, // one week
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("movies.json"),
            prior: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

impl OutputConfig {
    /// Document overrides are read from
    pub fn prior_path(&self) -> &Path {
        self.prior.as_deref().unwrap_or(&self.path)
    }
}

impl Config {
    /// Load configuration from the first parseable file in the search path
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("flix-catalog.toml"),
            PathBuf::from("config/flix-catalog.toml"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            config_paths.push(PathBuf::from(home).join(".config/flix-catalog/config.toml"));
        }
        config_paths.push(PathBuf::from("/etc/flix-catalog/config.toml"));

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load one explicit configuration file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults with environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("TMDB_API_KEY") {
            if !api_key.trim().is_empty() {
                self.lookup.api_key = Some(api_key);
            }
        }

        if let Ok(archive) = std::env::var("FLIX_CATALOG_ARCHIVE") {
            self.archive.path = PathBuf::from(archive);
        }

        if let Ok(channel_id) = std::env::var("FLIX_CATALOG_CHANNEL_ID") {
            match channel_id.trim().parse() {
                Ok(id) => self.archive.channel_id = Some(id),
                Err(_) => tracing::warn!("Ignoring non-numeric FLIX_CATALOG_CHANNEL_ID: {}", channel_id),
            }
        }

        if let Ok(output) = std::env::var("FLIX_CATALOG_OUTPUT") {
            self.output.path = PathBuf::from(output);
        }

        if let Ok(log_level) = std::env::var("FLIX_CATALOG_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.lookup.timeout_seconds == 0 {
            return Err(anyhow!("lookup.timeout_seconds must be greater than 0"));
        }

        if self.archive.video_extensions.is_empty() {
            return Err(anyhow!("archive.video_extensions must not be empty"));
        }

        if self.cache.enabled && self.cache.ttl_hours == 0 {
            return Err(anyhow!("cache.ttl_hours must be greater than 0 when the cache is enabled"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Flix Catalog Configuration:\n\
            - Archive: {} ({:?})\n\
            - Channel Id: {}\n\
            - Category: {}\n\
            - Lookup: {} (credential {})\n\
            - Lookup Cache: {}\n\
            - Output: {}\n\
            - Video Extensions: {}",
            self.archive.path.display(),
            self.archive.source,
            self.archive.channel_id.map(|id| id.to_string()).unwrap_or_else(|| "from archive".to_string()),
            self.archive.category.as_deref().unwrap_or("none"),
            if self.lookup.enabled { "enabled" } else { "disabled" },
            if self.lookup.api_key.is_some() { "set" } else { "missing" },
            if self.cache.enabled {
                format!("{} ({}h TTL)", self.cache.dir.display(), self.cache.ttl_hours)
            } else {
                "disabled".to_string()
            },
            self.output.path.display(),
            self.archive.video_extensions.join(", "),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_archive(mut self, path: PathBuf, source: ArchiveKind) -> Self {
        self.config.archive.path = path;
        self.config.archive.source = source;
        self
    }

    pub fn with_channel_id(mut self, channel_id: i64) -> Self {
        self.config.archive.channel_id = Some(channel_id);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.config.archive.category = Some(category.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.lookup.api_key = Some(api_key.into());
        self
    }

    pub fn enable_lookup(mut self, enable: bool) -> Self {
        self.config.lookup.enabled = enable;
        self
    }

    pub fn enable_cache(mut self, dir: PathBuf) -> Self {
        self.config.cache.enabled = true;
        self.config.cache.dir = dir;
        self
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.config.output.path = path;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.lookup.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.lookup.timeout_seconds, 10);
        assert!(!config.lookup.include_adult);
        assert!(!config.cache.enabled);
        assert_eq!(config.output.path, PathBuf::from("movies.json"));
        assert_eq!(config.server.port, 5000);
        assert!(config.archive.video_extensions.contains(&"mkv".to_string()));
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_channel_id(-1001234567890)
            .with_category("anime")
            .enable_lookup(false)
            .build();

        assert_eq!(config.archive.channel_id, Some(-1001234567890));
        assert_eq!(config.archive.category.as_deref(), Some("anime"));
        assert!(!config.lookup.enabled);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.lookup.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.archive.video_extensions.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [archive]
            path = "dump.json"
            channel_id = -1009876

            [lookup]
            word_dropping = false
            "#,
        )
        .unwrap();

        assert_eq!(config.archive.path, PathBuf::from("dump.json"));
        assert_eq!(config.archive.source, ArchiveKind::Export);
        assert_eq!(config.archive.channel_id, Some(-1009876));
        assert!(!config.lookup.word_dropping);
        assert_eq!(config.lookup.language, "en-US");
        assert_eq!(config.cache.ttl_hours, 168);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flix-catalog.toml");

        let config = ConfigBuilder::new()
            .with_archive(PathBuf::from("/srv/videos"), ArchiveKind::Directory)
            .enable_cache(PathBuf::from("/tmp/cache"))
            .build();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.archive.source, ArchiveKind::Directory);
        assert_eq!(loaded.archive.path, PathBuf::from("/srv/videos"));
        assert!(loaded.cache.enabled);
    }

    #[test]
    fn test_prior_path_defaults_to_output() {
        let mut output = OutputConfig::default();
        assert_eq!(output.prior_path(), Path::new("movies.json"));
        output.prior = Some(PathBuf::from("old.json"));
        assert_eq!(output.prior_path(), Path::new("old.json"));
    }
}
