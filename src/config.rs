use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_DIR: &str = "asset-thumbs";

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 128;
pub const THUMBNAIL_SIZE_RANGE: std::ops::RangeInclusive<u32> = 16..=512;
pub const DEFAULT_BATCH_SIZE: usize = 8;
pub const BATCH_SIZE_RANGE: std::ops::RangeInclusive<usize> = 1..=64;
pub const DEFAULT_MAX_CACHED_ITEMS: usize = 500;
pub const DEFAULT_RELOAD_COOLDOWN_MS: u64 = 2000;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DecoderConfig {
    #[default]
    InProcess,
    External {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub thumbnail_size: u32,
    pub batch_size: usize,
    pub max_cached_items: usize,
    pub reload_cooldown_ms: u64,
    pub cache_dir: Option<PathBuf>,
    pub decoder: DecoderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            max_cached_items: DEFAULT_MAX_CACHED_ITEMS,
            reload_cooldown_ms: DEFAULT_RELOAD_COOLDOWN_MS,
            cache_dir: None,
            decoder: DecoderConfig::InProcess,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Loads `path`, or the default location when `path` is `None`.
    /// A missing default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    /// Out-of-range values fall back to their defaults rather than failing.
    pub fn sanitize(&mut self) {
        if !THUMBNAIL_SIZE_RANGE.contains(&self.thumbnail_size) {
            log::warn!(
                "thumbnail_size {} outside {:?}, using {}",
                self.thumbnail_size,
                THUMBNAIL_SIZE_RANGE,
                DEFAULT_THUMBNAIL_SIZE
            );
            self.thumbnail_size = DEFAULT_THUMBNAIL_SIZE;
        }
        if !BATCH_SIZE_RANGE.contains(&self.batch_size) {
            log::warn!(
                "batch_size {} outside {:?}, using {}",
                self.batch_size,
                BATCH_SIZE_RANGE,
                DEFAULT_BATCH_SIZE
            );
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.max_cached_items == 0 {
            log::warn!("max_cached_items must be positive, using {}", DEFAULT_MAX_CACHED_ITEMS);
            self.max_cached_items = DEFAULT_MAX_CACHED_ITEMS;
        }
    }

    pub fn thumbnail_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join(APP_DIR)
            .join("thumbnails")
    }

    pub fn reload_cooldown(&self) -> Duration {
        Duration::from_millis(self.reload_cooldown_ms)
    }
}

/// A size value as delivered by whatever control the host UI uses.
#[derive(Clone, Debug, PartialEq)]
pub enum SizeInput {
    Slider(f64),
    Spin(i64),
    Text(String),
}

impl SizeInput {
    /// The requested size, or the default when it is unparsable or unsupported.
    pub fn target_size(&self) -> u32 {
        let requested = match self {
            SizeInput::Slider(v) if v.is_finite() => Some(v.round() as i64),
            SizeInput::Slider(_) => None,
            SizeInput::Spin(v) => Some(*v),
            SizeInput::Text(s) => s.trim().parse::<i64>().ok(),
        };

        requested
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| THUMBNAIL_SIZE_RANGE.contains(v))
            .unwrap_or(DEFAULT_THUMBNAIL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.thumbnail_size, 128);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.max_cached_items, 500);
        assert_eq!(config.reload_cooldown(), Duration::from_secs(2));
        assert_eq!(config.decoder, DecoderConfig::InProcess);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("thumbnail_size = 64\n").unwrap();
        assert_eq!(config.thumbnail_size, 64);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = Config::from_toml("thumbnail_size = 4096\nbatch_size = 0\nmax_cached_items = 0\n").unwrap();
        assert_eq!(config.thumbnail_size, DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.max_cached_items, DEFAULT_MAX_CACHED_ITEMS);
    }

    #[test]
    fn test_external_decoder_table() {
        let config = Config::from_toml(
            "[decoder.external]\nprogram = \"/usr/bin/xcursor_extractor\"\nargs = [\"--quiet\"]\n",
        )
        .unwrap();
        assert_eq!(
            config.decoder,
            DecoderConfig::External {
                program: PathBuf::from("/usr/bin/xcursor_extractor"),
                args: vec!["--quiet".to_string()],
            }
        );
    }

    #[test]
    fn test_in_process_decoder_string() {
        let config = Config::from_toml("decoder = \"in-process\"\n").unwrap();
        assert_eq!(config.decoder, DecoderConfig::InProcess);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "cache_dir = \"/tmp/thumbs\"\nreload_cooldown_ms = 10\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.thumbnail_dir(), PathBuf::from("/tmp/thumbs"));
        assert_eq!(config.reload_cooldown(), Duration::from_millis(10));

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_size_input_variants() {
        assert_eq!(SizeInput::Slider(63.6).target_size(), 64);
        assert_eq!(SizeInput::Spin(256).target_size(), 256);
        assert_eq!(SizeInput::Text(" 48 ".to_string()).target_size(), 48);
        assert_eq!(SizeInput::Text("huge".to_string()).target_size(), DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(SizeInput::Spin(-5).target_size(), DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(SizeInput::Slider(f64::NAN).target_size(), DEFAULT_THUMBNAIL_SIZE);
        assert_eq!(SizeInput::Spin(9000).target_size(), DEFAULT_THUMBNAIL_SIZE);
    }
}
