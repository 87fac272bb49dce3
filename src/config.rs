use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::resolve::Tier;

pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Reads the config file; a missing file means all defaults
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            log::debug!(
                "config {} not found, using defaults",
                path.to_string_lossy()
            );
            return Ok(Config {
                version: CURRENT_VERSION,
                ..Default::default()
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Config> {
        let cfg: Config = toml::from_str(contents).with_context(|| "Failed to parse config TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version != CURRENT_VERSION {
            bail!(
                "unsupported config version {}, expected {CURRENT_VERSION}",
                self.version
            );
        }
        if matches!(&self.search.tiers, Some(tiers) if tiers.is_empty()) {
            bail!("search.tiers must not be empty");
        }
        if self.search.max_candidates == 0 {
            bail!("search.max_candidates must be at least 1");
        }
        Ok(())
    }
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CatalogConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub ytdlp_path: PathBuf,
    pub max_candidates: usize,
    pub tolerance_seconds: u32,
    /// cascade tiers in order; the built-in four when absent
    pub tiers: Option<Vec<Tier>>,
}

impl SearchConfig {
    pub fn tiers(&self) -> Vec<Tier> {
        self.tiers.clone().unwrap_or_else(Tier::default_tiers)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            max_candidates: 5,
            tolerance_seconds: 2,
            tiers: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AudioConfig {
    pub ffmpeg_path: PathBuf,
    /// sample rate of the normalized intermediate
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            sample_rate: 48000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve::Acceptance, search::QueryMode};
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[catalog]
client_id = "abc"
client_secret = "def"

[search]
ytdlp_path = "/usr/local/bin/yt-dlp"
max_candidates = 8
tolerance_seconds = 1

[[search.tiers]]
name = "songs"
mode = "songs"
accept = "within_tolerance"

[[search.tiers]]
name = "fallback"
accept = "first"

[audio]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
sample_rate = 44100

[output]
dir = "/home/sancho/Music/new"
overwrite = true
"#;

        let cfg = Config::parse(toml_str)?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.catalog.client_id.as_deref(), Some("abc"));
        assert_eq!(cfg.catalog.client_secret.as_deref(), Some("def"));
        assert_eq!(cfg.search.ytdlp_path, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(cfg.search.max_candidates, 8);
        assert_eq!(cfg.search.tolerance_seconds, 1);

        let tiers = cfg.search.tiers();
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].mode, QueryMode::Songs);
        assert_eq!(tiers[0].accept, Acceptance::WithinTolerance);
        assert_eq!(tiers[1].mode, QueryMode::Videos);
        assert_eq!(tiers[1].suffix, None);
        assert_eq!(tiers[1].accept, Acceptance::First);

        assert_eq!(cfg.audio.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cfg.audio.sample_rate, 44100);
        assert_eq!(cfg.output.dir, PathBuf::from("/home/sancho/Music/new"));
        assert!(cfg.output.overwrite);

        Ok(())
    }

    #[test]
    fn test_minimal_config_uses_defaults() -> anyhow::Result<()> {
        let cfg = Config::parse("version = 1\n")?;

        assert_eq!(cfg.catalog.client_id, None);
        assert_eq!(cfg.search.max_candidates, 5);
        assert_eq!(cfg.search.tolerance_seconds, 2);
        assert_eq!(cfg.search.tiers(), Tier::default_tiers());
        assert_eq!(cfg.audio.sample_rate, 48000);
        assert_eq!(cfg.output.dir, PathBuf::from("."));
        assert!(!cfg.output.overwrite);

        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let cfg = Config::load(&tmp.path().join("nope.toml"))?;
        assert_eq!(cfg.version, CURRENT_VERSION);
        assert_eq!(cfg.search.tiers().len(), 4);
        Ok(())
    }

    #[test]
    fn test_rejects_empty_tier_list() {
        let toml_str = r#"
version = 1

[search]
tiers = []
"#;
        assert!(Config::parse(toml_str).is_err());
    }

    #[test]
    fn test_rejects_zero_candidates_and_unknown_version() {
        assert!(Config::parse("version = 1\n[search]\nmax_candidates = 0\n").is_err());
        assert!(Config::parse("version = 2\n").is_err());
    }
}
