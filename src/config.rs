use std::env;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, ensure};

use crate::layout::{DEFAULT_JITTER_AMPLITUDE, Jitter, LayoutConfig};

pub const DEFAULT_TREE_PATH: &str = "constellation-tree.json";
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_FILE_LOG_FILTER: &str = "info";

/// `CONSTELLATION_JITTER` values: `random`, `off`, or a `u64` seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterSetting(pub Jitter);

impl Display for JitterSetting {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Jitter::Off => f.write_str("off"),
            Jitter::Random => f.write_str("random"),
            Jitter::Seeded(seed) => write!(f, "{seed}"),
        }
    }
}

impl FromStr for JitterSetting {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "random" => Ok(Self(Jitter::Random)),
            "off" | "none" => Ok(Self(Jitter::Off)),
            other => other.parse::<u64>().map(|seed| Self(Jitter::Seeded(seed))).map_err(|_| {
                anyhow!(
                    "invalid CONSTELLATION_JITTER `{other}`; expected `random`, `off`, or a numeric seed"
                )
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstellationSettings {
    pub tree_path: PathBuf,
    pub jitter: Jitter,
    pub jitter_amplitude: f32,
    pub save_debounce_ms: u64,
    pub log_dir: Option<PathBuf>,
    pub file_log_filter: String,
}

impl ConstellationSettings {
    pub fn from_env() -> Result<Self> {
        // Load .env if present, but do not fail if file does not exist.
        let _ = dotenvy::dotenv();

        let tree_path = read_optional_env("CONSTELLATION_TREE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TREE_PATH));

        let jitter = env::var("CONSTELLATION_JITTER")
            .unwrap_or_else(|_| JitterSetting(Jitter::Random).to_string())
            .parse::<JitterSetting>()
            .context("failed to parse CONSTELLATION_JITTER")?
            .0;

        let jitter_amplitude =
            parse_f32_env("CONSTELLATION_JITTER_AMPLITUDE", DEFAULT_JITTER_AMPLITUDE)?;
        ensure!(
            jitter_amplitude.is_finite() && jitter_amplitude >= 0.0,
            "CONSTELLATION_JITTER_AMPLITUDE must be a finite number >= 0"
        );

        let save_debounce_ms =
            parse_u64_env("CONSTELLATION_SAVE_DEBOUNCE_MS", DEFAULT_SAVE_DEBOUNCE_MS)?;
        ensure!(
            save_debounce_ms > 0,
            "CONSTELLATION_SAVE_DEBOUNCE_MS must be greater than 0"
        );

        let log_dir = read_optional_env("CONSTELLATION_LOG_DIR").map(PathBuf::from);
        let file_log_filter = read_optional_env("CONSTELLATION_FILE_LOG")
            .unwrap_or_else(|| DEFAULT_FILE_LOG_FILTER.to_owned());

        Ok(Self {
            tree_path,
            jitter,
            jitter_amplitude,
            save_debounce_ms,
            log_dir,
            file_log_filter,
        })
    }

    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            jitter: self.jitter,
            jitter_amplitude: self.jitter_amplitude,
            ..LayoutConfig::default()
        }
    }
}

fn read_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn parse_u64_env(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("failed to parse {name} as u64")),
        Err(_) => Ok(default),
    }
}

fn parse_f32_env(name: &str, default: f32) -> Result<f32> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<f32>()
            .with_context(|| format!("failed to parse {name} as a number")),
        Err(_) => Ok(default),
    }
}
