//! Resolves the effective [`LoaderConfig`].
//!
//! Evaluation order:
//! 1) `$BRAGI_LOADER_CONFIG_PATH` (TOML or JSON file),
//! 2) `$BRAGI_LOADER_CONFIG_JSON` (inline JSON),
//! 3) the first of `bragi.toml`, `bragi.json`, `config/bragi.toml`,
//!    `config/bragi.json` under the search root,
//! 4) defaults.
//!
//! Individual fields are then overridden from `BRAGI_MAX_IMAGE_BYTES`,
//! `BRAGI_HEADROOM_FACTOR`, `BRAGI_FETCH_TIMEOUT` and
//! `BRAGI_REJECT_TRUNCATED`, and the result goes through the guard rails.

pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::anyhow;
use bragi_core::{LoaderConfig, TruncationPolicy};

use crate::{
    util::{parse_bool, parse_duration},
    validation::{ConfigWarnings, apply_guard_rails},
};
use error::ConfigLoadError;

pub const CONFIG_PATH_VAR: &str = "BRAGI_LOADER_CONFIG_PATH";
pub const CONFIG_JSON_VAR: &str = "BRAGI_LOADER_CONFIG_JSON";
pub const MAX_IMAGE_BYTES_VAR: &str = "BRAGI_MAX_IMAGE_BYTES";
pub const HEADROOM_FACTOR_VAR: &str = "BRAGI_HEADROOM_FACTOR";
pub const FETCH_TIMEOUT_VAR: &str = "BRAGI_FETCH_TIMEOUT";
pub const REJECT_TRUNCATED_VAR: &str = "BRAGI_REJECT_TRUNCATED";

const DEFAULT_CANDIDATES: &[&str] = &[
    "bragi.toml",
    "bragi.json",
    "config/bragi.toml",
    "config/bragi.json",
];

/// Source that produced the loader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoaderConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// A resolved configuration and how it was produced.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: LoaderConfig,
    pub source: LoaderConfigSource,
    /// Env vars that overrode individual fields, in evaluation order.
    pub env_overrides: Vec<&'static str>,
    pub warnings: ConfigWarnings,
    pub env_file_loaded: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    env_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            env_file: None,
        }
    }

    /// Directory the default file candidates are resolved against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Load this `.env` file instead of searching for one. The file must
    /// exist.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Load `.env`, then resolve against the process environment.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;
        let mut load = self.load_with(|name| std::env::var(name).ok())?;
        load.env_file_loaded = env_file_loaded;
        Ok(load)
    }

    /// Resolve using `env` for variable lookups.
    pub fn load_with<F>(&self, env: F) -> Result<ConfigLoad, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|raw| !raw.trim().is_empty());

        let (mut config, source) = if let Some(path) = lookup(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path);
            (load_from_file(&path)?, LoaderConfigSource::EnvPath(path))
        } else if let Some(raw) = lookup(CONFIG_JSON_VAR) {
            let config = parse_json(&raw).map_err(|source| {
                ConfigLoadError::Parse {
                    origin: CONFIG_JSON_VAR.to_string(),
                    source,
                }
            })?;
            (config, LoaderConfigSource::EnvInline)
        } else if let Some(path) = self.find_default_file() {
            (load_from_file(&path)?, LoaderConfigSource::File(path))
        } else {
            (LoaderConfig::default(), LoaderConfigSource::Default)
        };

        let env_overrides = apply_env_overrides(&mut config, &lookup)?;
        let warnings = apply_guard_rails(&config)?;
        for warning in &warnings.items {
            tracing::warn!(hint = ?warning.hint, "{}", warning.message);
        }

        tracing::debug!(?source, ?env_overrides, "loader config resolved");

        Ok(ConfigLoad {
            config,
            source,
            env_overrides,
            warnings,
            env_file_loaded: false,
        })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        if let Some(path) = &self.env_file {
            dotenvy::from_path(path)?;
            return Ok(true);
        }

        match dotenvy::dotenv() {
            Ok(_) => Ok(true),
            Err(err) if err.not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_CANDIDATES
            .iter()
            .map(|candidate| self.root.join(candidate))
            .find(|path| path.exists())
    }
}

pub fn load_from_file(path: &Path) -> Result<LoaderConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let parsed = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents),
        Some("toml") | Some("tml") => {
            toml::from_str(&contents).map_err(|err| anyhow!(err))
        }
        _ => parse_from_str(&contents),
    };

    parsed.map_err(|source| ConfigLoadError::Parse {
        origin: path.display().to_string(),
        source,
    })
}

/// Try TOML first, then JSON.
pub fn parse_from_str(contents: &str) -> anyhow::Result<LoaderConfig> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            anyhow!("toml error: {}; json error: {}", toml_err, json_err)
        })
    })
}

pub fn parse_json(raw: &str) -> anyhow::Result<LoaderConfig> {
    serde_json::from_str(raw).map_err(|err| anyhow!("invalid json: {err}"))
}

fn apply_env_overrides<F>(
    config: &mut LoaderConfig,
    lookup: &F,
) -> Result<Vec<&'static str>, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();
    let invalid = |var: &'static str, value: String| ConfigLoadError::InvalidEnv {
        var,
        value,
    };

    if let Some(raw) = lookup(MAX_IMAGE_BYTES_VAR) {
        config.max_image_bytes = raw
            .trim()
            .parse()
            .map_err(|_| invalid(MAX_IMAGE_BYTES_VAR, raw.clone()))?;
        applied.push(MAX_IMAGE_BYTES_VAR);
    }

    if let Some(raw) = lookup(HEADROOM_FACTOR_VAR) {
        config.headroom_factor = raw
            .trim()
            .parse()
            .map_err(|_| invalid(HEADROOM_FACTOR_VAR, raw.clone()))?;
        applied.push(HEADROOM_FACTOR_VAR);
    }

    if let Some(raw) = lookup(FETCH_TIMEOUT_VAR) {
        config.timeout = parse_duration(&raw)
            .ok_or_else(|| invalid(FETCH_TIMEOUT_VAR, raw.clone()))?;
        applied.push(FETCH_TIMEOUT_VAR);
    }

    if let Some(raw) = lookup(REJECT_TRUNCATED_VAR) {
        let reject = parse_bool(&raw)
            .ok_or_else(|| invalid(REJECT_TRUNCATED_VAR, raw.clone()))?;
        config.truncation = if reject {
            TruncationPolicy::Reject
        } else {
            TruncationPolicy::Accept
        };
        applied.push(REJECT_TRUNCATED_VAR);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_are_both_accepted() {
        let from_toml =
            parse_from_str("max_image_bytes = 32000\ntruncation = \"reject\"")
                .unwrap();
        assert_eq!(from_toml.max_image_bytes, 32_000);
        assert_eq!(from_toml.truncation, TruncationPolicy::Reject);

        let from_json = parse_from_str(r#"{"headroom_factor": 3}"#).unwrap();
        assert_eq!(from_json.headroom_factor, 3);
    }

    #[test]
    fn garbage_reports_both_parsers() {
        let err = parse_from_str("{{not config").unwrap_err().to_string();
        assert!(err.contains("toml error"));
        assert!(err.contains("json error"));
    }
}
