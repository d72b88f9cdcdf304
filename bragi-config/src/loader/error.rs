use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ConfigGuardRailError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read loader config from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse loader config {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
