use std::time::Duration;

use bragi_core::LoaderConfig;
use thiserror::Error;

/// Above this the single buffer stops fitting the display controller's heap.
const DEVICE_IMAGE_CAP: usize = 256 * 1024;

/// A body stalled this long starves the display task's watchdog.
const WATCHDOG_SAFE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("max_image_bytes must be greater than zero")]
    ZeroImageCap,
    #[error("headroom_factor must be at least 1 (got {0})")]
    HeadroomBelowOne(u64),
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn apply_guard_rails(
    config: &LoaderConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    if config.max_image_bytes == 0 {
        return Err(ConfigGuardRailError::ZeroImageCap);
    }
    if config.headroom_factor < 1 {
        return Err(ConfigGuardRailError::HeadroomBelowOne(
            config.headroom_factor,
        ));
    }
    if config.timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroTimeout);
    }

    if config.max_image_bytes > DEVICE_IMAGE_CAP {
        warnings.push_with_hint(
            format!(
                "max_image_bytes={} is larger than a display controller heap can hold",
                config.max_image_bytes
            ),
            "Resize album art server-side and keep the cap near 50000",
        );
    }

    if config.headroom_factor == 1 {
        warnings.push(
            "headroom_factor=1 leaves no room for transport buffers during the copy",
        );
    }

    if config.timeout > WATCHDOG_SAFE_TIMEOUT {
        warnings.push_with_hint(
            format!("timeout of {:?} may trip the task watchdog", config.timeout),
            "Keep BRAGI_FETCH_TIMEOUT at a few seconds",
        );
    }

    Ok(warnings)
}
