//! Scheduler configuration
//!
//! Hosts can ship a `cadence.toml` alongside the application:
//!
//! ```toml
//! target_fps = 60
//! default_animation_duration_ms = 500
//! max_frame_delta_ms = 100
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{AnimationError, Result};

/// Scheduler settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Frame pacing hint for hosts that drive [`AnimationScheduler::tick`](crate::AnimationScheduler::tick)
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Natural duration of an animation whose duration is automatic
    #[serde(default = "default_animation_duration_ms")]
    pub default_animation_duration_ms: u64,
    /// Largest wall-clock gap a single tick may advance by
    #[serde(default = "default_max_frame_delta_ms")]
    pub max_frame_delta_ms: u64,
}

fn default_target_fps() -> u32 {
    120
}

fn default_animation_duration_ms() -> u64 {
    1000
}

fn default_max_frame_delta_ms() -> u64 {
    250
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            default_animation_duration_ms: default_animation_duration_ms(),
            max_frame_delta_ms: default_max_frame_delta_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| AnimationError::Config(err.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            AnimationError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| AnimationError::Config(err.to_string()))
    }

    /// Time between frames at the target rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(1) as f64)
    }

    pub fn default_animation_duration(&self) -> Duration {
        Duration::from_millis(self.default_animation_duration_ms)
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}
