use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presentation::{
    ConcentrationConfig, FocusConfig, FocusMotionSpec, LookConfig, ManagerConfig, TargetingConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse game config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid game config value `{field}` = {value}: {reason}")]
    Invalid {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
}

/// Every tuning knob of a session. Missing fields fall back to defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub look: LookConfig,
    pub targeting: TargetingConfig,
    pub concentration: ConcentrationConfig,
    pub focus: FocusConfig,
    pub managers: ManagerConfig,
}

impl GameConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("look.sensitivity", self.look.sensitivity)?;
        positive(
            "targeting.interaction_distance",
            self.targeting.interaction_distance,
        )?;
        self.concentration.validate()?;
        match self.focus.motion {
            FocusMotionSpec::Tween {
                duration_seconds, ..
            } => non_negative("focus.motion.duration_seconds", duration_seconds),
            FocusMotionSpec::Follow { rotation_speed } => {
                positive("focus.motion.rotation_speed", rotation_speed)
            }
        }
    }
}

impl ConcentrationConfig {
    /// Also applied to meters placed in a scene, which bypass `GameConfig`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("concentration.max", self.max)?;
        non_negative("concentration.decrease_per_second", self.decrease_per_second)?;
        non_negative(
            "concentration.decrease_per_interaction",
            self.decrease_per_interaction,
        )
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::Invalid {
            field,
            value,
            reason: "must be finite",
        });
    }
    if value < 0.0 {
        return Err(ConfigError::Invalid {
            field,
            value,
            reason: "must not be negative",
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if value == 0.0 {
        return Err(ConfigError::Invalid {
            field,
            value,
            reason: "must be greater than zero",
        });
    }
    Ok(())
}
