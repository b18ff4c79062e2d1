//! Run-level simulation settings.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_MAX_FIELD_SIZE, DEFAULT_MAX_TICK_MULTIPLIER, INITIAL_STAMINA,
    LEAD_CHANGE_COMMENTARY_GAP, PHOTO_FINISH_MARGIN_TICKS,
};

/// Errors raised when simulation configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Parse(String),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Tunable limits for a single race run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Largest field the engine will assemble, including the entered horse.
    #[serde(default = "SimulationConfig::default_max_field_size")]
    pub max_field_size: u8,
    /// Hard stop at `total_ticks × max_tick_multiplier`.
    #[serde(default = "SimulationConfig::default_max_tick_multiplier")]
    pub max_tick_multiplier: u32,
    /// Top-two finish margin (ticks) below which a photo finish is called.
    #[serde(default = "SimulationConfig::default_photo_finish_margin")]
    pub photo_finish_margin: f64,
    /// Minimum ticks between two lead-change calls.
    #[serde(default = "SimulationConfig::default_lead_change_gap")]
    pub lead_change_commentary_gap: u32,
    #[serde(default = "SimulationConfig::default_initial_stamina")]
    pub initial_stamina: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_field_size: Self::default_max_field_size(),
            max_tick_multiplier: Self::default_max_tick_multiplier(),
            photo_finish_margin: Self::default_photo_finish_margin(),
            lead_change_commentary_gap: Self::default_lead_change_gap(),
            initial_stamina: Self::default_initial_stamina(),
        }
    }
}

impl SimulationConfig {
    const fn default_max_field_size() -> u8 {
        DEFAULT_MAX_FIELD_SIZE
    }

    const fn default_max_tick_multiplier() -> u32 {
        DEFAULT_MAX_TICK_MULTIPLIER
    }

    const fn default_photo_finish_margin() -> f64 {
        PHOTO_FINISH_MARGIN_TICKS
    }

    const fn default_lead_change_gap() -> u32 {
        LEAD_CHANGE_COMMENTARY_GAP
    }

    const fn default_initial_stamina() -> f64 {
        INITIAL_STAMINA
    }

    /// Load configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON string cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=20).contains(&self.max_field_size) {
            return Err(ConfigError::RangeViolation {
                field: "max_field_size",
                min: 1.0,
                max: 20.0,
                value: f64::from(self.max_field_size),
            });
        }
        if self.max_tick_multiplier < 2 {
            return Err(ConfigError::MinViolation {
                field: "max_tick_multiplier",
                min: 2.0,
                value: f64::from(self.max_tick_multiplier),
            });
        }
        if !self.photo_finish_margin.is_finite() || !(0.0..=5.0).contains(&self.photo_finish_margin)
        {
            return Err(ConfigError::RangeViolation {
                field: "photo_finish_margin",
                min: 0.0,
                max: 5.0,
                value: self.photo_finish_margin,
            });
        }
        if !self.initial_stamina.is_finite() || self.initial_stamina < 1.0 {
            return Err(ConfigError::MinViolation {
                field: "initial_stamina",
                min: 1.0,
                value: self.initial_stamina,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.max_field_size, 12);
    }

    #[test]
    fn rejects_oversized_field() {
        let err = SimulationConfig::from_json(r#"{"max_field_size": 40}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::RangeViolation { field, .. } if field == "max_field_size"
        ));
    }

    #[test]
    fn rejects_short_tick_cap_and_bad_stamina() {
        let cfg = SimulationConfig {
            max_tick_multiplier: 1,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation { field, .. }) if field == "max_tick_multiplier"
        ));
        let cfg = SimulationConfig {
            initial_stamina: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimulationConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
