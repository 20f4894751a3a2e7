//! Session configuration.
//!
//! A `HospitalConfig` bundles the resource registry, the reservation
//! policy, and the operational rules. It is loaded once at session start
//! from JSON and passed explicitly; there is no process-wide state.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigurationError;
use crate::models::{Horizon, Minutes, ResourceRegistry};
use crate::partition::ReservationPolicy;

/// Operational rules of the operating day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingRules {
    /// Start of the regular day (08:00).
    #[serde(default = "default_day_start")]
    pub day_start: Minutes,
    /// End of the regular day (20:00). Later finishes are overtime.
    #[serde(default = "default_day_end")]
    pub day_end: Minutes,
    /// Hard end of the planning horizon (24:00).
    #[serde(default = "default_horizon_end")]
    pub horizon_end: Minutes,
    /// Room cleaning time after each regular surgery.
    #[serde(default = "default_turnover")]
    pub turnover_minutes: Minutes,
    /// Mandatory surgeon break between consecutive regular surgeries.
    #[serde(default = "default_surgeon_break")]
    pub surgeon_break_minutes: Minutes,
}

fn default_day_start() -> Minutes {
    8 * 60
}

fn default_day_end() -> Minutes {
    20 * 60
}

fn default_horizon_end() -> Minutes {
    24 * 60
}

fn default_turnover() -> Minutes {
    30
}

fn default_surgeon_break() -> Minutes {
    30
}

impl Default for OperatingRules {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            horizon_end: default_horizon_end(),
            turnover_minutes: default_turnover(),
            surgeon_break_minutes: default_surgeon_break(),
        }
    }
}

impl OperatingRules {
    /// Rules with no turnover and no surgeon break.
    pub fn back_to_back() -> Self {
        Self {
            turnover_minutes: 0,
            surgeon_break_minutes: 0,
            ..Self::default()
        }
    }

    /// The full-day planning horizon.
    pub fn horizon(&self) -> Horizon {
        Horizon::new(self.day_start, self.horizon_end)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.day_start >= self.day_end {
            return Err(ConfigurationError::InvalidRules(format!(
                "day_start ({}) must be before day_end ({})",
                self.day_start, self.day_end
            )));
        }
        if self.day_end > self.horizon_end {
            return Err(ConfigurationError::InvalidRules(format!(
                "day_end ({}) must not be after horizon_end ({})",
                self.day_end, self.horizon_end
            )));
        }
        if self.turnover_minutes < 0 || self.surgeon_break_minutes < 0 {
            return Err(ConfigurationError::InvalidRules(
                "turnover and surgeon break must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to open a scheduling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalConfig {
    /// Rooms, surgeons and equipment.
    pub registry: ResourceRegistry,
    /// Which resources are withheld for emergencies.
    pub reservation: ReservationPolicy,
    /// Operating-day rules.
    #[serde(default)]
    pub rules: OperatingRules,
}

impl HospitalConfig {
    /// Creates a config with default rules.
    pub fn new(registry: ResourceRegistry, reservation: ReservationPolicy) -> Self {
        Self {
            registry,
            reservation,
            rules: OperatingRules::default(),
        }
    }

    /// Sets the operating rules.
    pub fn with_rules(mut self, rules: OperatingRules) -> Self {
        self.rules = rules;
        self
    }

    /// Parses a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.rules.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let r = OperatingRules::default();
        assert_eq!(r.day_start, 480);
        assert_eq!(r.day_end, 1200);
        assert_eq!(r.horizon_end, 1440);
        assert_eq!(r.turnover_minutes, 30);
        assert_eq!(r.surgeon_break_minutes, 30);
        assert!(r.validate().is_ok());
        assert_eq!(r.horizon(), Horizon::new(480, 1440));
    }

    #[test]
    fn test_invalid_rules() {
        let r = OperatingRules {
            day_start: 1200,
            day_end: 480,
            ..OperatingRules::default()
        };
        assert!(matches!(r.validate(), Err(ConfigurationError::InvalidRules(_))));

        let r = OperatingRules {
            turnover_minutes: -5,
            ..OperatingRules::default()
        };
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            "registry": {
                "rooms": [{"id": "OR-1"}, {"id": "OR-2", "kind": "reserved-emergency"}],
                "surgeons": [
                    {"id": "Dr. Grey", "specialties": ["General"]},
                    {"id": "Dr. Bailey", "specialties": ["General"]}
                ]
            },
            "reservation": {
                "reserved_room_ids": ["OR-2"],
                "reserved_surgeon_per_specialty": {"General": "Dr. Grey"}
            },
            "rules": {"turnover_minutes": 15}
        }"#;
        let config = HospitalConfig::from_json_str(json).unwrap();
        assert_eq!(config.registry.rooms.len(), 2);
        assert_eq!(config.rules.turnover_minutes, 15);
        assert_eq!(config.rules.surgeon_break_minutes, 30);
        assert!(config.reservation.reserved_room_ids.contains("OR-2"));
    }

    #[test]
    fn test_parse_error() {
        let err = HospitalConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = HospitalConfig::from_path("/nonexistent/hospital.json").unwrap_err();
        assert!(matches!(err, ConfigurationError::Io { .. }));
    }
}
