use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError};

/// Parameters for one simulation run. Read once at start and never changed
/// while the run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub num_particles: usize,
    pub num_types: usize,
    pub dt: f64,
    /// Interaction radius. Pairs further apart than this exert no force.
    pub r: f64,
    /// Velocity multiplier applied once per tick.
    pub friction_factor: f64,
    /// Normalized distance where the near-field attraction hands over to the
    /// type-dependent band. Must lie strictly inside (0, 1).
    pub beta: f64,
    pub width: f64,
    pub height: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        SimulationParameters {
            num_particles: 200,
            num_types: 5,
            dt: 0.02,
            r: 80.0,
            friction_factor: 0.3,
            beta: 0.3,
            width: 1280.0,
            height: 800.0,
            seed: None,
        }
    }
}

impl SimulationParameters {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Checks every precondition the force law and integrator rely on.
    /// A run with zero particles is rejected rather than ticking an empty world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_particles == 0 {
            return Err(ConfigError::new("num_particles", "must be at least 1"));
        }
        if self.num_types == 0 {
            return Err(ConfigError::new("num_types", "must be at least 1"));
        }
        finite_positive("dt", self.dt)?;
        finite_positive("r", self.r)?;
        finite_positive("width", self.width)?;
        finite_positive("height", self.height)?;
        if !(self.beta > 0.0 && self.beta < 1.0) {
            return Err(ConfigError::new(
                "beta",
                format!("must be strictly between 0 and 1, got {}", self.beta),
            ));
        }
        if !self.friction_factor.is_finite() {
            return Err(ConfigError::new("friction_factor", "must be finite"));
        }
        if self.friction_factor <= 0.0 || self.friction_factor > 1.0 {
            warn!(
                "friction_factor {} is outside (0, 1]; velocities will not decay normally",
                self.friction_factor
            );
        }
        Ok(())
    }
}

fn finite_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::new(
            field,
            format!("must be a finite number greater than 0, got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimulationParameters::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_particles() {
        let params = SimulationParameters {
            num_particles: 0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(err.field, "num_particles");
    }

    #[test]
    fn rejects_zero_types() {
        let params = SimulationParameters {
            num_types: 0,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "num_types");
    }

    #[test]
    fn rejects_beta_on_or_outside_bounds() {
        for beta in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let params = SimulationParameters {
                beta,
                ..Default::default()
            };
            assert_eq!(params.validate().unwrap_err().field, "beta", "beta={beta}");
        }
    }

    #[test]
    fn rejects_non_positive_radius_and_dt() {
        let params = SimulationParameters {
            r: 0.0,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "r");

        let params = SimulationParameters {
            dt: -0.1,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "dt");

        let params = SimulationParameters {
            width: f64::INFINITY,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "width");
    }

    #[test]
    fn unusual_friction_is_accepted() {
        let params = SimulationParameters {
            friction_factor: 1.5,
            ..Default::default()
        };
        assert!(params.validate().is_ok());

        let params = SimulationParameters {
            friction_factor: f64::NAN,
            ..Default::default()
        };
        assert_eq!(params.validate().unwrap_err().field, "friction_factor");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let params =
            SimulationParameters::from_json_str(r#"{"num_particles": 50, "beta": 0.4, "seed": 7}"#)
                .unwrap();
        assert_eq!(params.num_particles, 50);
        assert_eq!(params.beta, 0.4);
        assert_eq!(params.seed, Some(7));
        assert_eq!(params.num_types, 5);
        assert_eq!(params.r, 80.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = SimulationParameters::from_json_str("{num_particles: }").unwrap_err();
        assert!(matches!(err, SimError::Json(_)));
    }
}
