//! Ambulance diversion: bed-utilization feedback on ambulance admissions.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::Acuity;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiversionDecision {
    Admit,
    Divert,
}

/// The single place that decides whether an ambulance patient is diverted. Evaluated once,
/// when the crew is on scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct DiversionPolicy {
    /// Bed utilization at or above which ambulances are diverted.
    pub threshold: f64,
    /// Acuities at or below this level are always admitted.
    pub protected_acuity: u8,
}

impl Default for DiversionPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            protected_acuity: 2,
        }
    }
}

impl DiversionPolicy {
    pub fn decide(&self, bed_utilization: f64, acuity: Acuity) -> DiversionDecision {
        if bed_utilization < self.threshold || acuity.level() <= self.protected_acuity {
            DiversionDecision::Admit
        } else {
            DiversionDecision::Divert
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::InvalidDiversionThreshold(self.threshold));
        }
        if self.protected_acuity > Acuity::LEVELS.len() as u8 {
            return Err(ConfigError::InvalidAcuity(self.protected_acuity));
        }
        Ok(())
    }
}
