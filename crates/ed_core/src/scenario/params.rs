use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::distributions::Variate;
use crate::diversion::DiversionPolicy;
use crate::ecs::Acuity;
use crate::error::ConfigError;
use crate::patterns::{AcuityWeights, RateSchedule};
use crate::pool::Capacities;
use crate::protocols::ProtocolTables;

/// Default run length in minutes.
pub const DEFAULT_HORIZON: f64 = 1000.0;

/// Simulation end time in minutes. The runner stops once the next event would be at or
/// after this time.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTime(pub f64);

/// Ambulance crew timings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct AmbulanceConfig {
    pub travel_to_patient: Variate,
    pub on_scene: Variate,
    /// Return trip to the hospital as a multiple of the outbound travel time.
    pub return_factor: f64,
    /// Extra driving after a diversion, on top of the outbound travel time.
    pub diversion_travel: Variate,
}

impl Default for AmbulanceConfig {
    fn default() -> Self {
        Self {
            travel_to_patient: Variate::triangular(5.0, 10.0, 20.0),
            on_scene: Variate::uniform(4.0, 10.0),
            return_factor: 1.2,
            diversion_travel: Variate::triangular(10.0, 15.0, 25.0),
        }
    }
}

/// Triage assessment durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct TriageConfig {
    /// Acuity 2 and 3.
    pub urgent: Variate,
    /// Acuity 4 and 5.
    pub standard: Variate,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            urgent: Variate::uniform(0.75, 2.25),
            standard: Variate::uniform(7.5, 11.25),
        }
    }
}

impl TriageConfig {
    pub fn duration_for(&self, acuity: Acuity) -> &Variate {
        if acuity.is_urgent() {
            &self.urgent
        } else {
            &self.standard
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct DischargeConfig {
    /// Bed cleaning time after a discharge; the bed is unavailable until it ends.
    pub cleaning: Variate,
}

impl Default for DischargeConfig {
    fn default() -> Self {
        Self {
            cleaning: Variate::uniform(3.0, 6.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct QueueSampleConfig {
    pub interval: f64,
}

/// Parameters for building one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub seed: u64,
    /// Run length in minutes.
    pub horizon: f64,
    pub capacities: Capacities,
    pub rate_schedule: RateSchedule,
    pub acuity_weights: AcuityWeights,
    /// Divides the mean inter-arrival gap; values above 1 increase demand.
    pub inter_arrival_divisor: f64,
    pub protocols: ProtocolTables,
    pub ambulance: AmbulanceConfig,
    pub triage: TriageConfig,
    pub discharge: DischargeConfig,
    pub diversion: DiversionPolicy,
    /// Minutes between queue-length samples.
    pub sample_interval: f64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            seed: 0,
            horizon: DEFAULT_HORIZON,
            capacities: Capacities::default(),
            rate_schedule: RateSchedule::default(),
            acuity_weights: AcuityWeights::default(),
            inter_arrival_divisor: 1.0,
            protocols: ProtocolTables::default(),
            ambulance: AmbulanceConfig::default(),
            triage: TriageConfig::default(),
            discharge: DischargeConfig::default(),
            diversion: DiversionPolicy::default(),
            sample_interval: 1.0,
        }
    }
}

impl ScenarioParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_horizon(mut self, minutes: f64) -> Self {
        self.horizon = minutes;
        self
    }

    pub fn with_capacities(mut self, capacities: Capacities) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_rate_schedule(mut self, schedule: RateSchedule) -> Self {
        self.rate_schedule = schedule;
        self
    }

    pub fn with_acuity_weights(mut self, weights: AcuityWeights) -> Self {
        self.acuity_weights = weights;
        self
    }

    pub fn with_inter_arrival_divisor(mut self, divisor: f64) -> Self {
        self.inter_arrival_divisor = divisor;
        self
    }

    pub fn with_protocols(mut self, protocols: ProtocolTables) -> Self {
        self.protocols = protocols;
        self
    }

    pub fn with_diversion_policy(mut self, policy: DiversionPolicy) -> Self {
        self.diversion = policy;
        self
    }

    pub fn with_sample_interval(mut self, minutes: f64) -> Self {
        self.sample_interval = minutes;
        self
    }

    /// Check every parameter before any simulation time advances.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.horizon.is_finite() && self.horizon >= 0.0) {
            return Err(ConfigError::InvalidHorizon(self.horizon));
        }
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(ConfigError::InvalidSampleInterval(self.sample_interval));
        }
        if !(self.inter_arrival_divisor.is_finite() && self.inter_arrival_divisor > 0.0) {
            return Err(ConfigError::InvalidDivisor(self.inter_arrival_divisor));
        }
        self.capacities.validate()?;
        self.rate_schedule.validate()?;
        self.acuity_weights.validate()?;
        self.protocols.validate()?;
        self.diversion.validate()?;

        let ambulance = &self.ambulance;
        ambulance.travel_to_patient.validate("ambulance travel")?;
        ambulance.on_scene.validate("ambulance on scene")?;
        ambulance.diversion_travel.validate("ambulance diversion travel")?;
        if !(ambulance.return_factor.is_finite() && ambulance.return_factor >= 0.0) {
            return Err(ConfigError::InvalidDistribution {
                context: "ambulance return factor".to_string(),
                reason: "must be finite and non-negative".to_string(),
            });
        }
        self.triage.urgent.validate("urgent triage")?;
        self.triage.standard.validate("standard triage")?;
        self.discharge.cleaning.validate("bed cleaning")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolKind;

    #[test]
    fn defaults_are_valid() {
        ScenarioParams::default().validate().expect("valid");
    }

    #[test]
    fn builders_override_fields() {
        let params = ScenarioParams::default()
            .with_seed(9)
            .with_horizon(120.0)
            .with_sample_interval(5.0)
            .with_inter_arrival_divisor(2.0);
        assert_eq!(params.seed, 9);
        assert_eq!(params.horizon, 120.0);
        assert_eq!(params.sample_interval, 5.0);
        assert_eq!(params.inter_arrival_divisor, 2.0);
    }

    #[test]
    fn invalid_scalars_are_rejected() {
        let params = ScenarioParams::default().with_horizon(-1.0);
        assert_eq!(params.validate(), Err(ConfigError::InvalidHorizon(-1.0)));
        let params = ScenarioParams::default().with_sample_interval(0.0);
        assert_eq!(params.validate(), Err(ConfigError::InvalidSampleInterval(0.0)));
        let params = ScenarioParams::default().with_capacities(Capacities {
            doctors: 0,
            ..Capacities::default()
        });
        assert_eq!(
            params.validate(),
            Err(ConfigError::NonPositiveCapacity {
                pool: PoolKind::Doctor
            })
        );
    }

    #[test]
    fn triage_duration_depends_on_acuity() {
        let triage = TriageConfig::default();
        let urgent = Acuity::new(2).expect("acuity");
        let standard = Acuity::new(5).expect("acuity");
        assert_eq!(triage.duration_for(urgent), &Variate::uniform(0.75, 2.25));
        assert_eq!(triage.duration_for(standard), &Variate::uniform(7.5, 11.25));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: ScenarioParams = serde_json::from_str(
            r#"{ "seed": 3, "capacities": { "beds": 12 }, "diversion": { "threshold": 0.9 } }"#,
        )
        .expect("parse");
        assert_eq!(params.seed, 3);
        assert_eq!(params.capacities.beds, 12);
        assert_eq!(params.capacities.nurses, 15);
        assert_eq!(params.diversion.threshold, 0.9);
        assert_eq!(params.diversion.protected_acuity, 2);
        assert_eq!(params.horizon, DEFAULT_HORIZON);
        params.validate().expect("valid");
    }
}
