//! Scenario setup: turn [ScenarioParams] into the resources of one run.

mod build;
mod params;

pub use build::build_scenario;
pub use params::{
    AmbulanceConfig, DischargeConfig, QueueSampleConfig, ScenarioParams, SimulationEndTime,
    TriageConfig, DEFAULT_HORIZON,
};
