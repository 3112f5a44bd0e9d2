#![allow(dead_code)]

use bevy_ecs::prelude::{Entity, World};
use ed_core::clock::{EventKind, SimulationClock};
use ed_core::distributions::Variate;
use ed_core::diversion::DiversionPolicy;
use ed_core::ecs::{Acuity, ArrivalMode, Patient};
use ed_core::pool::Capacities;
use ed_core::protocols::{Complaint, ProcedureKind, ProtocolTables};
use ed_core::scenario::{
    build_scenario, AmbulanceConfig, DischargeConfig, ScenarioParams, TriageConfig,
};

/// Fixed durations used by [TestWorldBuilder::deterministic].
pub const EVALUATION: f64 = 10.0;
pub const PROCEDURE: f64 = 20.0;
pub const REST: f64 = 5.0;
pub const URGENT_TRIAGE: f64 = 1.0;
pub const STANDARD_TRIAGE: f64 = 8.0;
pub const CLEANING: f64 = 4.0;
pub const TRAVEL: f64 = 10.0;
pub const ON_SCENE: f64 = 5.0;
pub const DIVERSION_TRAVEL: f64 = 15.0;
pub const DEATH_REPORTING: f64 = 15.0;

/// Protocol tables with fixed durations and no procedures; tests add the ones they need.
pub fn fixed_protocols() -> ProtocolTables {
    let mut tables = ProtocolTables::default();
    for plan in &mut tables.plans {
        plan.evaluation = Variate::fixed(EVALUATION);
        plan.rest = Variate::fixed(REST);
        plan.repetitions = 1;
        plan.procedures.clear();
    }
    for spec in &mut tables.procedures {
        spec.duration = Variate::fixed(PROCEDURE);
    }
    tables.death_reporting_delay = Variate::fixed(DEATH_REPORTING);
    tables
}

/// Make `complaint` the only complaint at `acuity`.
pub fn only_complaint(tables: &mut ProtocolTables, acuity: u8, complaint: Complaint) {
    if let Some(weights) = tables.complaints.iter_mut().find(|w| w.acuity == acuity) {
        weights.complaints = vec![(complaint, 1.0)];
    }
}

/// Replace the procedure list of `complaint`.
pub fn set_procedures(
    tables: &mut ProtocolTables,
    complaint: Complaint,
    procedures: Vec<(ProcedureKind, f64)>,
) {
    if let Some(plan) = tables.plans.iter_mut().find(|p| p.complaint == complaint) {
        plan.procedures = procedures;
    }
}

/// Builder for reproducible test worlds on top of [ScenarioParams].
#[derive(Debug, Clone, Default)]
pub struct TestWorldBuilder {
    params: ScenarioParams,
}

impl TestWorldBuilder {
    /// Create a new builder with default configuration and seed 42.
    pub fn new() -> Self {
        Self {
            params: ScenarioParams::default().with_seed(42),
        }
    }

    /// Fixed durations everywhere and empty treatment plans.
    pub fn deterministic(mut self) -> Self {
        self.params.protocols = fixed_protocols();
        self.params.triage = TriageConfig {
            urgent: Variate::fixed(URGENT_TRIAGE),
            standard: Variate::fixed(STANDARD_TRIAGE),
        };
        self.params.discharge = DischargeConfig {
            cleaning: Variate::fixed(CLEANING),
        };
        self.params.ambulance = AmbulanceConfig {
            travel_to_patient: Variate::fixed(TRAVEL),
            on_scene: Variate::fixed(ON_SCENE),
            return_factor: 1.2,
            diversion_travel: Variate::fixed(DIVERSION_TRAVEL),
        };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn with_capacities(mut self, capacities: Capacities) -> Self {
        self.params.capacities = capacities;
        self
    }

    pub fn with_protocols(mut self, protocols: ProtocolTables) -> Self {
        self.params.protocols = protocols;
        self
    }

    /// Edit the current protocol tables in place.
    pub fn edit_protocols(mut self, edit: impl FnOnce(&mut ProtocolTables)) -> Self {
        edit(&mut self.params.protocols);
        self
    }

    pub fn with_diversion_policy(mut self, policy: DiversionPolicy) -> Self {
        self.params.diversion = policy;
        self
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.params.horizon = horizon;
        self
    }

    pub fn params(&self) -> &ScenarioParams {
        &self.params
    }

    /// Build the ECS world with the configured resources. No events are scheduled.
    pub fn build(self) -> World {
        let mut world = World::new();
        build_scenario(&mut world, self.params).expect("test scenario should be valid");
        world
    }
}

/// Spawn a patient arriving now and schedule its first journey step.
pub fn admit_patient(world: &mut World, id: u64, acuity: u8, mode: ArrivalMode) -> Entity {
    let now = world.resource::<SimulationClock>().now();
    let acuity = Acuity::new(acuity).expect("acuity");
    let entity = world.spawn(Patient::new(id, acuity, mode, now)).id();
    let first = match mode {
        ArrivalMode::Ambulance => EventKind::AmbulanceDispatch,
        ArrivalMode::WalkIn => EventKind::TriageStart,
    };
    world
        .resource_mut::<SimulationClock>()
        .resume_patient(0.0, first, entity);
    entity
}
