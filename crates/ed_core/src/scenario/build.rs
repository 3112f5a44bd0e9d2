use bevy_ecs::prelude::World;

use crate::clock::SimulationClock;
use crate::distributions::SimRng;
use crate::error::{ConfigError, SimFaults};
use crate::pool::ResourcePools;
use crate::protocols::Protocols;
use crate::scenario::params::{QueueSampleConfig, ScenarioParams, SimulationEndTime};
use crate::spawner::ArrivalGenerator;
use crate::telemetry::{EdTelemetry, RunInfo};

/// Validate `params` and insert every resource a run needs into `world`.
///
/// Nothing is inserted when validation fails.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<(), ConfigError> {
    params.validate()?;

    let pools = ResourcePools::from_capacities(&params.capacities)?;
    let protocols = Protocols::new(params.protocols)?;
    let arrivals = ArrivalGenerator::new(
        params.rate_schedule,
        &params.acuity_weights,
        params.inter_arrival_divisor,
    )?;

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimulationEndTime(params.horizon));
    world.insert_resource(SimRng::seeded(params.seed));
    world.insert_resource(SimFaults::default());
    world.insert_resource(EdTelemetry::default());
    world.insert_resource(RunInfo {
        seed: params.seed,
        horizon: params.horizon,
        capacities: params.capacities,
    });
    world.insert_resource(pools);
    world.insert_resource(protocols);
    world.insert_resource(arrivals);
    world.insert_resource(params.ambulance);
    world.insert_resource(params.triage);
    world.insert_resource(params.discharge);
    world.insert_resource(params.diversion);
    world.insert_resource(QueueSampleConfig {
        interval: params.sample_interval,
    });

    tracing::debug!(
        seed = params.seed,
        horizon = params.horizon,
        beds = params.capacities.beds,
        nurses = params.capacities.nurses,
        doctors = params.capacities.doctors,
        ambulances = params.capacities.ambulances,
        "scenario built"
    );
    Ok(())
}
