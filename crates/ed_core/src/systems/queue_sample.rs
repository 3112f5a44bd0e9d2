use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::pool::{PoolKind, ResourcePools};
use crate::scenario::QueueSampleConfig;
use crate::telemetry::{EdTelemetry, QueueSample};

/// Record the triage queue (patients waiting for a triage nurse, not nurses needed for
/// procedures) and the treatment queue (patients waiting for a bed), then reschedule.
pub fn queue_sample_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    pools: Res<ResourcePools>,
    config: Res<QueueSampleConfig>,
    mut telemetry: ResMut<EdTelemetry>,
) {
    if event.0.kind != EventKind::QueueSample {
        return;
    }
    let now = clock.now();
    telemetry.queue_samples.push(QueueSample {
        at: now,
        triage_queue: pools
            .pool(PoolKind::Nurse)
            .waiting_for(EventKind::TriageStaffAcquired),
        treatment_queue: pools.pool(PoolKind::Bed).queue_length(),
    });
    clock.schedule_in(config.interval, EventKind::QueueSample, None);
}
