use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::distributions::SimRng;
use crate::ecs::{ArrivalMode, Patient};
use crate::spawner::{ArrivalDraw, ArrivalGenerator};
use crate::telemetry::EdTelemetry;

/// Starts the arrival loop and the queue sampler.
pub fn simulation_started_system(event: Res<CurrentEvent>, mut clock: ResMut<SimulationClock>) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }
    let now = clock.now();
    clock.schedule_at(now, EventKind::PatientArrival, None);
    clock.schedule_at(now, EventKind::QueueSample, None);
    tracing::info!(now, "simulation started");
}

pub fn patient_arrival_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    mut generator: ResMut<ArrivalGenerator>,
    mut telemetry: ResMut<EdTelemetry>,
) {
    if event.0.kind != EventKind::PatientArrival {
        return;
    }
    let now = clock.now();
    match generator.draw(now, &mut rng.0) {
        ArrivalDraw::Quiet { resume_at } => {
            telemetry.idle_intervals += 1;
            tracing::warn!(now, resume_at, "no arrivals in current rate interval");
            clock.schedule_at(resume_at, EventKind::PatientArrival, None);
        }
        ArrivalDraw::Patient {
            id,
            mode,
            acuity,
            next_in,
        } => {
            let patient = commands.spawn(Patient::new(id, acuity, mode, now)).id();
            telemetry.record_arrival(mode);
            let first_step = match mode {
                ArrivalMode::Ambulance => EventKind::AmbulanceDispatch,
                ArrivalMode::WalkIn => EventKind::TriageStart,
            };
            clock.resume_patient(0.0, first_step, patient);
            clock.schedule_in(next_in, EventKind::PatientArrival, None);
            tracing::debug!(
                patient = id,
                acuity = acuity.level(),
                mode = mode.name(),
                now,
                "patient arrived"
            );
        }
    }
}
