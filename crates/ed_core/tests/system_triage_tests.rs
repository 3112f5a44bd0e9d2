mod support;

use ed_core::clock::EventKind;
use ed_core::ecs::{ArrivalMode, Patient, PatientStage};
use ed_core::pool::{Capacities, PoolKind, ResourcePools};
use ed_core::protocols::Complaint;
use ed_core::telemetry::EdTelemetry;
use support::schedule::ScheduleRunner;
use support::world::{admit_patient, only_complaint, TestWorldBuilder};

#[test]
fn triage_assigns_complaint_and_primary_doctor() {
    let mut world = TestWorldBuilder::new()
        .deterministic()
        .with_capacities(Capacities {
            doctors: 3,
            ..Default::default()
        })
        .edit_protocols(|tables| only_complaint(tables, 4, Complaint::Laceration))
        .build();
    let patient = admit_patient(&mut world, 1, 4, ArrivalMode::WalkIn);

    let mut runner = ScheduleRunner::new();
    assert!(runner.run_one(&mut world));

    let patient = world.get::<Patient>(patient).expect("patient");
    assert_eq!(patient.stage, PatientStage::Triage);
    assert_eq!(patient.complaint, Some(Complaint::Laceration));
    let doctor = patient.primary_doctor.expect("primary doctor");
    assert!((1..=3).contains(&doctor));
}

#[test]
fn second_patient_waits_for_the_only_nurse() {
    let mut world = TestWorldBuilder::new()
        .deterministic()
        .with_capacities(Capacities {
            nurses: 1,
            ..Default::default()
        })
        .build();
    admit_patient(&mut world, 1, 4, ArrivalMode::WalkIn);
    admit_patient(&mut world, 2, 4, ArrivalMode::WalkIn);

    ScheduleRunner::new().run_clean(&mut world);

    let records = &world.resource::<EdTelemetry>().records;
    assert_eq!(records.len(), 2);
    let first = records.iter().find(|r| r.id == 1).expect("first");
    let second = records.iter().find(|r| r.id == 2).expect("second");
    assert_eq!(first.triage_wait, 0.0);
    assert_eq!(first.bed_at, Some(8.0));
    assert_eq!(second.triage_wait, 8.0);
    assert_eq!(second.bed_at, Some(16.0));
    // Empty plan: 10 evaluation + 5 rest after the bed.
    assert_eq!(second.closed_at, 31.0);

    let nurses = world.resource::<ResourcePools>().pool(PoolKind::Nurse);
    assert_eq!(nurses.busy_time(), 16.0);
    assert_eq!(nurses.queue_length(), 0);
}

#[test]
fn urgent_acuities_get_the_short_triage() {
    let mut world = TestWorldBuilder::new().deterministic().build();
    admit_patient(&mut world, 1, 2, ArrivalMode::WalkIn);

    ScheduleRunner::new().run_clean(&mut world);

    let record = &world.resource::<EdTelemetry>().records[0];
    assert_eq!(record.bed_at, Some(1.0));
}

#[test]
fn acuity_one_skips_the_triage_nurse() {
    let mut world = TestWorldBuilder::new()
        .deterministic()
        .with_capacities(Capacities {
            nurses: 1,
            ..Default::default()
        })
        .build();
    // Occupy the only nurse so any triage request would queue.
    let blocker = world.spawn_empty().id();
    world
        .resource_mut::<ResourcePools>()
        .pool_mut(PoolKind::Nurse)
        .request(blocker, 1, EventKind::TriageStaffAcquired, 0.0)
        .expect("blocker holds nurse");
    admit_patient(&mut world, 1, 1, ArrivalMode::WalkIn);

    ScheduleRunner::new().run_clean(&mut world);

    let record = &world.resource::<EdTelemetry>().records[0];
    assert!(matches!(
        record.complaint,
        Some(Complaint::Trauma) | Some(Complaint::CardiacArrest)
    ));
    assert_eq!(record.bed_at, Some(0.0));
    assert_eq!(record.triage_wait, 0.0);
    assert_eq!(record.closed_at, 15.0);
    let nurses = world.resource::<ResourcePools>().pool(PoolKind::Nurse);
    assert_eq!(nurses.grants(), 1, "only the blocker was granted");
}
