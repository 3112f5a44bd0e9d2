//! Performance benchmarks for ed_core using Criterion.rs.

use bevy_ecs::prelude::{Entity, World};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ed_core::clock::{EventKind, SimulationClock};
use ed_core::distributions::SimRng;
use ed_core::patterns::{AcuityWeights, RateSchedule};
use ed_core::pool::{Capacities, PoolKind, ResourcePools};
use ed_core::runner::run_simulation;
use ed_core::scenario::ScenarioParams;
use ed_core::spawner::ArrivalGenerator;

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("shift", 480.0), ("day", 1440.0), ("three_days", 4320.0)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, horizon) in scenarios {
        group.bench_with_input(BenchmarkId::from_parameter(name), &horizon, |b, &horizon| {
            b.iter(|| {
                let params = ScenarioParams::default().with_seed(42).with_horizon(horizon);
                black_box(run_simulation(params).expect("run"));
            });
        });
    }
    group.finish();
}

fn bench_pool_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_contention");
    for waiters in [10u32, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(waiters),
            &waiters,
            |b, &waiters| {
                b.iter(|| {
                    let mut pools = ResourcePools::from_capacities(&Capacities {
                        beds: 4,
                        ..Default::default()
                    })
                    .expect("pools");
                    let mut clock = SimulationClock::default();
                    for id in 0..waiters {
                        let _ = pools.request(
                            PoolKind::Bed,
                            Entity::from_raw(id),
                            1,
                            EventKind::BedAcquired,
                            &mut clock,
                        );
                    }
                    for id in 0..waiters {
                        let _ = pools.release(PoolKind::Bed, Entity::from_raw(id), &mut clock);
                    }
                    black_box(clock.pending());
                });
            },
        );
    }
    group.finish();
}

fn bench_arrival_draws(c: &mut Criterion) {
    let mut generator =
        ArrivalGenerator::new(RateSchedule::default(), &AcuityWeights::default(), 1.0)
            .expect("generator");
    let mut rng = SimRng::seeded(42);
    let mut now = 0.0;
    c.bench_function("arrival_draw", |b| {
        b.iter(|| {
            now = (now + 1.7) % 1440.0;
            black_box(generator.draw(now, &mut rng.0));
        });
    });
}

criterion_group!(
    benches,
    bench_simulation_run,
    bench_pool_contention,
    bench_arrival_draws
);
criterion_main!(benches);
