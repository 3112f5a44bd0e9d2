pub mod clock;
pub mod distributions;
pub mod diversion;
pub mod ecs;
pub mod error;
pub mod patterns;
pub mod pool;
pub mod protocols;
pub mod runner;
pub mod scenario;
pub mod spawner;
pub mod systems;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
