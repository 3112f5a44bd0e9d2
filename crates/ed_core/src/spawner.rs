//! Arrival generator: creates patients at a time-of-day dependent rate.
//!
//! The generator is driven by `PatientArrival` events. Each firing either produces one
//! patient and the gap to the next arrival, or, when the current interval has no arrivals,
//! the time at which the rates next change.

use bevy_ecs::prelude::Resource;
use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::clock::MINUTES_PER_HOUR;
use crate::distributions::WeightedTable;
use crate::ecs::{Acuity, ArrivalMode};
use crate::error::ConfigError;
use crate::patterns::{AcuityWeights, RateSchedule};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrivalDraw {
    Patient {
        id: u64,
        mode: ArrivalMode,
        acuity: Acuity,
        /// Minutes until the next arrival.
        next_in: f64,
    },
    /// No arrivals in the current interval; check again at `resume_at`.
    Quiet { resume_at: f64 },
}

#[derive(Debug, Clone, Resource)]
pub struct ArrivalGenerator {
    schedule: RateSchedule,
    inter_arrival_divisor: f64,
    ambulance_acuity: WeightedTable<Acuity>,
    walk_in_acuity: WeightedTable<Acuity>,
    next_id: u64,
}

impl ArrivalGenerator {
    pub fn new(
        schedule: RateSchedule,
        weights: &AcuityWeights,
        inter_arrival_divisor: f64,
    ) -> Result<Self, ConfigError> {
        schedule.validate()?;
        weights.validate()?;
        if !(inter_arrival_divisor.is_finite() && inter_arrival_divisor > 0.0) {
            return Err(ConfigError::InvalidDivisor(inter_arrival_divisor));
        }
        Ok(Self {
            ambulance_acuity: WeightedTable::new(
                "ambulance acuity weights",
                &weights.entries(ArrivalMode::Ambulance),
            )?,
            walk_in_acuity: WeightedTable::new(
                "walk_in acuity weights",
                &weights.entries(ArrivalMode::WalkIn),
            )?,
            schedule,
            inter_arrival_divisor,
            next_id: 1,
        })
    }

    pub fn schedule(&self) -> &RateSchedule {
        &self.schedule
    }

    /// Number of patients generated so far.
    pub fn generated(&self) -> u64 {
        self.next_id - 1
    }

    /// Mean minutes between arrivals for a combined hourly rate.
    pub fn mean_gap(&self, combined_per_hour: f64) -> f64 {
        (MINUTES_PER_HOUR / combined_per_hour) / self.inter_arrival_divisor
    }

    pub fn draw<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) -> ArrivalDraw {
        let (combined, ambulance_share) = match self.schedule.interval_at(now) {
            Some(interval) => (interval.combined_per_hour(), interval.ambulance_share()),
            None => (0.0, 0.0),
        };
        if combined <= 0.0 {
            return ArrivalDraw::Quiet {
                resume_at: self.schedule.next_boundary(now),
            };
        }

        let mode = if rng.gen::<f64>() < ambulance_share {
            ArrivalMode::Ambulance
        } else {
            ArrivalMode::WalkIn
        };
        let acuity = match mode {
            ArrivalMode::Ambulance => self.ambulance_acuity.sample(rng),
            ArrivalMode::WalkIn => self.walk_in_acuity.sample(rng),
        };
        let mean = self.mean_gap(combined);
        let next_in = Exp::new(1.0 / mean)
            .map(|gap| gap.sample(rng))
            .unwrap_or(mean);

        let id = self.next_id;
        self.next_id += 1;
        ArrivalDraw::Patient {
            id,
            mode,
            acuity,
            next_in,
        }
    }
}
