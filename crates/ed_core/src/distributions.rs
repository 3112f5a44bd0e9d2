//! Random variates for durations, categorical draws and Bernoulli trials.
//!
//! One seeded [SimRng] per run feeds every draw. Because events are processed in a fixed
//! order, a fixed seed reproduces the whole run.

use bevy_ecs::prelude::Resource;
use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Triangular};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tolerance used when checking that probability tables sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Bernoulli trial; `probability` outside [0, 1] saturates.
    pub fn chance(&mut self, probability: f64) -> bool {
        self.0.gen::<f64>() < probability
    }

    pub fn sample(&mut self, variate: &Variate) -> f64 {
        variate.sample(&mut self.0)
    }
}

/// A duration distribution, in simulation minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variate {
    Fixed { value: f64 },
    Uniform { min: f64, max: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Exponential { mean: f64 },
}

impl Variate {
    pub fn fixed(value: f64) -> Self {
        Variate::Fixed { value }
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        Variate::Uniform { min, max }
    }

    pub fn triangular(min: f64, mode: f64, max: f64) -> Self {
        Variate::Triangular { min, mode, max }
    }

    pub fn exponential(mean: f64) -> Self {
        Variate::Exponential { mean }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Variate::Fixed { value } => value,
            Variate::Uniform { min, max } => {
                if max <= min {
                    min
                } else {
                    rng.gen_range(min..max)
                }
            }
            Variate::Triangular { min, mode, max } => {
                if max <= min {
                    return min;
                }
                match Triangular::new(min, max, mode) {
                    Ok(dist) => dist.sample(rng),
                    Err(_) => mode,
                }
            }
            Variate::Exponential { mean } => {
                if mean <= 0.0 {
                    return 0.0;
                }
                match Exp::new(1.0 / mean) {
                    Ok(dist) => dist.sample(rng),
                    Err(_) => mean,
                }
            }
        }
    }

    /// Smallest value the distribution can produce.
    pub fn lower_bound(&self) -> f64 {
        match *self {
            Variate::Fixed { value } => value,
            Variate::Uniform { min, .. } | Variate::Triangular { min, .. } => min,
            Variate::Exponential { .. } => 0.0,
        }
    }

    pub fn validate(&self, context: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidDistribution {
            context: context.to_string(),
            reason: reason.to_string(),
        };
        match *self {
            Variate::Fixed { value } => {
                if !value.is_finite() || value < 0.0 {
                    return Err(invalid("fixed value must be finite and non-negative"));
                }
            }
            Variate::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
                    return Err(invalid("uniform requires 0 <= min <= max"));
                }
            }
            Variate::Triangular { min, mode, max } => {
                if !min.is_finite() || !mode.is_finite() || !max.is_finite() {
                    return Err(invalid("triangular bounds must be finite"));
                }
                if min < 0.0 || mode < min || max < mode {
                    return Err(invalid("triangular requires 0 <= min <= mode <= max"));
                }
            }
            Variate::Exponential { mean } => {
                if !mean.is_finite() || mean <= 0.0 {
                    return Err(invalid("exponential mean must be finite and positive"));
                }
            }
        }
        Ok(())
    }
}

/// Categorical distribution over a fixed list of items.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    items: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> WeightedTable<T> {
    /// Build from `(item, probability)` pairs that must sum to one.
    pub fn new(table: &str, entries: &[(T, f64)]) -> Result<Self, ConfigError> {
        let mut sum = 0.0;
        for &(_, probability) in entries {
            check_probability(table, probability)?;
            sum += probability;
        }
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ConfigError::ProbabilitySum {
                table: table.to_string(),
                sum,
            });
        }
        let index = WeightedIndex::new(entries.iter().map(|&(_, weight)| weight)).map_err(
            |error| ConfigError::InvalidDistribution {
                context: table.to_string(),
                reason: error.to_string(),
            },
        )?;
        Ok(Self {
            items: entries.iter().map(|&(item, _)| item).collect(),
            index,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.items[self.index.sample(rng)]
    }
}

pub fn check_probability(context: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidProbability {
            context: context.to_string(),
            value,
        });
    }
    Ok(())
}
