//! Time-of-day arrival patterns.
//!
//! The day is split into hour intervals, each with its own walk-in and ambulance arrival
//! rates (patients per hour). An interval may wrap around midnight (`start > end`).

use serde::{Deserialize, Serialize};

use crate::clock::{MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::distributions::check_probability;
use crate::ecs::{Acuity, ArrivalMode};
use crate::error::ConfigError;

const HOURS_PER_DAY: u8 = 24;

/// Hour of day (0..24) for a simulation time in minutes.
pub fn hour_of_day(now: f64) -> u8 {
    ((now / MINUTES_PER_HOUR).floor() as u64 % HOURS_PER_DAY as u64) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateInterval {
    pub start_hour: u8,
    /// Exclusive; `24` means midnight.
    pub end_hour: u8,
    pub walk_in_per_hour: f64,
    pub ambulance_per_hour: f64,
}

impl RateInterval {
    pub fn new(start_hour: u8, end_hour: u8, walk_in_per_hour: f64, ambulance_per_hour: f64) -> Self {
        Self {
            start_hour,
            end_hour,
            walk_in_per_hour,
            ambulance_per_hour,
        }
    }

    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour < self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    pub fn combined_per_hour(&self) -> f64 {
        self.walk_in_per_hour + self.ambulance_per_hour
    }

    /// Probability that a patient arriving in this interval comes by ambulance.
    pub fn ambulance_share(&self) -> f64 {
        let combined = self.combined_per_hour();
        if combined > 0.0 {
            self.ambulance_per_hour / combined
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSchedule {
    pub intervals: Vec<RateInterval>,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            intervals: vec![
                RateInterval::new(23, 7, 6.0, 14.0),
                RateInterval::new(7, 11, 9.0, 10.0),
                RateInterval::new(11, 17, 15.0, 10.0),
                RateInterval::new(17, 23, 18.0, 12.0),
            ],
        }
    }
}

impl RateSchedule {
    /// A single all-day interval; handy for tests and sweeps.
    pub fn constant(walk_in_per_hour: f64, ambulance_per_hour: f64) -> Self {
        Self {
            intervals: vec![RateInterval::new(0, 24, walk_in_per_hour, ambulance_per_hour)],
        }
    }

    pub fn interval_for_hour(&self, hour: u8) -> Option<&RateInterval> {
        self.intervals.iter().find(|interval| interval.contains(hour))
    }

    pub fn interval_at(&self, now: f64) -> Option<&RateInterval> {
        self.interval_for_hour(hour_of_day(now))
    }

    /// Absolute time (minutes) at which the interval covering `now` ends.
    pub fn next_boundary(&self, now: f64) -> f64 {
        let hour = hour_of_day(now);
        let end_hour = self
            .interval_for_hour(hour)
            .map(|interval| interval.end_hour)
            .unwrap_or(hour + 1);
        let day_start = (now / MINUTES_PER_DAY).floor() * MINUTES_PER_DAY;
        let mut boundary = day_start + end_hour as f64 * MINUTES_PER_HOUR;
        if boundary <= now {
            boundary += MINUTES_PER_DAY;
        }
        boundary
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for interval in &self.intervals {
            let RateInterval {
                start_hour: start,
                end_hour: end,
                ..
            } = *interval;
            let start_ok = start < HOURS_PER_DAY;
            let end_ok = (1..=HOURS_PER_DAY).contains(&end);
            if !start_ok || !end_ok || start == end {
                return Err(ConfigError::InvalidRateInterval { start, end });
            }
            let rates = [interval.walk_in_per_hour, interval.ambulance_per_hour];
            if rates.iter().any(|rate| !rate.is_finite() || *rate < 0.0) {
                return Err(ConfigError::NegativeRate { start });
            }
        }
        for hour in 0..HOURS_PER_DAY {
            match self.intervals.iter().filter(|i| i.contains(hour)).count() {
                0 => return Err(ConfigError::RateScheduleGap { hour }),
                1 => {}
                _ => return Err(ConfigError::RateScheduleOverlap { hour }),
            }
        }
        Ok(())
    }
}

/// Acuity distribution (levels 1 to 5) for each arrival mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcuityWeights {
    pub ambulance: [f64; 5],
    pub walk_in: [f64; 5],
}

impl Default for AcuityWeights {
    fn default() -> Self {
        Self {
            ambulance: [0.2, 0.35, 0.3, 0.15, 0.0],
            walk_in: [0.0, 0.1, 0.3, 0.4, 0.2],
        }
    }
}

impl AcuityWeights {
    pub fn for_mode(&self, mode: ArrivalMode) -> &[f64; 5] {
        match mode {
            ArrivalMode::Ambulance => &self.ambulance,
            ArrivalMode::WalkIn => &self.walk_in,
        }
    }

    /// `(acuity, probability)` pairs for the mode.
    pub fn entries(&self, mode: ArrivalMode) -> Vec<(Acuity, f64)> {
        Acuity::LEVELS
            .iter()
            .zip(self.for_mode(mode))
            .filter_map(|(&level, &weight)| Acuity::new(level).ok().map(|a| (a, weight)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for mode in [ArrivalMode::Ambulance, ArrivalMode::WalkIn] {
            let table = format!("{} acuity weights", mode.name());
            for &weight in self.for_mode(mode) {
                check_probability(&table, weight)?;
            }
            let sum: f64 = self.for_mode(mode).iter().sum();
            if (sum - 1.0).abs() > crate::distributions::PROBABILITY_TOLERANCE {
                return Err(ConfigError::ProbabilitySum { table, sum });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_of_day_wraps_daily() {
        assert_eq!(hour_of_day(0.0), 0);
        assert_eq!(hour_of_day(59.9), 0);
        assert_eq!(hour_of_day(60.0), 1);
        assert_eq!(hour_of_day(MINUTES_PER_DAY + 125.0), 2);
    }

    #[test]
    fn wraparound_interval_covers_night_hours() {
        let schedule = RateSchedule::default();
        for hour in [23, 0, 3, 6] {
            let interval = schedule.interval_for_hour(hour).expect("interval");
            assert_eq!((interval.start_hour, interval.end_hour), (23, 7), "hour {hour}");
            assert_eq!(interval.walk_in_per_hour, 6.0);
            assert_eq!(interval.ambulance_per_hour, 14.0);
        }
        let morning = schedule.interval_for_hour(7).expect("interval");
        assert_eq!((morning.start_hour, morning.end_hour), (7, 11));
    }

    #[test]
    fn default_schedule_is_valid() {
        RateSchedule::default().validate().expect("valid");
        RateSchedule::constant(1.0, 1.0).validate().expect("valid");
    }

    #[test]
    fn gaps_and_overlaps_are_rejected() {
        let mut gap = RateSchedule::default();
        gap.intervals.remove(1);
        assert_eq!(gap.validate(), Err(ConfigError::RateScheduleGap { hour: 7 }));

        let mut overlap = RateSchedule::default();
        overlap.intervals.push(RateInterval::new(10, 12, 1.0, 1.0));
        assert_eq!(
            overlap.validate(),
            Err(ConfigError::RateScheduleOverlap { hour: 10 })
        );
    }

    #[test]
    fn invalid_intervals_and_rates_are_rejected() {
        let mut schedule = RateSchedule::constant(1.0, 1.0);
        schedule.intervals[0].end_hour = 0;
        assert!(matches!(
            schedule.validate(),
            Err(ConfigError::InvalidRateInterval { .. })
        ));

        let schedule = RateSchedule::constant(-1.0, 1.0);
        assert_eq!(schedule.validate(), Err(ConfigError::NegativeRate { start: 0 }));
    }

    #[test]
    fn next_boundary_follows_interval_end() {
        let schedule = RateSchedule::default();
        // 03:00 on day 0 sits in the overnight interval ending at 07:00.
        assert_eq!(schedule.next_boundary(180.0), 420.0);
        // 23:30 on day 0 ends at 07:00 on day 1.
        assert_eq!(schedule.next_boundary(23.5 * 60.0), MINUTES_PER_DAY + 420.0);
        // 12:00 ends at 17:00.
        assert_eq!(schedule.next_boundary(720.0), 1020.0);
        let all_day = RateSchedule::constant(0.0, 0.0);
        assert_eq!(all_day.next_boundary(100.0), MINUTES_PER_DAY);
    }

    #[test]
    fn ambulance_share_handles_zero_rates() {
        assert_eq!(RateInterval::new(0, 24, 0.0, 0.0).ambulance_share(), 0.0);
        assert_eq!(RateInterval::new(0, 24, 6.0, 14.0).ambulance_share(), 0.7);
    }

    #[test]
    fn acuity_weights_default_and_validation() {
        let weights = AcuityWeights::default();
        weights.validate().expect("valid");
        let entries = weights.entries(ArrivalMode::Ambulance);
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].0.level(), 1);

        let bad = AcuityWeights {
            walk_in: [0.5, 0.5, 0.5, 0.0, 0.0],
            ..AcuityWeights::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::ProbabilitySum { .. })
        ));
    }
}
