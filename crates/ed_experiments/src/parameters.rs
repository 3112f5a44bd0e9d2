//! Capacity sweep framework for exploring staffing and bed counts.
//!
//! A [CapacitySpace] holds candidate values per capacity dimension over a base scenario
//! and generates their Cartesian product. Dimensions left empty keep the base value.

use ed_core::pool::Capacities;
use ed_core::scenario::ScenarioParams;
use serde::Serialize;

use crate::error::ReplicationError;
use crate::report::ReplicationReport;
use crate::runner::{run_replications, ReplicationOptions};

/// One combination of swept capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityPoint {
    pub beds: u32,
    pub nurses: u32,
    pub doctors: u32,
    pub ambulances: u32,
}

impl CapacityPoint {
    /// Apply this point to `base`, keeping equipment capacities.
    pub fn apply(&self, base: Capacities) -> Capacities {
        Capacities {
            beds: self.beds,
            nurses: self.nurses,
            doctors: self.doctors,
            ambulances: self.ambulances,
            ..base
        }
    }
}

/// Defines a capacity space for exploration.
#[derive(Debug, Clone, Default)]
pub struct CapacitySpace {
    base: ScenarioParams,
    beds: Vec<u32>,
    nurses: Vec<u32>,
    doctors: Vec<u32>,
    ambulances: Vec<u32>,
}

impl CapacitySpace {
    /// Create a grid over the default scenario.
    pub fn grid() -> Self {
        Self::default()
    }

    /// Use `base` for every point; its capacities fill unswept dimensions.
    pub fn base(mut self, base: ScenarioParams) -> Self {
        self.base = base;
        self
    }

    pub fn beds(mut self, values: Vec<u32>) -> Self {
        self.beds = values;
        self
    }

    pub fn nurses(mut self, values: Vec<u32>) -> Self {
        self.nurses = values;
        self
    }

    pub fn doctors(mut self, values: Vec<u32>) -> Self {
        self.doctors = values;
        self
    }

    pub fn ambulances(mut self, values: Vec<u32>) -> Self {
        self.ambulances = values;
        self
    }

    pub fn base_params(&self) -> &ScenarioParams {
        &self.base
    }

    /// All capacity points, beds varying slowest.
    pub fn generate(&self) -> Vec<CapacityPoint> {
        let caps = self.base.capacities;
        let or_base = |values: &[u32], base: u32| {
            if values.is_empty() {
                vec![base]
            } else {
                values.to_vec()
            }
        };
        let beds = or_base(&self.beds, caps.beds);
        let nurses = or_base(&self.nurses, caps.nurses);
        let doctors = or_base(&self.doctors, caps.doctors);
        let ambulances = or_base(&self.ambulances, caps.ambulances);

        let mut points =
            Vec::with_capacity(beds.len() * nurses.len() * doctors.len() * ambulances.len());
        for &beds in &beds {
            for &nurses in &nurses {
                for &doctors in &doctors {
                    for &ambulances in &ambulances {
                        points.push(CapacityPoint {
                            beds,
                            nurses,
                            doctors,
                            ambulances,
                        });
                    }
                }
            }
        }
        points
    }

    /// Scenario for one point of the space.
    pub fn scenario(&self, point: &CapacityPoint) -> ScenarioParams {
        let mut params = self.base.clone();
        params.capacities = point.apply(params.capacities);
        params
    }
}

/// Replicate every point of `space` and pair it with its report.
///
/// Points run one after another; each point's replications run in parallel.
pub fn run_capacity_sweep(
    space: &CapacitySpace,
    replications: usize,
    options: ReplicationOptions,
) -> Result<Vec<(CapacityPoint, ReplicationReport)>, ReplicationError> {
    let points = space.generate();
    tracing::info!(points = points.len(), replications, "capacity sweep started");
    points
        .into_iter()
        .map(|point| {
            let report = run_replications(&space.scenario(&point), replications, options)?;
            tracing::info!(
                beds = point.beds,
                nurses = point.nurses,
                doctors = point.doctors,
                ambulances = point.ambulances,
                diversions = report.mean("diversions").unwrap_or(0.0),
                "capacity point finished"
            );
            Ok((point, report))
        })
        .collect()
}

/// Index of the point with the fewest mean diversions; ties go to the lower mean total wait.
pub fn find_lowest_diversion(results: &[(CapacityPoint, ReplicationReport)]) -> Option<usize> {
    let key = |report: &ReplicationReport| {
        (
            report.mean("diversions").unwrap_or(f64::INFINITY),
            report.mean("avg_total_wait").unwrap_or(f64::INFINITY),
        )
    };
    results
        .iter()
        .enumerate()
        .min_by(|(_, (_, a)), (_, (_, b))| {
            let (a_div, a_wait) = key(a);
            let (b_div, b_wait) = key(b);
            a_div
                .total_cmp(&b_div)
                .then_with(|| a_wait.total_cmp(&b_wait))
        })
        .map(|(index, _)| index)
}
