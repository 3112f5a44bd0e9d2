//! Finite-capacity resource pools with FIFO admission.
//!
//! Every contended resource in the department (beds, nurses, doctors, ambulances and each
//! equipment type) is a [ResourcePool]. A request gets its units right away whenever they
//! are free, otherwise it waits in line. A release hands the freed units, in the same
//! scheduler step, to the longest-waiting requests that fit. Requests are all-or-nothing,
//! so a waiting multi-unit request never holds part of its units.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{EventKind, SimulationClock};
use crate::error::ConfigError;

/// Pool kinds. Declaration order is the global acquisition order: a process that holds
/// several units at once acquires them in ascending order, which rules out wait cycles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Bed,
    Nurse,
    Doctor,
    Ambulance,
    XRay,
    CtScanner,
    OxygenSupply,
}

impl PoolKind {
    pub const ALL: [PoolKind; 7] = [
        PoolKind::Bed,
        PoolKind::Nurse,
        PoolKind::Doctor,
        PoolKind::Ambulance,
        PoolKind::XRay,
        PoolKind::CtScanner,
        PoolKind::OxygenSupply,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PoolKind::Bed => "bed",
            PoolKind::Nurse => "nurse",
            PoolKind::Doctor => "doctor",
            PoolKind::Ambulance => "ambulance",
            PoolKind::XRay => "xray",
            PoolKind::CtScanner => "ct_scanner",
            PoolKind::OxygenSupply => "oxygen_supply",
        }
    }

    pub fn is_equipment(self) -> bool {
        matches!(
            self,
            PoolKind::XRay | PoolKind::CtScanner | PoolKind::OxygenSupply
        )
    }
}

/// Unit counts for every pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capacities {
    pub beds: u32,
    pub nurses: u32,
    pub doctors: u32,
    pub ambulances: u32,
    pub xray_machines: u32,
    pub ct_scanners: u32,
    pub oxygen_supplies: u32,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            beds: 40,
            nurses: 15,
            doctors: 7,
            ambulances: 10,
            xray_machines: 2,
            ct_scanners: 1,
            oxygen_supplies: 6,
        }
    }
}

impl Capacities {
    pub fn get(&self, kind: PoolKind) -> u32 {
        match kind {
            PoolKind::Bed => self.beds,
            PoolKind::Nurse => self.nurses,
            PoolKind::Doctor => self.doctors,
            PoolKind::Ambulance => self.ambulances,
            PoolKind::XRay => self.xray_machines,
            PoolKind::CtScanner => self.ct_scanners,
            PoolKind::OxygenSupply => self.oxygen_supplies,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in PoolKind::ALL {
            if self.get(kind) == 0 {
                return Err(ConfigError::NonPositiveCapacity { pool: kind });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("{holder:?} released a {pool:?} unit it does not hold")]
    NotHeld { pool: PoolKind, holder: Entity },
    #[error("{pool:?} request for {units} units exceeds capacity {capacity}")]
    RequestExceedsCapacity {
        pool: PoolKind,
        units: u32,
        capacity: u32,
    },
    #[error("{pool:?} request for zero units")]
    ZeroUnits { pool: PoolKind },
    #[error("{pool:?} has {in_use} units in use, capacity is {capacity}")]
    OverCapacity {
        pool: PoolKind,
        in_use: u32,
        capacity: u32,
    },
}

/// Units currently held by one process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hold {
    pub holder: Entity,
    pub units: u32,
    pub acquired_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Waiter {
    holder: Entity,
    units: u32,
    resume: EventKind,
}

/// A waiting request that has just been admitted; the holder resumes at `resume`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grant {
    pub hold: Hold,
    pub resume: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Granted(Hold),
    Queued { position: usize },
}

#[derive(Debug, Clone)]
pub struct ResourcePool {
    kind: PoolKind,
    capacity: u32,
    in_use: u32,
    holds: Vec<Hold>,
    waiting: VecDeque<Waiter>,
    busy_time: f64,
    grants: u64,
}

impl ResourcePool {
    pub fn new(kind: PoolKind, capacity: u32) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity { pool: kind });
        }
        Ok(Self {
            kind,
            capacity,
            in_use: 0,
            holds: Vec::new(),
            waiting: VecDeque::new(),
            busy_time: 0.0,
            grants: 0,
        })
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn in_use(&self) -> u32 {
        self.in_use
    }

    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }

    /// Waiters that will resume at `resume` once admitted.
    pub fn waiting_for(&self, resume: EventKind) -> usize {
        self.waiting
            .iter()
            .filter(|waiter| waiter.resume == resume)
            .count()
    }

    /// Fraction of units currently held.
    pub fn utilization(&self) -> f64 {
        self.in_use as f64 / self.capacity as f64
    }

    /// Unit-minutes accumulated by released holds.
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Unit-minutes including holds still open at `now`.
    pub fn busy_time_at(&self, now: f64) -> f64 {
        let open: f64 = self
            .holds
            .iter()
            .map(|hold| (now - hold.acquired_at).max(0.0) * hold.units as f64)
            .sum();
        self.busy_time + open
    }

    pub fn grants(&self) -> u64 {
        self.grants
    }

    pub fn holds(&self) -> &[Hold] {
        &self.holds
    }

    pub fn is_holding(&self, holder: Entity) -> bool {
        self.holds.iter().any(|hold| hold.holder == holder)
    }

    pub fn request(
        &mut self,
        holder: Entity,
        units: u32,
        resume: EventKind,
        now: f64,
    ) -> Result<Admission, PoolError> {
        if units == 0 {
            return Err(PoolError::ZeroUnits { pool: self.kind });
        }
        if units > self.capacity {
            return Err(PoolError::RequestExceedsCapacity {
                pool: self.kind,
                units,
                capacity: self.capacity,
            });
        }
        if self.in_use + units <= self.capacity {
            let hold = self.grant(holder, units, now)?;
            return Ok(Admission::Granted(hold));
        }
        self.waiting.push_back(Waiter {
            holder,
            units,
            resume,
        });
        Ok(Admission::Queued {
            position: self.waiting.len() - 1,
        })
    }

    /// Release `holder`'s oldest hold and admit, in arrival order, every waiter that now fits.
    pub fn release(&mut self, holder: Entity, now: f64) -> Result<Vec<Grant>, PoolError> {
        let position = self
            .holds
            .iter()
            .position(|hold| hold.holder == holder)
            .ok_or(PoolError::NotHeld {
                pool: self.kind,
                holder,
            })?;
        let hold = self.holds.remove(position);
        self.in_use -= hold.units;
        self.busy_time += (now - hold.acquired_at).max(0.0) * hold.units as f64;

        let mut admitted = Vec::new();
        let mut index = 0;
        while index < self.waiting.len() && self.in_use < self.capacity {
            let waiter = self.waiting[index];
            if self.in_use + waiter.units > self.capacity {
                index += 1;
                continue;
            }
            self.waiting.remove(index);
            let hold = self.grant(waiter.holder, waiter.units, now)?;
            admitted.push(Grant {
                hold,
                resume: waiter.resume,
            });
        }
        Ok(admitted)
    }

    fn grant(&mut self, holder: Entity, units: u32, now: f64) -> Result<Hold, PoolError> {
        if self.in_use + units > self.capacity {
            return Err(PoolError::OverCapacity {
                pool: self.kind,
                in_use: self.in_use + units,
                capacity: self.capacity,
            });
        }
        self.in_use += units;
        self.grants += 1;
        let hold = Hold {
            holder,
            units,
            acquired_at: now,
        };
        self.holds.push(hold);
        Ok(hold)
    }
}

/// Busy-time summary for one pool at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoolUsage {
    pub kind: PoolKind,
    pub capacity: u32,
    pub busy_time: f64,
    pub grants: u64,
}

/// All pools of one run, indexed by [PoolKind].
#[derive(Debug, Clone, Resource)]
pub struct ResourcePools {
    pools: Vec<ResourcePool>,
}

impl ResourcePools {
    pub fn from_capacities(capacities: &Capacities) -> Result<Self, ConfigError> {
        let pools = PoolKind::ALL
            .iter()
            .map(|&kind| ResourcePool::new(kind, capacities.get(kind)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { pools })
    }

    pub fn pool(&self, kind: PoolKind) -> &ResourcePool {
        &self.pools[kind.index()]
    }

    pub fn pool_mut(&mut self, kind: PoolKind) -> &mut ResourcePool {
        &mut self.pools[kind.index()]
    }

    /// Request units for a patient; the patient resumes at `resume` once they are held
    /// (immediately when free, otherwise when a release admits it).
    pub fn request(
        &mut self,
        kind: PoolKind,
        holder: Entity,
        units: u32,
        resume: EventKind,
        clock: &mut SimulationClock,
    ) -> Result<Admission, PoolError> {
        let admission = self
            .pool_mut(kind)
            .request(holder, units, resume, clock.now())?;
        match admission {
            Admission::Granted(_) => clock.resume_patient(0.0, resume, holder),
            Admission::Queued { position } => {
                tracing::trace!(pool = kind.name(), ?holder, position, "request queued");
            }
        }
        Ok(admission)
    }

    /// Release a patient's hold on `kind`; admitted waiters resume at the current time.
    pub fn release(
        &mut self,
        kind: PoolKind,
        holder: Entity,
        clock: &mut SimulationClock,
    ) -> Result<(), PoolError> {
        let grants = self.pool_mut(kind).release(holder, clock.now())?;
        for grant in grants {
            clock.resume_patient(0.0, grant.resume, grant.hold.holder);
        }
        Ok(())
    }

    pub fn usage_at(&self, now: f64) -> Vec<PoolUsage> {
        self.pools
            .iter()
            .map(|pool| PoolUsage {
                kind: pool.kind(),
                capacity: pool.capacity(),
                busy_time: pool.busy_time_at(now),
                grants: pool.grants(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(raw: u32) -> Entity {
        Entity::from_raw(raw)
    }

    #[test]
    fn grants_until_capacity_then_queues() {
        let mut pool = ResourcePool::new(PoolKind::Bed, 2).expect("pool");
        let resume = EventKind::BedAcquired;

        assert!(matches!(
            pool.request(entity(1), 1, resume, 0.0),
            Ok(Admission::Granted(_))
        ));
        assert!(matches!(
            pool.request(entity(2), 1, resume, 0.0),
            Ok(Admission::Granted(_))
        ));
        assert_eq!(
            pool.request(entity(3), 1, resume, 0.0),
            Ok(Admission::Queued { position: 0 })
        );
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.queue_length(), 1);
        assert_eq!(pool.utilization(), 1.0);
    }

    #[test]
    fn release_hands_unit_to_longest_waiter() {
        let mut pool = ResourcePool::new(PoolKind::Nurse, 1).expect("pool");
        let resume = EventKind::TriageStaffAcquired;
        pool.request(entity(1), 1, resume, 0.0).expect("first");
        pool.request(entity(2), 1, resume, 1.0).expect("second");
        pool.request(entity(3), 1, resume, 2.0).expect("third");

        let grants = pool.release(entity(1), 5.0).expect("release");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].hold.holder, entity(2));
        assert_eq!(grants[0].hold.acquired_at, 5.0);
        assert_eq!(pool.in_use(), 1);
        assert!(pool.is_holding(entity(2)));
        assert!(!pool.is_holding(entity(3)));

        // A new requester cannot take the unit that was handed over.
        assert_eq!(
            pool.request(entity(4), 1, resume, 5.0),
            Ok(Admission::Queued { position: 1 })
        );
    }

    #[test]
    fn free_unit_is_not_held_back_by_larger_waiter() {
        let mut pool = ResourcePool::new(PoolKind::Doctor, 2).expect("pool");
        let resume = EventKind::ProcedureResourceAcquired;
        pool.request(entity(1), 1, resume, 0.0).expect("first");
        assert_eq!(
            pool.request(entity(2), 2, resume, 0.0),
            Ok(Admission::Queued { position: 0 })
        );
        assert!(matches!(
            pool.request(entity(3), 1, resume, 0.0),
            Ok(Admission::Granted(_))
        ));
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.queue_length(), 1);

        // One unit frees up: the surgery team still does not fit and keeps its place.
        let grants = pool.release(entity(1), 3.0).expect("release");
        assert!(grants.is_empty());
        assert_eq!(pool.in_use(), 1);

        let grants = pool.release(entity(3), 4.0).expect("release");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].hold.holder, entity(2));
        assert_eq!(grants[0].hold.units, 2);
        assert_eq!(pool.in_use(), 2);
    }

    #[test]
    fn release_admits_longest_waiting_requests_that_fit() {
        let mut pool = ResourcePool::new(PoolKind::Nurse, 3).expect("pool");
        let resume = EventKind::ProcedureResourceAcquired;
        pool.request(entity(1), 3, resume, 0.0).expect("all units");
        pool.request(entity(2), 3, resume, 1.0).expect("large");
        pool.request(entity(3), 1, resume, 2.0).expect("single");
        pool.request(entity(4), 2, resume, 3.0).expect("pair");
        pool.request(entity(5), 1, resume, 4.0).expect("late single");

        // Everything frees up: the head takes all three units and the rest keep waiting.
        let grants = pool.release(entity(1), 5.0).expect("release");
        let admitted: Vec<Entity> = grants.iter().map(|g| g.hold.holder).collect();
        assert_eq!(admitted, vec![entity(2)]);

        // The three-unit hold ends: the waiters fit in arrival order.
        let grants = pool.release(entity(2), 9.0).expect("release");
        let admitted: Vec<Entity> = grants.iter().map(|g| g.hold.holder).collect();
        assert_eq!(admitted, vec![entity(3), entity(4)]);
        assert_eq!(pool.in_use(), 3);
        assert_eq!(pool.queue_length(), 1);
    }

    #[test]
    fn waiting_for_counts_by_resume_stage() {
        let mut pool = ResourcePool::new(PoolKind::Nurse, 1).expect("pool");
        pool.request(entity(1), 1, EventKind::TriageStaffAcquired, 0.0)
            .expect("triage");
        pool.request(entity(2), 1, EventKind::ProcedureResourceAcquired, 0.0)
            .expect("medication");
        pool.request(entity(3), 1, EventKind::TriageStaffAcquired, 0.0)
            .expect("triage");
        assert_eq!(pool.queue_length(), 2);
        assert_eq!(pool.waiting_for(EventKind::TriageStaffAcquired), 1);
        assert_eq!(pool.waiting_for(EventKind::ProcedureResourceAcquired), 1);
    }

    #[test]
    fn busy_time_accumulates_per_hold_and_units() {
        let mut pool = ResourcePool::new(PoolKind::Doctor, 3).expect("pool");
        let resume = EventKind::ProcedureResourceAcquired;
        pool.request(entity(1), 2, resume, 10.0).expect("pair");
        pool.request(entity(2), 1, resume, 12.0).expect("single");
        pool.release(entity(1), 20.0).expect("release");
        assert_eq!(pool.busy_time(), 20.0);
        // Entity 2 is still holding: 8 more unit-minutes at t=20.
        assert_eq!(pool.busy_time_at(20.0), 28.0);
    }

    #[test]
    fn releasing_unknown_hold_is_an_error() {
        let mut pool = ResourcePool::new(PoolKind::Ambulance, 1).expect("pool");
        assert_eq!(
            pool.release(entity(9), 0.0),
            Err(PoolError::NotHeld {
                pool: PoolKind::Ambulance,
                holder: entity(9)
            })
        );
    }

    #[test]
    fn rejects_zero_and_oversized_requests() {
        let mut pool = ResourcePool::new(PoolKind::XRay, 1).expect("pool");
        let resume = EventKind::ProcedureResourceAcquired;
        assert!(matches!(
            pool.request(entity(1), 0, resume, 0.0),
            Err(PoolError::ZeroUnits { .. })
        ));
        assert!(matches!(
            pool.request(entity(1), 2, resume, 0.0),
            Err(PoolError::RequestExceedsCapacity { .. })
        ));
    }

    #[test]
    fn zero_capacity_is_a_config_error() {
        assert_eq!(
            ResourcePool::new(PoolKind::Bed, 0).err(),
            Some(ConfigError::NonPositiveCapacity {
                pool: PoolKind::Bed
            })
        );
    }

    #[test]
    fn pools_schedule_resume_for_immediate_and_deferred_grants() {
        let mut pools = ResourcePools::from_capacities(&Capacities {
            beds: 1,
            ..Capacities::default()
        })
        .expect("pools");
        let mut clock = SimulationClock::default();

        pools
            .request(PoolKind::Bed, entity(1), 1, EventKind::BedAcquired, &mut clock)
            .expect("first");
        pools
            .request(PoolKind::Bed, entity(2), 1, EventKind::BedAcquired, &mut clock)
            .expect("second");
        assert_eq!(clock.pending(), 1);

        let first = clock.pop_next().expect("resume first");
        assert_eq!(first.patient(), Some(entity(1)));

        clock.advance_to(7.0);
        pools
            .release(PoolKind::Bed, entity(1), &mut clock)
            .expect("release");
        let second = clock.pop_next().expect("resume second");
        assert_eq!(second.kind, EventKind::BedAcquired);
        assert_eq!(second.patient(), Some(entity(2)));
        assert_eq!(second.timestamp, 7.0);
    }
}
