//! Virtual clock and continuation queue.
//!
//! Time is measured in simulation minutes. Every pending continuation is an [Event]
//! naming the stage to resume ([EventKind]) and, for patient journeys, the entity it
//! belongs to ([EventSubject]). Events due at the same instant pop in the order they
//! were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};
use ordered_float::OrderedFloat;

pub const MINUTES_PER_HOUR: f64 = 60.0;
pub const MINUTES_PER_DAY: f64 = 24.0 * MINUTES_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    SimulationStarted,
    PatientArrival,
    QueueSample,
    AmbulanceDispatch,
    AmbulanceAssigned,
    AmbulanceOnScene,
    AmbulanceReturned,
    DiversionTravelComplete,
    TriageStart,
    TriageStaffAcquired,
    TriageComplete,
    TreatmentStart,
    BedAcquired,
    EvaluationComplete,
    ProcedureNext,
    ProcedureResourceAcquired,
    ProcedureComplete,
    RestComplete,
    DischargeStart,
    BedCleaned,
    PatientDeceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    Patient(Entity),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub timestamp: f64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
    /// Insertion order; breaks ties between events due at the same time.
    seq: u64,
}

impl Event {
    pub fn patient(&self) -> Option<Entity> {
        match self.subject {
            Some(EventSubject::Patient(entity)) => Some(entity),
            None => None,
        }
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        OrderedFloat(other.timestamp)
            .cmp(&OrderedFloat(self.timestamp))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed; inserted by the runner before each schedule run.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: f64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule a continuation at an absolute time. Times in the past are clamped to `now`.
    pub fn schedule_at(&mut self, timestamp: f64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(!timestamp.is_nan(), "event timestamp must not be NaN");
        let timestamp = if timestamp < self.now { self.now } else { timestamp };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp,
            kind,
            subject,
            seq,
        });
    }

    /// Schedule a continuation `delay` minutes from now.
    pub fn schedule_in(&mut self, delay: f64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now + delay.max(0.0), kind, subject);
    }

    /// Shorthand for resuming a patient's journey `delay` minutes from now.
    pub fn resume_patient(&mut self, delay: f64, kind: EventKind, patient: Entity) {
        self.schedule_in(delay, kind, Some(EventSubject::Patient(patient)));
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    /// Move the clock forward without processing events (used to close a run at its horizon).
    pub fn advance_to(&mut self, timestamp: f64) {
        if timestamp > self.now {
            self.now = timestamp;
        }
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
