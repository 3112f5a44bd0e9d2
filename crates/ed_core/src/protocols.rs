//! Clinical protocol tables: chief complaints by acuity, treatment plans by complaint and
//! the resources and durations of each procedure.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::distributions::{check_probability, Variate, WeightedTable};
use crate::ecs::Acuity;
use crate::error::ConfigError;
use crate::pool::PoolKind;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Complaint {
    Trauma,
    CardiacArrest,
    Stroke,
    SevereAsthma,
    BrokenLimb,
    Laceration,
    MildAsthma,
    CommonCold,
}

impl Complaint {
    pub const ALL: [Complaint; 8] = [
        Complaint::Trauma,
        Complaint::CardiacArrest,
        Complaint::Stroke,
        Complaint::SevereAsthma,
        Complaint::BrokenLimb,
        Complaint::Laceration,
        Complaint::MildAsthma,
        Complaint::CommonCold,
    ];

    fn default_plan(self) -> TreatmentPlan {
        use ProcedureKind::*;
        let (evaluation, repetitions, procedures, rest) = match self {
            Complaint::Trauma => (
                Variate::uniform(5.0, 10.0),
                1,
                vec![
                    (CtScan, 0.9),
                    (XRay, 0.6),
                    (IvFluids, 0.9),
                    (MajorSurgery, 0.5),
                    (Medication, 0.8),
                ],
                Variate::uniform(20.0, 40.0),
            ),
            Complaint::CardiacArrest => (
                Variate::uniform(2.0, 5.0),
                1,
                vec![
                    (Resuscitation, 1.0),
                    (Ecg, 1.0),
                    (Oxygen, 0.9),
                    (Medication, 1.0),
                    (MinorSurgery, 0.2),
                ],
                Variate::uniform(20.0, 40.0),
            ),
            Complaint::Stroke => (
                Variate::uniform(5.0, 10.0),
                1,
                vec![
                    (CtScan, 1.0),
                    (BloodWork, 0.9),
                    (Medication, 0.9),
                    (MajorSurgery, 0.15),
                ],
                Variate::uniform(20.0, 40.0),
            ),
            Complaint::SevereAsthma => (
                Variate::uniform(5.0, 10.0),
                2,
                vec![(Oxygen, 1.0), (Medication, 0.9), (BloodWork, 0.3)],
                Variate::uniform(10.0, 20.0),
            ),
            Complaint::BrokenLimb => (
                Variate::uniform(10.0, 20.0),
                1,
                vec![
                    (XRay, 1.0),
                    (Splinting, 0.8),
                    (MinorSurgery, 0.2),
                    (Medication, 0.7),
                ],
                Variate::uniform(10.0, 20.0),
            ),
            Complaint::Laceration => (
                Variate::uniform(5.0, 15.0),
                1,
                vec![(Suturing, 0.9), (Medication, 0.5)],
                Variate::uniform(5.0, 10.0),
            ),
            Complaint::MildAsthma => (
                Variate::uniform(5.0, 15.0),
                1,
                vec![(Oxygen, 0.6), (Medication, 0.9)],
                Variate::uniform(10.0, 20.0),
            ),
            Complaint::CommonCold => (
                Variate::uniform(5.0, 10.0),
                1,
                vec![(Medication, 0.7)],
                Variate::uniform(5.0, 10.0),
            ),
        };
        TreatmentPlan {
            complaint: self,
            evaluation,
            repetitions,
            procedures,
            rest,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    BloodWork,
    Medication,
    Ecg,
    IvFluids,
    Splinting,
    Suturing,
    Resuscitation,
    XRay,
    CtScan,
    Oxygen,
    MinorSurgery,
    MajorSurgery,
}

impl ProcedureKind {
    pub const ALL: [ProcedureKind; 12] = [
        ProcedureKind::BloodWork,
        ProcedureKind::Medication,
        ProcedureKind::Ecg,
        ProcedureKind::IvFluids,
        ProcedureKind::Splinting,
        ProcedureKind::Suturing,
        ProcedureKind::Resuscitation,
        ProcedureKind::XRay,
        ProcedureKind::CtScan,
        ProcedureKind::Oxygen,
        ProcedureKind::MinorSurgery,
        ProcedureKind::MajorSurgery,
    ];

    fn default_spec(self) -> ProcedureSpec {
        let (pool, duration, surgery) = match self {
            ProcedureKind::BloodWork => (PoolKind::Nurse, Variate::uniform(5.0, 10.0), None),
            ProcedureKind::Medication => (PoolKind::Nurse, Variate::uniform(2.0, 5.0), None),
            ProcedureKind::Ecg => (PoolKind::Nurse, Variate::uniform(5.0, 10.0), None),
            ProcedureKind::IvFluids => (PoolKind::Nurse, Variate::uniform(10.0, 20.0), None),
            ProcedureKind::Splinting => (PoolKind::Nurse, Variate::uniform(10.0, 20.0), None),
            ProcedureKind::Suturing => (PoolKind::Doctor, Variate::uniform(10.0, 25.0), None),
            ProcedureKind::Resuscitation => (
                PoolKind::Doctor,
                Variate::triangular(15.0, 30.0, 45.0),
                None,
            ),
            ProcedureKind::XRay => (PoolKind::XRay, Variate::uniform(10.0, 20.0), None),
            ProcedureKind::CtScan => (PoolKind::CtScanner, Variate::uniform(15.0, 30.0), None),
            ProcedureKind::Oxygen => (
                PoolKind::OxygenSupply,
                Variate::uniform(15.0, 30.0),
                None,
            ),
            ProcedureKind::MinorSurgery => (
                PoolKind::Doctor,
                Variate::triangular(30.0, 45.0, 60.0),
                Some(SurgeryRisk {
                    extra_nurse: 0.5,
                    extra_doctor: 0.2,
                    death: 0.01,
                }),
            ),
            ProcedureKind::MajorSurgery => (
                PoolKind::Doctor,
                Variate::triangular(60.0, 90.0, 150.0),
                Some(SurgeryRisk {
                    extra_nurse: 0.9,
                    extra_doctor: 0.5,
                    death: 0.05,
                }),
            ),
        };
        ProcedureSpec {
            kind: self,
            pool,
            duration,
            surgery,
        }
    }
}

/// Extra staffing and mortality for surgical procedures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurgeryRisk {
    pub extra_nurse: f64,
    pub extra_doctor: f64,
    pub death: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcedureSpec {
    pub kind: ProcedureKind,
    /// Pool providing the one unit every instance of the procedure needs.
    pub pool: PoolKind,
    pub duration: Variate,
    #[serde(default)]
    pub surgery: Option<SurgeryRisk>,
}

impl ProcedureSpec {
    /// Units to acquire for one instance, in acquisition order. Same-pool units are merged
    /// into one request and clamped to the pool's capacity.
    pub fn units<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        capacity: impl Fn(PoolKind) -> u32,
    ) -> Vec<(PoolKind, u32)> {
        let mut units: Vec<(PoolKind, u32)> = vec![(self.pool, 1)];
        if let Some(risk) = self.surgery {
            if rng.gen::<f64>() < risk.extra_nurse {
                add_unit(&mut units, PoolKind::Nurse);
            }
            if rng.gen::<f64>() < risk.extra_doctor {
                add_unit(&mut units, PoolKind::Doctor);
            }
        }
        for (pool, count) in units.iter_mut() {
            *count = (*count).min(capacity(*pool));
        }
        units.sort_by_key(|(pool, _)| *pool);
        units
    }
}

fn add_unit(units: &mut Vec<(PoolKind, u32)>, pool: PoolKind) {
    match units.iter_mut().find(|(kind, _)| *kind == pool) {
        Some((_, count)) => *count += 1,
        None => units.push((pool, 1)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    pub complaint: Complaint,
    pub evaluation: Variate,
    /// How many times the procedure list runs.
    pub repetitions: u32,
    /// Ordered `(procedure, probability)` pairs; each is drawn independently per repetition.
    pub procedures: Vec<(ProcedureKind, f64)>,
    pub rest: Variate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintWeights {
    pub acuity: u8,
    pub complaints: Vec<(Complaint, f64)>,
}

/// Configurable protocol tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolTables {
    pub complaints: Vec<ComplaintWeights>,
    pub plans: Vec<TreatmentPlan>,
    pub procedures: Vec<ProcedureSpec>,
    /// Delay between a death in surgery and the bed being given back.
    pub death_reporting_delay: Variate,
}

impl Default for ProtocolTables {
    fn default() -> Self {
        use Complaint::*;
        let complaints = vec![
            (1, vec![(Trauma, 0.5), (CardiacArrest, 0.5)]),
            (2, vec![(Stroke, 0.5), (SevereAsthma, 0.5)]),
            (3, vec![(BrokenLimb, 1.0)]),
            (4, vec![(Laceration, 0.5), (MildAsthma, 0.5)]),
            (5, vec![(CommonCold, 1.0)]),
        ]
        .into_iter()
        .map(|(acuity, complaints)| ComplaintWeights { acuity, complaints })
        .collect();
        Self {
            complaints,
            plans: Complaint::ALL.iter().map(|c| c.default_plan()).collect(),
            procedures: ProcedureKind::ALL.iter().map(|p| p.default_spec()).collect(),
            death_reporting_delay: Variate::fixed(15.0),
        }
    }
}

impl ProtocolTables {
    pub fn plan(&self, complaint: Complaint) -> Option<&TreatmentPlan> {
        self.plans.iter().find(|plan| plan.complaint == complaint)
    }

    pub fn procedure(&self, kind: ProcedureKind) -> Option<&ProcedureSpec> {
        self.procedures.iter().find(|spec| spec.kind == kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for level in Acuity::LEVELS {
            let entry = self.complaints.iter().find(|w| w.acuity == level);
            let sum: f64 = entry
                .map(|w| w.complaints.iter().map(|(_, p)| p).sum())
                .unwrap_or(0.0);
            if (sum - 1.0).abs() > crate::distributions::PROBABILITY_TOLERANCE {
                return Err(ConfigError::ProbabilitySum {
                    table: format!("complaints for acuity {level}"),
                    sum,
                });
            }
        }
        for weights in &self.complaints {
            Acuity::new(weights.acuity)?;
            for &(complaint, probability) in &weights.complaints {
                check_probability(&format!("complaint {complaint:?}"), probability)?;
                if self.plan(complaint).is_none() {
                    return Err(ConfigError::MissingTreatmentPlan(complaint));
                }
            }
        }
        for plan in &self.plans {
            let context = format!("{:?} plan", plan.complaint);
            plan.evaluation.validate(&format!("{context} evaluation"))?;
            plan.rest.validate(&format!("{context} rest"))?;
            if plan.repetitions == 0 {
                return Err(ConfigError::InvalidDistribution {
                    context,
                    reason: "repetitions must be at least 1".to_string(),
                });
            }
            for &(kind, probability) in &plan.procedures {
                check_probability(&format!("{context} {kind:?}"), probability)?;
                if self.procedure(kind).is_none() {
                    return Err(ConfigError::MissingProcedure(kind));
                }
            }
        }
        for spec in &self.procedures {
            if matches!(spec.pool, PoolKind::Bed | PoolKind::Ambulance) {
                return Err(ConfigError::InvalidProcedurePool {
                    procedure: spec.kind,
                    pool: spec.pool,
                });
            }
            spec.duration.validate(&format!("{:?} duration", spec.kind))?;
            if let Some(risk) = spec.surgery {
                let context = format!("{:?} surgery risk", spec.kind);
                check_probability(&context, risk.extra_nurse)?;
                check_probability(&context, risk.extra_doctor)?;
                check_probability(&context, risk.death)?;
            }
        }
        self.death_reporting_delay.validate("death reporting delay")
    }
}

/// Protocol tables with complaint draws prepared for sampling.
#[derive(Debug, Clone, bevy_ecs::prelude::Resource)]
pub struct Protocols {
    tables: ProtocolTables,
    complaint_draws: Vec<(u8, WeightedTable<Complaint>)>,
}

impl Protocols {
    pub fn new(tables: ProtocolTables) -> Result<Self, ConfigError> {
        tables.validate()?;
        let complaint_draws = tables
            .complaints
            .iter()
            .map(|weights| {
                let table = format!("complaints for acuity {}", weights.acuity);
                WeightedTable::new(&table, &weights.complaints).map(|draw| (weights.acuity, draw))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            tables,
            complaint_draws,
        })
    }

    pub fn tables(&self) -> &ProtocolTables {
        &self.tables
    }

    pub fn sample_complaint<R: Rng + ?Sized>(
        &self,
        acuity: Acuity,
        rng: &mut R,
    ) -> Result<Complaint, ConfigError> {
        self.complaint_draws
            .iter()
            .find(|(level, _)| *level == acuity.level())
            .map(|(_, draw)| draw.sample(rng))
            .ok_or(ConfigError::InvalidAcuity(acuity.level()))
    }

    pub fn plan(&self, complaint: Complaint) -> Result<&TreatmentPlan, ConfigError> {
        self.tables
            .plan(complaint)
            .ok_or(ConfigError::MissingTreatmentPlan(complaint))
    }

    pub fn procedure(&self, kind: ProcedureKind) -> Result<&ProcedureSpec, ConfigError> {
        self.tables
            .procedure(kind)
            .ok_or(ConfigError::MissingProcedure(kind))
    }

    pub fn death_reporting_delay(&self) -> &Variate {
        &self.tables.death_reporting_delay
    }
}
