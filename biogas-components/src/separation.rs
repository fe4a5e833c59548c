//! Sequential liquid/sludge separation of the digestate.
//!
//! Only the liquid passes from one stage to the next. An active stage
//! removes a share of the current dry matter as sludge at a fixed sludge
//! dry-matter share:
//!
//! ```text
//! removed  = DM · dm_removal
//! sludge   = removed / sludge_dm
//! liquid'  = liquid − sludge
//! DM'      = DM − removed
//! ```
//!
//! An absent stage passes the liquid through unchanged.

mod result;

use std::convert::Infallible;

use biogas_core::{
    Model,
    constraint::{Constrained, NonNegative, StrictlyPositive, UnitInterval},
};
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Ratio},
        ratio::percent,
    },
};

use crate::{
    error::ValidationError,
    ledger::Ledger,
    units::{fraction_of, in_tonnes_per_annum},
    warning::DegenerateResultWarning,
};

pub use result::{CascadeResult, StageResult, StreamSummary};

/// Sludge dry matter assumed when a stage record leaves it out, %.
pub const DEFAULT_SLUDGE_DM_PERCENT: f64 = 20.0;

/// One separation stage as supplied by an external loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationStageRecord {
    #[serde(default)]
    pub present: bool,
    /// Share of the incoming dry matter removed as sludge, %.
    #[serde(default)]
    pub dm_removal_percent: f64,
    /// Dry matter of the removed sludge, %.
    #[serde(default = "default_sludge_dm_percent")]
    pub sludge_dm_percent: f64,
}

fn default_sludge_dm_percent() -> f64 {
    DEFAULT_SLUDGE_DM_PERCENT
}

impl Default for SeparationStageRecord {
    fn default() -> Self {
        Self {
            present: false,
            dm_removal_percent: 0.0,
            sludge_dm_percent: DEFAULT_SLUDGE_DM_PERCENT,
        }
    }
}

/// A validated separation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeparationStage {
    /// The stage is not installed; liquid passes through.
    Absent,
    /// The stage separates sludge from the liquid.
    Active {
        dm_removal: Constrained<Ratio, UnitInterval>,
        sludge_dry_matter: Constrained<Ratio, StrictlyPositive>,
    },
}

impl SeparationStage {
    /// Creates an active stage.
    ///
    /// `stage` is the 1-based position used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SeparationStage`] if the removal share lies
    /// outside `[0, 1]`, or the sludge dry-matter share is not in `(0, 1]`.
    pub fn active(
        stage: usize,
        dm_removal: Ratio,
        sludge_dry_matter: Ratio,
    ) -> Result<Self, ValidationError> {
        let dm_removal = UnitInterval::new(dm_removal).map_err(ValidationError::stage(
            stage,
            "dry matter removal",
            dm_removal.get::<percent>(),
        ))?;

        let sludge_error =
            || ValidationError::stage(stage, "sludge dry matter", sludge_dry_matter.get::<percent>());
        UnitInterval::new(sludge_dry_matter).map_err(sludge_error())?;
        let sludge_dry_matter = StrictlyPositive::new(sludge_dry_matter).map_err(sludge_error())?;

        Ok(Self::Active {
            dm_removal,
            sludge_dry_matter,
        })
    }

    /// Validates a record for the stage at 1-based position `stage`.
    ///
    /// The parameters of an absent stage are ignored.
    ///
    /// # Errors
    ///
    /// See [`SeparationStage::active`].
    pub fn from_record(stage: usize, record: SeparationStageRecord) -> Result<Self, ValidationError> {
        if !record.present {
            return Ok(Self::Absent);
        }
        Self::active(
            stage,
            Ratio::new::<percent>(record.dm_removal_percent),
            Ratio::new::<percent>(record.sludge_dm_percent),
        )
    }

    /// Returns `true` for an active stage.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// The liquid entering a separation cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidFeed {
    mass: Constrained<MassRate, NonNegative>,
    dry_matter: Constrained<MassRate, NonNegative>,
}

impl LiquidFeed {
    /// Creates a feed from a total mass rate and its dry-matter rate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if either rate is negative or not finite,
    /// or if the dry matter exceeds the total mass.
    pub fn new(mass: MassRate, dry_matter: MassRate) -> Result<Self, ValidationError> {
        let invalid = |field: &'static str, value: MassRate| {
            let value = in_tonnes_per_annum(value);
            move |source| ValidationError::LiquidFeed {
                field,
                value,
                source,
            }
        };

        let mass = NonNegative::finite(mass).map_err(invalid("mass", mass))?;
        let dry_matter = NonNegative::finite(dry_matter).map_err(invalid("dry matter", dry_matter))?;

        if dry_matter.get() > mass.get() {
            return Err(ValidationError::DryMatterExceedsMass {
                mass: in_tonnes_per_annum(mass.get()),
                dry_matter: in_tonnes_per_annum(dry_matter.get()),
            });
        }

        Ok(Self { mass, dry_matter })
    }

    /// Takes the ledger totals as the feed.
    ///
    /// # Errors
    ///
    /// See [`LiquidFeed::new`].
    pub fn from_ledger(ledger: &Ledger) -> Result<Self, ValidationError> {
        Self::new(ledger.total_mass(), ledger.total_dry_matter())
    }

    #[must_use]
    pub fn mass(&self) -> MassRate {
        self.mass.get()
    }

    #[must_use]
    pub fn dry_matter(&self) -> MassRate {
        self.dry_matter.get()
    }
}

/// An ordered sequence of separation stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeparationCascade {
    stages: Vec<SeparationStage>,
}

impl SeparationCascade {
    #[must_use]
    pub fn new(stages: Vec<SeparationStage>) -> Self {
        Self { stages }
    }

    /// Validates stage records in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`], naming the 1-based stage.
    pub fn from_records(
        records: impl IntoIterator<Item = SeparationStageRecord>,
    ) -> Result<Self, ValidationError> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| SeparationStage::from_record(index + 1, record))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }

    #[must_use]
    pub fn stages(&self) -> &[SeparationStage] {
        &self.stages
    }

    /// Runs the liquid through every stage in order.
    ///
    /// Final liquid mass plus total sludge mass always equals the feed mass,
    /// and the same holds for dry matter.
    #[must_use]
    pub fn run(&self, feed: LiquidFeed) -> CascadeResult {
        let mut warnings = Vec::new();
        if feed.mass() <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroTotalMass.emit("separation"));
        } else if feed.dry_matter() <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroDryMatter.emit("separation"));
        }

        let mut liquid = Flow {
            mass: feed.mass(),
            dry_matter: feed.dry_matter(),
        };
        let mut sludge = Flow::ZERO;

        let stages: Vec<StageResult> = self
            .stages
            .iter()
            .enumerate()
            .map(|(index, stage)| {
                let result = separate(index + 1, *stage, liquid, &mut warnings);
                liquid = Flow {
                    mass: result.liquid_mass,
                    dry_matter: result.liquid_dry_matter,
                };
                sludge.mass += result.sludge_mass;
                sludge.dry_matter += result.sludge_dry_matter;
                result
            })
            .collect();

        let result = CascadeResult {
            stages,
            final_liquid: liquid.summary(),
            total_sludge: sludge.summary(),
            warnings,
        };

        tracing::info!(
            liquid_t_per_annum = in_tonnes_per_annum(result.final_liquid.mass),
            liquid_dm_percent = result.final_liquid.dry_matter_share.get::<percent>(),
            sludge_t_per_annum = in_tonnes_per_annum(result.total_sludge.mass),
            sludge_dm_percent = result.total_sludge.dry_matter_share.get::<percent>(),
            "separation complete"
        );

        result
    }
}

impl Model for SeparationCascade {
    type Input = LiquidFeed;
    type Output = CascadeResult;
    type Error = Infallible;

    fn call(&self, input: &LiquidFeed) -> Result<CascadeResult, Infallible> {
        Ok(self.run(*input))
    }
}

#[derive(Debug, Clone, Copy)]
struct Flow {
    mass: MassRate,
    dry_matter: MassRate,
}

impl Flow {
    const ZERO: Self = Self {
        mass: MassRate::ZERO,
        dry_matter: MassRate::ZERO,
    };

    fn summary(self) -> StreamSummary {
        StreamSummary {
            mass: self.mass,
            dry_matter: self.dry_matter,
            dry_matter_share: fraction_of(self.dry_matter, self.mass),
        }
    }
}

/// Runs one stage over the liquid it receives.
///
/// An active stage removes `dm_removal` of the incoming dry matter into a
/// sludge of `sludge_dry_matter` share. If the liquid left behind would carry
/// more dry matter than mass, the stage over-extracts: the whole input goes
/// to sludge, the remaining liquid is zero and a
/// [`DegenerateResultWarning::OverExtraction`] is raised. This triggers as
/// soon as the remaining mass drops below the remaining dry matter, which can
/// happen while the remaining mass is still positive. The reported
/// `sludge_dry_matter_share` is then the input's share, not the configured one.
fn separate(
    stage: usize,
    config: SeparationStage,
    liquid: Flow,
    warnings: &mut Vec<DegenerateResultWarning>,
) -> StageResult {
    let input_dry_matter_share = fraction_of(liquid.dry_matter, liquid.mass);

    let SeparationStage::Active {
        dm_removal,
        sludge_dry_matter,
    } = config
    else {
        tracing::debug!(stage, "separation stage absent");
        return StageResult {
            stage,
            present: false,
            input_mass: liquid.mass,
            input_dry_matter_share,
            sludge_mass: MassRate::ZERO,
            sludge_dry_matter: MassRate::ZERO,
            sludge_dry_matter_share: Ratio::ZERO,
            liquid_mass: liquid.mass,
            liquid_dry_matter: liquid.dry_matter,
            liquid_dry_matter_share: input_dry_matter_share,
        };
    };

    let removed = liquid.dry_matter * dm_removal.get();
    let requested: MassRate = removed / sludge_dry_matter.get();
    let remaining_mass = liquid.mass - requested;
    let remaining_dry_matter = liquid.dry_matter - removed;

    // The liquid can never carry more dry matter than mass.
    let (sludge, remaining) = if remaining_mass < remaining_dry_matter {
        warnings.push(
            DegenerateResultWarning::OverExtraction {
                stage,
                requested: in_tonnes_per_annum(requested),
                available: in_tonnes_per_annum(liquid.mass),
            }
            .emit("separation"),
        );
        (liquid, Flow::ZERO)
    } else {
        (
            Flow {
                mass: requested,
                dry_matter: removed,
            },
            Flow {
                mass: remaining_mass,
                dry_matter: remaining_dry_matter,
            },
        )
    };

    let result = StageResult {
        stage,
        present: true,
        input_mass: liquid.mass,
        input_dry_matter_share,
        sludge_mass: sludge.mass,
        sludge_dry_matter: sludge.dry_matter,
        sludge_dry_matter_share: fraction_of(sludge.dry_matter, sludge.mass),
        liquid_mass: remaining.mass,
        liquid_dry_matter: remaining.dry_matter,
        liquid_dry_matter_share: fraction_of(remaining.dry_matter, remaining.mass),
    };

    tracing::debug!(
        stage,
        sludge_t_per_annum = in_tonnes_per_annum(result.sludge_mass),
        liquid_t_per_annum = in_tonnes_per_annum(result.liquid_mass),
        liquid_dm_percent = result.liquid_dry_matter_share.get::<percent>(),
        "separated sludge"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use biogas_core::constraint::ConstraintError;
    use tracing_test::traced_test;

    use crate::{feedstock::tests::entry, units::tonnes_per_annum};

    fn feed(mass: f64, dm_percent: f64) -> LiquidFeed {
        LiquidFeed::new(tonnes_per_annum(mass), tonnes_per_annum(mass * dm_percent / 100.0)).unwrap()
    }

    fn stage(present: bool, dm_removal_percent: f64, sludge_dm_percent: f64) -> SeparationStageRecord {
        SeparationStageRecord {
            present,
            dm_removal_percent,
            sludge_dm_percent,
        }
    }

    fn cascade(records: &[SeparationStageRecord]) -> SeparationCascade {
        SeparationCascade::from_records(records.iter().copied()).unwrap()
    }

    #[test]
    fn single_stage() {
        let result = cascade(&[stage(true, 30.0, 15.0)]).run(feed(1000.0, 10.0));
        let first = &result.stages[0];

        assert!(first.present);
        assert_eq!(first.label(), "Stage_1");
        assert_relative_eq!(in_tonnes_per_annum(first.sludge_dry_matter), 30.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(first.sludge_mass), 200.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(first.liquid_mass), 800.0, max_relative = 1e-12);
        assert_relative_eq!(first.liquid_dry_matter_share.get::<percent>(), 8.75, max_relative = 1e-12);
        assert_relative_eq!(first.sludge_dry_matter_share.get::<percent>(), 15.0, max_relative = 1e-12);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn absent_stage_passes_liquid_through() {
        let result = cascade(&[stage(false, 50.0, 10.0)]).run(feed(1000.0, 10.0));
        let first = &result.stages[0];

        assert!(!first.present);
        assert_eq!(in_tonnes_per_annum(first.sludge_mass), 0.0);
        assert_eq!(first.liquid_mass, first.input_mass);
        assert_eq!(result.final_liquid.mass, tonnes_per_annum(1000.0));
        assert_eq!(in_tonnes_per_annum(result.total_sludge.mass), 0.0);
        assert_eq!(result.total_sludge.dry_matter_share.get::<percent>(), 0.0);
    }

    #[test]
    fn three_stages_with_one_absent() {
        let result = cascade(&[
            stage(true, 30.0, 15.0),
            stage(true, 25.0, 20.0),
            stage(false, 20.0, 25.0),
        ])
        .run(feed(1000.0, 10.0));

        let second = &result.stages[1];
        assert_relative_eq!(in_tonnes_per_annum(second.input_mass), 800.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(second.sludge_mass), 87.5, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(second.liquid_mass), 712.5, max_relative = 1e-12);

        assert_eq!(result.stages[2].liquid_mass, second.liquid_mass);
        assert_relative_eq!(in_tonnes_per_annum(result.final_liquid.mass), 712.5, max_relative = 1e-12);
        assert_relative_eq!(
            result.final_liquid.dry_matter_share.get::<percent>(),
            52.5 / 712.5 * 100.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(in_tonnes_per_annum(result.total_sludge.mass), 287.5, max_relative = 1e-12);
        assert_relative_eq!(
            result.total_sludge.dry_matter_share.get::<percent>(),
            47.5 / 287.5 * 100.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn conserves_mass_and_dry_matter() {
        let result = cascade(&[
            stage(true, 40.0, 12.0),
            stage(true, 60.0, 30.0),
            stage(true, 10.0, 8.0),
        ])
        .run(feed(2500.0, 7.0));

        assert_relative_eq!(
            in_tonnes_per_annum(result.final_liquid.mass + result.total_sludge.mass),
            2500.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            in_tonnes_per_annum(result.final_liquid.dry_matter + result.total_sludge.dry_matter),
            175.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn rejects_zero_sludge_dry_matter_on_active_stage() {
        let err = SeparationCascade::from_records([stage(true, 30.0, 15.0), stage(true, 30.0, 0.0)])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SeparationStage {
                stage: 2,
                field: "sludge dry matter",
                value: 0.0,
                source: ConstraintError::Zero,
            }
        );

        assert!(SeparationCascade::from_records([stage(false, 30.0, 0.0)]).is_ok());
    }

    #[test]
    fn rejects_out_of_range_removal() {
        assert!(matches!(
            SeparationCascade::from_records([stage(true, 120.0, 15.0)]),
            Err(ValidationError::SeparationStage { stage: 1, .. })
        ));
    }

    #[test]
    fn liquid_feed_validation() {
        assert!(matches!(
            LiquidFeed::new(tonnes_per_annum(-1.0), tonnes_per_annum(0.0)),
            Err(ValidationError::LiquidFeed { field: "mass", .. })
        ));
        assert!(matches!(
            LiquidFeed::new(tonnes_per_annum(10.0), tonnes_per_annum(11.0)),
            Err(ValidationError::DryMatterExceedsMass { .. })
        ));
    }

    #[test]
    fn feed_from_ledger_totals() {
        let mut ledger = Ledger::new();
        ledger.add(entry("a", 1000.0, 10.0, 80.0, 20.0, 50.0, 40.0));
        ledger.add(entry("b", 500.0, 20.0, 80.0, 20.0, 50.0, 40.0));

        let feed = LiquidFeed::from_ledger(&ledger).unwrap();
        assert_relative_eq!(in_tonnes_per_annum(feed.mass()), 1500.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(feed.dry_matter()), 200.0, max_relative = 1e-12);
    }

    #[test]
    #[traced_test]
    fn over_extraction_sends_everything_to_sludge() {
        let result = cascade(&[stage(true, 100.0, 10.0), stage(true, 50.0, 20.0)]).run(feed(100.0, 50.0));

        let first = &result.stages[0];
        assert_relative_eq!(in_tonnes_per_annum(first.sludge_mass), 100.0, max_relative = 1e-12);
        assert_eq!(in_tonnes_per_annum(first.liquid_mass), 0.0);
        assert_eq!(first.liquid_dry_matter_share.get::<percent>(), 0.0);
        assert_relative_eq!(first.sludge_dry_matter_share.get::<percent>(), 50.0, max_relative = 1e-12);

        match &result.warnings[..] {
            [DegenerateResultWarning::OverExtraction {
                stage,
                requested,
                available,
            }] => {
                assert_eq!(*stage, 1);
                assert_relative_eq!(*requested, 500.0, max_relative = 1e-9);
                assert_relative_eq!(*available, 100.0, max_relative = 1e-9);
            }
            other => panic!("unexpected warnings: {other:?}"),
        }

        // Downstream stages see an empty stream.
        assert_eq!(in_tonnes_per_annum(result.stages[1].sludge_mass), 0.0);
        assert_relative_eq!(in_tonnes_per_annum(result.total_sludge.mass), 100.0, max_relative = 1e-12);
        assert!(logs_contain("over-extracts"));
    }

    #[test]
    fn over_extraction_triggers_while_mass_remains() {
        // 30 T/A of DM into 35% sludge requests 85.7 T/A, leaving 14.3 T/A
        // of liquid to hold 20 T/A of DM.
        let result = cascade(&[stage(true, 60.0, 35.0)]).run(feed(100.0, 50.0));
        let only = &result.stages[0];

        assert_relative_eq!(in_tonnes_per_annum(only.sludge_mass), 100.0, max_relative = 1e-12);
        assert_relative_eq!(only.sludge_dry_matter_share.get::<percent>(), 50.0, max_relative = 1e-12);
        assert_eq!(in_tonnes_per_annum(only.liquid_mass), 0.0);
        assert!(matches!(
            result.warnings[..],
            [DegenerateResultWarning::OverExtraction { stage: 1, .. }]
        ));
    }

    #[test]
    fn rejects_infinite_liquid_feed() {
        assert!(matches!(
            LiquidFeed::new(tonnes_per_annum(f64::INFINITY), tonnes_per_annum(10.0)),
            Err(ValidationError::LiquidFeed {
                field: "mass",
                source: ConstraintError::Infinite,
                ..
            })
        ));
        assert!(matches!(
            LiquidFeed::new(tonnes_per_annum(100.0), tonnes_per_annum(f64::INFINITY)),
            Err(ValidationError::LiquidFeed {
                field: "dry matter",
                source: ConstraintError::Infinite,
                ..
            })
        ));
    }

    #[test]
    fn empty_feed_is_flagged() {
        let result = cascade(&[stage(true, 30.0, 15.0)]).run(feed(0.0, 0.0));
        assert_eq!(result.warnings, vec![DegenerateResultWarning::ZeroTotalMass]);
        assert_eq!(in_tonnes_per_annum(result.final_liquid.mass), 0.0);
    }

    #[test]
    fn model_matches_run() {
        let cascade = cascade(&[stage(true, 30.0, 15.0)]);
        let input = feed(1000.0, 10.0);
        assert_eq!(cascade.call(&input).unwrap(), cascade.run(input));
    }

    #[test]
    fn record_defaults() {
        let record = SeparationStageRecord::default();
        assert!(!record.present);
        assert_eq!(record.sludge_dm_percent, DEFAULT_SLUDGE_DM_PERCENT);
    }
}
