//! The full plant pipeline.
//!
//! A run takes the feed ledger through mixing, digestion, pasteurization and
//! separation, recording a ledger summary after each step. Hydraulic
//! retention is computed on the mixed ledger, which is what enters the
//! digesters.

use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{MassRate, Ratio, VolumeRate},
    ratio::percent,
};

use crate::{
    digestion::{DigestionReport, digest},
    equipment::EquipmentSheet,
    error::{EquipmentError, PlantError},
    feedstock::{FeedstockEntry, FeedstockRecord},
    hydraulics::{
        AssumptionsRecord, CapacityRecord, DigesterCapacity, HydraulicAssumptions,
        HydraulicCalculator, HydraulicResult,
    },
    ledger::{Ledger, LedgerSummary},
    separation::{CascadeResult, LiquidFeed, SeparationCascade, SeparationStageRecord},
    units::{in_cubic_meters_per_annum, in_tonnes_per_annum},
    warning::DegenerateResultWarning,
};

/// A plant description in plant units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlantConfig {
    pub feedstocks: Vec<FeedstockRecord>,
    /// Dilution and recirculation feeds mixed in after the initial feed.
    #[serde(default)]
    pub additives: Vec<FeedstockRecord>,
    #[serde(default)]
    pub separation: Vec<SeparationStageRecord>,
    #[serde(default)]
    pub capacity: CapacityRecord,
    #[serde(default)]
    pub hydraulics: AssumptionsRecord,
}

impl PlantConfig {
    /// Takes digester capacity and separation stages from an equipment sheet.
    ///
    /// # Errors
    ///
    /// Returns [`EquipmentError`] if a sheet parameter has the wrong kind.
    pub fn with_equipment(self, sheet: &EquipmentSheet) -> Result<Self, EquipmentError> {
        Ok(Self {
            capacity: sheet.capacity_record()?,
            separation: sheet.stage_records()?,
            ..self
        })
    }
}

/// A validated plant, ready to run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    feed: Ledger,
    additives: Vec<FeedstockEntry>,
    separation: SeparationCascade,
    hydraulics: HydraulicCalculator,
}

/// Digestion totals operators look at first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub biogas: VolumeRate,
    pub methane: VolumeRate,
    /// Zero when no biogas is produced.
    pub methane_share: Ratio,
    pub output_mass: MassRate,
    pub output_dry_matter_share: Ratio,
}

/// Everything a plant run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantReport {
    pub feed: LedgerSummary,
    pub mixed: LedgerSummary,
    pub digested: LedgerSummary,
    pub pasteurized: LedgerSummary,
    pub digestion: DigestionReport,
    pub separation: CascadeResult,
    pub hydraulics: HydraulicResult,
    pub metrics: HeadlineMetrics,
}

impl PlantReport {
    /// Iterates over the warnings raised by every step, in pipeline order.
    pub fn warnings(&self) -> impl Iterator<Item = &DegenerateResultWarning> {
        [
            &self.feed.warnings,
            &self.mixed.warnings,
            &self.hydraulics.warnings,
            &self.digestion.warnings,
            &self.digested.warnings,
            &self.pasteurized.warnings,
            &self.separation.warnings,
        ]
        .into_iter()
        .flatten()
    }
}

impl Plant {
    /// Validates a plant description.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError`] naming the part of the description that failed.
    pub fn new(config: PlantConfig) -> Result<Self, PlantError> {
        let feed = Ledger::from_records(config.feedstocks).map_err(PlantError::Feed)?;
        let additives = config
            .additives
            .into_iter()
            .map(FeedstockEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PlantError::Additive)?;
        let separation =
            SeparationCascade::from_records(config.separation).map_err(PlantError::Separation)?;
        let capacity = DigesterCapacity::try_from(config.capacity).map_err(PlantError::Capacity)?;
        let assumptions =
            HydraulicAssumptions::try_from(config.hydraulics).map_err(PlantError::Hydraulics)?;

        Ok(Self {
            feed,
            additives,
            separation,
            hydraulics: HydraulicCalculator::new(capacity, assumptions),
        })
    }

    /// Validates a plant description whose equipment lives on a sheet.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError`] if the sheet or the description is invalid.
    pub fn with_equipment(config: PlantConfig, sheet: &EquipmentSheet) -> Result<Self, PlantError> {
        Self::new(config.with_equipment(sheet)?)
    }

    #[must_use]
    pub fn feed(&self) -> &Ledger {
        &self.feed
    }

    /// Runs feed, mix, digest, pasteurize and separate on a fresh copy of
    /// the feed ledger.
    ///
    /// # Errors
    ///
    /// Returns [`PlantError::Separation`] if the digested ledger cannot feed
    /// the separation cascade.
    pub fn run(&self) -> Result<PlantReport, PlantError> {
        let _span = tracing::info_span!("plant").entered();

        let mut ledger = self.feed.clone();
        let feed = ledger.aggregate();

        ledger.mix(self.additives.iter().cloned());
        let mixed = ledger.aggregate();
        let hydraulics = self.hydraulics.compute_for_ledger(&ledger);

        let digestion = digest(&mut ledger);
        let digested = ledger.aggregate();

        let pasteurized = pasteurize(&digested);

        let liquid = LiquidFeed::from_ledger(&ledger).map_err(PlantError::Separation)?;
        let separation = self.separation.run(liquid);

        let metrics = HeadlineMetrics {
            biogas: digestion.biogas(),
            methane: digestion.methane,
            methane_share: digestion.methane_share(),
            output_mass: digestion.output_mass(),
            output_dry_matter_share: digestion.output_dry_matter_share(),
        };

        tracing::info!(
            methane_m3_per_annum = in_cubic_meters_per_annum(metrics.methane),
            methane_percent = metrics.methane_share.get::<percent>(),
            output_t_per_annum = in_tonnes_per_annum(metrics.output_mass),
            "plant run complete"
        );

        Ok(PlantReport {
            feed,
            mixed,
            digested,
            pasteurized,
            digestion,
            separation,
            hydraulics,
            metrics,
        })
    }
}

/// Holds the digestate at temperature; mass and composition are unchanged.
///
/// Returns the digested summary as the pasteurized snapshot. Its warnings
/// were already raised on `digested` and are not repeated.
#[must_use]
pub fn pasteurize(digested: &LedgerSummary) -> LedgerSummary {
    tracing::debug!(
        feeds = digested.entries.len(),
        mass_t_per_annum = digested
            .total
            .as_ref()
            .map_or(0.0, |total| in_tonnes_per_annum(total.mass)),
        "pasteurized"
    );
    LedgerSummary {
        warnings: Vec::new(),
        ..digested.clone()
    }
}
