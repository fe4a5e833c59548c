use serde::Serialize;
use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Ratio, VolumeRate},
        ratio::ratio,
    },
};

use crate::{units::fraction_of, warning::DegenerateResultWarning};

/// Name of the aggregated row in a [`DigestionReport`].
pub const TOTAL_ROW: &str = "*TOTAL";

/// Mass and gas balance of one feedstock through digestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestionRow {
    pub name: String,
    pub initial_mass: MassRate,
    pub initial_dry_matter: MassRate,
    pub initial_volatile_solids: MassRate,
    /// Volatile solids converted to gas; equal to the mass lost by the feed.
    pub volatile_solids_destroyed: MassRate,
    pub final_mass: MassRate,
    /// Destroyed mass over initial mass.
    pub mass_reduction: Ratio,
    pub biogas: VolumeRate,
    pub methane: VolumeRate,
    pub initial_dry_matter_share: Ratio,
    pub final_dry_matter_share: Ratio,
    pub initial_volatile_solids_share: Ratio,
    pub final_volatile_solids_share: Ratio,
}

/// Result of digesting a ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestionReport {
    /// One row per feedstock, in ledger order.
    pub rows: Vec<DigestionRow>,
    /// Aggregated row; `None` only for an empty ledger.
    ///
    /// Shares are recomputed from summed rates rather than averaged across
    /// rows, so small feeds do not skew them.
    pub total: Option<DigestionRow>,
    /// Total methane yield.
    pub methane: VolumeRate,
    pub warnings: Vec<DegenerateResultWarning>,
}

impl DigestionReport {
    pub(super) fn from_rows(rows: Vec<DigestionRow>, mut warnings: Vec<DegenerateResultWarning>) -> Self {
        let methane = rows
            .iter()
            .fold(VolumeRate::ZERO, |acc, row| acc + row.methane);

        if rows.is_empty() {
            warnings.push(DegenerateResultWarning::EmptyLedger.emit("digestion"));
            return Self {
                rows,
                total: None,
                methane,
                warnings,
            };
        }

        let total = total_row(&rows);
        if total.initial_mass <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroTotalMass.emit("digestion"));
        } else if total.initial_dry_matter <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroDryMatter.emit("digestion"));
        }

        Self {
            rows,
            total: Some(total),
            methane,
            warnings,
        }
    }

    /// Total biogas yield.
    #[must_use]
    pub fn biogas(&self) -> VolumeRate {
        self.total.as_ref().map_or(VolumeRate::ZERO, |total| total.biogas)
    }

    /// Methane share of the total biogas, zero when no biogas is produced.
    #[must_use]
    pub fn methane_share(&self) -> Ratio {
        let biogas = self.biogas();
        if biogas > VolumeRate::ZERO {
            self.methane / biogas
        } else {
            Ratio::new::<ratio>(0.0)
        }
    }

    /// Total mass leaving the digester.
    #[must_use]
    pub fn output_mass(&self) -> MassRate {
        self.total.as_ref().map_or(MassRate::ZERO, |total| total.final_mass)
    }

    /// Dry-matter share of the digestate.
    #[must_use]
    pub fn output_dry_matter_share(&self) -> Ratio {
        self.total
            .as_ref()
            .map_or(Ratio::new::<ratio>(0.0), |total| total.final_dry_matter_share)
    }
}

fn total_row(rows: &[DigestionRow]) -> DigestionRow {
    let sum = |rate: fn(&DigestionRow) -> MassRate| {
        rows.iter().fold(MassRate::ZERO, |acc, row| acc + rate(row))
    };
    let sum_gas = |rate: fn(&DigestionRow) -> VolumeRate| {
        rows.iter().fold(VolumeRate::ZERO, |acc, row| acc + rate(row))
    };

    let initial_mass = sum(|row| row.initial_mass);
    let initial_dry_matter = sum(|row| row.initial_dry_matter);
    let initial_volatile_solids = sum(|row| row.initial_volatile_solids);
    let destroyed = sum(|row| row.volatile_solids_destroyed);
    let final_mass = sum(|row| row.final_mass);
    let final_dry_matter = initial_dry_matter - destroyed;

    DigestionRow {
        name: TOTAL_ROW.to_string(),
        initial_mass,
        initial_dry_matter,
        initial_volatile_solids,
        volatile_solids_destroyed: destroyed,
        final_mass,
        mass_reduction: fraction_of(destroyed, initial_mass),
        biogas: sum_gas(|row| row.biogas),
        methane: sum_gas(|row| row.methane),
        initial_dry_matter_share: fraction_of(initial_dry_matter, initial_mass),
        final_dry_matter_share: fraction_of(final_dry_matter, final_mass),
        initial_volatile_solids_share: fraction_of(initial_volatile_solids, initial_dry_matter),
        final_volatile_solids_share: fraction_of(
            initial_volatile_solids - destroyed,
            final_dry_matter,
        ),
    }
}
