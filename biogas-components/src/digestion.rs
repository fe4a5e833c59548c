//! Anaerobic digestion of the feedstock ledger.
//!
//! Digestion converts a share of each feedstock's volatile solids (VS) into
//! biogas. Per entry:
//!
//! 1. `DM = quantity·dm`, `VS = DM·vs`
//! 2. `biogas = VS·gas_yield`, `methane = biogas·methane_share`
//! 3. `destroyed = VS·reduction` is the only mass that leaves the liquid
//! 4. non-volatile dry matter (ash, lignin) is conserved, so
//!    `DM' = DM − destroyed` and `VS' = VS − destroyed`
//! 5. `quantity' = quantity − destroyed`, `dm' = DM'/quantity'`, `vs' = VS'/DM'`
//!
//! [`digest`] rewrites the ledger in place. [`Digester`] wraps it as a
//! [`Model`] that digests a copy, leaving its input untouched.

mod report;

use std::convert::Infallible;

use biogas_core::{
    Model,
    constraint::{Constrained, NonNegative, UnitInterval},
};
use uom::si::f64::{MassRate, VolumeRate};

use crate::{
    feedstock::FeedstockEntry,
    ledger::Ledger,
    units::{fraction_of, in_cubic_meters_per_annum, in_tonnes_per_annum},
    warning::DegenerateResultWarning,
};

pub use report::{DigestionReport, DigestionRow, TOTAL_ROW};

/// Digests every entry of the ledger in place and reports what changed.
///
/// Each entry's quantity, dry-matter share and volatile-solids share are
/// overwritten; name, gas yield, methane share and reduction factor are kept.
/// Zero-mass entries produce all-zero rows.
pub fn digest(ledger: &mut Ledger) -> DigestionReport {
    let mut clamped = Vec::new();
    let rows: Vec<DigestionRow> = ledger
        .iter_mut()
        .map(|entry| digest_entry(entry, &mut clamped))
        .collect();
    let report = DigestionReport::from_rows(rows, clamped);

    tracing::info!(
        feeds = report.rows.len(),
        methane_m3_per_annum = in_cubic_meters_per_annum(report.methane),
        "digestion complete"
    );

    report
}

fn digest_entry(entry: &mut FeedstockEntry, warnings: &mut Vec<DegenerateResultWarning>) -> DigestionRow {
    let initial_mass = entry.quantity();
    let initial_dry_matter = entry.dry_matter_rate();
    let initial_volatile_solids = entry.volatile_solids_rate();

    let biogas: VolumeRate = initial_volatile_solids * entry.gas_yield();
    let methane: VolumeRate = biogas * entry.methane();

    let destroyed = initial_volatile_solids * entry.reduction();
    let remaining_volatile_solids = initial_volatile_solids - destroyed;
    let inert = initial_dry_matter - initial_volatile_solids;
    let remaining_dry_matter = remaining_volatile_solids + inert;
    let quantity = digested_quantity(entry.name(), initial_mass - destroyed, warnings);
    let final_mass = quantity.get();

    let row = DigestionRow {
        name: entry.name().to_string(),
        initial_mass,
        initial_dry_matter,
        initial_volatile_solids,
        volatile_solids_destroyed: destroyed,
        final_mass,
        mass_reduction: fraction_of(destroyed, initial_mass),
        biogas,
        methane,
        initial_dry_matter_share: entry.dry_matter(),
        final_dry_matter_share: fraction_of(remaining_dry_matter, final_mass),
        initial_volatile_solids_share: entry.volatile_solids(),
        final_volatile_solids_share: fraction_of(remaining_volatile_solids, remaining_dry_matter),
    };

    entry.set_digested(
        quantity,
        UnitInterval::saturating(row.final_dry_matter_share),
        UnitInterval::saturating(row.final_volatile_solids_share),
    );

    tracing::debug!(
        feed = %row.name,
        initial_mass_t_per_annum = in_tonnes_per_annum(initial_mass),
        destroyed_t_per_annum = in_tonnes_per_annum(destroyed),
        methane_m3_per_annum = in_cubic_meters_per_annum(methane),
        "digested feedstock"
    );

    row
}

/// Validates a digested mass rate, clamping anything negative or non-finite
/// to zero with a [`DegenerateResultWarning::ClampedMass`].
fn digested_quantity(
    feed: &str,
    mass: MassRate,
    warnings: &mut Vec<DegenerateResultWarning>,
) -> Constrained<MassRate, NonNegative> {
    NonNegative::finite(mass).unwrap_or_else(|_| {
        let warning = DegenerateResultWarning::ClampedMass {
            feed: feed.to_string(),
            mass: in_tonnes_per_annum(mass),
        };
        warnings.push(warning.emit("digestion"));
        NonNegative::zero()
    })
}

/// Digestion as a non-destructive model.
///
/// Digests a clone of the input ledger, so the same feed can be run through
/// several downstream variants without rebuilding it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Digester;

/// Output of the [`Digester`] model.
#[derive(Debug, Clone, PartialEq)]
pub struct Digested {
    /// The ledger after digestion.
    pub ledger: Ledger,
    pub report: DigestionReport,
}

impl Model for Digester {
    type Input = Ledger;
    type Output = Digested;
    type Error = Infallible;

    fn call(&self, input: &Ledger) -> Result<Digested, Infallible> {
        let mut ledger = input.clone();
        let report = digest(&mut ledger);
        Ok(Digested { ledger, report })
    }
}
