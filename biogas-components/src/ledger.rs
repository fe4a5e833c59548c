//! The feedstock ledger and its aggregate rate table.

use std::collections::{BTreeMap, btree_map};

use biogas_core::constraint::{Constrained, NonNegative};
use serde::Serialize;
use uom::{
    ConstZero,
    si::f64::{MassRate, Ratio, VolumeRate},
};

use crate::{
    error::ValidationError,
    feedstock::{DerivedRates, FeedstockEntry, FeedstockRecord},
    units::fraction_of,
    warning::DegenerateResultWarning,
};

/// Name of the synthetic row holding column sums in a [`LedgerSummary`].
pub const TOTAL_ROW: &str = "*total";

/// The set of feedstocks flowing through the plant, keyed by unique name.
///
/// A ledger is built once per simulation run. Digestion rewrites entries in
/// place; separation and hydraulics only read it. Entries are never removed.
/// Iteration is ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: BTreeMap<String, FeedstockEntry>,
}

/// One row of the aggregate rate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    pub name: String,
    pub mass: MassRate,
    pub dry_matter: MassRate,
    pub volatile_solids: MassRate,
    pub biogas: VolumeRate,
    pub methane: VolumeRate,
}

/// Snapshot of a ledger's rates.
///
/// `entries` holds one row per feedstock. `total` holds the column sums and
/// is `None` only for an empty ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub entries: Vec<RateRow>,
    pub total: Option<RateRow>,
    /// Total dry matter over total mass, zero when the total mass is zero.
    pub dry_matter: Ratio,
    pub warnings: Vec<DegenerateResultWarning>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from external records.
    ///
    /// All records are validated before the ledger is built, so a bad record
    /// leaves nothing behind. Later records overwrite earlier ones by name.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn from_records(
        records: impl IntoIterator<Item = FeedstockRecord>,
    ) -> Result<Self, ValidationError> {
        let entries = records
            .into_iter()
            .map(FeedstockEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut ledger = Self::new();
        ledger.mix(entries);
        Ok(ledger)
    }

    /// Inserts an entry, returning the entry it replaced if the name was taken.
    pub fn add(&mut self, entry: FeedstockEntry) -> Option<FeedstockEntry> {
        self.entries.insert(entry.name().to_string(), entry)
    }

    /// Validates a record and inserts it.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] and leaves the ledger untouched if the
    /// record is invalid.
    pub fn add_record(&mut self, record: FeedstockRecord) -> Result<(), ValidationError> {
        self.add(FeedstockEntry::try_from(record)?);
        Ok(())
    }

    /// Adds further feeds to the ledger, such as clean water or recirculated liquid.
    pub fn mix(&mut self, additions: impl IntoIterator<Item = FeedstockEntry>) {
        for entry in additions {
            if let Some(replaced) = self.add(entry) {
                tracing::debug!(feed = replaced.name(), "mixed feed replaced an existing entry");
            }
        }
    }

    /// Returns the entry with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeedstockEntry> {
        self.entries.get(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the ledger holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in name order.
    pub fn iter(&self) -> btree_map::Values<'_, String, FeedstockEntry> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, String, FeedstockEntry> {
        self.entries.values_mut()
    }

    /// Total mass rate across all entries, still known to be non-negative.
    ///
    /// This is the inflow handed to [`HydraulicCalculator`](crate::HydraulicCalculator).
    #[must_use]
    pub fn total_quantity(&self) -> Constrained<MassRate, NonNegative> {
        self.iter().map(FeedstockEntry::constrained_quantity).sum()
    }

    /// Total mass rate across all entries.
    #[must_use]
    pub fn total_mass(&self) -> MassRate {
        self.total_quantity().into_inner()
    }

    /// Total dry-matter rate across all entries.
    #[must_use]
    pub fn total_dry_matter(&self) -> MassRate {
        self.iter()
            .fold(MassRate::ZERO, |acc, entry| acc + entry.dry_matter_rate())
    }

    /// Builds the aggregate rate table.
    ///
    /// Never fails: an empty ledger yields no rows and a dry-matter share of
    /// zero, flagged with [`DegenerateResultWarning::EmptyLedger`].
    #[must_use]
    pub fn aggregate(&self) -> LedgerSummary {
        let entries: Vec<RateRow> = self
            .iter()
            .map(|entry| RateRow::from_rates(entry.name(), &entry.rates()))
            .collect();

        let mut warnings = Vec::new();
        if entries.is_empty() {
            warnings.push(DegenerateResultWarning::EmptyLedger.emit("ledger"));
            return LedgerSummary {
                entries,
                total: None,
                dry_matter: fraction_of(MassRate::ZERO, MassRate::ZERO),
                warnings,
            };
        }

        let total = RateRow::sum(TOTAL_ROW, &entries);
        if total.mass <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroTotalMass.emit("ledger"));
        } else if total.dry_matter <= MassRate::ZERO {
            warnings.push(DegenerateResultWarning::ZeroDryMatter.emit("ledger"));
        }

        LedgerSummary {
            dry_matter: fraction_of(total.dry_matter, total.mass),
            entries,
            total: Some(total),
            warnings,
        }
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a FeedstockEntry;
    type IntoIter = btree_map::Values<'a, String, FeedstockEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl RateRow {
    fn from_rates(name: &str, rates: &DerivedRates) -> Self {
        Self {
            name: name.to_string(),
            mass: rates.mass,
            dry_matter: rates.dry_matter,
            volatile_solids: rates.volatile_solids,
            biogas: rates.biogas,
            methane: rates.methane,
        }
    }

    fn sum(name: &str, rows: &[RateRow]) -> Self {
        let zero = DerivedRates {
            mass: MassRate::ZERO,
            dry_matter: MassRate::ZERO,
            volatile_solids: MassRate::ZERO,
            biogas: VolumeRate::ZERO,
            methane: VolumeRate::ZERO,
        };
        let total = rows.iter().fold(zero, |acc, row| DerivedRates {
            mass: acc.mass + row.mass,
            dry_matter: acc.dry_matter + row.dry_matter,
            volatile_solids: acc.volatile_solids + row.volatile_solids,
            biogas: acc.biogas + row.biogas,
            methane: acc.methane + row.methane,
        });
        Self::from_rates(name, &total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::ratio::percent;

    use crate::{
        feedstock::tests::{entry, record},
        units::{in_cubic_meters_per_annum, in_tonnes_per_annum, tonnes_per_annum},
    };

    fn two_feeds() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.add(entry("feed1", 1000.0, 10.0, 80.0, 20.0, 50.0, 40.0));
        ledger.add(entry("feed2", 500.0, 15.0, 75.0, 25.0, 55.0, 45.0));
        ledger
    }

    #[test]
    fn starts_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn add_overwrites_by_name() {
        let mut ledger = two_feeds();
        let replaced = ledger.add(entry("feed1", 10.0, 5.0, 50.0, 1.0, 1.0, 1.0));
        assert!(replaced.is_some());
        assert_eq!(ledger.len(), 2);
        assert_relative_eq!(
            in_tonnes_per_annum(ledger.get("feed1").unwrap().quantity()),
            10.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn aggregate_single_feed() {
        let mut ledger = Ledger::new();
        ledger.add(entry("feed1", 1000.0, 10.0, 80.0, 20.0, 50.0, 40.0));
        let summary = ledger.aggregate();

        let row = &summary.entries[0];
        assert_eq!(row.name, "feed1");
        assert_relative_eq!(in_tonnes_per_annum(row.mass), 1000.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(row.dry_matter), 100.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(row.volatile_solids), 80.0, max_relative = 1e-12);
        assert_relative_eq!(in_cubic_meters_per_annum(row.biogas), 1600.0, max_relative = 1e-12);
        assert_relative_eq!(in_cubic_meters_per_annum(row.methane), 800.0, max_relative = 1e-12);
        assert_relative_eq!(summary.dry_matter.get::<percent>(), 10.0, max_relative = 1e-12);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn aggregate_total_row_sums_columns() {
        let ledger = two_feeds();
        let summary = ledger.aggregate();
        let total = summary.total.unwrap();

        assert_eq!(total.name, TOTAL_ROW);
        assert_relative_eq!(in_tonnes_per_annum(total.mass), 1500.0, max_relative = 1e-12);
        assert_relative_eq!(in_tonnes_per_annum(total.dry_matter), 175.0, max_relative = 1e-12);
        assert_relative_eq!(
            summary.dry_matter.get::<percent>(),
            175.0 * 100.0 / 1500.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            in_tonnes_per_annum(total.mass),
            in_tonnes_per_annum(ledger.total_mass()),
            max_relative = 1e-12
        );
    }

    #[test]
    fn empty_ledger_aggregates_to_nothing() {
        let summary = Ledger::new().aggregate();
        assert!(summary.entries.is_empty());
        assert!(summary.total.is_none());
        assert_eq!(summary.dry_matter.get::<percent>(), 0.0);
        assert_eq!(summary.warnings, vec![DegenerateResultWarning::EmptyLedger]);
    }

    #[test]
    fn zero_mass_ledger_reports_zero_dry_matter() {
        let mut ledger = Ledger::new();
        ledger.add(entry("idle", 0.0, 20.0, 80.0, 10.0, 50.0, 40.0));
        let summary = ledger.aggregate();

        assert_eq!(summary.entries.len(), 1);
        assert_eq!(summary.dry_matter.get::<percent>(), 0.0);
        assert!(!summary.dry_matter.value.is_nan());
        assert_eq!(summary.warnings, vec![DegenerateResultWarning::ZeroTotalMass]);
    }

    #[test]
    fn solids_free_ledger_reports_zero_dry_matter() {
        let mut ledger = Ledger::new();
        ledger.add(FeedstockEntry::water("clean_water", tonnes_per_annum(800.0)).unwrap());
        let summary = ledger.aggregate();

        assert_relative_eq!(
            in_tonnes_per_annum(summary.total.unwrap().mass),
            800.0,
            max_relative = 1e-12
        );
        assert_eq!(summary.dry_matter.get::<percent>(), 0.0);
        assert_eq!(summary.warnings, vec![DegenerateResultWarning::ZeroDryMatter]);
    }

    #[test]
    fn total_quantity_sums_constrained_entries() {
        let ledger = two_feeds();
        assert_relative_eq!(
            in_tonnes_per_annum(ledger.total_quantity().into_inner()),
            1500.0,
            max_relative = 1e-12
        );
        assert_eq!(Ledger::new().total_quantity().into_inner(), MassRate::ZERO);
    }

    #[test]
    fn from_records_rejects_infinite_rate() {
        let records = vec![
            record("a", f64::INFINITY, 10.0, 80.0, 20.0, 50.0, 40.0),
            record("b", 1000.0, 10.0, 80.0, 20.0, 50.0, 40.0),
        ];
        assert!(matches!(
            Ledger::from_records(records),
            Err(ValidationError::Feedstock { field: "quantity", .. })
        ));
    }

    #[test]
    fn mix_adds_water_and_recirculate() {
        let mut ledger = two_feeds();
        ledger.mix([
            FeedstockEntry::water("clean_water", tonnes_per_annum(1000.0)).unwrap(),
            entry("recirc_fluid", 1000.0, 5.0, 0.0, 0.0, 0.0, 0.0),
        ]);

        assert_eq!(ledger.len(), 4);
        assert_relative_eq!(in_tonnes_per_annum(ledger.total_mass()), 3500.0, max_relative = 1e-12);
        assert_relative_eq!(
            in_tonnes_per_annum(ledger.total_dry_matter()),
            225.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn from_records_rejects_without_building() {
        let records = vec![
            record("ok", 10.0, 10.0, 80.0, 20.0, 50.0, 40.0),
            record("bad", 10.0, 110.0, 80.0, 20.0, 50.0, 40.0),
        ];
        assert!(matches!(
            Ledger::from_records(records),
            Err(ValidationError::Feedstock { .. })
        ));
    }

    #[test]
    fn add_record_leaves_ledger_untouched_on_error() {
        let mut ledger = two_feeds();
        let before = ledger.clone();
        assert!(ledger.add_record(record("feed1", -1.0, 10.0, 80.0, 20.0, 50.0, 40.0)).is_err());
        assert_eq!(ledger, before);
    }
}
