//! Feedstock entries and the external records they are built from.

use biogas_core::constraint::{Constrained, NonNegative, UnitInterval};
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Ratio, SpecificVolume, VolumeRate},
        ratio::percent,
    },
};

use crate::{
    error::ValidationError,
    units::{cubic_meters_per_tonne, in_cubic_meters_per_tonne, in_tonnes_per_annum, tonnes_per_annum},
};

/// A feedstock as supplied by an external loader, in plant units.
///
/// Field names follow the plant's feed sheet: rates in tonnes per annum,
/// shares in percent, gas yield in m³ per tonne of volatile solids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedstockRecord {
    pub name: String,
    /// Mass rate, T/A.
    pub rate: f64,
    /// Dry matter, % of total mass.
    pub dm_percent: f64,
    /// Volatile solids, % of dry matter.
    pub vs_percent: f64,
    /// Biogas yield, m³/T of volatile solids.
    pub gas_yield: f64,
    /// Methane, % of biogas.
    pub methane_percent: f64,
    /// Volatile solids destroyed during digestion, %.
    pub digest_reduction_percent: f64,
}

/// A validated feedstock in the ledger.
///
/// Quantities are non-negative and every share lies in `[0, 1]`; both hold
/// for the lifetime of the entry, including after digestion rewrites its
/// quantity and composition.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedstockEntry {
    name: String,
    quantity: Constrained<MassRate, NonNegative>,
    dry_matter: Constrained<Ratio, UnitInterval>,
    volatile_solids: Constrained<Ratio, UnitInterval>,
    gas_yield: Constrained<SpecificVolume, NonNegative>,
    methane: Constrained<Ratio, UnitInterval>,
    reduction: Constrained<Ratio, UnitInterval>,
}

/// Rates derived from a feedstock's quantity and composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRates {
    pub mass: MassRate,
    pub dry_matter: MassRate,
    pub volatile_solids: MassRate,
    pub biogas: VolumeRate,
    pub methane: VolumeRate,
}

impl FeedstockEntry {
    /// Creates an entry from SI quantities.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is empty, the quantity or gas
    /// yield is negative or not finite, or any share lies outside `[0, 1]`.
    pub fn new(
        name: impl Into<String>,
        quantity: MassRate,
        dry_matter: Ratio,
        volatile_solids: Ratio,
        gas_yield: SpecificVolume,
        methane: Ratio,
        reduction: Ratio,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let share = |field: &'static str, value: Ratio| {
            UnitInterval::new(value)
                .map_err(ValidationError::feedstock(&name, field, value.get::<percent>()))
        };

        Ok(Self {
            quantity: NonNegative::finite(quantity).map_err(ValidationError::feedstock(
                &name,
                "quantity",
                in_tonnes_per_annum(quantity),
            ))?,
            dry_matter: share("dry matter", dry_matter)?,
            volatile_solids: share("volatile solids", volatile_solids)?,
            gas_yield: NonNegative::finite(gas_yield).map_err(ValidationError::feedstock(
                &name,
                "gas yield",
                in_cubic_meters_per_tonne(gas_yield),
            ))?,
            methane: share("methane", methane)?,
            reduction: share("digestion reduction", reduction)?,
            name,
        })
    }

    /// Creates a pure dilution feed such as clean water: no solids, no gas.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the name is empty or the rate is negative
    /// or not finite.
    pub fn water(name: impl Into<String>, quantity: MassRate) -> Result<Self, ValidationError> {
        let zero = Ratio::new::<percent>(0.0);
        Self::new(
            name,
            quantity,
            zero,
            zero,
            SpecificVolume::ZERO,
            zero,
            zero,
        )
    }

    /// Returns the feedstock name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the mass rate.
    #[must_use]
    pub fn quantity(&self) -> MassRate {
        self.quantity.get()
    }

    pub(crate) fn constrained_quantity(&self) -> Constrained<MassRate, NonNegative> {
        self.quantity
    }

    /// Returns the dry-matter share of total mass.
    #[must_use]
    pub fn dry_matter(&self) -> Ratio {
        self.dry_matter.get()
    }

    /// Returns the volatile-solids share of dry matter.
    #[must_use]
    pub fn volatile_solids(&self) -> Ratio {
        self.volatile_solids.get()
    }

    /// Returns the biogas yield per unit of volatile solids.
    #[must_use]
    pub fn gas_yield(&self) -> SpecificVolume {
        self.gas_yield.get()
    }

    /// Returns the methane share of the biogas.
    #[must_use]
    pub fn methane(&self) -> Ratio {
        self.methane.get()
    }

    /// Returns the share of volatile solids destroyed by digestion.
    #[must_use]
    pub fn reduction(&self) -> Ratio {
        self.reduction.get()
    }

    /// Dry-matter mass rate.
    #[must_use]
    pub fn dry_matter_rate(&self) -> MassRate {
        self.quantity() * self.dry_matter()
    }

    /// Volatile-solids mass rate.
    #[must_use]
    pub fn volatile_solids_rate(&self) -> MassRate {
        self.dry_matter_rate() * self.volatile_solids()
    }

    /// Computes all rates derived from this entry.
    ///
    /// A zero-quantity entry yields zero for every rate.
    #[must_use]
    pub fn rates(&self) -> DerivedRates {
        let volatile_solids = self.volatile_solids_rate();
        let biogas: VolumeRate = volatile_solids * self.gas_yield();
        DerivedRates {
            mass: self.quantity(),
            dry_matter: self.dry_matter_rate(),
            volatile_solids,
            biogas,
            methane: biogas * self.methane(),
        }
    }

    /// Overwrites quantity and composition after digestion.
    pub(crate) fn set_digested(
        &mut self,
        quantity: Constrained<MassRate, NonNegative>,
        dry_matter: Constrained<Ratio, UnitInterval>,
        volatile_solids: Constrained<Ratio, UnitInterval>,
    ) {
        self.quantity = quantity;
        self.dry_matter = dry_matter;
        self.volatile_solids = volatile_solids;
    }
}

impl TryFrom<FeedstockRecord> for FeedstockEntry {
    type Error = ValidationError;

    fn try_from(record: FeedstockRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.name,
            tonnes_per_annum(record.rate),
            Ratio::new::<percent>(record.dm_percent),
            Ratio::new::<percent>(record.vs_percent),
            cubic_meters_per_tonne(record.gas_yield),
            Ratio::new::<percent>(record.methane_percent),
            Ratio::new::<percent>(record.digest_reduction_percent),
        )
    }
}
