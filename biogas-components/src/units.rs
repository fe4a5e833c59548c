//! Plant units on top of `uom` SI quantities.
//!
//! Models store SI quantities. Plant operators think in tonnes per annum,
//! cubic meters per annum and cubic meters of biogas per tonne of volatile
//! solids, so configuration records and reports convert at the boundary with
//! the helpers here. A year is [`DAYS_PER_YEAR`] days long.

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Ratio, SpecificVolume, VolumeRate},
        mass_rate::kilogram_per_second,
        ratio::ratio,
        specific_volume::cubic_meter_per_kilogram,
        volume_rate::cubic_meter_per_second,
    },
};

/// Days per annum, including the leap-year quarter day.
pub const DAYS_PER_YEAR: f64 = 365.25;

const SECONDS_PER_DAY: f64 = 86_400.0;
const SECONDS_PER_YEAR: f64 = DAYS_PER_YEAR * SECONDS_PER_DAY;
const KILOGRAMS_PER_TONNE: f64 = 1_000.0;

/// Creates a mass rate from tonnes per annum (T/A).
#[must_use]
pub fn tonnes_per_annum(value: f64) -> MassRate {
    MassRate::new::<kilogram_per_second>(value * KILOGRAMS_PER_TONNE / SECONDS_PER_YEAR)
}

/// Returns a mass rate in tonnes per annum (T/A).
#[must_use]
pub fn in_tonnes_per_annum(rate: MassRate) -> f64 {
    rate.get::<kilogram_per_second>() * SECONDS_PER_YEAR / KILOGRAMS_PER_TONNE
}

/// Returns a mass rate in tonnes per day.
#[must_use]
pub fn in_tonnes_per_day(rate: MassRate) -> f64 {
    rate.get::<kilogram_per_second>() * SECONDS_PER_DAY / KILOGRAMS_PER_TONNE
}

/// Creates a volume rate from cubic meters per annum (m³/A).
#[must_use]
pub fn cubic_meters_per_annum(value: f64) -> VolumeRate {
    VolumeRate::new::<cubic_meter_per_second>(value / SECONDS_PER_YEAR)
}

/// Returns a volume rate in cubic meters per annum (m³/A).
#[must_use]
pub fn in_cubic_meters_per_annum(rate: VolumeRate) -> f64 {
    rate.get::<cubic_meter_per_second>() * SECONDS_PER_YEAR
}

/// Returns a volume rate in cubic meters per day.
#[must_use]
pub fn in_cubic_meters_per_day(rate: VolumeRate) -> f64 {
    rate.get::<cubic_meter_per_second>() * SECONDS_PER_DAY
}

/// Creates a gas yield from cubic meters per tonne (m³/T).
#[must_use]
pub fn cubic_meters_per_tonne(value: f64) -> SpecificVolume {
    SpecificVolume::new::<cubic_meter_per_kilogram>(value / KILOGRAMS_PER_TONNE)
}

/// Returns a gas yield in cubic meters per tonne (m³/T).
#[must_use]
pub fn in_cubic_meters_per_tonne(gas_yield: SpecificVolume) -> f64 {
    gas_yield.get::<cubic_meter_per_kilogram>() * KILOGRAMS_PER_TONNE
}

/// Returns `part / whole`, or zero when `whole` is not positive.
///
/// Every percentage the models derive from summed rates goes through here,
/// so an empty or fully consumed stream reports 0% rather than `NaN`.
#[must_use]
pub fn fraction_of(part: MassRate, whole: MassRate) -> Ratio {
    if whole > MassRate::ZERO {
        part / whole
    } else {
        Ratio::new::<ratio>(0.0)
    }
}
