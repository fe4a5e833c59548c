use uom::si::f64::{Mass, MassDensity, MassRate, Ratio, SpecificVolume, Volume, VolumeRate};

/// Numeric types that can report whether they hold a finite value.
///
/// Implemented for `f64` and the `f64`-backed `uom` quantities the plant
/// models use.
pub trait Finite {
    /// Returns `true` unless the value is infinite or `NaN`.
    fn is_finite(&self) -> bool;
}

impl Finite for f64 {
    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }
}

macro_rules! finite_quantity {
    ($($quantity:ty),* $(,)?) => {
        $(
            impl Finite for $quantity {
                fn is_finite(&self) -> bool {
                    self.value.is_finite()
                }
            }
        )*
    };
}

finite_quantity!(Mass, MassDensity, MassRate, Ratio, SpecificVolume, Volume, VolumeRate);
