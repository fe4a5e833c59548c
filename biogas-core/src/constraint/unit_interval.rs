use std::cmp::Ordering;

use uom::si::{f64::Ratio, ratio::ratio};

use super::{Constrained, Constraint, ConstraintError};

/// Types with well-defined zero and one bounds.
///
/// Implemented for `f64` and `uom::si::f64::Ratio`.
pub trait UnitBounds: PartialOrd + Sized {
    fn zero() -> Self;
    fn one() -> Self;
}

impl UnitBounds for f64 {
    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }
}

impl UnitBounds for Ratio {
    fn zero() -> Self {
        Ratio::new::<ratio>(0.0)
    }

    fn one() -> Self {
        Ratio::new::<ratio>(1.0)
    }
}

/// Marker type enforcing that a value lies in the closed unit interval `[0, 1]`.
///
/// Plant percentages (dry matter, volatile solids, methane share, reduction
/// factor) are stored as `Constrained<Ratio, UnitInterval>`.
///
/// # Examples
///
/// ```
/// use biogas_core::constraint::UnitInterval;
/// use uom::si::{f64::Ratio, ratio::percent};
///
/// let dm = UnitInterval::new(Ratio::new::<percent>(20.0)).unwrap();
/// assert!((dm.into_inner().get::<percent>() - 20.0).abs() < 1e-12);
///
/// assert!(UnitInterval::new(Ratio::new::<percent>(120.0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitInterval;

impl UnitInterval {
    /// Constructs `Constrained<T, UnitInterval>` if `0 <= value <= 1`.
    ///
    /// # Errors
    ///
    /// - [`ConstraintError::BelowMinimum`] if less than zero.
    /// - [`ConstraintError::AboveMaximum`] if greater than one.
    /// - [`ConstraintError::NotANumber`] if the comparison is undefined.
    pub fn new<T: UnitBounds>(value: T) -> Result<Constrained<T, UnitInterval>, ConstraintError> {
        Constrained::new(value)
    }

    /// Constructs a constrained value, saturating out-of-range inputs.
    ///
    /// Values below zero and `NaN` map to zero, values above one map to one.
    /// Used for fractions recomputed from rates, where rounding can land a
    /// hair outside the interval.
    #[must_use]
    pub fn saturating<T: UnitBounds>(value: T) -> Constrained<T, UnitInterval> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (Some(Ordering::Less) | None, _) | (_, None) => Self::zero(),
            (_, Some(Ordering::Greater)) => Self::one(),
            _ => Constrained::new_unchecked(value),
        }
    }

    /// Returns the lower bound (zero) as a constrained value.
    #[must_use]
    pub fn zero<T: UnitBounds>() -> Constrained<T, UnitInterval> {
        Constrained::new_unchecked(T::zero())
    }

    /// Returns the upper bound (one) as a constrained value.
    #[must_use]
    pub fn one<T: UnitBounds>() -> Constrained<T, UnitInterval> {
        Constrained::new_unchecked(T::one())
    }
}

impl<T: UnitBounds> Constraint<T> for UnitInterval {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match (value.partial_cmp(&T::zero()), value.partial_cmp(&T::one())) {
            (None, _) | (_, None) => Err(ConstraintError::NotANumber),
            (Some(Ordering::Less), _) => Err(ConstraintError::BelowMinimum),
            (_, Some(Ordering::Greater)) => Err(ConstraintError::AboveMaximum),
            _ => Ok(()),
        }
    }
}
