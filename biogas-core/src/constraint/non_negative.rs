use std::{cmp::Ordering, ops::Add};

use num_traits::Zero;

use super::{Constrained, Constraint, ConstraintError, Finite};

/// Marker type enforcing that a value is non-negative (zero or greater).
///
/// Works with any `T: PartialOrd + Zero`, including `f64` and `uom`
/// quantities such as `MassRate` and `Volume`.
///
/// # Examples
///
/// ```
/// use biogas_core::constraint::NonNegative;
/// use uom::si::{f64::MassRate, mass_rate::kilogram_per_second};
///
/// let rate = NonNegative::new(MassRate::new::<kilogram_per_second>(2.5)).unwrap();
/// assert_eq!(rate.into_inner().get::<kilogram_per_second>(), 2.5);
///
/// assert!(NonNegative::new(-1.0).is_err());
/// assert!(NonNegative::new(f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct NonNegative;

impl NonNegative {
    /// Constructs `Constrained<T, NonNegative>` if the value is zero or greater.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::Negative`] for negative values and
    /// [`ConstraintError::NotANumber`] if the comparison is undefined.
    pub fn new<T: PartialOrd + Zero>(value: T) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        Constrained::new(value)
    }

    /// Constructs `Constrained<T, NonNegative>` if the value is finite and
    /// zero or greater.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::NotANumber`] for `NaN`,
    /// [`ConstraintError::Infinite`] for either infinity and
    /// [`ConstraintError::Negative`] for finite negative values.
    pub fn finite<T: PartialOrd + Zero + Finite>(
        value: T,
    ) -> Result<Constrained<T, NonNegative>, ConstraintError> {
        if !value.is_finite() {
            return Err(if value.partial_cmp(&T::zero()).is_none() {
                ConstraintError::NotANumber
            } else {
                ConstraintError::Infinite
            });
        }
        Constrained::new(value)
    }

    /// Returns zero as a non-negative constrained value.
    #[must_use]
    pub fn zero<T: PartialOrd + Zero>() -> Constrained<T, NonNegative> {
        Constrained::new_unchecked(T::zero())
    }
}

impl<T: PartialOrd + Zero> Constraint<T> for NonNegative {
    fn check(value: &T) -> Result<(), ConstraintError> {
        match value.partial_cmp(&T::zero()) {
            Some(Ordering::Greater | Ordering::Equal) => Ok(()),
            Some(Ordering::Less) => Err(ConstraintError::Negative),
            None => Err(ConstraintError::NotANumber),
        }
    }
}

/// Adds two non-negative values.
///
/// The sum of two non-negative values is non-negative; checked in debug builds.
impl<T> Add for Constrained<T, NonNegative>
where
    T: Add<Output = T> + PartialOrd + Zero,
{
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let result = self.value + rhs.value;
        debug_assert!(
            result >= T::zero(),
            "Addition produced a negative value, violating NonNegative invariant"
        );
        Self::new_unchecked(result)
    }
}

impl<T> Zero for Constrained<T, NonNegative>
where
    T: Add<Output = T> + PartialOrd + Zero,
{
    fn zero() -> Self {
        NonNegative::zero()
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uom::si::{f64::MassRate, mass_rate::kilogram_per_second};

    #[test]
    fn accepts_zero_and_positive() {
        assert_eq!(NonNegative::new(0.0).unwrap().into_inner(), 0.0);
        assert_eq!(NonNegative::new(3.5).unwrap().into_inner(), 3.5);
    }

    #[test]
    fn rejects_negative_and_nan() {
        assert_eq!(NonNegative::new(-0.1), Err(ConstraintError::Negative));
        assert_eq!(NonNegative::new(f64::NAN), Err(ConstraintError::NotANumber));
    }

    #[test]
    fn finite_rejects_infinities() {
        assert_eq!(NonNegative::new(f64::INFINITY).unwrap().into_inner(), f64::INFINITY);
        assert_eq!(NonNegative::finite(f64::INFINITY), Err(ConstraintError::Infinite));
        assert_eq!(NonNegative::finite(f64::NEG_INFINITY), Err(ConstraintError::Infinite));
        assert_eq!(NonNegative::finite(f64::NAN), Err(ConstraintError::NotANumber));
        assert_eq!(NonNegative::finite(-2.0_f64), Err(ConstraintError::Negative));
        assert_eq!(NonNegative::finite(2.0_f64).unwrap().into_inner(), 2.0);

        let rate = MassRate::new::<kilogram_per_second>(f64::INFINITY);
        assert_eq!(NonNegative::finite(rate), Err(ConstraintError::Infinite));
    }

    #[test]
    fn sums_mass_rates() {
        let total: Constrained<MassRate, NonNegative> = [1.0, 2.0, 3.0]
            .into_iter()
            .map(|v| NonNegative::new(MassRate::new::<kilogram_per_second>(v)).unwrap())
            .sum();
        assert_eq!(total.into_inner().get::<kilogram_per_second>(), 6.0);
    }
}
