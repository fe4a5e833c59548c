//! Errors raised before any model mutates its input.
//!
//! Every error here is returned while external records are converted into
//! typed model inputs, never halfway through a computation.

use biogas_core::constraint::ConstraintError;
use thiserror::Error;

/// An input value is outside the range the plant models accept.
///
/// Validation happens when external records are converted into typed model
/// inputs, so a failing conversion never leaves a ledger half-populated.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A feedstock record has no name.
    #[error("feedstock name must not be empty")]
    EmptyName,

    /// A feedstock field is negative, out of range, or not finite.
    #[error("feedstock `{name}`: invalid {field} ({value})")]
    Feedstock {
        name: String,
        field: &'static str,
        value: f64,
        #[source]
        source: ConstraintError,
    },

    /// A separation stage field is out of range.
    ///
    /// Includes a non-positive sludge dry-matter share on an active stage.
    #[error("separation stage {stage}: invalid {field} ({value})")]
    SeparationStage {
        stage: usize,
        field: &'static str,
        value: f64,
        #[source]
        source: ConstraintError,
    },

    /// The liquid entering a separation cascade is invalid.
    #[error("liquid feed: invalid {field} ({value})")]
    LiquidFeed {
        field: &'static str,
        value: f64,
        #[source]
        source: ConstraintError,
    },

    /// The liquid feed carries more dry matter than total mass.
    #[error("liquid feed: dry matter ({dry_matter} T/A) exceeds total mass ({mass} T/A)")]
    DryMatterExceedsMass { mass: f64, dry_matter: f64 },

    /// A digester capacity field is invalid.
    #[error("digester capacity: invalid {field} ({value})")]
    Capacity {
        field: &'static str,
        value: f64,
        #[source]
        source: ConstraintError,
    },

    /// A hydraulic assumption is invalid.
    #[error("hydraulic assumption: invalid {field} ({value})")]
    Assumption {
        field: &'static str,
        value: f64,
        #[source]
        source: ConstraintError,
    },
}

/// An equipment sheet parameter could not be coerced into a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EquipmentError {
    #[error("{equipment}.{parameter}: expected a number, found {found}")]
    NotANumber {
        equipment: String,
        parameter: String,
        found: String,
    },

    #[error("{equipment}.{parameter}: expected true or false, found {found}")]
    NotAFlag {
        equipment: String,
        parameter: String,
        found: String,
    },

    /// Tank counts must be whole, non-negative numbers.
    #[error("{equipment}.{parameter}: expected a tank count, found {found}")]
    NotACount {
        equipment: String,
        parameter: String,
        found: String,
    },

    /// The coerced values failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A plant description could not be turned into a runnable plant.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PlantError {
    #[error("invalid feedstock")]
    Feed(#[source] ValidationError),

    #[error("invalid additive")]
    Additive(#[source] ValidationError),

    #[error("invalid separation stage")]
    Separation(#[source] ValidationError),

    #[error("invalid digester capacity")]
    Capacity(#[source] ValidationError),

    #[error("invalid hydraulic assumptions")]
    Hydraulics(#[source] ValidationError),

    #[error("invalid equipment sheet")]
    Equipment(#[from] EquipmentError),
}

impl ValidationError {
    pub(crate) fn feedstock(
        name: &str,
        field: &'static str,
        value: f64,
    ) -> impl FnOnce(ConstraintError) -> Self + use<> {
        let name = name.to_string();
        move |source| Self::Feedstock {
            name,
            field,
            value,
            source,
        }
    }

    pub(crate) fn stage(
        stage: usize,
        field: &'static str,
        value: f64,
    ) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::SeparationStage {
            stage,
            field,
            value,
            source,
        }
    }
}
