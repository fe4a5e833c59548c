//! Non-fatal conditions surfaced alongside otherwise valid results.

use serde::Serialize;
use thiserror::Error;

/// A computation completed, but some values were clamped to zero.
///
/// Warnings are collected on the result they apply to and also emitted as
/// `tracing` warn events, so neither a caller nor a log reader sees a silent
/// zero.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[non_exhaustive]
pub enum DegenerateResultWarning {
    /// The ledger holds no feedstocks.
    #[error("ledger is empty")]
    EmptyLedger,

    /// The total mass rate is zero, so all percentages report 0%.
    #[error("total mass is zero")]
    ZeroTotalMass,

    /// The total dry-matter rate is zero.
    #[error("total dry matter is zero")]
    ZeroDryMatter,

    /// A separation stage asked for more sludge than the liquid it received.
    ///
    /// The whole stream is sent to sludge and the remaining liquid is zero.
    /// Rates are in tonnes per annum.
    #[error(
        "separation stage {stage} over-extracts: requested {requested:.3} T/A of sludge from {available:.3} T/A"
    )]
    OverExtraction {
        stage: usize,
        requested: f64,
        available: f64,
    },

    /// Digestion produced a negative or non-finite mass for a feedstock,
    /// which was clamped to zero. The mass is in tonnes per annum.
    #[error("digested mass of `{feed}` is {mass} T/A, clamped to zero")]
    ClampedMass { feed: String, mass: f64 },

    /// The digester receives no inflow, so retention times report zero.
    #[error("digester inflow is zero")]
    ZeroInflow,
}

impl DegenerateResultWarning {
    /// Emits this warning as a `tracing` event and returns it.
    pub(crate) fn emit(self, context: &'static str) -> Self {
        tracing::warn!(context, warning = %self, "degenerate result");
        self
    }
}
