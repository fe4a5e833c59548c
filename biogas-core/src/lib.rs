//! Shared building blocks for biogas plant mass-balance models.
//!
//! Plant models in `biogas-components` implement the [`Model`] trait and use
//! the [`constraint`] types to make invalid feedstock and equipment values
//! unrepresentable once constructed.

pub mod constraint;
mod model;

pub use model::{Model, Snapshot};
