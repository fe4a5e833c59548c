//! Mass-balance models for a biogas plant.
//!
//! Feedstocks are collected in a [`Ledger`], digested in place by
//! [`digest`], and the digestate is split into liquid and sludge by a
//! [`SeparationCascade`]. The [`HydraulicCalculator`] derives digester
//! volumes and retention times, and [`Plant`] runs the whole pipeline.
//!
//! All quantities are `uom` SI quantities. The [`units`] module converts to
//! and from the plant units used in configuration (tonnes per annum, m³ per
//! tonne, percent).

pub mod digestion;
pub mod equipment;
pub mod error;
pub mod feedstock;
pub mod hydraulics;
pub mod ledger;
pub mod plant;
pub mod separation;
pub mod units;
pub mod warning;

pub use digestion::{Digested, Digester, DigestionReport, DigestionRow, digest};
pub use equipment::{EquipmentSheet, Parameter, ParameterValue};
pub use error::{EquipmentError, PlantError, ValidationError};
pub use feedstock::{FeedstockEntry, FeedstockRecord};
pub use hydraulics::{
    AssumptionsRecord, CapacityRecord, DigesterCapacity, HydraulicAssumptions, HydraulicCalculator,
    HydraulicResult, OutputFlowBasis,
};
pub use ledger::{Ledger, LedgerSummary, RateRow};
pub use plant::{HeadlineMetrics, Plant, PlantConfig, PlantReport, pasteurize};
pub use separation::{
    CascadeResult, LiquidFeed, SeparationCascade, SeparationStage, SeparationStageRecord,
    StageResult, StreamSummary,
};
pub use warning::DegenerateResultWarning;
