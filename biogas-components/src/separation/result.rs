use serde::Serialize;
use uom::si::f64::{MassRate, Ratio};

use crate::warning::DegenerateResultWarning;

/// What one stage of a cascade did to the liquid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageResult {
    /// 1-based position in the cascade.
    pub stage: usize,
    pub present: bool,
    pub input_mass: MassRate,
    pub input_dry_matter_share: Ratio,
    pub sludge_mass: MassRate,
    /// Dry matter removed with the sludge.
    pub sludge_dry_matter: MassRate,
    pub sludge_dry_matter_share: Ratio,
    pub liquid_mass: MassRate,
    pub liquid_dry_matter: MassRate,
    pub liquid_dry_matter_share: Ratio,
}

impl StageResult {
    /// Returns the stage name used on equipment sheets, e.g. `Stage_1`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Stage_{}", self.stage)
    }
}

/// Mass, dry matter and dry-matter share of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StreamSummary {
    pub mass: MassRate,
    pub dry_matter: MassRate,
    /// Zero when the stream is empty.
    pub dry_matter_share: Ratio,
}

/// Result of running a liquid through a separation cascade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeResult {
    /// One result per configured stage, absent stages included.
    pub stages: Vec<StageResult>,
    /// Liquid leaving the last stage.
    pub final_liquid: StreamSummary,
    /// Sludge accumulated over all active stages.
    pub total_sludge: StreamSummary,
    pub warnings: Vec<DegenerateResultWarning>,
}
