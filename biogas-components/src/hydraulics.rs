//! Digester volumes and hydraulic retention times.
//!
//! Retention time is the digester volume over the volumetric flow through
//! it. Mass rates convert to volume rates through an assumed bulk density.
//! The outflow is smaller than the inflow by the mass converted to biogas;
//! unless a measured outflow is supplied it is estimated with a fixed mass
//! loss share.

use std::convert::Infallible;

use biogas_core::{
    Model,
    constraint::{Constrained, NonNegative, StrictlyPositive, UnitInterval},
};
use serde::{Deserialize, Serialize};
use uom::{
    ConstZero,
    si::{
        f64::{MassDensity, MassRate, Ratio, Time, Volume, VolumeRate},
        mass_density::kilogram_per_cubic_meter,
        ratio::{percent, ratio},
        time::day,
        volume::cubic_meter,
    },
};

use crate::{
    error::ValidationError,
    ledger::Ledger,
    units::{in_cubic_meters_per_day, in_tonnes_per_annum, tonnes_per_annum},
    warning::DegenerateResultWarning,
};

/// Share of the inflow mass assumed lost to biogas, %.
pub const DEFAULT_MASS_LOSS_PERCENT: f64 = 15.0;

/// Bulk density of digester contents, kg/m³.
pub const DEFAULT_DENSITY: f64 = 1000.0;

/// Installed digester tanks as supplied by an external loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityRecord {
    pub primary_tank_count: u32,
    /// Usable volume per primary tank, m³.
    pub primary_tank_volume: f64,
    pub secondary_tank_count: u32,
    /// Usable volume per secondary tank, m³.
    pub secondary_tank_volume: f64,
}

impl Default for CapacityRecord {
    fn default() -> Self {
        Self {
            primary_tank_count: 1,
            primary_tank_volume: 2000.0,
            secondary_tank_count: 1,
            secondary_tank_volume: 1500.0,
        }
    }
}

/// Validated digester capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigesterCapacity {
    primary_tanks: u32,
    primary_tank_volume: Constrained<Volume, NonNegative>,
    secondary_tanks: u32,
    secondary_tank_volume: Constrained<Volume, NonNegative>,
}

impl DigesterCapacity {
    /// Creates a capacity from tank counts and per-tank volumes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Capacity`] if a volume is negative or not finite.
    pub fn new(
        primary_tanks: u32,
        primary_tank_volume: Volume,
        secondary_tanks: u32,
        secondary_tank_volume: Volume,
    ) -> Result<Self, ValidationError> {
        let volume = |field: &'static str, value: Volume| {
            NonNegative::finite(value).map_err(|source| ValidationError::Capacity {
                field,
                value: value.get::<cubic_meter>(),
                source,
            })
        };

        Ok(Self {
            primary_tanks,
            primary_tank_volume: volume("primary tank volume", primary_tank_volume)?,
            secondary_tanks,
            secondary_tank_volume: volume("secondary tank volume", secondary_tank_volume)?,
        })
    }

    /// Combined volume of the primary tanks.
    #[must_use]
    pub fn primary_volume(&self) -> Volume {
        self.primary_tank_volume.get() * f64::from(self.primary_tanks)
    }

    /// Combined volume of the secondary tanks.
    #[must_use]
    pub fn secondary_volume(&self) -> Volume {
        self.secondary_tank_volume.get() * f64::from(self.secondary_tanks)
    }

    #[must_use]
    pub fn total_volume(&self) -> Volume {
        self.primary_volume() + self.secondary_volume()
    }
}

impl TryFrom<CapacityRecord> for DigesterCapacity {
    type Error = ValidationError;

    fn try_from(record: CapacityRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.primary_tank_count,
            Volume::new::<cubic_meter>(record.primary_tank_volume),
            record.secondary_tank_count,
            Volume::new::<cubic_meter>(record.secondary_tank_volume),
        )
    }
}

/// How the digester outflow is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFlowBasis {
    /// Outflow is the inflow less this share of its mass.
    AssumedMassLoss(Constrained<Ratio, UnitInterval>),
    /// Outflow is a known mass rate, such as the digested ledger total.
    Measured(Constrained<MassRate, NonNegative>),
}

/// Assumptions behind the volumetric flows.
///
/// The density is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicAssumptions {
    density: MassDensity,
    output_flow: OutputFlowBasis,
}

impl HydraulicAssumptions {
    /// # Errors
    ///
    /// Returns [`ValidationError::Assumption`] if the density is not positive
    /// or not finite.
    pub fn new(density: MassDensity, output_flow: OutputFlowBasis) -> Result<Self, ValidationError> {
        NonNegative::finite(density)
            .and_then(|_| StrictlyPositive::new(density))
            .map_err(|source| ValidationError::Assumption {
                field: "density",
                value: density.get::<kilogram_per_cubic_meter>(),
                source,
            })?;
        Ok(Self {
            density,
            output_flow,
        })
    }

    /// Replaces the output flow basis.
    #[must_use]
    pub fn with_output_flow(self, output_flow: OutputFlowBasis) -> Self {
        Self {
            output_flow,
            ..self
        }
    }

    #[must_use]
    pub fn density(&self) -> MassDensity {
        self.density
    }

    #[must_use]
    pub fn output_flow(&self) -> OutputFlowBasis {
        self.output_flow
    }
}

impl Default for HydraulicAssumptions {
    /// 1000 kg/m³ and a 15% mass loss.
    fn default() -> Self {
        Self {
            density: MassDensity::new::<kilogram_per_cubic_meter>(DEFAULT_DENSITY),
            output_flow: OutputFlowBasis::AssumedMassLoss(UnitInterval::saturating(
                Ratio::new::<percent>(DEFAULT_MASS_LOSS_PERCENT),
            )),
        }
    }
}

/// Hydraulic assumptions as supplied by an external loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionsRecord {
    /// Share of inflow mass lost to biogas, %. Ignored when a measured rate is given.
    pub mass_loss_percent: f64,
    /// Bulk density, kg/m³.
    pub density: f64,
    /// Measured outflow, T/A.
    pub measured_output_rate: Option<f64>,
}

impl Default for AssumptionsRecord {
    fn default() -> Self {
        Self {
            mass_loss_percent: DEFAULT_MASS_LOSS_PERCENT,
            density: DEFAULT_DENSITY,
            measured_output_rate: None,
        }
    }
}

impl TryFrom<AssumptionsRecord> for HydraulicAssumptions {
    type Error = ValidationError;

    fn try_from(record: AssumptionsRecord) -> Result<Self, Self::Error> {
        let output_flow = match record.measured_output_rate {
            Some(rate) => OutputFlowBasis::Measured(
                NonNegative::finite(tonnes_per_annum(rate)).map_err(|source| {
                    ValidationError::Assumption {
                        field: "measured output rate",
                        value: rate,
                        source,
                    }
                })?,
            ),
            None => OutputFlowBasis::AssumedMassLoss(
                UnitInterval::new(Ratio::new::<percent>(record.mass_loss_percent)).map_err(
                    |source| ValidationError::Assumption {
                        field: "mass loss",
                        value: record.mass_loss_percent,
                        source,
                    },
                )?,
            ),
        };

        Self::new(
            MassDensity::new::<kilogram_per_cubic_meter>(record.density),
            output_flow,
        )
    }
}

/// Volumes, flows and retention times of the digester train.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydraulicResult {
    pub primary_volume: Volume,
    pub secondary_volume: Volume,
    pub total_volume: Volume,
    /// Mass rate entering the digesters.
    pub input_mass: MassRate,
    pub input_flow: VolumeRate,
    pub output_flow: VolumeRate,
    /// Total volume over the inflow; zero without inflow.
    pub retention_time_input: Time,
    /// Total volume over the mean of inflow and outflow; zero without flow.
    pub retention_time_average: Time,
    pub warnings: Vec<DegenerateResultWarning>,
}

/// Computes hydraulic retention for a fixed digester train.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HydraulicCalculator {
    capacity: DigesterCapacity,
    assumptions: HydraulicAssumptions,
}

impl HydraulicCalculator {
    #[must_use]
    pub fn new(capacity: DigesterCapacity, assumptions: HydraulicAssumptions) -> Self {
        Self {
            capacity,
            assumptions,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> &DigesterCapacity {
        &self.capacity
    }

    #[must_use]
    pub fn assumptions(&self) -> &HydraulicAssumptions {
        &self.assumptions
    }

    /// Computes retention times for the given total inflow mass rate.
    #[must_use]
    pub fn compute(&self, input_mass: Constrained<MassRate, NonNegative>) -> HydraulicResult {
        let input_mass = input_mass.get();
        let density = self.assumptions.density();
        let input_flow: VolumeRate = input_mass / density;
        let output_flow: VolumeRate = match self.assumptions.output_flow {
            OutputFlowBasis::AssumedMassLoss(loss) => {
                input_flow * (Ratio::new::<ratio>(1.0) - loss.get())
            }
            OutputFlowBasis::Measured(rate) => rate.get() / density,
        };

        let total_volume = self.capacity.total_volume();
        let mut warnings = Vec::new();

        let retention_time_input = if input_flow > VolumeRate::ZERO {
            total_volume / input_flow
        } else {
            warnings.push(DegenerateResultWarning::ZeroInflow.emit("hydraulics"));
            Time::ZERO
        };

        let average_flow = (input_flow + output_flow) / 2.0;
        let retention_time_average = if average_flow > VolumeRate::ZERO {
            total_volume / average_flow
        } else {
            Time::ZERO
        };

        tracing::info!(
            input_t_per_annum = in_tonnes_per_annum(input_mass),
            input_m3_per_day = in_cubic_meters_per_day(input_flow),
            total_volume_m3 = total_volume.get::<cubic_meter>(),
            retention_days = retention_time_input.get::<day>(),
            "hydraulic retention computed"
        );

        HydraulicResult {
            primary_volume: self.capacity.primary_volume(),
            secondary_volume: self.capacity.secondary_volume(),
            total_volume,
            input_mass,
            input_flow,
            output_flow,
            retention_time_input,
            retention_time_average,
            warnings,
        }
    }

    /// Computes retention times with the ledger total as inflow.
    #[must_use]
    pub fn compute_for_ledger(&self, ledger: &Ledger) -> HydraulicResult {
        self.compute(ledger.total_quantity())
    }
}

impl Model for HydraulicCalculator {
    type Input = Constrained<MassRate, NonNegative>;
    type Output = HydraulicResult;
    type Error = Infallible;

    fn call(&self, input: &Constrained<MassRate, NonNegative>) -> Result<HydraulicResult, Infallible> {
        Ok(self.compute(*input))
    }
}
