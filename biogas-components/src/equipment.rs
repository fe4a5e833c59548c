//! Free-form equipment parameter sheets.
//!
//! Operators describe installed equipment as `equipment type -> parameter ->
//! (value, unit)`, with values that may be numbers, flags or text. The sheet
//! is coerced into typed records here and never passed to the models as is.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::EquipmentError,
    hydraulics::{CapacityRecord, DigesterCapacity},
    separation::{DEFAULT_SLUDGE_DM_PERCENT, SeparationCascade, SeparationStageRecord},
};

pub const PRIMARY_DIGESTION: &str = "Primary_Digestion";
pub const SECONDARY_DIGESTION: &str = "Secondary_Digestion";
pub const TANK_COUNT: &str = "No_Tanks";
pub const USABLE_VOLUME: &str = "Usable_Volume";

/// Prefix of separation stage equipment, followed by the 1-based stage number.
pub const STAGE_PREFIX: &str = "Stage_";
pub const PRESENT: &str = "Present";
pub const DM_REMOVAL_PERCENT: &str = "DM_Removal_Percent";
pub const SLUDGE_DM: &str = "Sludge_DM";

/// A raw parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => write!(f, "`{text}`"),
        }
    }
}

/// A parameter value and its display unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub value: ParameterValue,
    #[serde(default)]
    pub unit: String,
}

impl Parameter {
    pub fn new(value: ParameterValue, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }
}

/// Equipment parameters keyed by equipment type, then parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentSheet {
    equipment: BTreeMap<String, BTreeMap<String, Parameter>>,
}

impl EquipmentSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, returning the one it replaced.
    pub fn insert(
        &mut self,
        equipment: impl Into<String>,
        parameter: impl Into<String>,
        value: Parameter,
    ) -> Option<Parameter> {
        self.equipment
            .entry(equipment.into())
            .or_default()
            .insert(parameter.into(), value)
    }

    #[must_use]
    pub fn get(&self, equipment: &str, parameter: &str) -> Option<&Parameter> {
        self.equipment.get(equipment)?.get(parameter)
    }

    /// Reads the digester tanks, defaulting to one 2000 m³ primary and one
    /// 1500 m³ secondary tank for anything left out.
    ///
    /// # Errors
    ///
    /// Returns [`EquipmentError`] if a count is not a whole non-negative
    /// number or a volume is not a number.
    pub fn capacity_record(&self) -> Result<CapacityRecord, EquipmentError> {
        let defaults = CapacityRecord::default();
        Ok(CapacityRecord {
            primary_tank_count: self.count(PRIMARY_DIGESTION, TANK_COUNT, defaults.primary_tank_count)?,
            primary_tank_volume: self.number(PRIMARY_DIGESTION, USABLE_VOLUME, defaults.primary_tank_volume)?,
            secondary_tank_count: self.count(
                SECONDARY_DIGESTION,
                TANK_COUNT,
                defaults.secondary_tank_count,
            )?,
            secondary_tank_volume: self.number(
                SECONDARY_DIGESTION,
                USABLE_VOLUME,
                defaults.secondary_tank_volume,
            )?,
        })
    }

    /// Reads and validates the digester tanks.
    ///
    /// # Errors
    ///
    /// See [`EquipmentSheet::capacity_record`]; also fails on negative volumes.
    pub fn digester_capacity(&self) -> Result<DigesterCapacity, EquipmentError> {
        Ok(DigesterCapacity::try_from(self.capacity_record()?)?)
    }

    /// Reads `Stage_<n>` entries ordered by `n`.
    ///
    /// Equipment whose name does not end in a stage number is not a stage and
    /// is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`EquipmentError`] if a stage parameter has the wrong kind.
    pub fn stage_records(&self) -> Result<Vec<SeparationStageRecord>, EquipmentError> {
        let mut stages: Vec<(usize, &str)> = self
            .equipment
            .keys()
            .filter_map(|name| {
                let number = name.strip_prefix(STAGE_PREFIX)?.parse().ok()?;
                Some((number, name.as_str()))
            })
            .collect();
        stages.sort_unstable();

        stages
            .into_iter()
            .map(|(_, name)| {
                Ok(SeparationStageRecord {
                    present: self.flag(name, PRESENT, false)?,
                    dm_removal_percent: self.number(name, DM_REMOVAL_PERCENT, 0.0)?,
                    sludge_dm_percent: self.number(name, SLUDGE_DM, DEFAULT_SLUDGE_DM_PERCENT)?,
                })
            })
            .collect()
    }

    /// Reads and validates the separation stages.
    ///
    /// # Errors
    ///
    /// See [`EquipmentSheet::stage_records`]; also fails on out-of-range
    /// percentages of an active stage.
    pub fn separation_cascade(&self) -> Result<SeparationCascade, EquipmentError> {
        Ok(SeparationCascade::from_records(self.stage_records()?)?)
    }

    fn number(&self, equipment: &str, parameter: &str, default: f64) -> Result<f64, EquipmentError> {
        let Some(found) = self.get(equipment, parameter) else {
            return Ok(default);
        };
        match &found.value {
            ParameterValue::Number(number) => Ok(*number),
            ParameterValue::Text(text) => text.trim().parse().map_err(|_| EquipmentError::NotANumber {
                equipment: equipment.to_string(),
                parameter: parameter.to_string(),
                found: found.value.to_string(),
            }),
            ParameterValue::Flag(_) => Err(EquipmentError::NotANumber {
                equipment: equipment.to_string(),
                parameter: parameter.to_string(),
                found: found.value.to_string(),
            }),
        }
    }

    fn count(&self, equipment: &str, parameter: &str, default: u32) -> Result<u32, EquipmentError> {
        let number = self
            .number(equipment, parameter, f64::from(default))
            .map_err(|_| not_a_count(self, equipment, parameter))?;

        if number.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&number) {
            return Err(not_a_count(self, equipment, parameter));
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = number as u32;
        Ok(count)
    }

    fn flag(&self, equipment: &str, parameter: &str, default: bool) -> Result<bool, EquipmentError> {
        let Some(found) = self.get(equipment, parameter) else {
            return Ok(default);
        };
        match &found.value {
            ParameterValue::Flag(flag) => Ok(*flag),
            ParameterValue::Text(text) if text.trim().eq_ignore_ascii_case("true") => Ok(true),
            ParameterValue::Text(text) if text.trim().eq_ignore_ascii_case("false") => Ok(false),
            value => Err(EquipmentError::NotAFlag {
                equipment: equipment.to_string(),
                parameter: parameter.to_string(),
                found: value.to_string(),
            }),
        }
    }
}

fn not_a_count(sheet: &EquipmentSheet, equipment: &str, parameter: &str) -> EquipmentError {
    EquipmentError::NotACount {
        equipment: equipment.to_string(),
        parameter: parameter.to_string(),
        found: sheet
            .get(equipment, parameter)
            .map_or_else(String::new, |found| found.value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::volume::cubic_meter;

    use crate::{error::ValidationError, separation::SeparationStage};

    fn number(value: f64, unit: &str) -> Parameter {
        Parameter::new(ParameterValue::Number(value), unit)
    }

    fn text(value: &str) -> Parameter {
        Parameter::new(ParameterValue::Text(value.to_string()), "")
    }

    #[test]
    fn empty_sheet_uses_default_tanks() {
        let record = EquipmentSheet::new().capacity_record().unwrap();
        assert_eq!(record, CapacityRecord::default());
    }

    #[test]
    fn reads_digester_tanks() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert(PRIMARY_DIGESTION, TANK_COUNT, number(2.0, "count"));
        sheet.insert(PRIMARY_DIGESTION, USABLE_VOLUME, text(" 2000 "));
        sheet.insert(SECONDARY_DIGESTION, USABLE_VOLUME, number(1500.0, "m3"));

        let capacity = sheet.digester_capacity().unwrap();
        assert_relative_eq!(capacity.total_volume().get::<cubic_meter>(), 5500.0);
    }

    #[test]
    fn rejects_fractional_tank_counts() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert(PRIMARY_DIGESTION, TANK_COUNT, number(1.5, "count"));
        assert_eq!(
            sheet.capacity_record(),
            Err(EquipmentError::NotACount {
                equipment: PRIMARY_DIGESTION.to_string(),
                parameter: TANK_COUNT.to_string(),
                found: "1.5".to_string(),
            })
        );
    }

    #[test]
    fn rejects_text_volume_and_negative_volume() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert(SECONDARY_DIGESTION, USABLE_VOLUME, text("large"));
        assert!(matches!(sheet.capacity_record(), Err(EquipmentError::NotANumber { .. })));

        sheet.insert(SECONDARY_DIGESTION, USABLE_VOLUME, number(-10.0, "m3"));
        assert!(matches!(
            sheet.digester_capacity(),
            Err(EquipmentError::Invalid(ValidationError::Capacity { .. }))
        ));
    }

    #[test]
    fn stages_are_ordered_numerically() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert("Stage_10", PRESENT, text("TRUE"));
        sheet.insert("Stage_10", DM_REMOVAL_PERCENT, number(5.0, "%"));
        sheet.insert("Stage_2", PRESENT, Parameter::new(ParameterValue::Flag(true), "boolean"));
        sheet.insert("Stage_2", DM_REMOVAL_PERCENT, number(25.0, "%"));
        sheet.insert("Stage_2", SLUDGE_DM, number(30.0, "%"));
        sheet.insert("Stage_1", PRESENT, text("False"));
        sheet.insert("Stage_Extra", PRESENT, text("true"));
        sheet.insert("Screw_Press", PRESENT, text("true"));

        let records = sheet.stage_records().unwrap();
        assert_eq!(records.len(), 3);
        assert!(!records[0].present);
        assert_eq!(records[1].dm_removal_percent, 25.0);
        assert_eq!(records[1].sludge_dm_percent, 30.0);
        assert!(records[2].present);
        assert_eq!(records[2].sludge_dm_percent, DEFAULT_SLUDGE_DM_PERCENT);

        let cascade = sheet.separation_cascade().unwrap();
        assert_eq!(cascade.stages()[0], SeparationStage::Absent);
        assert!(cascade.stages()[2].is_present());
    }

    #[test]
    fn rejects_unknown_flag_text() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert("Stage_1", PRESENT, text("maybe"));
        assert!(matches!(sheet.stage_records(), Err(EquipmentError::NotAFlag { .. })));
    }

    #[test]
    fn zero_sludge_dry_matter_is_invalid_on_active_stage() {
        let mut sheet = EquipmentSheet::new();
        sheet.insert("Stage_1", PRESENT, text("true"));
        sheet.insert("Stage_1", SLUDGE_DM, number(0.0, "%"));
        assert!(matches!(
            sheet.separation_cascade(),
            Err(EquipmentError::Invalid(ValidationError::SeparationStage { stage: 1, .. }))
        ));
    }
}
