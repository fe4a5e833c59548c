//! Plant descriptions shared by the integration tests.
//!
//! The same plant is written out in JSON, TOML and YAML so the tests can check
//! that every format deserializes into an identical description.

use serde::de::DeserializeOwned;

/// Two feeds, water and recirculate, two active stages and one absent,
/// 2 × 2000 m³ primary and 1 × 1500 m³ secondary digestion.
pub const PLANT_TOML: &str = r#"
[[feedstocks]]
name = "cattle_slurry"
rate = 6000.0
dm_percent = 8.0
vs_percent = 80.0
gas_yield = 300.0
methane_percent = 55.0
digest_reduction_percent = 40.0

[[feedstocks]]
name = "maize_silage"
rate = 3000.0
dm_percent = 33.0
vs_percent = 95.0
gas_yield = 600.0
methane_percent = 52.0
digest_reduction_percent = 80.0

[[additives]]
name = "clean_water"
rate = 500.0
dm_percent = 0.0
vs_percent = 0.0
gas_yield = 0.0
methane_percent = 0.0
digest_reduction_percent = 0.0

[[additives]]
name = "recirc_fluid"
rate = 500.0
dm_percent = 5.0
vs_percent = 0.0
gas_yield = 0.0
methane_percent = 0.0
digest_reduction_percent = 0.0

[[separation]]
present = true
dm_removal_percent = 30.0
sludge_dm_percent = 15.0

[[separation]]
present = true
dm_removal_percent = 25.0
sludge_dm_percent = 20.0

[[separation]]
present = false
dm_removal_percent = 20.0
sludge_dm_percent = 25.0

[capacity]
primary_tank_count = 2
primary_tank_volume = 2000.0
secondary_tank_count = 1
secondary_tank_volume = 1500.0
"#;

/// [`PLANT_TOML`] in JSON.
pub const PLANT_JSON: &str = r#"{
  "feedstocks": [
    { "name": "cattle_slurry", "rate": 6000.0, "dm_percent": 8.0, "vs_percent": 80.0,
      "gas_yield": 300.0, "methane_percent": 55.0, "digest_reduction_percent": 40.0 },
    { "name": "maize_silage", "rate": 3000.0, "dm_percent": 33.0, "vs_percent": 95.0,
      "gas_yield": 600.0, "methane_percent": 52.0, "digest_reduction_percent": 80.0 }
  ],
  "additives": [
    { "name": "clean_water", "rate": 500.0, "dm_percent": 0.0, "vs_percent": 0.0,
      "gas_yield": 0.0, "methane_percent": 0.0, "digest_reduction_percent": 0.0 },
    { "name": "recirc_fluid", "rate": 500.0, "dm_percent": 5.0, "vs_percent": 0.0,
      "gas_yield": 0.0, "methane_percent": 0.0, "digest_reduction_percent": 0.0 }
  ],
  "separation": [
    { "present": true, "dm_removal_percent": 30.0, "sludge_dm_percent": 15.0 },
    { "present": true, "dm_removal_percent": 25.0, "sludge_dm_percent": 20.0 },
    { "present": false, "dm_removal_percent": 20.0, "sludge_dm_percent": 25.0 }
  ],
  "capacity": {
    "primary_tank_count": 2,
    "primary_tank_volume": 2000.0,
    "secondary_tank_count": 1,
    "secondary_tank_volume": 1500.0
  }
}"#;

/// [`PLANT_TOML`] in YAML.
pub const PLANT_YAML: &str = r"
feedstocks:
  - name: cattle_slurry
    rate: 6000.0
    dm_percent: 8.0
    vs_percent: 80.0
    gas_yield: 300.0
    methane_percent: 55.0
    digest_reduction_percent: 40.0
  - name: maize_silage
    rate: 3000.0
    dm_percent: 33.0
    vs_percent: 95.0
    gas_yield: 600.0
    methane_percent: 52.0
    digest_reduction_percent: 80.0
additives:
  - name: clean_water
    rate: 500.0
    dm_percent: 0.0
    vs_percent: 0.0
    gas_yield: 0.0
    methane_percent: 0.0
    digest_reduction_percent: 0.0
  - name: recirc_fluid
    rate: 500.0
    dm_percent: 5.0
    vs_percent: 0.0
    gas_yield: 0.0
    methane_percent: 0.0
    digest_reduction_percent: 0.0
separation:
  - present: true
    dm_removal_percent: 30.0
    sludge_dm_percent: 15.0
  - present: true
    dm_removal_percent: 25.0
    sludge_dm_percent: 20.0
  - present: false
    dm_removal_percent: 20.0
    sludge_dm_percent: 25.0
capacity:
  primary_tank_count: 2
  primary_tank_volume: 2000.0
  secondary_tank_count: 1
  secondary_tank_volume: 1500.0
";

/// An equipment sheet as operators keep it, with counts as numbers, a
/// volume as text and flags in both spellings.
pub const EQUIPMENT_JSON: &str = r#"{
  "Primary_Digestion": {
    "No_Tanks": { "value": 2, "unit": "count" },
    "Usable_Volume": { "value": "2000", "unit": "m3" }
  },
  "Secondary_Digestion": {
    "No_Tanks": { "value": 1, "unit": "count" },
    "Usable_Volume": { "value": 1500.0, "unit": "m3" }
  },
  "Stage_1": {
    "Present": { "value": "True", "unit": "boolean" },
    "DM_Removal_Percent": { "value": 30, "unit": "%" },
    "Sludge_DM": { "value": 15, "unit": "%" }
  },
  "Stage_2": {
    "Present": { "value": true, "unit": "boolean" },
    "DM_Removal_Percent": { "value": 25, "unit": "%" }
  },
  "Stage_3": {
    "Present": { "value": "False", "unit": "boolean" },
    "DM_Removal_Percent": { "value": 20, "unit": "%" },
    "Sludge_DM": { "value": 25, "unit": "%" }
  },
  "Gas_Upgrading": {
    "Membrane_Area": { "value": 120, "unit": "m2" }
  }
}"#;

/// The formats a plant description can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

/// Deserializes a description from text in the given format.
///
/// # Errors
///
/// Returns the parser's error as a string.
pub fn parse<T: DeserializeOwned>(format: Format, text: &str) -> Result<T, String> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(text).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}
