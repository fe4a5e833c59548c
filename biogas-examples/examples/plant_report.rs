//! # Plant Report
//!
//! Runs a small farm-scale biogas plant through feed, mix, digestion,
//! pasteurization and a three-stage separation train, then prints the
//! ledger after every step together with the digestion breakdown, the
//! separation results and the hydraulic retention time.
//!
//! The plant is described in TOML, the same format operators keep their
//! plant descriptions in.
//!
//! ## Running the Example
//!
//! ```sh
//! cargo run --example plant_report
//! RUST_LOG=biogas_components=debug cargo run --example plant_report
//! ```

use std::error::Error;

use biogas_components::{
    LedgerSummary, Plant, PlantConfig,
    units::{in_cubic_meters_per_annum, in_tonnes_per_annum, in_tonnes_per_day},
};
use tracing_subscriber::EnvFilter;
use uom::si::{ratio::percent, time::day, volume::cubic_meter};

const PLANT: &str = r#"
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
rate = 2500.0
dm_percent = 33.0
vs_percent = 95.0
gas_yield = 600.0
methane_percent = 52.0
digest_reduction_percent = 80.0

[[feedstocks]]
name = "farmyard_manure"
rate = 1000.0
dm_percent = 25.0
vs_percent = 80.0
gas_yield = 350.0
methane_percent = 55.0
digest_reduction_percent = 45.0

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
rate = 1000.0
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

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config: PlantConfig = toml::from_str(PLANT)?;
    let plant = Plant::new(config)?;
    let report = plant.run()?;

    print_summary("FEED", &report.feed);
    print_summary("MIX", &report.mixed);
    print_summary("DIGEST", &report.digested);

    println!(
        "METHANE YIELD: {:.1} m³/A ({:.1}% of {:.1} m³/A biogas)",
        in_cubic_meters_per_annum(report.metrics.methane),
        report.metrics.methane_share.get::<percent>(),
        in_cubic_meters_per_annum(report.metrics.biogas),
    );
    println!("\nMASS REDUCTION TABLE:");
    println!(
        "{:<18} {:>12} {:>12} {:>12} {:>10} {:>14} {:>14}",
        "Feed", "Initial T/A", "Reduced T/A", "Final T/A", "Red. %", "Biogas m³/A", "Methane m³/A"
    );
    for row in report.digestion.rows.iter().chain(&report.digestion.total) {
        println!(
            "{:<18} {:>12.2} {:>12.2} {:>12.2} {:>10.2} {:>14.2} {:>14.2}",
            row.name,
            in_tonnes_per_annum(row.initial_mass),
            in_tonnes_per_annum(row.volatile_solids_destroyed),
            in_tonnes_per_annum(row.final_mass),
            row.mass_reduction.get::<percent>(),
            in_cubic_meters_per_annum(row.biogas),
            in_cubic_meters_per_annum(row.methane),
        );
    }
    println!();

    print_summary("PASTEURIZE", &report.pasteurized);

    println!("SEQUENTIAL SEPARATION");
    println!("------------------------------------");
    for stage in &report.separation.stages {
        let state = if stage.present { "ACTIVE" } else { "INACTIVE" };
        println!("{} ({state}):", stage.label());
        println!(
            "  Input: {:.1} T/A at {:.2}% DM",
            in_tonnes_per_annum(stage.input_mass),
            stage.input_dry_matter_share.get::<percent>()
        );
        if stage.present {
            println!(
                "  Sludge: {:.1} T/A at {:.1}% DM",
                in_tonnes_per_annum(stage.sludge_mass),
                stage.sludge_dry_matter_share.get::<percent>()
            );
            println!(
                "  Liquid: {:.1} T/A at {:.2}% DM",
                in_tonnes_per_annum(stage.liquid_mass),
                stage.liquid_dry_matter_share.get::<percent>()
            );
        } else {
            println!("  No separation (stage inactive)");
        }
    }
    let liquid = &report.separation.final_liquid;
    let sludge = &report.separation.total_sludge;
    println!(
        "\nFinal Liquid: {:.1} T/A at {:.2}% DM",
        in_tonnes_per_annum(liquid.mass),
        liquid.dry_matter_share.get::<percent>()
    );
    println!(
        "Total Sludge: {:.1} T/A at {:.2}% DM\n",
        in_tonnes_per_annum(sludge.mass),
        sludge.dry_matter_share.get::<percent>()
    );

    let hydraulics = &report.hydraulics;
    println!("HYDRAULIC RETENTION");
    println!("------------------------------------");
    println!(
        "Digester volume: {:.0} m³ primary + {:.0} m³ secondary = {:.0} m³",
        hydraulics.primary_volume.get::<cubic_meter>(),
        hydraulics.secondary_volume.get::<cubic_meter>(),
        hydraulics.total_volume.get::<cubic_meter>(),
    );
    println!("Daily input: {:.2} T/day", in_tonnes_per_day(hydraulics.input_mass));
    println!(
        "Retention time: {:.1} days (input basis), {:.1} days (average flow)",
        hydraulics.retention_time_input.get::<day>(),
        hydraulics.retention_time_average.get::<day>(),
    );

    for warning in report.warnings() {
        println!("warning: {warning}");
    }

    Ok(())
}

fn print_summary(title: &str, summary: &LedgerSummary) {
    println!("{title}");
    println!("------------------------------------");
    println!(
        "{:<18} {:>12} {:>12} {:>12} {:>14} {:>14}",
        "Feed", "Mass T/A", "DM T/A", "VS T/A", "Biogas m³/A", "Methane m³/A"
    );
    for row in summary.entries.iter().chain(&summary.total) {
        println!(
            "{:<18} {:>12.2} {:>12.2} {:>12.2} {:>14.2} {:>14.2}",
            row.name,
            in_tonnes_per_annum(row.mass),
            in_tonnes_per_annum(row.dry_matter),
            in_tonnes_per_annum(row.volatile_solids),
            in_cubic_meters_per_annum(row.biogas),
            in_cubic_meters_per_annum(row.methane),
        );
    }
    println!("DM PERCENTAGE: {:.2} %\n", summary.dry_matter.get::<percent>());
}
