//! Property-based tests for the mass-balance invariants.
//!
//! Whatever the stage configuration, separation must neither create nor lose
//! mass or dry matter. Digestion must only remove destroyed volatile solids.

use proptest::prelude::*;

use biogas_components::{
    FeedstockRecord, Ledger, LiquidFeed, SeparationCascade, SeparationStageRecord, digest,
    units::{in_tonnes_per_annum, tonnes_per_annum},
};

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= 1e-9 * scale.max(1.0)
}

fn stage_record() -> impl Strategy<Value = SeparationStageRecord> {
    (any::<bool>(), 0.0..=100.0f64, 0.5..=100.0f64).prop_map(
        |(present, dm_removal_percent, sludge_dm_percent)| SeparationStageRecord {
            present,
            dm_removal_percent,
            sludge_dm_percent,
        },
    )
}

fn feedstock_record(name: String) -> impl Strategy<Value = FeedstockRecord> {
    (
        0.0..100_000.0f64,
        0.0..=100.0f64,
        0.0..=100.0f64,
        0.0..1_000.0f64,
        0.0..=100.0f64,
        0.0..=100.0f64,
    )
        .prop_map(move |(rate, dm, vs, gas_yield, methane, reduction)| FeedstockRecord {
            name: name.clone(),
            rate,
            dm_percent: dm,
            vs_percent: vs,
            gas_yield,
            methane_percent: methane,
            digest_reduction_percent: reduction,
        })
}

fn ledger_records() -> impl Strategy<Value = Vec<FeedstockRecord>> {
    (1..6usize).prop_flat_map(|count| {
        (0..count)
            .map(|index| feedstock_record(format!("feed{index}")))
            .collect::<Vec<_>>()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn separation_conserves_mass_and_dry_matter(
        mass in 0.0..1_000_000.0f64,
        dm_percent in 0.0..=100.0f64,
        stages in prop::collection::vec(stage_record(), 0..6),
    ) {
        let feed = LiquidFeed::new(
            tonnes_per_annum(mass),
            tonnes_per_annum(mass * dm_percent / 100.0),
        ).unwrap();
        let cascade = SeparationCascade::from_records(stages).unwrap();
        let result = cascade.run(feed);

        let out_mass = in_tonnes_per_annum(result.final_liquid.mass + result.total_sludge.mass);
        let out_dm = in_tonnes_per_annum(result.final_liquid.dry_matter + result.total_sludge.dry_matter);
        let in_dm = in_tonnes_per_annum(feed.dry_matter());

        prop_assert!(close(out_mass, mass, mass), "mass {out_mass} != {mass}");
        prop_assert!(close(out_dm, in_dm, mass), "dry matter {out_dm} != {in_dm}");
        prop_assert!(result.final_liquid.mass.value >= 0.0);
        prop_assert!(result.final_liquid.dry_matter <= result.final_liquid.mass);
    }

    #[test]
    fn absent_stages_are_no_ops(
        mass in 0.0..1_000_000.0f64,
        dm_percent in 0.0..=100.0f64,
        stages in prop::collection::vec(stage_record(), 0..6),
    ) {
        let feed = LiquidFeed::new(
            tonnes_per_annum(mass),
            tonnes_per_annum(mass * dm_percent / 100.0),
        ).unwrap();
        let with_absent: Vec<_> = stages
            .iter()
            .flat_map(|stage| [*stage, SeparationStageRecord { present: false, ..*stage }])
            .collect();

        let plain = SeparationCascade::from_records(stages).unwrap().run(feed);
        let padded = SeparationCascade::from_records(with_absent).unwrap().run(feed);

        prop_assert_eq!(plain.final_liquid, padded.final_liquid);
        prop_assert_eq!(plain.total_sludge, padded.total_sludge);
    }

    #[test]
    fn digestion_only_removes_destroyed_volatile_solids(records in ledger_records()) {
        let mut ledger = Ledger::from_records(records).unwrap();
        let before = ledger.clone();
        let report = digest(&mut ledger);

        for ((initial, digested), row) in before.iter().zip(ledger.iter()).zip(&report.rows) {
            let scale = in_tonnes_per_annum(initial.quantity());

            let inert_before = in_tonnes_per_annum(initial.dry_matter_rate() - initial.volatile_solids_rate());
            let inert_after = in_tonnes_per_annum(digested.dry_matter_rate() - digested.volatile_solids_rate());
            prop_assert!(close(inert_after, inert_before, scale));

            let lost = in_tonnes_per_annum(initial.quantity() - digested.quantity());
            prop_assert!(close(lost, in_tonnes_per_annum(row.volatile_solids_destroyed), scale));
        }

        let methane: f64 = report.rows.iter().map(|row| row.methane.value).sum();
        prop_assert!(close(report.methane.value, methane, methane));
    }
}
