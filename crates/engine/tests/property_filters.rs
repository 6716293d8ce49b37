// Property-based tests for filter, search and merge invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use beantrack_engine::{catalog, filter, merge, search};
use beantrack_engine::{EntityKind, FilterCriteria, InMemorySource, Row};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Field text: mostly words, sometimes blank, sometimes numeric-looking.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => r"[A-Za-z]{1,8}( [A-Za-z]{1,8})?",
        1 => Just(String::new()),
        1 => r"[0-9]{1,4}",
    ]
}

/// Age as the data service may deliver it: a number, a numeric string, junk or nothing.
fn arb_age() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        3 => (0u32..100).prop_map(serde_json::Value::from),
        1 => (0u32..100).prop_map(|n| serde_json::Value::from(n.to_string())),
        1 => Just(serde_json::Value::from("n/a")),
        1 => Just(serde_json::Value::Null),
    ]
}

fn arb_date() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (1950i32..2010, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}")),
        1 => Just(String::new()),
        1 => Just("not a date".to_string()),
    ]
}

fn arb_beneficiary() -> impl Strategy<Value = Row> {
    (
        r"B-[0-9]{1,4}",
        arb_text(),
        arb_text(),
        prop_oneof![Just("Male"), Just("Female"), Just("")],
        arb_age(),
        arb_text(),
        arb_date(),
    )
        .prop_map(|(id, first, last, gender, age, barangay, birth)| {
            Row::default()
                .with("beneficiary_id", id)
                .with("first_name", first)
                .with("last_name", last)
                .with("gender", gender)
                .with("age", age)
                .with("barangay", barangay)
                .with("birth_date", birth)
        })
}

fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        proptest::option::of(r"[a-z]{1,3}"),
        proptest::option::of(prop_oneof![Just("Male"), Just("Female")]),
        proptest::option::of(0.0..60.0f64),
        proptest::option::of(40.0..100.0f64),
    )
        .prop_map(|(name, gender, min, max)| {
            let mut criteria = FilterCriteria::default();
            if let Some(name) = name {
                criteria = criteria.with_value("name", &name);
            }
            if let Some(gender) = gender {
                criteria = criteria.with_value("gender", gender);
            }
            criteria.with_range("age", min, max)
        })
}

fn is_subsequence(sub: &[Row], of: &[Row]) -> bool {
    let mut it = of.iter();
    sub.iter().all(|row| it.any(|candidate| candidate == row))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn empty_criteria_is_identity(rows in proptest::collection::vec(arb_beneficiary(), 0..30)) {
        let out = filter::apply(EntityKind::BeneficiaryList, rows.clone(), &FilterCriteria::default());
        prop_assert_eq!(out, rows);
    }

    #[test]
    fn filter_output_is_ordered_subset(
        rows in proptest::collection::vec(arb_beneficiary(), 0..30),
        criteria in arb_criteria(),
    ) {
        let out = filter::apply(EntityKind::BeneficiaryList, rows.clone(), &criteria);
        prop_assert!(out.len() <= rows.len());
        prop_assert!(is_subsequence(&out, &rows));
    }

    #[test]
    fn adding_a_constraint_never_widens(
        rows in proptest::collection::vec(arb_beneficiary(), 0..30),
        criteria in arb_criteria(),
        barangay in r"[a-z]{1,2}",
    ) {
        let base = filter::apply(EntityKind::BeneficiaryList, rows.clone(), &criteria);
        let narrowed = filter::apply(
            EntityKind::BeneficiaryList,
            rows,
            &criteria.clone().with_value("address", &barangay),
        );
        prop_assert!(narrowed.len() <= base.len());
        prop_assert!(is_subsequence(&narrowed, &base));
    }

    #[test]
    fn blank_search_is_identity(
        rows in proptest::collection::vec(arb_beneficiary(), 0..30),
        blank in r"[ \t]{0,3}",
    ) {
        let out = search::apply(EntityKind::BeneficiaryList, rows.clone(), &blank);
        prop_assert_eq!(out, rows);
    }

    #[test]
    fn search_output_is_ordered_subset(
        rows in proptest::collection::vec(arb_beneficiary(), 0..30),
        query in r"[a-zA-Z0-9-]{1,4}",
    ) {
        let out = search::apply(EntityKind::BeneficiaryList, rows.clone(), &query);
        prop_assert!(is_subsequence(&out, &rows));
    }

    #[test]
    fn merge_count_is_sum_of_entities(
        beneficiaries in proptest::collection::vec(arb_beneficiary(), 0..20),
        plots in 0usize..20,
    ) {
        let plot_rows: Vec<Row> = (0..plots)
            .map(|i| Row::default().with("plot_id", format!("P-{i}")))
            .collect();
        let src = InMemorySource::new()
            .with_rows(EntityKind::BeneficiaryList, beneficiaries.clone())
            .with_rows(EntityKind::FarmLocation, plot_rows);
        let ids = ["ben_id", "farm_hectares"];
        prop_assert_eq!(catalog::involved_entities(&ids).len(), 2);

        let merged = merge::merge(&ids, &src).unwrap();
        prop_assert_eq!(merged.len(), beneficiaries.len() + plots);
        let first_plot = merged
            .iter()
            .position(|r| r.source_entity == EntityKind::FarmLocation)
            .unwrap_or(merged.len());
        prop_assert_eq!(first_plot, beneficiaries.len());
    }
}
