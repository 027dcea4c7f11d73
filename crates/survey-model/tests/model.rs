//! Tests for survey-model types.

use proptest::prelude::*;
use survey_model::{ColumnSpec, DataType, Field, RecordTable, SentinelSet, Value};

#[test]
fn column_spec_deserializes_from_toml() {
    let spec: ColumnSpec = toml::from_str(
        r#"
name = "weight"
type = "float"
span = { start = 12, end = 15 }
"#,
    )
    .expect("parse column spec");
    assert_eq!(spec.name, "weight");
    assert_eq!(spec.data_type, DataType::Float);
    assert_eq!(spec.span.map(|s| (s.start, s.end)), Some((12, 15)));
    assert!(spec.header.is_none());
}

#[test]
fn column_spec_rejects_misspelled_keys() {
    let misspelled = toml::from_str::<ColumnSpec>(
        r#"
name = "birth"
type = "date"
date_fromat = "%d/%m/%Y"
"#,
    );
    assert!(misspelled.is_err());

    let bad_span = toml::from_str::<ColumnSpec>(
        r#"
name = "weight"
type = "float"
span = { start = 12, stop = 15 }
"#,
    );
    assert!(bad_span.is_err());
}

#[test]
fn sentinel_set_deserializes_as_list() {
    #[derive(serde::Deserialize)]
    struct Source {
        missing: SentinelSet,
    }
    let source: Source = toml::from_str(r#"missing = ["998", "999"]"#).expect("parse sentinels");
    assert_eq!(source.missing.len(), 2);
    assert!(source.missing.contains("999"));
}

#[test]
fn table_round_trips_through_rows() {
    let table = RecordTable::from_rows(
        vec![Field::new("age", DataType::Integer)],
        vec![vec![Value::Integer(40)], vec![Value::Missing]],
    )
    .unwrap();
    let ages: Vec<&Value> = table.column("age").unwrap().collect();
    assert_eq!(ages, vec![&Value::Integer(40), &Value::Missing]);
}

proptest! {
    #[test]
    fn declared_sentinels_are_always_missing(code in 900i64..1000, pad in 0usize..3) {
        let set: SentinelSet = [code.to_string()].into_iter().collect();
        let raw = format!("{}{}", "0".repeat(pad), code);
        prop_assert!(set.is_missing(&raw));
        let padded = format!(" {code} ");
        prop_assert!(set.is_missing(&padded));
    }

    #[test]
    fn non_sentinel_numbers_are_kept(value in 0i64..900) {
        let set: SentinelSet = ["998", "999"].into_iter().collect();
        prop_assert!(!set.is_missing(&value.to_string()));
    }
}
