use chrono::NaiveDate;
use ledgernote_core::ledger::migration::decode_ledger;
use ledgernote_core::{migrate_ledger, LedgerData, LedgerSource};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

#[test]
fn legacy_item_lists_become_a_two_column_ledger() {
    let content = r#"[
        {"description":"Coffee","quantity":2,"price":3,"operation":"+"},
        {"description":"Discount","quantity":1,"price":1,"operation":"-"}
    ]"#;

    let migration = migrate_ledger(content, today());

    assert_eq!(migration.source, LedgerSource::LegacyItems);
    assert!(migration.rewrite);
    let data = migration.data;
    assert_eq!(data.headers, vec!["Description", "Value"]);
    let cells: Vec<Vec<String>> = data.rows.iter().map(|row| row.data.clone()).collect();
    assert_eq!(cells, vec![vec!["Coffee", "6"], vec!["Discount", "-1"]]);
    assert_eq!(data.sum_column_indices, vec![1]);
    assert_eq!(data.totals()[0].total, 5.0);
}

#[test]
fn legacy_fields_fall_back_when_not_numeric() {
    let content = r#"[{"label":"Tip","quantity":"many","price":"4"},{"description":"Gift"}]"#;

    let data = migrate_ledger(content, today()).data;

    assert_eq!(data.rows[0].data, vec!["Tip", "4"]);
    assert_eq!(data.rows[1].data, vec!["Gift", "0"]);
}

#[test]
fn singular_sum_key_is_upgraded() {
    let content = r#"{"headers":["Date","Amount"],"rows":[{"id":"a","data":["2024-01-01","3"]}],"sumColumnIndex":1}"#;

    let migration = migrate_ledger(content, today());

    assert_eq!(migration.source, LedgerSource::SingleSumColumn);
    assert!(migration.rewrite);
    assert_eq!(migration.data.sum_column_indices, vec![1]);
    assert_eq!(migration.data.rows[0].id, "a");
}

#[test]
fn migration_is_idempotent() {
    let inputs = [
        r#"[{"description":"Tea","quantity":1,"price":2.5}]"#,
        r#"{"headers":["Date","Amount"],"rows":[{"id":"a","data":["2024-01-01","3"]}],"sumColumnIndex":1}"#,
        r#"{"headers":["A","B"],"rows":[{"id":"r","data":["1"]},{"id":"r","data":["2","3","4"]}],"sumColumnIndices":[1,1,9]}"#,
        "",
        "{oops",
        r#"{"title":"not a ledger"}"#,
    ];

    for input in inputs {
        let first = migrate_ledger(input, today());
        assert!(first.rewrite, "input {input:?}");
        let stored = first.data.to_content();

        let second = migrate_ledger(&stored, today());

        assert_eq!(second.source, LedgerSource::Current, "input {input:?}");
        assert!(!second.rewrite, "input {input:?}");
        assert_eq!(second.data, first.data, "input {input:?}");
        assert_eq!(second.data.to_content(), stored);
    }
}

#[test]
fn repeated_row_ids_are_made_unique() {
    let content = r#"{"headers":["Item"],"rows":[{"id":"1","data":["a"]},{"id":"1","data":["b"]}],"sumColumnIndices":[]}"#;

    let migration = migrate_ledger(content, today());

    assert_eq!(migration.source, LedgerSource::CurrentRepaired);
    assert!(migration.rewrite);
    let mut data = migration.data;
    assert_eq!(data.rows[0].id, "1");
    assert_ne!(data.rows[1].id, "1");

    data.remove_row("1").unwrap();

    assert_eq!(data.rows.len(), 1);
    assert_eq!(data.rows[0].data, vec!["b"]);
}

#[test]
fn repeated_legacy_ids_are_made_unique() {
    let content = r#"[{"id":"x","description":"a"},{"id":"x","description":"b"},{"id":"x","description":"c"}]"#;

    let data = migrate_ledger(content, today()).data;

    let mut ids: Vec<&str> = data.rows.iter().map(|row| row.id.as_str()).collect();
    assert_eq!(ids[0], "x");
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn ragged_rows_are_repaired() {
    let content = r#"{"headers":["A","B","C"],"rows":[{"id":"r","data":["1"]},{"data":["x","y","z","extra"]}],"sumColumnIndices":[2,2,7]}"#;

    let migration = migrate_ledger(content, today());

    assert_eq!(migration.source, LedgerSource::CurrentRepaired);
    assert!(migration.rewrite);
    assert!(migration.data.is_well_formed());
    assert_eq!(migration.data.sum_column_indices, vec![2]);
    assert!(!migration.data.rows[1].id.is_empty());
}

#[test]
fn unusable_payloads_fall_back_to_the_default_schema() {
    for content in ["", "null", "{oops", r#"{"title":"not a ledger"}"#, "42"] {
        let migration = migrate_ledger(content, today());
        assert!(migration.rewrite, "content {content:?}");
        assert_eq!(
            migration.data,
            LedgerData {
                rows: migration.data.rows.clone(),
                ..LedgerData::default_schema(today())
            }
        );
        assert_eq!(migration.data.rows[0].data[0], "2024-01-15");
    }
}

#[test]
fn decode_reports_why_no_table_was_produced() {
    assert_eq!(decode_ledger("  "), Err(LedgerSource::Missing));
    assert_eq!(decode_ledger("null"), Err(LedgerSource::Missing));
    assert_eq!(decode_ledger("{oops"), Err(LedgerSource::Unparsable));
    assert_eq!(decode_ledger("true"), Err(LedgerSource::UnknownShape));
}
