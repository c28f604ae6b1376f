//! Property tests for the SQL compiler.

use metaquery_sql::query::{select, update, Column, MatchKind, UpdateRoot};
use metaquery_sql::TableMapping;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Join {
    And,
    Or,
}

fn arb_column() -> impl Strategy<Value = Column> {
    prop_oneof![Just(Column::TotalId), Just(Column::Key), Just(Column::Value)]
}

fn arb_join() -> impl Strategy<Value = Join> {
    prop_oneof![Just(Join::And), Just(Join::Or)]
}

fn arb_kind() -> impl Strategy<Value = MatchKind> {
    prop_oneof![
        Just(MatchKind::Contains),
        Just(MatchKind::Exact),
        Just(MatchKind::StartsWith),
        Just(MatchKind::EndsWith),
        Just(MatchKind::Full),
    ]
}

// Arbitrary printable text, including '?' so placeholder counting only sees the SQL
fn arb_text() -> impl Strategy<Value = String> {
    "[ -~]{0,12}"
}

fn arb_width() -> impl Strategy<Value = usize> {
    1usize..4
}

fn table_with_value_width(width: usize) -> TableMapping {
    let value_columns: Vec<String> = (0..width).map(|i| format!("value_{}", i)).collect();
    TableMapping::builder("meta")
        .map(Column::TotalId, ["uuid"])
        .map(Column::Key, ["identifier"])
        .map(Column::Value, value_columns)
        .build()
        .unwrap()
}

fn physical_names(column: Column, value_width: usize) -> Vec<String> {
    match column {
        Column::TotalId => vec!["uuid".to_string()],
        Column::Key => vec!["identifier".to_string()],
        Column::Value => (0..value_width).map(|i| format!("value_{}", i)).collect(),
    }
}

fn projection_tokens(sql: &str) -> Vec<&str> {
    let start = sql.find("SELECT ").map(|i| i + "SELECT ".len()).unwrap();
    let end = sql.find(" FROM ").unwrap();
    sql[start..end].split(", ").collect()
}

proptest! {
    #[test]
    fn select_params_align_with_placeholders(
        first in (arb_column(), arb_text()),
        rest in prop::collection::vec((arb_join(), arb_column(), arb_text()), 0..8),
    ) {
        let table = table_with_value_width(1);
        let mut query = select([Column::Key]).where_clause(first.0, first.1.clone()).unwrap();
        let mut expected = vec![first.1];
        for (join, column, value) in rest {
            query = match join {
                Join::And => query.and(column, value.clone()).unwrap(),
                Join::Or => query.or(column, value.clone()).unwrap(),
            };
            expected.push(value);
        }

        let compiled = query.compile(&table).unwrap();
        prop_assert_eq!(compiled.placeholder_count(), compiled.params.len());
        prop_assert_eq!(compiled.params, expected);
    }

    #[test]
    fn update_params_put_directives_before_predicates(
        directives in prop::collection::vec((arb_column(), arb_text()), 1..5),
        predicates in prop::collection::vec((arb_column(), arb_text()), 0..5),
    ) {
        let table = table_with_value_width(2);
        let mut root = UpdateRoot::new();
        for (column, value) in &directives {
            root = root.set(*column, value.clone()).unwrap();
        }

        let mut expected: Vec<String> = directives.iter().map(|(_, v)| v.clone()).collect();
        let compiled = match predicates.split_first() {
            None => root.compile(&table).unwrap(),
            Some(((column, value), rest)) => {
                let mut query = root.where_clause(*column, value.clone()).unwrap();
                expected.push(value.clone());
                for (column, value) in rest {
                    query = query.and(*column, value.clone()).unwrap();
                    expected.push(value.clone());
                }
                query.compile(&table).unwrap()
            }
        };

        prop_assert_eq!(compiled.placeholder_count(), compiled.params.len());
        prop_assert_eq!(compiled.params, expected);
    }

    #[test]
    fn projection_expands_to_mapped_width(
        columns in prop::collection::vec(arb_column(), 1..6),
        width in arb_width(),
    ) {
        let table = table_with_value_width(width);
        let compiled = select(columns.clone()).compile(&table).unwrap();

        let expected: Vec<String> = columns
            .iter()
            .flat_map(|c| physical_names(*c, width))
            .collect();
        let expected_tokens: Vec<&str> = expected.iter().map(String::as_str).collect();
        prop_assert_eq!(projection_tokens(&compiled.sql), expected_tokens);
        prop_assert_eq!(compiled.result_width, expected.len());
        prop_assert!(compiled.params.is_empty());
    }

    #[test]
    fn compile_is_deterministic(
        column in arb_column(),
        pattern in arb_text(),
        kind in arb_kind(),
        width in arb_width(),
    ) {
        let table = table_with_value_width(width);
        let query = update(Column::Value, pattern.clone()).unwrap()
            .where_match(column, &pattern, kind).unwrap();

        let first = query.compile(&table).unwrap();
        let second = query.compile(&table).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn statement_ends_with_single_terminator(
        columns in prop::collection::vec(arb_column(), 1..4),
        predicates in prop::collection::vec((arb_column(), arb_text()), 0..4),
    ) {
        let table = table_with_value_width(1);
        let compiled = match predicates.split_first() {
            None => select(columns).compile(&table).unwrap(),
            Some(((column, value), rest)) => {
                let mut query = select(columns).where_clause(*column, value.clone()).unwrap();
                for (column, value) in rest {
                    query = query.or(*column, value.clone()).unwrap();
                }
                query.compile(&table).unwrap()
            }
        };

        prop_assert!(compiled.sql.ends_with(';'));
        prop_assert_eq!(compiled.sql.matches(';').count(), 1);
        prop_assert_eq!(compiled.sql.contains(" WHERE "), !predicates.is_empty());
    }
}
