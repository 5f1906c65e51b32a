//! Property tests for value encoding and type mapping.
//!
//! These tests use proptest to generate random inputs and verify invariants.

use mysql2pg_core::adapters::helpers::{is_control_char, strip_control_chars};
use mysql2pg_core::encoder::encode_value;
use mysql2pg_core::models::{ColumnDescriptor, SourceValue};
use mysql2pg_core::typemap::{map_column_type, parse_enum_members};
use proptest::prelude::*;

/// Undoes SQL string literal quoting: strips the outer quotes and collapses `''`.
fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

prop_compose! {
    fn enum_member()(s in "[a-zA-Z0-9 _',()-]{1,12}") -> String {
        s
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn test_text_literal_decodes_to_control_free_input(input in any::<String>()) {
        let literal = encode_value(&SourceValue::Text(input.clone()));
        prop_assert_eq!(unquote(&literal), Some(strip_control_chars(&input)));
    }

    #[test]
    fn test_no_control_characters_survive(input in any::<String>()) {
        let literal = encode_value(&SourceValue::Text(input));
        prop_assert!(!literal.chars().any(is_control_char));
    }

    #[test]
    fn test_quotes_are_always_paired(input in "[a-z' ]{0,40}") {
        let literal = encode_value(&SourceValue::Text(input));
        let inner = &literal[1..literal.len() - 1];
        // Every quote inside the literal is part of an escaped pair
        prop_assert_eq!(inner.replace("''", "").matches('\'').count(), 0);
    }

    #[test]
    fn test_integers_encode_as_quoted_decimal(value in any::<i64>()) {
        prop_assert_eq!(
            encode_value(&SourceValue::Integer(value)),
            format!("'{}'", value)
        );
    }

    #[test]
    fn test_auto_increment_always_maps_to_serial(
        source_type in "[a-z]{2,10}(\\([0-9]{1,3}\\))?( unsigned)?",
        primary in any::<bool>(),
    ) {
        let mut column = ColumnDescriptor::new("id", source_type.clone()).auto_increment();
        column.is_primary_key = primary;

        let mapped = map_column_type(&column);
        let serial = if source_type.contains("bigint") { "BIGSERIAL" } else { "SERIAL" };
        let expected = if primary { format!("{} PRIMARY KEY", serial) } else { serial.to_string() };
        prop_assert_eq!(mapped, expected);
    }

    #[test]
    fn test_enum_members_preserved_in_order(
        members in prop::collection::vec(enum_member(), 1..6),
    ) {
        let declared: Vec<String> = members
            .iter()
            .map(|m| format!("'{}'", m.replace('\'', "''")))
            .collect();
        let source_type = format!("enum({})", declared.join(","));

        prop_assert_eq!(parse_enum_members(&source_type), members.clone());

        let mapped = map_column_type(&ColumnDescriptor::new("kind", source_type));
        let expected_list: Vec<String> = members
            .iter()
            .map(|m| format!("'{}'", m.replace('\'', "''")))
            .collect();
        prop_assert_eq!(
            mapped,
            format!("TEXT CHECK (\"kind\" IN ({}))", expected_list.join(", "))
        );
    }
}
