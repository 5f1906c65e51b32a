//! Source cell to PostgreSQL literal encoding.
//!
//! The encoder guarantees syntactic safety of the generated INSERT text.
//! Values the source could not represent (zero dates and the like) become
//! `NULL` rather than errors.

use crate::adapters::helpers::{bytea_hex, quote_literal};
use crate::models::{RowRecord, SourceValue, TemporalValue};
use chrono::SecondsFormat;

/// Literal used for SQL NULL.
pub const NULL_LITERAL: &str = "NULL";

/// Converts source cells into literals for a target INSERT statement.
pub trait ValueEncoder: Send + Sync {
    /// Encodes a single cell.
    fn encode(&self, value: &SourceValue) -> String;

    /// Encodes a whole row as a parenthesized tuple, e.g. `('a', NULL, '3')`.
    fn encode_row(&self, row: &RowRecord) -> String {
        let literals: Vec<String> = row.values().map(|v| self.encode(v)).collect();
        format!("({})", literals.join(", "))
    }
}

/// PostgreSQL value encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresValueEncoder;

impl ValueEncoder for PostgresValueEncoder {
    fn encode(&self, value: &SourceValue) -> String {
        encode_value(value)
    }
}

/// Encodes one value using PostgreSQL literal rules.
///
/// # Example
/// ```rust
/// use mysql2pg_core::encoder::encode_value;
/// use mysql2pg_core::models::SourceValue;
///
/// assert_eq!(encode_value(&SourceValue::Null), "NULL");
/// assert_eq!(encode_value(&SourceValue::Text("it's".into())), "'it''s'");
/// assert_eq!(encode_value(&SourceValue::Integer(7)), "'7'");
/// ```
pub fn encode_value(value: &SourceValue) -> String {
    let text = match value {
        SourceValue::Null | SourceValue::Temporal(TemporalValue::Invalid) => {
            return NULL_LITERAL.to_string();
        }
        SourceValue::Temporal(temporal) => format_temporal(temporal),
        SourceValue::Integer(v) => v.to_string(),
        SourceValue::UnsignedInteger(v) => v.to_string(),
        SourceValue::Float(v) => v.to_string(),
        SourceValue::Boolean(v) => v.to_string(),
        SourceValue::Binary(bytes) => bytea_hex(bytes),
        SourceValue::Text(s) => return quote_literal(s),
    };
    quote_literal(&text)
}

/// ISO-8601 rendering of a valid temporal value.
fn format_temporal(value: &TemporalValue) -> String {
    match value {
        TemporalValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        TemporalValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        TemporalValue::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        TemporalValue::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        TemporalValue::Invalid => String::new(),
    }
}
