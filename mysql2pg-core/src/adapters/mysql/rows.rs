//! Decoding of MySQL result rows into [`SourceValue`] cells.
//!
//! Decoding is driven by the column's reported type name. Values the
//! driver refuses to decode as a date or time (zero dates, out-of-range
//! times) become [`TemporalValue::Invalid`] instead of failing the table.

use crate::Result;
use crate::error::MigrationError;
use crate::models::{RowRecord, SourceValue, TemporalValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// How a MySQL column type is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Boolean,
    Signed,
    Unsigned,
    Float,
    Double,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    Text,
}

/// Classifies a type name as reported by the driver (`INT UNSIGNED`,
/// `VARCHAR`, `DATETIME`, ...).
pub fn cell_kind(type_name: &str) -> CellKind {
    let upper = type_name.to_ascii_uppercase();
    let base = upper.split_whitespace().next().unwrap_or_default();

    match base {
        "BOOLEAN" | "BOOL" => CellKind::Boolean,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            if upper.ends_with("UNSIGNED") {
                CellKind::Unsigned
            } else {
                CellKind::Signed
            }
        }
        "FLOAT" => CellKind::Float,
        "DOUBLE" | "REAL" => CellKind::Double,
        "DATE" => CellKind::Date,
        "TIME" => CellKind::Time,
        "DATETIME" => CellKind::DateTime,
        "TIMESTAMP" => CellKind::Timestamp,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => CellKind::Binary,
        _ => CellKind::Text,
    }
}

/// Decodes one result row, keeping the column order of the result set.
pub fn decode_row(row: &MySqlRow, table: &str) -> Result<RowRecord> {
    let mut record = RowRecord::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let kind = cell_kind(column.type_info().name());
        let value = decode_cell(row, index, kind).map_err(|e| {
            MigrationError::source_failed(
                format!(
                    "Failed to decode column '{}' of table '{}'",
                    column.name(),
                    table
                ),
                e,
            )
        })?;
        record.push(column.name(), value);
    }
    Ok(record)
}

fn decode_cell(
    row: &MySqlRow,
    index: usize,
    kind: CellKind,
) -> std::result::Result<SourceValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SourceValue::Null);
    }

    let value = match kind {
        CellKind::Boolean => SourceValue::Boolean(row.try_get_unchecked::<bool, _>(index)?),
        CellKind::Signed => SourceValue::Integer(row.try_get_unchecked::<i64, _>(index)?),
        CellKind::Unsigned => {
            SourceValue::UnsignedInteger(row.try_get_unchecked::<u64, _>(index)?)
        }
        CellKind::Float => {
            let v = row.try_get_unchecked::<f32, _>(index)?;
            // Go through the shortest decimal form so 0.1f32 stays 0.1
            SourceValue::Float(v.to_string().parse().unwrap_or_else(|_| f64::from(v)))
        }
        CellKind::Double => SourceValue::Float(row.try_get_unchecked::<f64, _>(index)?),
        CellKind::Date => temporal(row.try_get::<NaiveDate, _>(index).map(TemporalValue::Date)),
        CellKind::Time => temporal(row.try_get::<NaiveTime, _>(index).map(TemporalValue::Time)),
        CellKind::DateTime => temporal(
            row.try_get::<NaiveDateTime, _>(index)
                .map(TemporalValue::DateTime),
        ),
        CellKind::Timestamp => temporal(
            row.try_get::<DateTime<Utc>, _>(index)
                .map(TemporalValue::Timestamp),
        ),
        CellKind::Binary => SourceValue::Binary(row.try_get_unchecked::<Vec<u8>, _>(index)?),
        CellKind::Text => match row.try_get_unchecked::<String, _>(index) {
            Ok(text) => SourceValue::Text(text),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                match String::from_utf8(bytes) {
                    Ok(text) => SourceValue::Text(text),
                    Err(e) => SourceValue::Binary(e.into_bytes()),
                }
            }
        },
    };

    Ok(value)
}

fn temporal(decoded: std::result::Result<TemporalValue, sqlx::Error>) -> SourceValue {
    SourceValue::Temporal(decoded.unwrap_or(TemporalValue::Invalid))
}
