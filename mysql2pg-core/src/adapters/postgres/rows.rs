//! Decoding of PostgreSQL query results.
//!
//! Only the types catalog queries return are decoded natively; anything
//! else is read as text.

use crate::Result;
use crate::error::MigrationError;
use crate::models::{RowRecord, SourceValue};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

pub(super) fn decode_row(row: &PgRow) -> Result<RowRecord> {
    let mut record = RowRecord::with_capacity(row.columns().len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = decode_cell(row, index, column.type_info().name()).map_err(|e| {
            MigrationError::target_failed(
                format!("Failed to decode result column '{}'", column.name()),
                e,
            )
        })?;
        record.push(column.name(), value);
    }
    Ok(record)
}

fn decode_cell(
    row: &PgRow,
    index: usize,
    type_name: &str,
) -> std::result::Result<SourceValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SourceValue::Null);
    }

    let value = match type_name {
        "BOOL" => SourceValue::Boolean(row.try_get(index)?),
        "INT2" => SourceValue::Integer(i64::from(row.try_get::<i16, _>(index)?)),
        "INT4" => SourceValue::Integer(i64::from(row.try_get::<i32, _>(index)?)),
        "INT8" => SourceValue::Integer(row.try_get(index)?),
        "FLOAT4" => SourceValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        "FLOAT8" => SourceValue::Float(row.try_get(index)?),
        "BYTEA" => SourceValue::Binary(row.try_get(index)?),
        _ => SourceValue::Text(row.try_get_unchecked::<String, _>(index)?),
    };

    Ok(value)
}
