//! MySQL column type to PostgreSQL DDL translation.
//!
//! Type dispatch is an ordered list of probes against the column's base type
//! name; the first probe that matches wins. Several MySQL names contain
//! others (`bigint`/`int`, `varchar`/`char`, `tinyint(1)`/`tinyint`), so the
//! order below is load-bearing.

use crate::adapters::MigrationOptions;
use crate::adapters::helpers::{quote_ident, quote_literal};
use crate::models::ColumnDescriptor;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static LENGTH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\d+)(?:\s*,\s*(\d+))?\)").expect("Invalid length suffix pattern")
});

static CURRENT_TIMESTAMP_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(current_timestamp|now|localtimestamp|localtime)(\(\d*\))?$")
        .expect("Invalid timestamp default pattern")
});

/// Maps source column descriptors onto target column DDL.
///
/// Implementations must be total: every well-formed source type yields a
/// usable fragment.
pub trait TypeMapper: Send + Sync {
    /// Returns the type portion of a column definition, including any
    /// column-level constraint the type implies (e.g. `CHECK` for enums).
    fn map(&self, column: &ColumnDescriptor) -> String;

    /// Returns the full column definition: quoted name, mapped type, and the
    /// `NOT NULL`/`DEFAULT` clauses enabled in `options`.
    fn column_definition(&self, column: &ColumnDescriptor, options: &MigrationOptions) -> String {
        let mut definition = format!("{} {}", quote_ident(&column.name), self.map(column));

        // Zero dates are copied as NULL, so calendar columns stay nullable
        if options.not_null && !column.is_nullable && !is_calendar_type(&column.source_type) {
            definition.push_str(" NOT NULL");
        }

        if options.default_values
            && !column.is_auto_increment
            && let Some(default) = column
                .default_value
                .as_deref()
                .and_then(|raw| render_default(raw, &column.source_type))
        {
            definition.push_str(" DEFAULT ");
            definition.push_str(&default);
        }

        definition
    }
}

/// PostgreSQL type mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    fn map(&self, column: &ColumnDescriptor) -> String {
        map_column_type(column)
    }
}

/// Splits a raw MySQL type into `(base name, length, precision)`.
///
/// `int(10) unsigned` yields `("int", Some(10), None)`.
fn parse_type(raw: &str) -> (String, Option<u32>, Option<u32>) {
    let lower = raw.trim().to_lowercase();
    let base = lower
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default()
        .to_string();

    let (length, precision) = LENGTH_SUFFIX
        .captures(&lower)
        .map(|caps| {
            (
                caps.get(1).and_then(|m| m.as_str().parse().ok()),
                caps.get(2).and_then(|m| m.as_str().parse().ok()),
            )
        })
        .unwrap_or((None, None));

    (base, length, precision)
}

/// Translates one MySQL column into a PostgreSQL type fragment.
///
/// # Example
/// ```rust
/// use mysql2pg_core::models::ColumnDescriptor;
/// use mysql2pg_core::typemap::map_column_type;
///
/// let column = ColumnDescriptor::new("price", "decimal(12,4)");
/// assert_eq!(map_column_type(&column), "DECIMAL(12,4)");
/// ```
pub fn map_column_type(column: &ColumnDescriptor) -> String {
    let (base, length, precision) = parse_type(&column.source_type);

    if column.is_auto_increment {
        let serial = if base.contains("bigint") {
            "BIGSERIAL"
        } else {
            "SERIAL"
        };
        return if column.is_primary_key {
            format!("{} PRIMARY KEY", serial)
        } else {
            serial.to_string()
        };
    }

    let unsigned = column.source_type.to_lowercase().contains("unsigned");

    if base.contains("varchar") {
        format!("VARCHAR({})", length.unwrap_or(255))
    } else if base.contains("char") {
        format!("CHAR({})", length.unwrap_or(1))
    } else if base.contains("text") {
        "TEXT".to_string()
    } else if base == "tinyint" && length == Some(1) {
        "BOOLEAN".to_string()
    } else if base.contains("bigint") {
        "BIGINT".to_string()
    } else if matches!(
        base.as_str(),
        "tinyint" | "smallint" | "mediumint" | "middleint" | "int" | "integer"
    ) {
        if unsigned {
            format!("INTEGER CHECK ({} >= 0)", quote_ident(&column.name))
        } else {
            "INTEGER".to_string()
        }
    } else if base.contains("decimal") || base.contains("numeric") {
        format!("DECIMAL({},{})", length.unwrap_or(10), precision.unwrap_or(2))
    } else if base.contains("double") {
        "DOUBLE PRECISION".to_string()
    } else if base.contains("float") {
        "REAL".to_string()
    } else if base == "date" {
        "DATE".to_string()
    } else if base == "time" {
        "TIME WITHOUT TIME ZONE".to_string()
    } else if base.contains("timestamp") || base == "datetime" {
        "TIMESTAMP WITHOUT TIME ZONE".to_string()
    } else if base == "year" {
        "SMALLINT".to_string()
    } else if base.contains("binary") || base.contains("blob") {
        "BYTEA".to_string()
    } else if base.contains("json") {
        "JSONB".to_string()
    } else if base == "enum" {
        let members = parse_enum_members(&column.source_type);
        if members.is_empty() {
            return "TEXT".to_string();
        }
        let members = members
            .iter()
            .map(|m| quote_literal(m))
            .collect::<Vec<_>>()
            .join(", ");
        format!("TEXT CHECK ({} IN ({}))", quote_ident(&column.name), members)
    } else {
        "TEXT".to_string()
    }
}

/// Extracts the quoted member list of an `enum(...)` type, in declaration order.
///
/// Members keep their original case; `''` inside a member is unescaped.
pub fn parse_enum_members(raw: &str) -> Vec<String> {
    let Some(open) = raw.find('(') else {
        return Vec::new();
    };

    let mut members = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = raw[open..].chars().skip(1).peekable();

    while let Some(c) = chars.next() {
        match (in_quotes, c) {
            (true, '\'') if chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
            }
            (true, '\'') => {
                in_quotes = false;
                members.push(std::mem::take(&mut current));
            }
            (true, c) => current.push(c),
            (false, '\'') => in_quotes = true,
            (false, ')') => break,
            (false, _) => {}
        }
    }

    members
}

/// Whether `source_type` is a MySQL date, datetime, or timestamp type.
///
/// These columns may hold zero dates, which are copied as NULL.
pub fn is_calendar_type(source_type: &str) -> bool {
    let (base, _, _) = parse_type(source_type);
    base == "date" || base == "datetime" || base.contains("timestamp")
}

/// Whether `value` is a real calendar value for a column of `source_type`.
fn is_valid_calendar_literal(value: &str, source_type: &str) -> bool {
    let (base, _, _) = parse_type(source_type);
    if base == "date" {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
    } else {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
            || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
    }
}

/// Renders a MySQL column default as a PostgreSQL default expression.
///
/// Returns `None` when the default should be omitted: empty values, an
/// explicit `NULL`, MySQL 8 expression defaults (parenthesized), and zero or
/// otherwise unparseable dates on calendar columns.
pub fn render_default(raw: &str, source_type: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("null") || value.starts_with('(') {
        return None;
    }
    if CURRENT_TIMESTAMP_DEFAULT.is_match(value) {
        return Some("CURRENT_TIMESTAMP".to_string());
    }
    if is_calendar_type(source_type) && !is_valid_calendar_literal(value, source_type) {
        return None;
    }
    Some(quote_literal(raw))
}
