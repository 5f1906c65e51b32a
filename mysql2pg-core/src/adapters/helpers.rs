//! Helper utilities shared by the engine and the database adapters.
//!
//! Identifier and literal quoting lives here so DDL, DML and catalog
//! statements all quote names the same way.

use std::fmt::Write as _;

/// Quotes a PostgreSQL identifier, doubling embedded double quotes.
///
/// # Example
/// ```rust
/// use mysql2pg_core::adapters::helpers::quote_ident;
///
/// assert_eq!(quote_ident("order"), "\"order\"");
/// assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a schema-qualified PostgreSQL name.
pub fn qualify(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_mysql_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Whether `c` is in the C0 (U+0000–U+001F) or C1 (U+007F–U+009F) control range.
pub fn is_control_char(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

/// Removes every C0 and C1 control character.
pub fn strip_control_chars(value: &str) -> String {
    value.chars().filter(|c| !is_control_char(*c)).collect()
}

/// Produces a single-quoted SQL string literal.
///
/// Control characters are dropped and embedded single quotes are doubled,
/// so the result can be spliced into any statement.
pub fn quote_literal(value: &str) -> String {
    let cleaned = strip_control_chars(value);
    let mut literal = String::with_capacity(cleaned.len().saturating_add(2));
    literal.push('\'');
    for c in cleaned.chars() {
        if c == '\'' {
            literal.push('\'');
        }
        literal.push(c);
    }
    literal.push('\'');
    literal
}

/// Renders bytes in PostgreSQL's `bytea` hex input format (`\x0a0b`).
pub fn bytea_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(2).saturating_add(2));
    out.push_str("\\x");
    for byte in bytes {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// Extension trait for extracting typed values from MySQL rows with
/// consistent error context.
#[cfg(feature = "mysql")]
pub trait RowExt {
    /// Extracts a typed field from the row.
    ///
    /// # Arguments
    /// * `field_name` - Name of the column to extract
    /// * `table_context` - Optional table name for error messages
    fn get_field<'r, T>(&'r self, field_name: &str, table_context: Option<&str>) -> crate::Result<T>
    where
        T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>;
}

#[cfg(feature = "mysql")]
impl RowExt for sqlx::mysql::MySqlRow {
    fn get_field<'r, T>(&'r self, field_name: &str, table_context: Option<&str>) -> crate::Result<T>
    where
        T: sqlx::Decode<'r, sqlx::MySql> + sqlx::Type<sqlx::MySql>,
    {
        use sqlx::Row;

        self.try_get(field_name).map_err(|e| {
            let context = match table_context {
                Some(table) => format!(
                    "Failed to parse field '{}' from result for table '{}'",
                    field_name, table
                ),
                None => format!("Failed to parse field '{}' from database result", field_name),
            };
            crate::error::MigrationError::source_failed(context, e)
        })
    }
}
