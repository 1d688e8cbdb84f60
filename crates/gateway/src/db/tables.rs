//! Guarded generic access to storefront tables.
//!
//! The catalog-management process occasionally needs to inspect or clean
//! up rows the typed endpoints do not cover. Access is limited to a fixed
//! table list, a row ceiling and a free-text `WHERE` filter that is screened
//! for anything beyond simple comparisons before it reaches the driver.
//! The screen is a last line of defense, not a parser.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, TypeInfo, ValueRef};
use thiserror::Error;
use tracing::{debug, instrument};

use super::statements::Statements;

/// Tables reachable through the gateway (without prefix).
pub const ALLOWED_TABLES: &[&str] = &[
    "product",
    "product_description",
    "product_image",
    "product_attribute",
    "product_special",
    "product_to_category",
    "product_to_store",
    "category",
    "category_description",
    "attribute",
    "attribute_description",
    "manufacturer",
    "order",
    "order_product",
    "order_total",
    "order_history",
    "api",
    "currency",
];

/// Maximum rows read or deleted by one call.
pub const MAX_ROWS: u32 = 500;

const FORBIDDEN_SEQUENCES: &[&str] = &[";", "--", "/*", "*/", "#", "@@", "\\"];

static FORBIDDEN_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(SELECT|FROM|TABLE|VALUES|WITH|INTO|DROP|DELETE|INSERT|UPDATE|ALTER|CREATE|TRUNCATE|UNION|EXEC|EXECUTE|GRANT|REVOKE|RENAME|REPLACE|HANDLER|CALL|LOAD_FILE|OUTFILE|DUMPFILE|INFORMATION_SCHEMA|SLEEP|BENCHMARK)\b",
    )
    .expect("Invalid regex")
});

static HEX_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b0x[0-9a-f]+|\bx'[0-9a-f]*'").expect("Invalid regex")
});

static STRING_BUILDERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(CHAR|CONCAT|CONCAT_WS|UNHEX|HEX|CONV)\s*\(").expect("Invalid regex")
});

/// Errors from the table gateway.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table not allowed: {0}")]
    TableNotAllowed(String),

    #[error("unsafe filter: {0}")]
    UnsafeFilter(String),

    #[error("a filter is required for deletes")]
    FilterRequired,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Check `table` against [`ALLOWED_TABLES`].
///
/// # Errors
///
/// Returns `TableError::TableNotAllowed` for any other name.
pub fn validate_table(table: &str) -> Result<(), TableError> {
    if ALLOWED_TABLES.contains(&table) {
        Ok(())
    } else {
        Err(TableError::TableNotAllowed(table.to_string()))
    }
}

/// Screen a `WHERE` filter for statement separators, comments, keywords
/// and literal-building tricks.
///
/// # Errors
///
/// Returns `TableError::UnsafeFilter` naming the first offending pattern.
pub fn validate_filter(filter: &str) -> Result<(), TableError> {
    if let Some(seq) = FORBIDDEN_SEQUENCES.iter().find(|seq| filter.contains(**seq)) {
        return Err(TableError::UnsafeFilter(format!("contains `{seq}`")));
    }
    if let Some(m) = FORBIDDEN_KEYWORDS.find(filter) {
        return Err(TableError::UnsafeFilter(format!(
            "keyword `{}` is not allowed",
            m.as_str().to_uppercase()
        )));
    }
    if HEX_LITERAL.is_match(filter) {
        return Err(TableError::UnsafeFilter("hex literals are not allowed".to_string()));
    }
    if let Some(m) = STRING_BUILDERS.find(filter) {
        return Err(TableError::UnsafeFilter(format!(
            "`{}` is not allowed",
            m.as_str().trim_end_matches('(').trim()
        )));
    }
    Ok(())
}

/// Limit actually applied: 0 or anything above the ceiling becomes the
/// ceiling.
#[must_use]
pub const fn effective_limit(requested: u32) -> u32 {
    if requested == 0 || requested > MAX_ROWS {
        MAX_ROWS
    } else {
        requested
    }
}

/// Build the `SELECT` for a validated request.
fn select_sql(statements: &Statements, table: &str, filter: &str, limit: u32) -> String {
    let filter = filter.trim();
    if filter.is_empty() {
        format!("SELECT * FROM {} LIMIT {limit}", statements.table(table))
    } else {
        format!(
            "SELECT * FROM {} WHERE {filter} LIMIT {limit}",
            statements.table(table)
        )
    }
}

fn delete_sql(statements: &Statements, table: &str, filter: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} LIMIT {MAX_ROWS}",
        statements.table(table),
        filter.trim()
    )
}

/// Guarded read/delete access to whitelisted tables.
pub struct TableGateway<'a> {
    pool: &'a MySqlPool,
    statements: &'a Statements,
}

impl<'a> TableGateway<'a> {
    #[must_use]
    pub const fn new(pool: &'a MySqlPool, statements: &'a Statements) -> Self {
        Self { pool, statements }
    }

    /// Read up to `limit` rows as JSON objects.
    ///
    /// Binary columns are treated as base64 text and decoded, unless `plain`
    /// is set. Values that do not decode are returned as raw text.
    ///
    /// # Errors
    ///
    /// Returns `TableNotAllowed` or `UnsafeFilter` before any query runs, or
    /// `Database` if the query fails.
    #[instrument(skip(self, filter), fields(table = %table))]
    pub async fn read(
        &self,
        table: &str,
        filter: &str,
        limit: u32,
        plain: bool,
    ) -> Result<Vec<Map<String, Value>>, TableError> {
        validate_table(table)?;
        validate_filter(filter)?;

        let sql = select_sql(self.statements, table, filter, effective_limit(limit));
        debug!(sql = %sql, "Table read");

        let rows = sqlx::query(&sql)
            .persistent(false)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.iter().map(|row| row_to_json(row, plain)).collect())
    }

    /// Delete up to [`MAX_ROWS`] rows matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `FilterRequired` for an empty filter, `TableNotAllowed` or
    /// `UnsafeFilter` before any query runs, or `Database` if the delete
    /// fails.
    #[instrument(skip(self, filter), fields(table = %table))]
    pub async fn delete(&self, table: &str, filter: &str) -> Result<u64, TableError> {
        validate_table(table)?;
        if filter.trim().is_empty() {
            return Err(TableError::FilterRequired);
        }
        validate_filter(filter)?;

        let sql = delete_sql(self.statements, table, filter);
        debug!(sql = %sql, "Table delete");

        let result = sqlx::query(&sql)
            .persistent(false)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Row decoding
// =============================================================================

fn row_to_json(row: &MySqlRow, plain: bool) -> Map<String, Value> {
    let mut object = Map::with_capacity(row.columns().len());
    for column in row.columns() {
        let index = column.ordinal();
        let value = column_value(row, index, column.type_info().name(), plain);
        object.insert(column.name().to_string(), value);
    }
    object
}

fn column_value(row: &MySqlRow, index: usize, type_name: &str, plain: bool) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(_) => {}
        Err(_) => return Value::Null,
    }

    match type_name {
        "BOOLEAN" => row.try_get::<bool, _>(index).map_or(Value::Null, Value::from),
        name if name.ends_with("UNSIGNED") => {
            row.try_get::<u64, _>(index).map_or(Value::Null, Value::from)
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get::<i64, _>(index).map_or(Value::Null, Value::from)
        }
        "DECIMAL" => row
            .try_get::<Decimal, _>(index)
            .map_or(Value::Null, |d| Value::String(d.to_string())),
        "FLOAT" => row.try_get::<f32, _>(index).map_or(Value::Null, Value::from),
        "DOUBLE" => row.try_get::<f64, _>(index).map_or(Value::Null, Value::from),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map_or_else(|_| Value::from("0000-00-00"), |d| Value::String(d.to_string())),
        "DATETIME" | "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(index).map_or_else(
            |_| Value::from("0000-00-00 00:00:00"),
            |d| Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string()),
        ),
        "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => row
            .try_get::<Vec<u8>, _>(index)
            .map_or(Value::Null, |bytes| Value::String(decode_binary(&bytes, plain))),
        _ => row.try_get::<String, _>(index).map_or_else(
            |_| {
                row.try_get_unchecked::<Vec<u8>, _>(index)
                    .map_or(Value::Null, |bytes| {
                        Value::String(String::from_utf8_lossy(&bytes).into_owned())
                    })
            },
            Value::String,
        ),
    }
}

/// Text for a binary column. Stored values are usually base64; anything
/// that does not decode to UTF-8 is returned as raw text.
fn decode_binary(bytes: &[u8], plain: bool) -> String {
    if !plain
        && let Ok(decoded) = STANDARD.decode(bytes)
        && let Ok(text) = String::from_utf8(decoded)
    {
        return text;
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_whitelist() {
        assert!(validate_table("product").is_ok());
        assert!(validate_table("order").is_ok());
        assert!(matches!(
            validate_table("user"),
            Err(TableError::TableNotAllowed(t)) if t == "user"
        ));
        assert!(validate_table("product; DROP TABLE x").is_err());
    }

    #[test]
    fn test_filter_accepts_simple_comparisons() {
        assert!(validate_filter("").is_ok());
        assert!(validate_filter("product_id = 42").is_ok());
        assert!(validate_filter("model LIKE 'p-%' AND status = 1").is_ok());
        assert!(validate_filter("date_modified >= '2024-01-01'").is_ok());
        // Keywords inside identifiers are fine.
        assert!(validate_filter("date_added > '2024-01-01' AND updated_by = 3").is_ok());
    }

    #[test]
    fn test_filter_rejects_separators_and_comments() {
        for filter in [
            "1=1; DROP TABLE oc_product",
            "status = 1 -- comment",
            "status = 1 /* x */",
            "status = 1 # x",
            "@@version = 1",
            "name = 'a\\' OR 1=1",
        ] {
            assert!(
                matches!(validate_filter(filter), Err(TableError::UnsafeFilter(_))),
                "{filter}"
            );
        }
    }

    #[test]
    fn test_filter_rejects_keywords() {
        for filter in [
            "1=1 UNION SELECT * FROM oc_user",
            "drop = 1",
            "product_id IN (SELECT product_id FROM information_schema.tables)",
            "SLEEP(5) = 0",
            "benchmark(1000000, md5(1))",
        ] {
            assert!(validate_filter(filter).is_err(), "{filter}");
        }
    }

    #[test]
    fn test_filter_rejects_subqueries() {
        for filter in [
            "product_id = 1 AND (SELECT ASCII(SUBSTRING(password, 1, 1)) FROM oc_user LIMIT 1) > 64",
            "product_id IN (SELECT user_id FROM oc_user)",
            "EXISTS (select 1 from oc_user)",
            "product_id IN (TABLE oc_user)",
            "product_id IN (VALUES ROW(1))",
        ] {
            assert!(
                matches!(validate_filter(filter), Err(TableError::UnsafeFilter(_))),
                "{filter}"
            );
        }

        // Identifiers that merely contain a keyword stay allowed.
        assert!(validate_filter("selected = 1 AND table_id = 2 AND from_date > '2024-01-01'").is_ok());
    }

    #[test]
    fn test_filter_rejects_literal_builders() {
        assert!(validate_filter("name = 0x61646d696e").is_err());
        assert!(validate_filter("name = X'61'").is_err());
        assert!(validate_filter("name = CHAR(97)").is_err());
        assert!(validate_filter("name = concat ('a', 'b')").is_err());
        assert!(validate_filter("name = 'charcoal'").is_ok());
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(0), MAX_ROWS);
        assert_eq!(effective_limit(10), 10);
        assert_eq!(effective_limit(MAX_ROWS), MAX_ROWS);
        assert_eq!(effective_limit(10_000), MAX_ROWS);
    }

    #[test]
    fn test_sql_building() {
        let statements = Statements::new("oc_");
        assert_eq!(
            select_sql(&statements, "product", "", 5),
            "SELECT * FROM `oc_product` LIMIT 5"
        );
        assert_eq!(
            select_sql(&statements, "order", " order_id = 1 ", 500),
            "SELECT * FROM `oc_order` WHERE order_id = 1 LIMIT 500"
        );
        assert_eq!(
            delete_sql(&statements, "product_image", "product_id = 7"),
            "DELETE FROM `oc_product_image` WHERE product_id = 7 LIMIT 500"
        );
    }

    #[test]
    fn test_decode_binary() {
        assert_eq!(decode_binary(b"aGVsbG8=", false), "hello");
        assert_eq!(decode_binary(b"aGVsbG8=", true), "aGVsbG8=");
        assert_eq!(decode_binary(b"not base64!", false), "not base64!");
    }
}
