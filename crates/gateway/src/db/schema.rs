//! Extension columns added to the storefront schema.
//!
//! The gateway keys storefront rows by external UIDs, which the stock
//! schema has no place for. [`ensure_extension_columns`] adds them when
//! missing and is safe to run on every startup.

use sqlx::MySqlPool;
use sqlx::mysql::MySqlDatabaseError;
use tracing::{debug, info};

use super::RepositoryError;
use super::statements::Statements;

/// `MySQL` error number for "Duplicate column name".
const ER_DUP_FIELDNAME: u16 = 1060;
/// `MySQL` error number for "Duplicate key name".
const ER_DUP_KEYNAME: u16 = 1061;

/// An extension column: `(table, column, indexed)`.
pub const EXTENSION_COLUMNS: &[(&str, &str, bool)] = &[
    ("category", "category_uid", true),
    ("category", "parent_uid", false),
    ("product", "batch_uid", true),
    ("product_image", "file_uid", true),
    ("attribute", "attribute_uid", true),
];

const COLUMN_EXISTS: &str = r"SELECT COUNT(*) FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? AND COLUMN_NAME = ?";

fn mysql_error_number(error: &sqlx::Error) -> Option<u16> {
    error
        .as_database_error()
        .and_then(|e| e.try_downcast_ref::<MySqlDatabaseError>())
        .map(MySqlDatabaseError::number)
}

/// Add any missing extension column.
///
/// Returns the `table.column` names that were added. A concurrent migration
/// that adds the same column first is not an error.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a lookup or `ALTER TABLE` fails.
pub async fn ensure_extension_columns(
    pool: &MySqlPool,
    statements: &Statements,
) -> Result<Vec<String>, RepositoryError> {
    let mut added = Vec::new();

    for &(table, column, indexed) in EXTENSION_COLUMNS {
        let exists = sqlx::query_scalar::<_, i64>(COLUMN_EXISTS)
            .bind(statements.raw_table(table))
            .bind(column)
            .fetch_one(pool)
            .await?;
        if exists > 0 {
            debug!(table, column, "Extension column present");
            continue;
        }

        let alter = format!(
            "ALTER TABLE {} ADD COLUMN `{column}` VARCHAR(64) NULL",
            statements.table(table)
        );
        match sqlx::query(&alter).persistent(false).execute(pool).await {
            Ok(_) => {
                info!(table, column, "Added extension column");
                added.push(format!("{table}.{column}"));
            }
            Err(e) if mysql_error_number(&e) == Some(ER_DUP_FIELDNAME) => {
                debug!(table, column, "Extension column added concurrently");
                continue;
            }
            Err(e) => return Err(e.into()),
        }

        if indexed {
            let index = format!(
                "ALTER TABLE {} ADD INDEX `idx_{column}` (`{column}`)",
                statements.table(table)
            );
            match sqlx::query(&index).persistent(false).execute(pool).await {
                Ok(_) => {}
                Err(e) if mysql_error_number(&e) == Some(ER_DUP_KEYNAME) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_columns_are_identifiers() {
        for &(table, column, _) in EXTENSION_COLUMNS {
            assert!(table.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
            assert!(column.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_non_database_error_has_no_number() {
        assert_eq!(mysql_error_number(&sqlx::Error::RowNotFound), None);
    }
}
