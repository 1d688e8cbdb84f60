//! API user lookup.
//!
//! The storefront's `api` table stores each key base64-encoded; callers
//! present the raw token.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sqlx::MySqlPool;

use super::RepositoryError;
use super::statements::{Statement, Statements};

const FIND_USERNAME: Statement = Statement::new(
    "api.find_username",
    "SELECT username FROM {api} WHERE `key` = ? AND status = 1 LIMIT 1",
);

/// Repository for API credentials.
pub struct ApiKeyRepository<'a> {
    pool: &'a MySqlPool,
    statements: &'a Statements,
}

impl<'a> ApiKeyRepository<'a> {
    /// Create a new API key repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool, statements: &'a Statements) -> Self {
        Self { pool, statements }
    }

    /// Username of the enabled API user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_username(&self, token: &str) -> Result<Option<String>, RepositoryError> {
        let sql = self.statements.sql(&FIND_USERNAME);
        let username = sqlx::query_scalar::<_, String>(&sql)
            .bind(encode_key(token))
            .fetch_optional(self.pool)
            .await?;
        Ok(username)
    }
}

/// Stored form of an API key.
#[must_use]
pub fn encode_key(token: &str) -> String {
    STANDARD.encode(token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("secret"), "c2VjcmV0");
        assert_eq!(encode_key(""), "");
    }
}
