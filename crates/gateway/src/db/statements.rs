//! Named statement registry.
//!
//! Storefront tables carry a configurable prefix, so SQL text is built at
//! runtime. Each statement is declared once as a [`Statement`] with `{table}`
//! placeholders; the registry renders it on first use and hands out the
//! cached text afterwards. Queries run as persistent statements, so every
//! pooled connection prepares a given text once and reuses the handle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A named SQL template.
///
/// `{name}` in the template is replaced with the quoted, prefixed table name.
#[derive(Debug, Clone, Copy)]
pub struct Statement {
    name: &'static str,
    template: &'static str,
}

impl Statement {
    /// Declare a statement.
    #[must_use]
    pub const fn new(name: &'static str, template: &'static str) -> Self {
        Self { name, template }
    }

    /// Registry key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Rendered statements keyed by name.
///
/// Created at startup and owned by the application state.
#[derive(Debug)]
pub struct Statements {
    prefix: String,
    cache: Mutex<HashMap<&'static str, Arc<str>>>,
}

impl Statements {
    /// Create a registry for tables named `{prefix}{table}`.
    ///
    /// The prefix must already be validated as an identifier.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Table prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefixed table name without quoting, as stored in `information_schema`.
    #[must_use]
    pub fn raw_table(&self, table: &str) -> String {
        format!("{}{table}", self.prefix)
    }

    /// Quoted, prefixed table name for use in SQL text.
    #[must_use]
    pub fn table(&self, table: &str) -> String {
        format!("`{}{table}`", self.prefix)
    }

    /// SQL text for a statement, rendering and caching it on first use.
    pub fn sql(&self, statement: &Statement) -> Arc<str> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sql) = cache.get(statement.name) {
            return Arc::clone(sql);
        }
        let sql: Arc<str> = Arc::from(self.render(statement.template));
        cache.insert(statement.name, Arc::clone(&sql));
        sql
    }

    /// Number of statements rendered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no statement has been rendered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached statement.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Replace `{table}` placeholders with quoted table names.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len() + 32);
        let mut rest = template;

        while let Some(start) = rest.find('{') {
            let (before, after) = rest.split_at(start);
            out.push_str(before);

            let tail = after.get(1..).unwrap_or_default();
            match tail.find('}') {
                Some(end) => {
                    let name = tail.get(..end).unwrap_or_default();
                    out.push_str(&self.table(name));
                    rest = tail.get(end + 1..).unwrap_or_default();
                }
                None => {
                    out.push_str(after);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIND_PRODUCT: Statement = Statement::new(
        "test.find_product",
        "SELECT product_id FROM {product} WHERE model = ? LIMIT 1",
    );

    #[test]
    fn test_render_replaces_placeholders() {
        let statements = Statements::new("oc_");
        assert_eq!(
            statements.render("DELETE FROM {product_to_category} WHERE product_id = ?"),
            "DELETE FROM `oc_product_to_category` WHERE product_id = ?"
        );
        assert_eq!(
            statements.render("SELECT * FROM {order} o JOIN {order_product} op USING (order_id)"),
            "SELECT * FROM `oc_order` o JOIN `oc_order_product` op USING (order_id)"
        );
    }

    #[test]
    fn test_render_without_prefix() {
        let statements = Statements::new("");
        assert_eq!(statements.render("SELECT 1 FROM {api}"), "SELECT 1 FROM `api`");
    }

    #[test]
    fn test_render_leaves_unbalanced_brace() {
        let statements = Statements::new("oc_");
        assert_eq!(statements.render("SELECT '{'"), "SELECT '{'");
    }

    #[test]
    fn test_sql_is_cached_by_name() {
        let statements = Statements::new("oc_");
        assert!(statements.is_empty());

        let first = statements.sql(&FIND_PRODUCT);
        let second = statements.sql(&FIND_PRODUCT);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(statements.len(), 1);
        assert_eq!(
            &*first,
            "SELECT product_id FROM `oc_product` WHERE model = ? LIMIT 1"
        );

        statements.clear();
        assert!(statements.is_empty());
    }

    #[test]
    fn test_table_names() {
        let statements = Statements::new("oc_");
        assert_eq!(statements.table("order"), "`oc_order`");
        assert_eq!(statements.raw_table("order"), "oc_order");
        assert_eq!(statements.prefix(), "oc_");
    }
}
