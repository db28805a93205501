//! SQL dialects.
//!
//! A dialect is a fixed set of text-generation capabilities: identifier and
//! parameter delimiting, multi-row inserts, pagination, and last-insert-id
//! retrieval.

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::bail;

use crate::error::{Error, Result};

/// One column of a multi-row insert: the column name and the parameter
/// name rows are bound under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchColumn<'a> {
    /// Column name, unquoted.
    pub column: &'a str,
    /// Parameter base name; row `n` binds `{param}_{n}`.
    pub param: &'a str,
}

/// Parameter name for `param` in row `row` of a multi-row insert.
#[must_use]
pub fn row_parameter(param: &str, row: usize) -> String {
    format!("{param}_{row}")
}

/// Text-generation rules for one database family.
pub trait Dialect: Debug + Send + Sync {
    /// Dialect name. Two dialects with the same name are the same dialect.
    fn name(&self) -> &'static str;

    /// Prefix and suffix wrapped around identifiers.
    fn identifier_delimiters(&self) -> (&'static str, &'static str);

    /// Prefix of named parameters.
    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    /// Whether [`Dialect::batch_insert`] produces a statement.
    fn batch_insert_supported(&self) -> bool;

    /// Whether [`Dialect::last_insert_id`] produces a statement.
    fn last_insert_id_supported(&self) -> bool;

    /// Multi-row `INSERT` for `rows` rows, or `None` when unsupported.
    fn batch_insert(&self, table: &str, columns: &[BatchColumn<'_>], rows: usize) -> Option<String>;

    /// Wraps an un-paginated select into one page of results.
    ///
    /// `order_by` is a complete `ORDER BY ...` fragment or empty; `filter`
    /// is a WHERE condition without the keyword.
    ///
    /// # Errors
    ///
    /// Returns a generation error when the select cannot be paginated.
    fn paginate(
        &self, page_index: u64, page_size: u64, select: &str, order_by: &str,
        filter: Option<&str>,
    ) -> Result<String>;

    /// Statement returning the id generated by the last insert.
    fn last_insert_id(&self) -> Option<&'static str>;

    /// Wraps an identifier in the dialect's delimiters.
    fn quote_identifier(&self, identifier: &str) -> String {
        let (prefix, suffix) = self.identifier_delimiters();
        format!("{prefix}{identifier}{suffix}")
    }

    /// Formats a named parameter placeholder.
    fn parameter(&self, name: &str) -> String {
        format!("{}{name}", self.parameter_prefix())
    }
}

fn push_filter(sql: &mut String, filter: Option<&str>) {
    if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter);
    }
}

/// `MySQL`: backtick identifiers and `LIMIT offset, size` pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_delimiters(&self) -> (&'static str, &'static str) {
        ("`", "`")
    }

    fn batch_insert_supported(&self) -> bool {
        true
    }

    fn last_insert_id_supported(&self) -> bool {
        true
    }

    fn batch_insert(
        &self, table: &str, columns: &[BatchColumn<'_>], rows: usize,
    ) -> Option<String> {
        if columns.is_empty() || rows == 0 {
            return None;
        }

        let names =
            columns.iter().map(|c| self.quote_identifier(c.column)).collect::<Vec<_>>().join(", ");
        let tuples = (0..rows)
            .map(|row| {
                let params = columns
                    .iter()
                    .map(|c| self.parameter(&row_parameter(c.param, row)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({params})")
            })
            .collect::<Vec<_>>()
            .join(", ");

        Some(format!("INSERT INTO {} ({names}) VALUES {tuples}", self.quote_identifier(table)))
    }

    fn paginate(
        &self, page_index: u64, page_size: u64, select: &str, order_by: &str,
        filter: Option<&str>,
    ) -> Result<String> {
        let mut sql = select.to_string();
        push_filter(&mut sql, filter);
        if !order_by.trim().is_empty() {
            sql.push(' ');
            sql.push_str(order_by);
        }

        if page_index == 0 {
            sql.push_str(&format!(" LIMIT {page_size}"));
        } else {
            let offset = page_index.saturating_mul(page_size);
            sql.push_str(&format!(" LIMIT {offset}, {page_size}"));
        }
        Ok(sql)
    }

    fn last_insert_id(&self) -> Option<&'static str> {
        Some("SELECT LAST_INSERT_ID()")
    }
}

/// SQL Server: bracket identifiers and `ROW_NUMBER()` window pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlServer;

impl Dialect for SqlServer {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn identifier_delimiters(&self) -> (&'static str, &'static str) {
        ("[", "]")
    }

    fn batch_insert_supported(&self) -> bool {
        false
    }

    fn last_insert_id_supported(&self) -> bool {
        true
    }

    fn batch_insert(&self, _: &str, _: &[BatchColumn<'_>], _: usize) -> Option<String> {
        None
    }

    fn paginate(
        &self, page_index: u64, page_size: u64, select: &str, order_by: &str,
        filter: Option<&str>,
    ) -> Result<String> {
        // the select list and the source are split on the one literal " FROM "
        let parts: Vec<&str> = select.split(" FROM ").collect();
        let [list, source] = parts.as_slice() else {
            return Err(Error::MalformedSelect(select.to_string()));
        };

        let over = if order_by.trim().is_empty() { "ORDER BY (SELECT NULL)" } else { order_by };
        let mut inner = format!("{list}, ROW_NUMBER() OVER({over}) AS [ROWNUMBER] FROM {source}");
        push_filter(&mut inner, filter);

        let first = page_index.saturating_mul(page_size).saturating_add(1);
        let last = page_index.saturating_add(1).saturating_mul(page_size);
        Ok(format!(
            "SELECT * FROM ({inner}) AS [PAGED] \
             WHERE [ROWNUMBER] BETWEEN {first} AND {last} ORDER BY [ROWNUMBER]"
        ))
    }

    fn last_insert_id(&self) -> Option<&'static str> {
        Some("SELECT CAST(@@IDENTITY AS BIGINT)")
    }
}

/// Dialect selector used in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DialectKind {
    /// [`MySql`]
    #[default]
    MySql,
    /// [`SqlServer`]
    SqlServer,
}

impl DialectKind {
    /// Instantiates the dialect.
    #[must_use]
    pub fn dialect(self) -> Arc<dyn Dialect> {
        match self {
            Self::MySql => Arc::new(MySql),
            Self::SqlServer => Arc::new(SqlServer),
        }
    }
}

impl FromStr for DialectKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            other => bail!("unknown dialect `{other}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_first_page() {
        let sql = MySql.paginate(0, 10, "SELECT * FROM t", "ORDER BY id", None).unwrap();
        assert_eq!(sql, "SELECT * FROM t ORDER BY id LIMIT 10");
    }

    #[test]
    fn mysql_later_page_with_filter() {
        let sql = MySql.paginate(2, 10, "SELECT * FROM t", "ORDER BY id", None).unwrap();
        assert_eq!(sql, "SELECT * FROM t ORDER BY id LIMIT 20, 10");

        let sql = MySql.paginate(1, 5, "SELECT * FROM t", "", Some("`a` = @p0")).unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE `a` = @p0 LIMIT 5, 5");
    }

    #[test]
    fn sqlserver_window() {
        let sql = SqlServer.paginate(1, 5, "SELECT a, b FROM t", "ORDER BY a asc", None).unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM (SELECT a, b, ROW_NUMBER() OVER(ORDER BY a asc) AS [ROWNUMBER] FROM t) \
             AS [PAGED] WHERE [ROWNUMBER] BETWEEN 6 AND 10 ORDER BY [ROWNUMBER]"
        );
    }

    #[test]
    fn sqlserver_window_filter_and_default_order() {
        let sql = SqlServer.paginate(0, 20, "SELECT a FROM t", "", Some("[a] > @p0")).unwrap();
        assert!(sql.contains("OVER(ORDER BY (SELECT NULL))"));
        assert!(sql.contains("FROM t WHERE [a] > @p0) AS [PAGED]"));
        assert!(sql.contains("BETWEEN 1 AND 20"));
    }

    #[test]
    fn sqlserver_rejects_malformed_select() {
        let err = SqlServer.paginate(0, 5, "SELECT 1", "", None).unwrap_err();
        assert!(matches!(err, Error::MalformedSelect(_)));

        let err = SqlServer
            .paginate(0, 5, "SELECT a FROM t WHERE b IN (SELECT b FROM u)", "", None)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedSelect(_)));
    }

    #[test]
    fn batch_insert_capabilities() {
        let columns = [
            BatchColumn { column: "name", param: "name" },
            BatchColumn { column: "age", param: "age" },
        ];
        let sql = MySql.batch_insert("users", &columns, 2).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO `users` (`name`, `age`) VALUES (@name_0, @age_0), (@name_1, @age_1)"
        );
        assert!(MySql.batch_insert_supported());

        assert!(SqlServer.batch_insert("users", &columns, 2).is_none());
        assert!(!SqlServer.batch_insert_supported());
    }

    #[test]
    fn delimiting() {
        assert_eq!(MySql.quote_identifier("user"), "`user`");
        assert_eq!(SqlServer.quote_identifier("user"), "[user]");
        assert_eq!(SqlServer.parameter("p0"), "@p0");
    }

    #[test]
    fn parses_kind() {
        assert_eq!("MSSQL".parse::<DialectKind>().unwrap(), DialectKind::SqlServer);
        assert_eq!(DialectKind::MySql.dialect().name(), "mysql");
        "oracle".parse::<DialectKind>().unwrap_err();
    }
}
