//! SELECT, page and count statements.

use crate::entity::Entity;
use crate::error::Result;
use crate::filter::QueryFilter;
use crate::generator::{Generator, SortOptions};
use crate::query::{Params, Statement};

impl<E: Entity> Generator<E> {
    /// Builds `SELECT cols FROM t [WHERE ...] [ORDER BY ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter or sort cannot be rendered.
    pub fn select(&self, filter: &QueryFilter, sort: &SortOptions) -> Result<Statement> {
        let mut params = Params::new();
        let mut sql = self.templates().select().to_string();

        let condition = self.filter(filter, &mut params)?;
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        let order_by = self.order_by(sort)?;
        if !order_by.is_empty() {
            sql.push(' ');
            sql.push_str(&order_by);
        }

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            "select generated SQL"
        );

        Ok(Statement::new(sql, params))
    }

    /// Builds one page of a filtered, sorted select.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter or sort cannot be rendered or the
    /// dialect cannot paginate the select.
    pub fn page(
        &self, filter: &QueryFilter, sort: &SortOptions, page_index: u64, page_size: u64,
    ) -> Result<Statement> {
        let mut params = Params::new();
        let condition = self.filter(filter, &mut params)?;
        let order_by = self.order_by(sort)?;
        let sql = self.paginate(
            page_index,
            page_size,
            self.templates().select(),
            &order_by,
            Some(condition.as_str()),
        )?;

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            page_index,
            page_size,
            "page generated SQL"
        );

        Ok(Statement::new(sql, params))
    }

    /// Builds `SELECT COUNT(*) FROM t [WHERE ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter cannot be rendered.
    pub fn count(&self, filter: &QueryFilter) -> Result<Statement> {
        let mut params = Params::new();
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.templates().table());

        let condition = self.filter(filter, &mut params)?;
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            "count generated SQL"
        );

        Ok(Statement::new(sql, params))
    }
}
