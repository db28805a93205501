//! Keyed and filtered DELETE statements.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::filter::QueryFilter;
use crate::generator::Generator;
use crate::query::{Params, Statement};

impl<E: Entity> Generator<E> {
    /// Builds the keyed delete for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`] for a keyless entity.
    pub fn delete(&self, entity: &E) -> Result<Statement> {
        let sql = self.templates().delete()?.to_string();
        let mut params = Params::new();
        Self::bind(&mut params, &entity.values(), self.metadata().keys());

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            "delete generated SQL"
        );

        Ok(Statement::new(sql, params))
    }

    /// Builds `DELETE FROM t WHERE ...` for every row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFilter`] when the filter has no predicate, or
    /// any rendering error.
    pub fn delete_where(&self, filter: &QueryFilter) -> Result<Statement> {
        let table = self.metadata().table_name();
        let mut params = Params::new();

        let condition = self.filter(filter, &mut params)?;
        if condition.is_empty() {
            return Err(Error::EmptyFilter("delete", table.to_string()));
        }
        let sql = format!("DELETE FROM {} WHERE {condition}", self.templates().table());

        tracing::debug!(
            table,
            sql = %sql,
            param_count = params.len(),
            "delete_where generated SQL"
        );

        Ok(Statement::new(sql, params))
    }
}
