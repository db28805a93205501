//! Keyed, partial and filtered UPDATE statements.

use sea_query::Value;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::filter::QueryFilter;
use crate::generator::Generator;
use crate::query::{Params, Statement};
use crate::templates::{assignment, key_clause, update_fields};

impl<E: Entity> Generator<E> {
    /// Builds the keyed update for `entity`, setting every updatable column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`] for a keyless entity.
    pub fn update(&self, entity: &E) -> Result<Statement> {
        let sql = self.templates().update()?.to_string();
        let mut params = Params::new();
        let values = entity.values();
        Self::bind(&mut params, &values, update_fields(self.metadata()));
        Self::bind(&mut params, &values, self.metadata().keys());

        tracing::debug!(
            table = self.metadata().table_name(),
            sql = %sql,
            param_count = params.len(),
            "update generated SQL"
        );

        Ok(Statement::new(sql, params))
    }

    /// Builds a keyed update of the named fields only. Key and generated
    /// fields are never set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyUpdate`] when no updatable field is named,
    /// [`Error::UnknownField`] for unmapped fields and
    /// [`Error::MissingKey`] for a keyless entity.
    pub fn update_fields(&self, entity: &E, fields: &[&str]) -> Result<Statement> {
        let metadata = self.metadata();
        let keys = key_clause(metadata, self.dialect()).ok_or(Error::MissingKey(E::NAME))?;

        let mut selected = Vec::with_capacity(fields.len());
        for name in fields {
            let field = self.field(name)?;
            if !field.is_key && !field.auto_generation && !selected.contains(&field) {
                selected.push(field);
            }
        }
        if selected.is_empty() {
            return Err(Error::EmptyUpdate(metadata.table_name().to_string()));
        }

        let sets =
            selected.iter().map(|f| assignment(f, self.dialect())).collect::<Vec<_>>().join(", ");
        let sql = format!("UPDATE {} SET {sets} WHERE {keys}", self.templates().table());

        let mut params = Params::new();
        let values = entity.values();
        Self::bind(&mut params, &values, selected);
        Self::bind(&mut params, &values, metadata.keys());

        tracing::debug!(
            table = metadata.table_name(),
            sql = %sql,
            param_count = params.len(),
            "update_fields generated SQL"
        );

        Ok(Statement::new(sql, params))
    }

    /// Builds `UPDATE t SET ... WHERE ...` for every row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFilter`] when the filter has no predicate,
    /// [`Error::EmptyUpdate`] when `pairs` is empty, or any rendering error.
    pub fn update_where(&self, pairs: &[(&str, Value)], filter: &QueryFilter) -> Result<Statement> {
        let table = self.metadata().table_name();
        let mut params = Params::new();

        let sets = self.set(pairs, &mut params)?;
        let condition = self.filter(filter, &mut params)?;
        if condition.is_empty() {
            return Err(Error::EmptyFilter("update", table.to_string()));
        }
        let sql = format!("UPDATE {} SET {sets} WHERE {condition}", self.templates().table());

        tracing::debug!(
            table,
            sql = %sql,
            param_count = params.len(),
            "update_where generated SQL"
        );

        Ok(Statement::new(sql, params))
    }
}
