//! Write paths over an external statement executor.

use std::fmt::Debug;
use std::sync::Arc;

use futures::future::BoxFuture;
use sea_query::Value;

use crate::entity::Entity;
use crate::error::Result;
use crate::filter::QueryFilter;
use crate::generator::Generator;
use crate::insert::BatchInsert;
use crate::query::{Params, Statement};
use crate::registry::DataSource;
use crate::value::coerce_integer;

/// Boxed `'static` future returned by [`Executor`] methods.
pub type FutureResult<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Runs generated statements against a named connection.
pub trait Executor: Debug + Send + Sync + 'static {
    /// Runs one statement and returns the number of affected rows.
    fn exec(&self, connection: &str, statement: Statement) -> FutureResult<u64>;

    /// Runs `sql` once per parameter set and returns the total number of
    /// affected rows.
    fn exec_each(&self, connection: &str, sql: String, rows: Vec<Params>) -> FutureResult<u64>;

    /// Runs the statements in one transaction and returns the single value
    /// produced by the last one.
    fn exec_scalar(&self, connection: &str, statements: Vec<Statement>) -> FutureResult<Value>;
}

/// Inserts, updates and deletes of `E` through its writing connection.
pub struct Repository<E: Entity> {
    generator: Generator<E>,
    source: DataSource,
    executor: Arc<dyn Executor>,
}

impl<E: Entity> Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("generator", &self.generator)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Repository<E> {
    /// Creates a repository.
    #[must_use]
    pub fn new(generator: Generator<E>, source: DataSource, executor: Arc<dyn Executor>) -> Self {
        Self {
            generator,
            source,
            executor,
        }
    }

    /// SQL generator.
    #[must_use]
    pub const fn generator(&self) -> &Generator<E> {
        &self.generator
    }

    /// Data source.
    #[must_use]
    pub const fn data_source(&self) -> &DataSource {
        &self.source
    }

    fn connection(&self) -> &str {
        self.source.writing_connection()
    }

    /// Inserts `entity`.
    ///
    /// When the entity has a single database-generated integer key and the
    /// dialect reports last insert ids, the insert and the id query run in
    /// one transaction, the id is written back onto `entity`, and 1 is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an execution error, or an error assigning the generated id.
    pub async fn insert(&self, entity: &mut E) -> Result<u64> {
        let statement = self.generator.insert(entity);

        let auto_key = self.generator.auto_increment_key().map(|key| (key.property, key.kind));
        let last_insert_id = self.generator.last_insert_id();
        let (Some((property, kind)), Some(last_insert_id)) = (auto_key, last_insert_id) else {
            return Ok(self.executor.exec(self.connection(), statement).await?);
        };

        let id =
            self.executor.exec_scalar(self.connection(), vec![statement, last_insert_id]).await?;
        let id = coerce_integer(id, kind, property)?;
        entity.set_value(property, id)?;
        tracing::debug!(entity = E::NAME, property, "assigned generated key");
        Ok(1)
    }

    /// Inserts `entities` as one multi-row statement where the dialect
    /// supports it, otherwise row by row.
    ///
    /// # Errors
    ///
    /// Returns an execution error.
    pub async fn insert_batch(&self, entities: &[E]) -> Result<u64> {
        if entities.is_empty() {
            return Ok(0);
        }

        let affected = match self.generator.batch_insert(entities) {
            BatchInsert::MultiRow { statement, .. } => {
                self.executor.exec(self.connection(), statement).await?
            }
            BatchInsert::PerRow { sql, rows } => {
                self.executor.exec_each(self.connection(), sql, rows).await?
            }
        };
        Ok(affected)
    }

    /// Updates every updatable column of `entity` by key.
    ///
    /// # Errors
    ///
    /// Returns a generation or execution error.
    pub async fn update(&self, entity: &E) -> Result<u64> {
        let statement = self.generator.update(entity)?;
        Ok(self.executor.exec(self.connection(), statement).await?)
    }

    /// Updates the named fields of `entity` by key.
    ///
    /// # Errors
    ///
    /// Returns a generation or execution error.
    pub async fn update_fields(&self, entity: &E, fields: &[&str]) -> Result<u64> {
        let statement = self.generator.update_fields(entity, fields)?;
        Ok(self.executor.exec(self.connection(), statement).await?)
    }

    /// Sets `pairs` on every row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a generation or execution error.
    pub async fn update_where(&self, pairs: &[(&str, Value)], filter: &QueryFilter) -> Result<u64> {
        let statement = self.generator.update_where(pairs, filter)?;
        Ok(self.executor.exec(self.connection(), statement).await?)
    }

    /// Deletes `entity` by key.
    ///
    /// # Errors
    ///
    /// Returns a generation or execution error.
    pub async fn delete(&self, entity: &E) -> Result<u64> {
        let statement = self.generator.delete(entity)?;
        Ok(self.executor.exec(self.connection(), statement).await?)
    }

    /// Deletes every row matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a generation or execution error.
    pub async fn delete_where(&self, filter: &QueryFilter) -> Result<u64> {
        let statement = self.generator.delete_where(filter)?;
        Ok(self.executor.exec(self.connection(), statement).await?)
    }
}
