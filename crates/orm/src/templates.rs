//! Cached CRUD statement text.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::metadata::{EntityMetadata, FieldMetadata};

/// Fields written by an insert, ordered by column name.
pub(crate) fn insert_fields(metadata: &EntityMetadata) -> Vec<&FieldMetadata> {
    sorted(metadata.fields().iter().filter(|f| !f.ignore && !f.auto_generation))
}

/// Fields set by an update, ordered by column name.
pub(crate) fn update_fields(metadata: &EntityMetadata) -> Vec<&FieldMetadata> {
    sorted(metadata.fields().iter().filter(|f| !f.is_key && !f.auto_generation && !f.ignore))
}

/// Fields read by a select, ordered by column name.
pub(crate) fn select_fields(metadata: &EntityMetadata) -> Vec<&FieldMetadata> {
    sorted(metadata.fields().iter().filter(|f| !f.ignore))
}

fn sorted<'a>(fields: impl Iterator<Item = &'a FieldMetadata>) -> Vec<&'a FieldMetadata> {
    let mut fields: Vec<_> = fields.collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    fields
}

/// `[k1] = @k1 AND [k2] = @k2`, or `None` for a keyless entity.
pub(crate) fn key_clause(metadata: &EntityMetadata, dialect: &dyn Dialect) -> Option<String> {
    let clause = metadata
        .keys()
        .map(|key| assignment(key, dialect))
        .collect::<Vec<_>>()
        .join(" AND ");
    (!clause.is_empty()).then_some(clause)
}

/// `[column] = @property`
pub(crate) fn assignment(field: &FieldMetadata, dialect: &dyn Dialect) -> String {
    format!("{} = {}", dialect.quote_identifier(&field.name), dialect.parameter(field.property))
}

/// Insert, update, delete and select text for one entity type, built once
/// and shared. Parameters are named after entity properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrudTemplates {
    entity: &'static str,
    table: String,
    insert: String,
    update: Option<String>,
    delete: Option<String>,
    select: String,
}

impl CrudTemplates {
    /// Builds the templates for `metadata` in `dialect`.
    #[must_use]
    pub fn build(metadata: &EntityMetadata, dialect: &dyn Dialect) -> Self {
        let table = dialect.quote_identifier(metadata.table_name());

        let inserted = insert_fields(metadata);
        let columns = inserted
            .iter()
            .map(|f| dialect.quote_identifier(&f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let values =
            inserted.iter().map(|f| dialect.parameter(f.property)).collect::<Vec<_>>().join(", ");
        let insert = format!("INSERT INTO {table} ({columns}) VALUES ({values})");

        let keys = key_clause(metadata, dialect);
        let sets = update_fields(metadata)
            .into_iter()
            .map(|f| assignment(f, dialect))
            .collect::<Vec<_>>()
            .join(", ");
        let update = keys
            .as_ref()
            .filter(|_| !sets.is_empty())
            .map(|keys| format!("UPDATE {table} SET {sets} WHERE {keys}"));
        let delete = keys.map(|keys| format!("DELETE FROM {table} WHERE {keys}"));

        let selected = select_fields(metadata)
            .into_iter()
            .map(|f| dialect.quote_identifier(&f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let select = format!("SELECT {selected} FROM {table}");

        Self {
            entity: metadata.entity(),
            table,
            insert,
            update,
            delete,
            select,
        }
    }

    /// Quoted table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `INSERT INTO t (cols) VALUES (@props)`
    #[must_use]
    pub fn insert(&self) -> &str {
        &self.insert
    }

    /// `UPDATE t SET ... WHERE keys`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`] for a keyless entity and
    /// [`Error::EmptyUpdate`] when every field is a key or generated.
    pub fn update(&self) -> Result<&str> {
        if self.delete.is_none() {
            return Err(Error::MissingKey(self.entity));
        }
        self.update.as_deref().ok_or_else(|| Error::EmptyUpdate(self.table.clone()))
    }

    /// `DELETE FROM t WHERE keys`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`] for a keyless entity.
    pub fn delete(&self) -> Result<&str> {
        self.delete.as_deref().ok_or(Error::MissingKey(self.entity))
    }

    /// `SELECT cols FROM t`
    #[must_use]
    pub fn select(&self) -> &str {
        &self.select
    }
}
