//! Table and column mapping of an entity, and the builder that configures it.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::entity::{Entity, ScalarKind};
use crate::error::{Error, Result};
use crate::naming::NamingPolicy;

/// How one property maps to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Rust property name; templates bind parameters by it.
    pub property: &'static str,
    /// Column name after naming resolution.
    pub name: String,
    /// Column kind.
    pub kind: ScalarKind,
    /// Whether the property is an `Option`.
    pub nullable: bool,
    /// Part of the primary key.
    pub is_key: bool,
    /// Value is produced by the database.
    pub auto_generation: bool,
    /// Not mapped to any column.
    pub ignore: bool,
}

/// How an entity maps to a table and which connections it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    entity: &'static str,
    type_id: TypeId,
    table_name: String,
    fields: Vec<FieldMetadata>,
    reading_connection: String,
    writing_connection: String,
}

impl EntityMetadata {
    /// Reflection default: every property becomes a field, the table is
    /// named after the type, and no key is set.
    #[must_use]
    pub fn reflect<E: Entity>(naming: &NamingPolicy, connection: &str) -> Self {
        let fields = E::properties()
            .iter()
            .map(|property| FieldMetadata {
                property: property.name,
                name: naming.resolve(property.name),
                kind: property.kind,
                nullable: property.nullable,
                is_key: false,
                auto_generation: false,
                ignore: false,
            })
            .collect();

        Self {
            entity: E::NAME,
            type_id: TypeId::of::<E>(),
            table_name: naming.resolve(E::NAME),
            fields,
            reading_connection: connection.to_string(),
            writing_connection: connection.to_string(),
        }
    }

    /// Entity type name.
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        self.entity
    }

    /// Entity type identity.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fields in declaration order, ignored ones included.
    #[must_use]
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    /// Key fields in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldMetadata> {
        self.fields.iter().filter(|field| field.is_key)
    }

    /// Looks up a mapped (not ignored) field by property name, ignoring case.
    #[must_use]
    pub fn field(&self, property: &str) -> Option<&FieldMetadata> {
        self.fields
            .iter()
            .find(|field| !field.ignore && field.property.eq_ignore_ascii_case(property))
    }

    /// Connection used for reads.
    #[must_use]
    pub fn reading_connection(&self) -> &str {
        &self.reading_connection
    }

    /// Connection used for writes.
    #[must_use]
    pub fn writing_connection(&self) -> &str {
        &self.writing_connection
    }

    /// Fails when no key is marked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingKey`].
    pub fn require_key(&self) -> Result<()> {
        if self.keys().next().is_none() {
            return Err(Error::MissingKey(self.entity));
        }
        Ok(())
    }

    pub(crate) fn field_mut(&mut self, property: &str) -> Result<&mut FieldMetadata> {
        let entity = self.entity;
        self.fields.iter_mut().find(|field| field.property == property).ok_or_else(|| {
            Error::UnknownProperty {
                entity,
                property: property.to_string(),
            }
        })
    }

    pub(crate) fn set_table_name(&mut self, name: impl Into<String>) {
        self.table_name = name.into();
    }

    pub(crate) fn set_connections(&mut self, reading: &str, writing: &str) {
        self.reading_connection = reading.to_string();
        self.writing_connection = writing.to_string();
    }

    pub(crate) fn mark_key(&mut self, property: &str) -> Result<()> {
        let entity = self.entity;
        let field = self.field_mut(property)?;
        if field.ignore {
            return Err(Error::IgnoredKey {
                entity,
                property: property.to_string(),
            });
        }
        field.is_key = true;
        Ok(())
    }

    pub(crate) fn mark_ignored(&mut self, property: &str) -> Result<()> {
        let entity = self.entity;
        let field = self.field_mut(property)?;
        if field.is_key {
            return Err(Error::IgnoredKey {
                entity,
                property: property.to_string(),
            });
        }
        field.ignore = true;
        Ok(())
    }
}

/// Fluent configuration of an entity's metadata.
///
/// Starts from the reflection default. Misconfigurations are recorded and
/// the first one is reported by [`MetadataBuilder::build`].
///
/// ```
/// use strata_orm::{MetadataBuilder, NamingPolicy};
///
/// strata_orm::entity! {
///     pub struct Order {
///         pub id: i64,
///         pub total: f64,
///     }
/// }
///
/// let metadata = MetadataBuilder::<Order>::new(&NamingPolicy::default(), "default")
///     .table("orders")
///     .auto_key("id")
///     .build()
///     .unwrap();
/// assert_eq!(metadata.table_name(), "orders");
/// ```
#[derive(Debug)]
pub struct MetadataBuilder<E: Entity> {
    metadata: EntityMetadata,
    error: Option<Error>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> MetadataBuilder<E> {
    /// Creates a builder seeded with the reflection default.
    #[must_use]
    pub fn new(naming: &NamingPolicy, connection: &str) -> Self {
        Self {
            metadata: EntityMetadata::reflect::<E>(naming, connection),
            error: None,
            _marker: PhantomData,
        }
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(e) = result
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.metadata.set_table_name(name);
        self
    }

    /// Overrides the column name of a property.
    #[must_use]
    pub fn column(mut self, property: &str, column: impl Into<String>) -> Self {
        let result = self.metadata.field_mut(property).map(|field| field.name = column.into());
        self.record(result);
        self
    }

    /// Marks the primary key, replacing any previously marked key.
    #[must_use]
    pub fn key(self, property: &str) -> Self {
        self.keys(&[property])
    }

    /// Marks a composite primary key, replacing any previously marked key.
    #[must_use]
    pub fn keys(mut self, properties: &[&str]) -> Self {
        for field in &mut self.metadata.fields {
            field.is_key = false;
        }
        for property in properties {
            let result = self.metadata.mark_key(property);
            self.record(result);
        }
        self
    }

    /// Marks a property as produced by the database.
    #[must_use]
    pub fn auto_generated(mut self, property: &str) -> Self {
        let result = self.metadata.field_mut(property).map(|field| field.auto_generation = true);
        self.record(result);
        self
    }

    /// Marks a database-generated primary key, replacing any previous key.
    #[must_use]
    pub fn auto_key(self, property: &str) -> Self {
        self.key(property).auto_generated(property)
    }

    /// Excludes a property from every statement. Fails for key properties.
    #[must_use]
    pub fn ignore(mut self, property: &str) -> Self {
        let result = self.metadata.mark_ignored(property);
        self.record(result);
        self
    }

    /// Sets the connection used for reads.
    #[must_use]
    pub fn reading_connection(mut self, name: &str) -> Self {
        self.metadata.reading_connection = name.to_string();
        self
    }

    /// Sets the connection used for writes.
    #[must_use]
    pub fn writing_connection(mut self, name: &str) -> Self {
        self.metadata.writing_connection = name.to_string();
        self
    }

    /// Uses one connection for reads and writes.
    #[must_use]
    pub fn connection(mut self, name: &str) -> Self {
        self.metadata.set_connections(name, name);
        self
    }

    /// Finishes the metadata.
    ///
    /// # Errors
    ///
    /// Returns the first misconfiguration, or [`Error::MissingKey`] when no
    /// key was marked.
    pub fn build(self) -> Result<EntityMetadata> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.metadata.require_key()?;
        Ok(self.metadata)
    }
}
