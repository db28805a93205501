//! Runtime registry.
//!
//! The registry resolves metadata, data sources and CRUD templates once per
//! entity type and shares them for its lifetime. Each cache is a concurrent
//! map keyed by [`TypeId`]; concurrent first requests for the same type run
//! one construction and all observe its result.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fromenv::FromEnv;

use crate::convention::Conventions;
use crate::dialect::{Dialect, DialectKind};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::metadata::{EntityMetadata, MetadataBuilder};
use crate::naming::{Capitalization, NamingPolicy, NamingStrategy};
use crate::repository::{Executor, Repository};
use crate::templates::CrudTemplates;

/// The dialect and connections an entity is read from and written to.
///
/// Two data sources are equal when their dialect names and connection
/// names match.
#[derive(Debug, Clone)]
pub struct DataSource {
    dialect: Arc<dyn Dialect>,
    reading_connection: String,
    writing_connection: String,
}

impl DataSource {
    /// Creates a data source for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DialectMismatch`] when the two connections use
    /// different dialects.
    pub fn new(
        entity: &'static str, reading: (&str, Arc<dyn Dialect>), writing: (&str, Arc<dyn Dialect>),
    ) -> Result<Self> {
        let (reading_connection, reading_dialect) = reading;
        let (writing_connection, writing_dialect) = writing;

        if reading_dialect.name() != writing_dialect.name() {
            return Err(Error::DialectMismatch {
                entity,
                reading: reading_connection.to_string(),
                reading_dialect: reading_dialect.name(),
                writing: writing_connection.to_string(),
                writing_dialect: writing_dialect.name(),
            });
        }

        Ok(Self {
            dialect: reading_dialect,
            reading_connection: reading_connection.to_string(),
            writing_connection: writing_connection.to_string(),
        })
    }

    /// Shared dialect of both connections.
    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
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
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.dialect.name() == other.dialect.name()
            && self.reading_connection == other.reading_connection
            && self.writing_connection == other.writing_connection
    }
}

impl Eq for DataSource {}

/// Registry construction settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    naming: NamingPolicy,
    conventions: Conventions,
    connections: HashMap<String, Arc<dyn Dialect>>,
    default_connection: String,
    reflection: bool,
}

impl RegistryConfig {
    /// Creates a configuration with one connection, used by entities that
    /// do not route elsewhere.
    #[must_use]
    pub fn new(default_connection: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        let default_connection = default_connection.into();
        let mut connections = HashMap::new();
        connections.insert(default_connection.clone(), dialect);

        Self {
            naming: NamingPolicy::default(),
            conventions: Conventions::default(),
            connections,
            default_connection,
            reflection: true,
        }
    }

    /// Adds or replaces a named connection.
    #[must_use]
    pub fn with_connection(mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        self.connections.insert(name.into(), dialect);
        self
    }

    /// Sets the naming policy for table and column names.
    #[must_use]
    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the conventions applied to entities without explicit metadata.
    #[must_use]
    pub fn with_conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Only entities published through [`Registry::configure`] resolve;
    /// anything else fails with [`Error::NoMetadata`].
    #[must_use]
    pub fn explicit_only(mut self) -> Self {
        self.reflection = false;
        self
    }

    /// Naming policy.
    #[must_use]
    pub const fn naming(&self) -> &NamingPolicy {
        &self.naming
    }

    /// Connection used when metadata does not name one.
    #[must_use]
    pub fn default_connection(&self) -> &str {
        &self.default_connection
    }

    /// Dialect of a named connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownConnection`] for unconfigured names.
    pub fn dialect(&self, connection: &str) -> Result<Arc<dyn Dialect>> {
        self.connections
            .get(connection)
            .cloned()
            .ok_or_else(|| Error::UnknownConnection(connection.to_string()))
    }
}

/// Registry settings loaded from the environment.
#[allow(missing_docs)]
#[derive(Debug, Clone, FromEnv)]
pub struct RegistryOptions {
    /// `pascal` or `underline`.
    #[env(from = "ORM_NAMING_STRATEGY", default = "underline")]
    pub naming_strategy: String,

    /// `lower`, `upper` or `original`.
    #[env(from = "ORM_NAMING_CASE", default = "lower")]
    pub naming_case: String,

    /// Name of the default connection.
    #[env(from = "ORM_DEFAULT_CONNECTION", default = "default")]
    pub default_connection: String,

    /// `mysql` or `sqlserver`.
    #[env(from = "ORM_DEFAULT_DIALECT", default = "mysql")]
    pub default_dialect: String,
}

impl RegistryOptions {
    /// Loads the options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be read.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_env().finalize().context("issue loading registry options")
    }

    /// Parses the options into a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for unrecognised strategy, case or dialect names.
    pub fn into_config(self) -> anyhow::Result<RegistryConfig> {
        let strategy: NamingStrategy = self.naming_strategy.parse()?;
        let case: Capitalization = self.naming_case.parse()?;
        let dialect: DialectKind = self.default_dialect.parse()?;

        Ok(RegistryConfig::new(self.default_connection, dialect.dialect())
            .with_naming(NamingPolicy::new(strategy, case)))
    }
}

/// Per-type caches of metadata, data sources and CRUD templates.
pub struct Registry {
    config: RegistryConfig,
    metadata: DashMap<TypeId, Arc<EntityMetadata>>,
    sources: DashMap<TypeId, DataSource>,
    templates: DashMap<TypeId, Arc<CrudTemplates>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("entities", &self.metadata.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            metadata: DashMap::new(),
            sources: DashMap::new(),
            templates: DashMap::new(),
        }
    }

    /// Creates a registry configured from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the options cannot be loaded or parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(RegistryOptions::load()?.into_config()?))
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Publishes explicit metadata for `E`, built by `configure` from the
    /// reflection default.
    ///
    /// # Errors
    ///
    /// Returns the builder's error, a data source error for the configured
    /// connections, or [`Error::AlreadyRegistered`] when metadata for `E` has
    /// already been published or resolved.
    pub fn configure<E: Entity>(
        &self, configure: impl FnOnce(MetadataBuilder<E>) -> MetadataBuilder<E>,
    ) -> Result<Arc<EntityMetadata>> {
        let builder = MetadataBuilder::new(&self.config.naming, &self.config.default_connection);
        let metadata = Arc::new(configure(builder).build()?);
        let source = self.resolve_source(&metadata)?;

        match self.metadata.entry(TypeId::of::<E>()) {
            Entry::Occupied(_) => Err(Error::AlreadyRegistered(E::NAME)),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&metadata));
                self.sources.entry(TypeId::of::<E>()).or_insert(source);
                tracing::debug!(
                    entity = E::NAME,
                    table = metadata.table_name(),
                    "published entity metadata"
                );
                Ok(metadata)
            }
        }
    }

    /// Metadata for `E`: the published metadata if any, otherwise the
    /// reflection default with conventions applied, resolved once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMetadata`] when reflection is disabled and nothing
    /// was published, or a convention error.
    pub fn metadata<E: Entity>(&self) -> Result<Arc<EntityMetadata>> {
        let entry = self.metadata.entry(TypeId::of::<E>()).or_try_insert_with(|| {
            if !self.config.reflection {
                return Err(Error::NoMetadata(E::NAME));
            }
            let mut metadata =
                EntityMetadata::reflect::<E>(&self.config.naming, &self.config.default_connection);
            self.config.conventions.apply(&mut metadata, E::properties())?;
            tracing::debug!(
                entity = E::NAME,
                table = metadata.table_name(),
                "resolved entity metadata"
            );
            Ok(Arc::new(metadata))
        })?;
        Ok(Arc::clone(entry.value()))
    }

    /// Metadata for `E` if it has been published or resolved.
    #[must_use]
    pub fn find_metadata<E: Entity>(&self) -> Option<Arc<EntityMetadata>> {
        self.metadata.get(&TypeId::of::<E>()).map(|entry| Arc::clone(entry.value()))
    }

    /// Data source for `E`.
    ///
    /// # Errors
    ///
    /// Returns a metadata error, [`Error::UnknownConnection`] or
    /// [`Error::DialectMismatch`].
    pub fn data_source<E: Entity>(&self) -> Result<DataSource> {
        if let Some(source) = self.sources.get(&TypeId::of::<E>()) {
            return Ok(source.value().clone());
        }

        let metadata = self.metadata::<E>()?;
        let entry = self
            .sources
            .entry(TypeId::of::<E>())
            .or_try_insert_with(|| self.resolve_source(&metadata))?;
        Ok(entry.value().clone())
    }

    fn resolve_source(&self, metadata: &EntityMetadata) -> Result<DataSource> {
        let reading = metadata.reading_connection();
        let writing = metadata.writing_connection();
        DataSource::new(
            metadata.entity(),
            (reading, self.config.dialect(reading)?),
            (writing, self.config.dialect(writing)?),
        )
    }

    /// CRUD templates for `E` in its data source's dialect.
    ///
    /// # Errors
    ///
    /// Returns a metadata or data source error.
    pub fn templates<E: Entity>(&self) -> Result<Arc<CrudTemplates>> {
        if let Some(templates) = self.templates.get(&TypeId::of::<E>()) {
            return Ok(Arc::clone(templates.value()));
        }

        let metadata = self.metadata::<E>()?;
        let source = self.data_source::<E>()?;
        let entry = self.templates.entry(TypeId::of::<E>()).or_insert_with(|| {
            tracing::debug!(
                entity = E::NAME,
                dialect = source.dialect().name(),
                "built CRUD templates"
            );
            Arc::new(CrudTemplates::build(&metadata, source.dialect().as_ref()))
        });
        Ok(Arc::clone(entry.value()))
    }

    /// SQL generator for `E`.
    ///
    /// # Errors
    ///
    /// Returns a metadata or data source error.
    pub fn generator<E: Entity>(&self) -> Result<Generator<E>> {
        let templates = self.templates::<E>()?;
        let metadata = self.metadata::<E>()?;
        let source = self.data_source::<E>()?;
        Ok(Generator::from_parts(metadata, templates, Arc::clone(source.dialect())))
    }

    /// Write repository for `E` running statements through `executor`.
    ///
    /// # Errors
    ///
    /// Returns a metadata or data source error.
    pub fn repository<E: Entity>(&self, executor: Arc<dyn Executor>) -> Result<Repository<E>> {
        Ok(Repository::new(self.generator::<E>()?, self.data_source::<E>()?, executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, SqlServer};

    crate::entity! {
        #[derive(Debug, Clone)]
        pub struct Invoice {
            pub id: i64,
            pub total: f64,
        }
    }

    fn config() -> RegistryConfig {
        RegistryConfig::new("main", Arc::new(MySql)).with_connection("reports", Arc::new(SqlServer))
    }

    #[test]
    fn metadata_is_resolved_once() {
        let registry = Registry::new(config());
        assert!(registry.find_metadata::<Invoice>().is_none());
        let first = registry.metadata::<Invoice>().unwrap();
        let second = registry.metadata::<Invoice>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.find_metadata::<Invoice>().is_some());
    }

    #[test]
    fn publishing_twice_fails() {
        let registry = Registry::new(config());
        registry.configure::<Invoice>(|b| b.auto_key("id")).unwrap();
        let err = registry.configure::<Invoice>(|b| b.key("id")).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered("Invoice")));
    }

    #[test]
    fn dialect_mismatch() {
        let registry = Registry::new(config());
        let err = registry
            .configure::<Invoice>(|b| b.key("id").reading_connection("reports"))
            .unwrap_err();
        assert!(matches!(err, Error::DialectMismatch { reading_dialect: "sqlserver", .. }));
        // nothing was published
        assert!(registry.find_metadata::<Invoice>().is_none());
    }

    #[test]
    fn unknown_connection() {
        let registry = Registry::new(config());
        let err = registry.configure::<Invoice>(|b| b.key("id").connection("nowhere")).unwrap_err();
        assert!(matches!(err, Error::UnknownConnection(name) if name == "nowhere"));
    }

    #[test]
    fn explicit_only_requires_publication() {
        let registry = Registry::new(config().explicit_only());
        let err = registry.metadata::<Invoice>().unwrap_err();
        assert!(matches!(err, Error::NoMetadata("Invoice")));
    }

    #[test]
    fn data_source_equality() {
        let a = DataSource::new("X", ("main", Arc::new(MySql)), ("main", Arc::new(MySql))).unwrap();
        let b = DataSource::new("Y", ("main", Arc::new(MySql)), ("main", Arc::new(MySql))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn options_into_config() {
        let options = RegistryOptions {
            naming_strategy: "pascal".to_string(),
            naming_case: "upper".to_string(),
            default_connection: "db".to_string(),
            default_dialect: "sqlserver".to_string(),
        };
        let config = options.into_config().unwrap();
        assert_eq!(config.default_connection(), "db");
        assert_eq!(config.dialect("db").unwrap().name(), "sqlserver");
        assert_eq!(config.naming().resolve("OrderLine"), "ORDERLINE");
    }
}
