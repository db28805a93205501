//! Ambient conventions applied to entities that have no explicit metadata.
//!
//! A convention pairs a predicate with a rule. Property conventions decide
//! keys, generated values, ignored fields and column names; type conventions
//! decide connection routing. The first matching convention wins.

use std::fmt;
use std::sync::Arc;

use crate::entity::Property;
use crate::error::Result;
use crate::metadata::EntityMetadata;

type PropertyMatcher = Arc<dyn Fn(&'static str, &Property) -> bool + Send + Sync>;
type TypeMatcher = Arc<dyn Fn(&'static str) -> bool + Send + Sync>;

/// Column rule applied to a matching property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRule {
    /// Mark as primary key.
    pub key: bool,
    /// Mark as database generated.
    pub auto_generated: bool,
    /// Exclude from statements.
    pub ignore: bool,
    /// Explicit column name.
    pub column: Option<String>,
}

impl ColumnRule {
    /// A primary key column.
    #[must_use]
    pub fn key() -> Self {
        Self {
            key: true,
            ..Self::default()
        }
    }

    /// A database-generated primary key column.
    #[must_use]
    pub fn auto_key() -> Self {
        Self {
            key: true,
            auto_generated: true,
            ..Self::default()
        }
    }

    /// A database-generated column.
    #[must_use]
    pub fn auto_generated() -> Self {
        Self {
            auto_generated: true,
            ..Self::default()
        }
    }

    /// An ignored property.
    #[must_use]
    pub fn ignored() -> Self {
        Self {
            ignore: true,
            ..Self::default()
        }
    }

    /// Sets an explicit column name.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }
}

/// Connection routing applied to a matching entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routing {
    /// Connection used for reads.
    pub reading: String,
    /// Connection used for writes.
    pub writing: String,
}

impl Routing {
    /// Same connection for reads and writes.
    #[must_use]
    pub fn single(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            reading: name.clone(),
            writing: name,
        }
    }

    /// Separate read and write connections.
    #[must_use]
    pub fn split(reading: impl Into<String>, writing: impl Into<String>) -> Self {
        Self {
            reading: reading.into(),
            writing: writing.into(),
        }
    }
}

/// Ordered property and type conventions.
#[derive(Clone, Default)]
pub struct Conventions {
    properties: Vec<(PropertyMatcher, ColumnRule)>,
    types: Vec<(TypeMatcher, Routing)>,
}

impl fmt::Debug for Conventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conventions")
            .field("properties", &self.properties.len())
            .field("types", &self.types.len())
            .finish()
    }
}

impl Conventions {
    /// No conventions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property convention. `matcher` receives the entity name and
    /// the property.
    #[must_use]
    pub fn property<F>(mut self, matcher: F, rule: ColumnRule) -> Self
    where
        F: Fn(&'static str, &Property) -> bool + Send + Sync + 'static,
    {
        self.properties.push((Arc::new(matcher), rule));
        self
    }

    /// Adds a type convention. `matcher` receives the entity name.
    #[must_use]
    pub fn entity<F>(mut self, matcher: F, routing: Routing) -> Self
    where
        F: Fn(&'static str) -> bool + Send + Sync + 'static,
    {
        self.types.push((Arc::new(matcher), routing));
        self
    }

    /// Convention marking properties named `id` (any case) as generated keys.
    #[must_use]
    pub fn id_is_auto_key(self) -> Self {
        self.property(
            |_, property| property.name.eq_ignore_ascii_case("id"),
            ColumnRule::auto_key(),
        )
    }

    /// Applies the first matching rule per property and per type.
    ///
    /// # Errors
    ///
    /// Returns an error when a rule marks an ignored property as key or the
    /// reverse.
    pub fn apply(&self, metadata: &mut EntityMetadata, properties: &[Property]) -> Result<()> {
        let entity = metadata.entity();

        for property in properties {
            let Some((_, rule)) =
                self.properties.iter().find(|(matcher, _)| matcher(entity, property))
            else {
                continue;
            };
            if rule.key {
                metadata.mark_key(property.name)?;
            }
            if rule.ignore {
                metadata.mark_ignored(property.name)?;
            }
            let field = metadata.field_mut(property.name)?;
            if rule.auto_generated {
                field.auto_generation = true;
            }
            if let Some(column) = &rule.column {
                field.name.clone_from(column);
            }
        }

        if let Some((_, routing)) = self.types.iter().find(|(matcher, _)| matcher(entity)) {
            metadata.set_connections(&routing.reading, &routing.writing);
        }
        Ok(())
    }
}
