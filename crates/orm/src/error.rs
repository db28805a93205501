//! Errors

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while compiling predicates, resolving metadata, or
/// generating SQL.
#[derive(Error, Debug)]
pub enum Error {
    // --- Compilation errors ---
    /// The predicate contains a node shape the compiler cannot lower.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// A resolved comparison value is not a supported scalar.
    #[error("unsupported constant type: {0}")]
    UnsupportedConstant(String),

    /// A call in value position takes arguments.
    #[error("unsupported call with {0} argument(s); only parameterless calls can be evaluated")]
    UnsupportedCall(usize),

    // --- Configuration errors ---
    /// No metadata can be resolved for the entity.
    #[error("no metadata can be resolved for entity `{0}`")]
    NoMetadata(&'static str),

    /// The reading and writing connections resolve to different dialects.
    #[error(
        "entity `{entity}` reads through `{reading}` ({reading_dialect}) \
         but writes through `{writing}` ({writing_dialect})"
    )]
    DialectMismatch {
        /// Entity name.
        entity: &'static str,
        /// Reading connection name.
        reading: String,
        /// Dialect of the reading connection.
        reading_dialect: &'static str,
        /// Writing connection name.
        writing: String,
        /// Dialect of the writing connection.
        writing_dialect: &'static str,
    },

    /// The entity has no primary key field.
    #[error("entity `{0}` has no primary key field")]
    MissingKey(&'static str),

    /// A key field was marked as ignored, or an ignored field as key.
    #[error("property `{property}` of entity `{entity}` cannot be both key and ignored")]
    IgnoredKey {
        /// Entity name.
        entity: &'static str,
        /// Offending property.
        property: String,
    },

    /// The builder referenced a property the entity does not declare.
    #[error("entity `{entity}` has no property `{property}`")]
    UnknownProperty {
        /// Entity name.
        entity: &'static str,
        /// Offending property.
        property: String,
    },

    /// A connection name has no configured dialect.
    #[error("no dialect configured for connection `{0}`")]
    UnknownConnection(String),

    /// Metadata for the entity was already published.
    #[error("metadata for entity `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    // --- Generation errors ---
    /// The select fragment does not split into exactly two parts around ` FROM `.
    #[error("malformed select fragment, expected exactly one \" FROM \": {0}")]
    MalformedSelect(String),

    /// An update or delete would run without a WHERE clause.
    #[error("{0} on `{1}` requires a non-empty filter")]
    EmptyFilter(&'static str, String),

    /// No fields were supplied for a partial update.
    #[error("no fields to update on `{0}`")]
    EmptyUpdate(String),

    /// A filter, sort or update refers to a field that is not mapped.
    #[error("table `{table}` has no mapped field `{field}`")]
    UnknownField {
        /// Table name.
        table: String,
        /// Offending field.
        field: String,
    },

    // --- Value errors ---
    /// A null value was paired with an operation other than equality.
    #[error("field `{field}` cannot be compared with null using {operation}")]
    NullValue {
        /// Offending field.
        field: String,
        /// Operation name.
        operation: &'static str,
    },

    /// A value could not be converted onto an entity field.
    #[error("cannot assign value to `{property}`: {reason}")]
    Assign {
        /// Target property.
        property: String,
        /// Conversion failure.
        reason: String,
    },

    // --- Collaborator errors ---
    /// The executor failed to run a generated statement.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}
