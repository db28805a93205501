//! Dynamic SQL fragments.
//!
//! A [`Generator`] renders filters, assignments, sorts and pages for one
//! entity type in one dialect. Fragments share a caller-owned [`Params`], so
//! parameter names stay unique across everything that goes into a statement.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use sea_query::{Order, Value};

use crate::dialect::Dialect;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::filter::{Operation, QueryFilter, SingleQueryFilter};
use crate::metadata::{EntityMetadata, FieldMetadata};
use crate::query::{Params, Statement};
use crate::templates::CrudTemplates;
use crate::value::{Argument, check_scalar};

/// Sort columns in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortOptions {
    entries: Vec<(String, Order)>,
}

impl SortOptions {
    /// No sorting.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an ascending sort on `field`.
    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.then(field, Order::Asc)
    }

    /// Appends a descending sort on `field`.
    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.then(field, Order::Desc)
    }

    /// Appends a sort on `field`.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, order: Order) -> Self {
        self.entries.push((field.into(), order));
        self
    }

    /// `(field, order)` pairs in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[(String, Order)] {
        &self.entries
    }

    /// Returns `true` when no sort was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SQL generation for entity `E`.
pub struct Generator<E: Entity> {
    metadata: Arc<EntityMetadata>,
    templates: Arc<CrudTemplates>,
    dialect: Arc<dyn Dialect>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Generator<E> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            templates: Arc::clone(&self.templates),
            dialect: Arc::clone(&self.dialect),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity> fmt::Debug for Generator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("entity", &E::NAME)
            .field("table", &self.metadata.table_name())
            .field("dialect", &self.dialect.name())
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Generator<E> {
    /// Creates a generator, building the CRUD templates.
    #[must_use]
    pub fn new(metadata: Arc<EntityMetadata>, dialect: Arc<dyn Dialect>) -> Self {
        let templates = Arc::new(CrudTemplates::build(&metadata, dialect.as_ref()));
        Self::from_parts(metadata, templates, dialect)
    }

    pub(crate) const fn from_parts(
        metadata: Arc<EntityMetadata>, templates: Arc<CrudTemplates>, dialect: Arc<dyn Dialect>,
    ) -> Self {
        Self {
            metadata,
            templates,
            dialect,
            _marker: PhantomData,
        }
    }

    /// Entity metadata.
    #[must_use]
    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    /// CRUD templates.
    #[must_use]
    pub fn templates(&self) -> &CrudTemplates {
        &self.templates
    }

    /// Dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Mapped field for `name`.
    pub(crate) fn field(&self, name: &str) -> Result<&FieldMetadata> {
        self.metadata.field(name).ok_or_else(|| Error::UnknownField {
            table: self.metadata.table_name().to_string(),
            field: name.to_string(),
        })
    }

    pub(crate) fn column(&self, name: &str) -> Result<String> {
        Ok(self.dialect.quote_identifier(&self.field(name)?.name))
    }

    /// Renders a filter as a WHERE condition (without the keyword). An
    /// empty filter renders as an empty string.
    ///
    /// # Errors
    ///
    /// Returns an error when a predicate names an unmapped field, holds an
    /// unsupported value, or compares null with anything but equality.
    pub fn filter(&self, filter: &QueryFilter, params: &mut Params) -> Result<String> {
        match filter {
            QueryFilter::Single(single) => self.single(single, params),
            QueryFilter::Combined(combined) => {
                let left = self.filter(combined.left(), params)?;
                let right = self.filter(combined.right(), params)?;
                Ok(match (left.is_empty(), right.is_empty()) {
                    (true, _) => right,
                    (_, true) => left,
                    _ => format!("({left}) {} ({right})", combined.clause()),
                })
            }
        }
    }

    fn single(&self, filter: &SingleQueryFilter, params: &mut Params) -> Result<String> {
        let mut parts = Vec::with_capacity(filter.predicates().len());

        for predicate in filter.predicates() {
            let column = self.column(predicate.field_name())?;
            let value = predicate.value();
            value.check()?;
            check_shape(predicate.field_name(), predicate.operation(), value)?;

            if value.is_null() {
                let test = match predicate.operation() {
                    Operation::Equal => "IS NULL",
                    Operation::NotEqual => "IS NOT NULL",
                    operation => {
                        return Err(Error::NullValue {
                            field: predicate.field_name().to_string(),
                            operation: operation.name(),
                        });
                    }
                };
                parts.push(format!("{column} {test}"));
                continue;
            }

            let name = params.add(value.clone());
            parts.push(format!(
                "{column} {} {}",
                predicate.operation().symbol(),
                self.dialect.parameter(&name)
            ));
        }

        Ok(parts.join(&format!(" {} ", filter.clause())))
    }

    /// Renders `col = @pN` assignments (without the `SET` keyword).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyUpdate`] for no pairs, [`Error::UnknownField`]
    /// for unmapped fields and [`Error::UnsupportedConstant`] for composite
    /// values.
    pub fn set(&self, pairs: &[(&str, Value)], params: &mut Params) -> Result<String> {
        if pairs.is_empty() {
            return Err(Error::EmptyUpdate(self.metadata.table_name().to_string()));
        }

        let mut assignments = Vec::with_capacity(pairs.len());
        for (field, value) in pairs {
            let column = self.column(field)?;
            check_scalar(value)?;
            let name = params.add(value.clone());
            assignments.push(format!("{column} = {}", self.dialect.parameter(&name)));
        }
        Ok(assignments.join(", "))
    }

    /// Renders `col IN @pN`; the parameter binds the whole list.
    ///
    /// # Errors
    ///
    /// Returns an error for unmapped fields or unsupported values.
    pub fn in_clause(
        &self, field: &str, values: impl IntoIterator<Item = impl Into<Value>>,
        params: &mut Params,
    ) -> Result<String> {
        let column = self.column(field)?;
        let argument = Argument::List(values.into_iter().map(Into::into).collect());
        argument.check()?;
        let name = params.add(argument);
        Ok(format!("{column} IN {}", self.dialect.parameter(&name)))
    }

    /// Renders `ORDER BY col asc, col2 desc`, or an empty string when
    /// `sort` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownField`] for unmapped fields and
    /// [`Error::UnsupportedExpression`] for value-list orderings.
    pub fn order_by(&self, sort: &SortOptions) -> Result<String> {
        if sort.is_empty() {
            return Ok(String::new());
        }

        let mut columns = Vec::with_capacity(sort.entries().len());
        for (field, order) in sort.entries() {
            let direction = match order {
                Order::Asc => "asc",
                Order::Desc => "desc",
                Order::Field(_) => {
                    return Err(Error::UnsupportedExpression(format!(
                        "ordering `{field}` by a value list"
                    )));
                }
            };
            columns.push(format!("{} {direction}", self.column(field)?));
        }
        Ok(format!("ORDER BY {}", columns.join(", ")))
    }

    /// Wraps `select` into one page of results using the dialect's
    /// pagination.
    ///
    /// # Errors
    ///
    /// Returns the dialect's error, e.g. [`Error::MalformedSelect`].
    pub fn paginate(
        &self, page_index: u64, page_size: u64, select: &str, order_by: &str,
        filter: Option<&str>,
    ) -> Result<String> {
        self.dialect.paginate(page_index, page_size, select, order_by, filter)
    }

    /// The key written back after an insert: present when the dialect can
    /// report the last insert id and exactly one key field is database
    /// generated and of integer kind.
    #[must_use]
    pub fn auto_increment_key(&self) -> Option<&FieldMetadata> {
        if !self.dialect.last_insert_id_supported() {
            return None;
        }
        let mut generated =
            self.metadata.keys().filter(|key| key.auto_generation && key.kind.is_integer());
        match (generated.next(), generated.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    /// Statement returning the last generated id.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<Statement> {
        self.dialect.last_insert_id().map(Statement::raw)
    }

    /// Binds `fields` from `values` under their property names.
    pub(crate) fn bind<'a>(
        params: &mut Params, values: &[(&'static str, Value)],
        fields: impl IntoIterator<Item = &'a FieldMetadata>,
    ) {
        for field in fields {
            if let Some((_, value)) =
                values.iter().find(|(property, _)| *property == field.property)
            {
                params.bind(field.property, value.clone());
            }
        }
    }
}

// `IN` takes a list; every other operation takes a scalar.
fn check_shape(field: &str, operation: Operation, value: &Argument) -> Result<()> {
    match (operation, value) {
        (Operation::In, Argument::List(_)) => Ok(()),
        (Operation::In, Argument::Scalar(scalar)) => Err(Error::UnsupportedConstant(format!(
            "`{field}` IN expects a list of values, got {scalar:?}"
        ))),
        (_, Argument::Scalar(_)) => Ok(()),
        (operation, Argument::List(_)) => Err(Error::UnsupportedConstant(format!(
            "`{field}` {} expects a single value, got a list",
            operation.name()
        ))),
    }
}
