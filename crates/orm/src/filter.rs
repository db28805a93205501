//! Filter AST consumed by the SQL generator.

use std::fmt;
use std::sync::Arc;

use sea_query::Value;

use crate::value::Argument;

/// Comparison applied by a [`FieldPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// column = value
    Equal,
    /// column <> value
    NotEqual,
    /// column > value
    Greater,
    /// column >= value
    GreaterOrEqual,
    /// column < value
    Less,
    /// column <= value
    LessOrEqual,
    /// column IN (values)
    In,
}

impl Operation {
    /// SQL operator symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::In => "IN",
        }
    }

    /// Variant name, used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Greater => "Greater",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::Less => "Less",
            Self::LessOrEqual => "LessOrEqual",
            Self::In => "In",
        }
    }
}

/// Connective joining predicates or sub-filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BooleanClause {
    /// All must hold.
    #[default]
    And,
    /// At least one must hold.
    Or,
}

impl BooleanClause {
    /// SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for BooleanClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One `field <op> value` comparison.
///
/// Two predicates are equal when their field names match ignoring case and
/// their operation and value match.
#[derive(Debug, Clone)]
pub struct FieldPredicate {
    field_name: String,
    operation: Operation,
    value: Argument,
}

impl FieldPredicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(field_name: impl Into<String>, operation: Operation, value: Argument) -> Self {
        Self {
            field_name: field_name.into(),
            operation,
            value,
        }
    }

    /// Property name the predicate refers to.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Comparison operation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Compared value.
    #[must_use]
    pub const fn value(&self) -> &Argument {
        &self.value
    }
}

impl PartialEq for FieldPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.field_name.eq_ignore_ascii_case(&other.field_name)
            && self.operation == other.operation
            && self.value == other.value
    }
}

/// A set of predicates combined by one clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SingleQueryFilter {
    predicates: Vec<FieldPredicate>,
    clause: BooleanClause,
}

impl SingleQueryFilter {
    /// Creates an empty filter whose predicates are joined by `clause`.
    #[must_use]
    pub const fn new(clause: BooleanClause) -> Self {
        Self {
            predicates: Vec::new(),
            clause,
        }
    }

    /// Creates an empty `AND` filter.
    #[must_use]
    pub const fn and() -> Self {
        Self::new(BooleanClause::And)
    }

    /// Creates an empty `OR` filter.
    #[must_use]
    pub const fn or() -> Self {
        Self::new(BooleanClause::Or)
    }

    /// Adds a predicate. Duplicates collapse into one.
    #[must_use]
    pub fn with(mut self, predicate: FieldPredicate) -> Self {
        if !self.predicates.contains(&predicate) {
            self.predicates.push(predicate);
        }
        self
    }

    /// Adds `field = value`.
    #[must_use]
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(field, Operation::Equal, Argument::Scalar(value.into())))
    }

    /// Adds `field <> value`.
    #[must_use]
    pub fn ne(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(field, Operation::NotEqual, Argument::Scalar(value.into())))
    }

    /// Adds `field > value`.
    #[must_use]
    pub fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(field, Operation::Greater, Argument::Scalar(value.into())))
    }

    /// Adds `field >= value`.
    #[must_use]
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(
            field,
            Operation::GreaterOrEqual,
            Argument::Scalar(value.into()),
        ))
    }

    /// Adds `field < value`.
    #[must_use]
    pub fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(field, Operation::Less, Argument::Scalar(value.into())))
    }

    /// Adds `field <= value`.
    #[must_use]
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(FieldPredicate::new(
            field,
            Operation::LessOrEqual,
            Argument::Scalar(value.into()),
        ))
    }

    /// Adds `field IN (values)`.
    #[must_use]
    pub fn r#in(
        self, field: impl Into<String>, values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(FieldPredicate::new(field, Operation::In, Argument::List(values)))
    }

    /// Predicates in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[FieldPredicate] {
        &self.predicates
    }

    /// Clause joining the predicates.
    #[must_use]
    pub const fn clause(&self) -> BooleanClause {
        self.clause
    }

    /// Returns `true` when the filter holds no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// `(filter1) <clause> (filter2)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedQueryFilter {
    left: Arc<QueryFilter>,
    right: Arc<QueryFilter>,
    clause: BooleanClause,
}

impl CombinedQueryFilter {
    /// Combines two filters.
    #[must_use]
    pub fn new(
        left: impl Into<Arc<QueryFilter>>, right: impl Into<Arc<QueryFilter>>,
        clause: BooleanClause,
    ) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            clause,
        }
    }

    /// Left operand.
    #[must_use]
    pub fn left(&self) -> &QueryFilter {
        &self.left
    }

    /// Right operand.
    #[must_use]
    pub fn right(&self) -> &QueryFilter {
        &self.right
    }

    /// Clause joining the operands.
    #[must_use]
    pub const fn clause(&self) -> BooleanClause {
        self.clause
    }
}

/// Filter AST produced by the predicate compiler and consumed by the
/// generator. Immutable once built; composition wraps existing nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    /// Flat predicate set.
    Single(SingleQueryFilter),
    /// Binary combination of two filters.
    Combined(CombinedQueryFilter),
}

impl QueryFilter {
    /// A filter matching every row.
    #[must_use]
    pub const fn all() -> Self {
        Self::Single(SingleQueryFilter::and())
    }

    /// `(self) AND (other)`.
    #[must_use]
    pub fn combine_and(self, other: impl Into<Arc<Self>>) -> Self {
        Self::Combined(CombinedQueryFilter::new(self, other, BooleanClause::And))
    }

    /// `(self) OR (other)`.
    #[must_use]
    pub fn combine_or(self, other: impl Into<Arc<Self>>) -> Self {
        Self::Combined(CombinedQueryFilter::new(self, other, BooleanClause::Or))
    }

    /// Returns `true` when no predicate exists anywhere in the tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(single) => single.is_empty(),
            Self::Combined(combined) => combined.left.is_empty() && combined.right.is_empty(),
        }
    }
}

impl From<SingleQueryFilter> for QueryFilter {
    fn from(filter: SingleQueryFilter) -> Self {
        Self::Single(filter)
    }
}

impl From<CombinedQueryFilter> for QueryFilter {
    fn from(filter: CombinedQueryFilter) -> Self {
        Self::Combined(filter)
    }
}

impl From<SingleQueryFilter> for Arc<QueryFilter> {
    fn from(filter: SingleQueryFilter) -> Self {
        Self::new(QueryFilter::Single(filter))
    }
}
