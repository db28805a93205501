//! Predicate expressions and their compilation into a [`QueryFilter`].
//!
//! A predicate is a small expression tree over one entity: comparisons
//! between a field of the entity and a value, joined by boolean connectives.
//! Values may be literals, members of captured objects, or the result of a
//! parameterless call.
//!
//! ```
//! use strata_orm::field;
//!
//! let expr = field("age").gt(18).and(field("name").eq("bob"));
//! let filter = strata_orm::compile(&expr).unwrap();
//! assert!(!filter.is_empty());
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_query::Value;
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::filter::{
    BooleanClause, CombinedQueryFilter, FieldPredicate, Operation, QueryFilter, SingleQueryFilter,
};
use crate::value::{Argument, check_scalar};

/// An object captured by a predicate whose members can be read by name.
pub trait Captured: fmt::Debug + Send + Sync {
    /// Reads a member. `None` when the object has no such member.
    fn member(&self, name: &str) -> Option<Constant>;
}

/// A constant operand: a scalar or a captured object.
#[derive(Clone)]
pub enum Constant {
    /// Scalar value.
    Value(Value),
    /// Captured object.
    Object(Arc<dyn Captured>),
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
        }
    }
}

impl From<Value> for Constant {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<T> From<Option<T>> for Constant
where
    Option<T>: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Self::Value(value.into())
    }
}

/// A function evaluated while compiling.
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn() -> Constant + Send + Sync>);

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// Binary operators of the expression tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Eager `&`
    And,
    /// Short-circuit `&&`
    AndAlso,
    /// Eager `|`
    Or,
    /// Short-circuit `||`
    OrElse,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `+`
    Add,
    /// `-`
    Subtract,
}

impl BinaryOp {
    const fn clause(self) -> Option<BooleanClause> {
        match self {
            Self::And | Self::AndAlso => Some(BooleanClause::And),
            Self::Or | Self::OrElse => Some(BooleanClause::Or),
            _ => None,
        }
    }

    const fn operation(self) -> Option<Operation> {
        match self {
            Self::Equal => Some(Operation::Equal),
            Self::NotEqual => Some(Operation::NotEqual),
            Self::GreaterThan => Some(Operation::Greater),
            Self::GreaterThanOrEqual => Some(Operation::GreaterOrEqual),
            Self::LessThan => Some(Operation::Less),
            Self::LessThanOrEqual => Some(Operation::LessOrEqual),
            _ => None,
        }
    }
}

/// Predicate expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// The entity the predicate is evaluated against.
    Parameter,
    /// `target.name`
    Member {
        /// Expression the member is read from.
        target: Box<Expr>,
        /// Member name.
        name: String,
    },
    /// Literal or captured object.
    Constant(Constant),
    /// Function call.
    Call {
        /// Function to invoke.
        function: Callable,
        /// Call arguments.
        arguments: Vec<Expr>,
    },
    /// `left <op> right`
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// `!operand`
    Not(Box<Expr>),
}

/// `entity.name`
#[must_use]
pub fn field(name: impl Into<String>) -> Expr {
    Expr::Parameter.member(name)
}

impl Expr {
    /// A literal value.
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Constant(Constant::Value(value.into()))
    }

    /// A captured object.
    #[must_use]
    pub fn captured(object: Arc<dyn Captured>) -> Self {
        Self::Constant(Constant::Object(object))
    }

    /// A parameterless call evaluated during compilation.
    #[must_use]
    pub fn call<F, C>(function: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Into<Constant>,
    {
        Self::Call {
            function: Callable(Arc::new(move || function().into())),
            arguments: Vec::new(),
        }
    }

    /// A call with arguments. Compiling it fails; arguments are kept so the
    /// error can report them.
    #[must_use]
    pub fn call_with<F, C>(function: F, arguments: Vec<Self>) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Into<Constant>,
    {
        Self::Call {
            function: Callable(Arc::new(move || function().into())),
            arguments,
        }
    }

    /// `self.name`
    #[must_use]
    pub fn member(self, name: impl Into<String>) -> Self {
        Self::Member {
            target: Box::new(self),
            name: name.into(),
        }
    }

    fn binary(self, op: BinaryOp, right: impl IntoExpr) -> Self {
        Self::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right.into_expr()),
        }
    }

    /// `self == right`
    #[must_use]
    pub fn eq(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Equal, right)
    }

    /// `self != right`
    #[must_use]
    pub fn ne(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::NotEqual, right)
    }

    /// `self > right`
    #[must_use]
    pub fn gt(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::GreaterThan, right)
    }

    /// `self >= right`
    #[must_use]
    pub fn ge(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::GreaterThanOrEqual, right)
    }

    /// `self < right`
    #[must_use]
    pub fn lt(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::LessThan, right)
    }

    /// `self <= right`
    #[must_use]
    pub fn le(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::LessThanOrEqual, right)
    }

    /// `self + right`
    #[must_use]
    pub fn add(self, right: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Add, right)
    }

    /// `self && right`
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::AndAlso, right)
    }

    /// `self || right`
    #[must_use]
    pub fn or(self, right: Self) -> Self {
        self.binary(BinaryOp::OrElse, right)
    }

    /// `!self`
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    fn describe(&self) -> String {
        match self {
            Self::Parameter => "entity parameter".to_string(),
            Self::Member { name, .. } => format!("member access `{name}`"),
            Self::Constant(Constant::Value(value)) => format!("constant {value:?}"),
            Self::Constant(Constant::Object(_)) => "captured object".to_string(),
            Self::Call { arguments, .. } => format!("call with {} argument(s)", arguments.len()),
            Self::Binary { op, .. } => format!("binary {op:?}"),
            Self::Not(_) => "negation".to_string(),
        }
    }
}

/// Conversion into an operand of a comparison.
pub trait IntoExpr {
    /// Converts `self` into an expression.
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Value {
    fn into_expr(self) -> Expr {
        Expr::Constant(Constant::Value(self))
    }
}

impl<T> IntoExpr for Option<T>
where
    Self: Into<Value>,
{
    fn into_expr(self) -> Expr {
        Expr::value(self)
    }
}

macro_rules! scalar_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    Expr::value(self)
                }
            }

            impl From<$ty> for Constant {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

scalar_operand!(
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String, &str, NaiveDate,
    NaiveTime, NaiveDateTime, DateTime<Utc>, Uuid,
);

/// A predicate typed to one entity.
pub struct Predicate<E: Entity> {
    body: Expr,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Predicate<E> {
    /// Wraps an expression body.
    #[must_use]
    pub const fn new(body: Expr) -> Self {
        Self {
            body,
            _marker: PhantomData,
        }
    }

    /// The expression body.
    #[must_use]
    pub const fn body(&self) -> &Expr {
        &self.body
    }

    /// Compiles the predicate, checking every field is a property of `E`.
    ///
    /// # Errors
    ///
    /// Returns a compilation error for unsupported shapes or values, and
    /// [`Error::UnknownProperty`] for fields `E` does not declare.
    pub fn compile(&self) -> Result<QueryFilter> {
        let filter = compile(&self.body)?;
        check_fields::<E>(&filter)?;
        Ok(filter)
    }
}

impl<E: Entity> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("entity", &E::NAME).field("body", &self.body).finish()
    }
}

fn check_fields<E: Entity>(filter: &QueryFilter) -> Result<()> {
    match filter {
        QueryFilter::Single(single) => single.predicates().iter().try_for_each(|predicate| {
            let name = predicate.field_name();
            if E::properties().iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
                Ok(())
            } else {
                Err(Error::UnknownProperty {
                    entity: E::NAME,
                    property: predicate.field_name().to_string(),
                })
            }
        }),
        QueryFilter::Combined(combined) => {
            check_fields::<E>(combined.left())?;
            check_fields::<E>(combined.right())
        }
    }
}

/// Lowers a predicate expression into a filter AST.
///
/// # Errors
///
/// Fails on the first unsupported node; no partial filter is returned.
pub fn compile(expr: &Expr) -> Result<QueryFilter> {
    match expr {
        Expr::Binary { op, left, right } => {
            if let Some(clause) = op.clause() {
                let left = compile(left)?;
                let right = compile(right)?;
                return Ok(CombinedQueryFilter::new(left, right, clause).into());
            }
            if let Some(operation) = op.operation() {
                let field_name = Visitor::default().field_name(left)?;
                let value = Visitor::default().value(right)?;
                let predicate = FieldPredicate::new(field_name, operation, Argument::Scalar(value));
                return Ok(SingleQueryFilter::and().with(predicate).into());
            }
            Err(Error::UnsupportedExpression(expr.describe()))
        }
        other => Err(Error::UnsupportedExpression(other.describe())),
    }
}

// Scratch state for one sub-expression. `member` is the member name waiting
// to be read off whatever the next node evaluates to.
#[derive(Default)]
struct Visitor {
    member: Option<String>,
}

impl Visitor {
    fn pending(name: &str) -> Self {
        Self {
            member: Some(name.to_string()),
        }
    }

    fn field_name(self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::Member { target, name } if matches!(**target, Expr::Parameter) => {
                Ok(name.clone())
            }
            other => Err(Error::UnsupportedExpression(format!(
                "{} where a field of the entity was expected",
                other.describe()
            ))),
        }
    }

    fn value(self, expr: &Expr) -> Result<Value> {
        match self.evaluate(expr)? {
            Constant::Value(value) => {
                check_scalar(&value)?;
                Ok(value)
            }
            Constant::Object(object) => Err(Error::UnsupportedConstant(format!("{object:?}"))),
        }
    }

    fn evaluate(mut self, expr: &Expr) -> Result<Constant> {
        let constant = match expr {
            Expr::Constant(constant) => constant.clone(),
            Expr::Member { target, name } => {
                if matches!(**target, Expr::Parameter) {
                    return Err(Error::UnsupportedExpression(format!(
                        "field `{name}` where a value was expected"
                    )));
                }
                Self::pending(name).evaluate(target)?
            }
            Expr::Call { function, arguments } => {
                if !arguments.is_empty() {
                    return Err(Error::UnsupportedCall(arguments.len()));
                }
                (function.0)()
            }
            other => return Err(Error::UnsupportedExpression(other.describe())),
        };

        match self.member.take() {
            Some(name) => read_member(&constant, &name),
            None => Ok(constant),
        }
    }
}

fn read_member(owner: &Constant, name: &str) -> Result<Constant> {
    match owner {
        Constant::Object(object) => object.member(name).ok_or_else(|| {
            Error::UnsupportedExpression(format!("captured object has no member `{name}`"))
        }),
        Constant::Value(value) => {
            Err(Error::UnsupportedExpression(format!("member `{name}` read from {value:?}")))
        }
    }
}
