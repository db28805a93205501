//! Scalar values bound as statement parameters.

use sea_query::Value;

use crate::entity::ScalarKind;
use crate::error::{Error, Result};

/// The value side of a field predicate or parameter binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A single scalar, possibly null.
    Scalar(Value),
    /// A collection bound as one parameter (used by `IN`).
    List(Vec<Value>),
}

impl Argument {
    /// Returns `true` for a null scalar.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Self::Scalar(value) => is_null(value),
            Self::List(_) => false,
        }
    }

    /// Checks every contained value is a supported scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedConstant`] naming the first composite value.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::Scalar(value) => check_scalar(value),
            Self::List(values) => values.iter().try_for_each(check_scalar),
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<Value>> for Argument {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

/// Rejects values that are not plain scalars (JSON, bytes, arrays, ...).
///
/// # Errors
///
/// Returns [`Error::UnsupportedConstant`] with the value's variant.
pub fn check_scalar(value: &Value) -> Result<()> {
    match value {
        Value::Bool(_)
        | Value::TinyInt(_)
        | Value::SmallInt(_)
        | Value::Int(_)
        | Value::BigInt(_)
        | Value::TinyUnsigned(_)
        | Value::SmallUnsigned(_)
        | Value::Unsigned(_)
        | Value::BigUnsigned(_)
        | Value::Float(_)
        | Value::Double(_)
        | Value::String(_)
        | Value::Char(_)
        | Value::ChronoDate(_)
        | Value::ChronoTime(_)
        | Value::ChronoDateTime(_)
        | Value::ChronoDateTimeUtc(_)
        | Value::Uuid(_) => Ok(()),
        other => Err(Error::UnsupportedConstant(format!("{other:?}"))),
    }
}

/// Returns `true` when the value is the null form of its variant.
#[must_use]
pub const fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::Uuid(None)
    )
}

/// Converts a generated id into the integer variant matching `kind`.
///
/// # Errors
///
/// Returns [`Error::Assign`] when the value is not an integer or does not fit.
pub fn coerce_integer(value: Value, kind: ScalarKind, property: &str) -> Result<Value> {
    let assign = |reason: String| Error::Assign {
        property: property.to_string(),
        reason,
    };

    let wide: i128 = match value {
        Value::TinyInt(Some(v)) => v.into(),
        Value::SmallInt(Some(v)) => v.into(),
        Value::Int(Some(v)) => v.into(),
        Value::BigInt(Some(v)) => v.into(),
        Value::TinyUnsigned(Some(v)) => v.into(),
        Value::SmallUnsigned(Some(v)) => v.into(),
        Value::Unsigned(Some(v)) => v.into(),
        Value::BigUnsigned(Some(v)) => v.into(),
        Value::String(Some(raw)) => {
            raw.parse().map_err(|_e| assign(format!("`{raw}` is not an integer")))?
        }
        other => return Err(assign(format!("expected an integer id, got {other:?}"))),
    };

    let out_of_range = || assign(format!("{wide} does not fit {kind:?}"));
    let value = match kind {
        ScalarKind::I8 => Value::TinyInt(Some(i8::try_from(wide).map_err(|_e| out_of_range())?)),
        ScalarKind::I16 => {
            Value::SmallInt(Some(i16::try_from(wide).map_err(|_e| out_of_range())?))
        }
        ScalarKind::I32 => Value::Int(Some(i32::try_from(wide).map_err(|_e| out_of_range())?)),
        ScalarKind::I64 => Value::BigInt(Some(i64::try_from(wide).map_err(|_e| out_of_range())?)),
        ScalarKind::U8 => {
            Value::TinyUnsigned(Some(u8::try_from(wide).map_err(|_e| out_of_range())?))
        }
        ScalarKind::U16 => {
            Value::SmallUnsigned(Some(u16::try_from(wide).map_err(|_e| out_of_range())?))
        }
        ScalarKind::U32 => {
            Value::Unsigned(Some(u32::try_from(wide).map_err(|_e| out_of_range())?))
        }
        ScalarKind::U64 => {
            Value::BigUnsigned(Some(u64::try_from(wide).map_err(|_e| out_of_range())?))
        }
        other => return Err(assign(format!("{other:?} is not an integer kind"))),
    };
    Ok(value)
}
