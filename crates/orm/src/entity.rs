//! Entity declaration: the `Entity` trait, scalar kinds and the `entity!` macro.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sea_query::Value;
use uuid::Uuid;

use crate::error::Result;

/// Scalar column kinds an entity property can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`
    Char,
    /// `String`
    String,
    /// `NaiveDate`
    Date,
    /// `NaiveTime`
    Time,
    /// `NaiveDateTime`
    DateTime,
    /// `DateTime<Utc>`
    DateTimeUtc,
    /// `Uuid`
    Uuid,
}

impl ScalarKind {
    /// Returns `true` for signed and unsigned integer kinds.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }
}

/// Implemented for every Rust type that maps onto a single column.
///
/// `Option<T>` is the nullable form of `T`.
pub trait Scalar {
    /// Column kind.
    const KIND: ScalarKind;

    /// Whether the column accepts null.
    const NULLABLE: bool = false;
}

macro_rules! scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;
            }
        )*
    };
}

scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeUtc,
    Uuid => Uuid,
}

impl<T: Scalar> Scalar for Option<T> {
    const KIND: ScalarKind = T::KIND;
    const NULLABLE: bool = true;
}

/// A property declared on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    /// Rust field name. Also the parameter name templates bind to.
    pub name: &'static str,
    /// Column kind.
    pub kind: ScalarKind,
    /// Whether the property is an `Option`.
    pub nullable: bool,
}

impl Property {
    #[doc(hidden)]
    #[must_use]
    pub const fn new(name: &'static str, kind: ScalarKind, nullable: bool) -> Self {
        Self { name, kind, nullable }
    }
}

/// Declares an ORM entity with automatic `Entity` trait implementation.
///
/// Every field must implement [`Scalar`].
///
/// # Examples
///
/// ```
/// strata_orm::entity! {
///     #[derive(Debug, Clone, Default)]
///     pub struct UserAccount {
///         pub id: i64,
///         pub user_name: String,
///         pub age: Option<i32>,
///     }
/// }
///
/// use strata_orm::Entity;
/// assert_eq!(UserAccount::NAME, "UserAccount");
/// assert_eq!(UserAccount::properties().len(), 3);
/// ```
#[macro_export]
macro_rules! entity {
    (
        $(#[$meta:meta])*
        pub struct $struct_name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field_name:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        #[allow(missing_docs)]
        $(#[$meta])*
        pub struct $struct_name {
            $(
                $(#[$field_meta])*
                pub $field_name : $field_type
            ),*
        }

        impl $crate::Entity for $struct_name {
            const NAME: &'static str = stringify!($struct_name);

            fn properties() -> &'static [$crate::Property] {
                const PROPERTIES: &[$crate::Property] = &[
                    $(
                        $crate::Property::new(
                            stringify!($field_name),
                            <$field_type as $crate::Scalar>::KIND,
                            <$field_type as $crate::Scalar>::NULLABLE,
                        ),
                    )*
                ];
                PROPERTIES
            }

            fn values(&self) -> Vec<(&'static str, $crate::__private::Value)> {
                vec![
                    $(
                        (stringify!($field_name), self.$field_name.clone().into()),
                    )*
                ]
            }

            fn set_value(
                &mut self, property: &str, value: $crate::__private::Value,
            ) -> $crate::Result<()> {
                $(
                    if property == stringify!($field_name) {
                        self.$field_name =
                            <$field_type as $crate::__private::ValueType>::try_from(value)
                                .map_err(|e| $crate::Error::Assign {
                                    property: property.to_string(),
                                    reason: e.to_string(),
                                })?;
                        return Ok(());
                    }
                )*
                Err($crate::Error::Assign {
                    property: property.to_string(),
                    reason: format!("`{}` has no such property", stringify!($struct_name)),
                })
            }
        }
    };
}

/// Trait for database entities.
///
/// Typically implemented via the `entity!` macro rather than manually.
pub trait Entity: Sized + Send + Sync + 'static {
    /// Type name; the default table name is derived from it.
    const NAME: &'static str;

    /// Declared properties, in declaration order.
    fn properties() -> &'static [Property];

    /// Current property values keyed by property name.
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Assigns a value to the named property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is unknown or the value does not
    /// convert to the property's type.
    fn set_value(&mut self, property: &str, value: Value) -> Result<()>;
}
