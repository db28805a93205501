//! Generated statements and their named parameters.

use sea_query::Value;

use crate::value::Argument;

/// Named parameters in binding order.
///
/// Dynamic fragments draw names from [`Params::add`] (`p0`, `p1`, ...), so
/// several fragments generated against the same collection never collide.
/// Templates bind by property name through [`Params::bind`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Argument)>,
    next: usize,
}

impl Params {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value under the next generated name and returns that name.
    pub fn add(&mut self, value: impl Into<Argument>) -> String {
        let name = format!("p{}", self.next);
        self.next += 1;
        self.entries.push((name.clone(), value.into()));
        name
    }

    /// Binds a value under an explicit name. A repeated name replaces the
    /// earlier value.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Argument>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Value bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Argument> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, value)| value)
    }

    /// Scalar value bound under `name`.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Argument::Scalar(value) => Some(value),
            Argument::List(_) => None,
        }
    }

    /// Parameter names in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, value)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Argument)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// SQL text and the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    /// Parameterized SQL.
    pub sql: String,
    /// Parameters referenced by `sql`.
    pub params: Params,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Creates a statement without parameters.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Params::new())
    }
}
