//! Table and column naming policy.

use std::str::FromStr;

use anyhow::bail;

/// How identifiers are split into words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NamingStrategy {
    /// Identifiers are used as written.
    PascalCase,
    /// `_` is inserted where an uppercase letter follows a lowercase one.
    #[default]
    Underline,
}

/// Capitalization applied after word splitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Capitalization {
    /// `user_name`
    #[default]
    LowerCase,
    /// `USER_NAME`
    UpperCase,
    /// Leave letters untouched.
    Original,
}

/// Resolves entity and property identifiers to table and column names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NamingPolicy {
    /// Word-splitting strategy.
    pub strategy: NamingStrategy,
    /// Capitalization rule.
    pub case: Capitalization,
}

impl NamingPolicy {
    /// Creates a policy from its two axes.
    #[must_use]
    pub const fn new(strategy: NamingStrategy, case: Capitalization) -> Self {
        Self { strategy, case }
    }

    /// Resolves an identifier under this policy.
    ///
    /// ```
    /// use strata_orm::{Capitalization, NamingPolicy, NamingStrategy};
    ///
    /// let policy = NamingPolicy::new(NamingStrategy::Underline, Capitalization::LowerCase);
    /// assert_eq!(policy.resolve("UserName"), "user_name");
    /// ```
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> String {
        let split = match self.strategy {
            NamingStrategy::PascalCase => identifier.to_string(),
            NamingStrategy::Underline => underline(identifier),
        };
        match self.case {
            Capitalization::LowerCase => split.to_lowercase(),
            Capitalization::UpperCase => split.to_uppercase(),
            Capitalization::Original => split,
        }
    }
}

// Acronym runs stay together: `UserID` -> `User_ID`, `HTTPServer` -> `HTTPServer`.
fn underline(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 4);
    let mut prev_lower = false;
    for ch in identifier.chars() {
        if ch.is_uppercase() && prev_lower && !out.ends_with('_') {
            out.push('_');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.push(ch);
    }
    out
}

impl FromStr for NamingStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pascal" | "pascalcase" => Ok(Self::PascalCase),
            "underline" | "snake" => Ok(Self::Underline),
            other => bail!("unknown naming strategy `{other}`"),
        }
    }
}

impl FromStr for Capitalization {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lower" | "lowercase" => Ok(Self::LowerCase),
            "upper" | "uppercase" => Ok(Self::UpperCase),
            "original" => Ok(Self::Original),
            other => bail!("unknown capitalization `{other}`"),
        }
    }
}
