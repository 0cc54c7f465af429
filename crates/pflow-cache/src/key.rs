//! Cache keys: ordered sequences of primitive tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One primitive component of a [`QueryKey`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyToken {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Str(s) => write!(f, "{:?}", s),
            KeyToken::Int(i) => write!(f, "{}", i),
            KeyToken::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for KeyToken {
    fn from(value: &str) -> Self {
        KeyToken::Str(value.to_string())
    }
}

impl From<String> for KeyToken {
    fn from(value: String) -> Self {
        KeyToken::Str(value)
    }
}

impl From<i64> for KeyToken {
    fn from(value: i64) -> Self {
        KeyToken::Int(value)
    }
}

impl From<bool> for KeyToken {
    fn from(value: bool) -> Self {
        KeyToken::Bool(value)
    }
}

/// Identifies one logical remote query, e.g. `["workorders"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryKey(Vec<KeyToken>);

impl QueryKey {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<KeyToken>,
    {
        Self(tokens.into_iter().map(Into::into).collect())
    }

    /// Appends a token, e.g. `["workorders"] -> ["workorders", "w1"]`
    pub fn with(mut self, token: impl Into<KeyToken>) -> Self {
        self.0.push(token.into());
        self
    }

    pub fn tokens(&self) -> &[KeyToken] {
        &self.0
    }

    /// Prefix match used by invalidation. Every key starts with itself.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", token)?;
        }
        write!(f, "]")
    }
}
