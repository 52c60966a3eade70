use std::fmt;

/// Result alias that carries the custom [`ShizuError`] type.
pub type Result<T> = std::result::Result<T, ShizuError>;

/// The two kinds of record kept in the ledger and referenced by a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dj,
    Promo,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Dj => f.write_str("DJ"),
            EntryKind::Promo => f.write_str("promo"),
        }
    }
}

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShizuError {
    /// Lookup or removal of a name that is not present.
    #[error("{kind} `{name}` not found")]
    NotFound { kind: EntryKind, name: String },
    /// Insertion of a name that is already taken.
    #[error("{kind} `{name}` already exists")]
    AlreadyExists { kind: EntryKind, name: String },
    /// Reorder index outside the current list.
    #[error("index {index} is out of range for {len} entries")]
    OutOfRange { index: usize, len: usize },
    /// A lineup entry whose ledger record has since been removed.
    #[error("lineup {kind} `{name}` is no longer in the ledger")]
    StaleReference { kind: EntryKind, name: String },
    #[error("{kind} name must not be empty")]
    EmptyName { kind: EntryKind },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl ShizuError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn not_found(kind: EntryKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn already_exists(kind: EntryKind, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    /// Returns true for the error kinds that mean "the name is not there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StaleReference { .. })
    }
}

impl From<&str> for ShizuError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShizuError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entry() {
        let err = ShizuError::not_found(EntryKind::Dj, "alice");
        assert_eq!(err.to_string(), "DJ `alice` not found");

        let err = ShizuError::StaleReference {
            kind: EntryKind::Promo,
            name: "ad1".into(),
        };
        assert_eq!(err.to_string(), "lineup promo `ad1` is no longer in the ledger");
        assert!(err.is_not_found());
    }
}
