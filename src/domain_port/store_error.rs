use std::fmt;

/// Columns the stores keep unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    TokenValue,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
            UniqueField::TokenValue => "token_value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate {0}")]
    Duplicate(UniqueField),
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<E: fmt::Display>(error: E) -> Self {
        StoreError::Backend(error.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }

    pub fn duplicate_field(&self) -> Option<UniqueField> {
        match self {
            StoreError::Duplicate(field) => Some(*field),
            _ => None,
        }
    }
}

/// Turns a `NotFound` lookup into `Ok(None)` and keeps every other error.
pub trait OptionalRecord<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalRecord<T> for Result<T, StoreError> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
