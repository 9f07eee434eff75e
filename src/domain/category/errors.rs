//! Category configuration errors.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Failure to load or trust the category configuration document.
///
/// Always fatal: a catalog that fails here must abort startup rather than be
/// tolerated at request time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The document could not be read.
    #[error("failed to read category document {path}: {message}")]
    Io { path: String, message: String },

    /// The document is not valid YAML or does not match the expected shape.
    #[error("failed to parse category document: {0}")]
    Parse(String),

    /// The document parsed but breaks structural invariants.
    #[error("invalid category configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl CatalogError {
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Structural violations, empty for I/O and parse failures.
    pub fn violations(&self) -> &[String] {
        match self {
            CatalogError::Invalid(v) => v,
            _ => &[],
        }
    }
}

impl From<CatalogError> for DomainError {
    fn from(err: CatalogError) -> Self {
        DomainError::new(ErrorCode::ConfigurationError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_violation() {
        let err = CatalogError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid category configuration: a; b");
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn maps_to_configuration_error_code() {
        let err: DomainError = CatalogError::Parse("bad".into()).into();
        assert_eq!(err.code, ErrorCode::ConfigurationError);
    }
}
