// ⚠️ Taxonomy Errors - validation failures raised while assembling the model
// or starting a selection session

use crate::taxonomy::ClassificationKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    /// Empty name/key, mis-bound owner, or an unrecognized selection mode
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: &'static str, message: String },

    /// A sibling with the same key is already registered
    #[error("{kind} `{key}` is already registered")]
    DuplicateKey { kind: ClassificationKind, key: String },

    /// The POI type is listed by another filter
    #[error("POI type `{type_key}` already belongs to filter `{filter_key}`")]
    TypeAlreadyAssigned { type_key: String, filter_key: String },

    #[error("unknown {kind} `{key}`")]
    NotFound { kind: ClassificationKind, key: String },
}

impl TaxonomyError {
    pub fn invalid_argument(field: &'static str, message: impl Into<String>) -> Self {
        TaxonomyError::InvalidArgument {
            field,
            message: message.into(),
        }
    }

    pub fn duplicate(kind: ClassificationKind, key: impl Into<String>) -> Self {
        TaxonomyError::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    pub fn already_assigned(type_key: impl Into<String>, filter_key: impl Into<String>) -> Self {
        TaxonomyError::TypeAlreadyAssigned {
            type_key: type_key.into(),
            filter_key: filter_key.into(),
        }
    }

    pub fn not_found(kind: ClassificationKind, key: impl Into<String>) -> Self {
        TaxonomyError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TaxonomyError::InvalidArgument { .. })
    }
}
