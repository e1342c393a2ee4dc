// 🏷️ Classification Base - identity + display metadata shared by every node
//
// "Key is IDENTITY (never changes), name and icon are how we show it"
//
// Categories, filters and POI types all embed a BaseInfo and expose it
// through the Classification trait.

use crate::error::TaxonomyError;
use serde::Serialize;
use std::fmt;

// ============================================================================
// CLASSIFICATION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKind {
    /// Top-level grouping (e.g., "Food", "Shop")
    Category,

    /// Named group of types inside one category (e.g., "Restaurants")
    Filter,

    /// Leaf, the assignable tag (e.g., "cafe")
    PoiType,
}

impl ClassificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationKind::Category => "category",
            ClassificationKind::Filter => "filter",
            ClassificationKind::PoiType => "POI type",
        }
    }
}

impl fmt::Display for ClassificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BASE INFO
// ============================================================================

/// Identity and display metadata of a classification node
///
/// Identity: `key` (immutable once built, no setter)
/// Values: name, localized name, icon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseInfo {
    key: String,
    name: String,
    localized_name: Option<String>,
    icon: Option<String>,
}

impl BaseInfo {
    /// Node whose key is its name (the usual shape of catalog entries)
    pub fn new(name: impl Into<String>) -> Result<Self, TaxonomyError> {
        let name = name.into();
        Self::with_key(name.clone(), name)
    }

    /// Node with an explicit stable key
    pub fn with_key(key: impl Into<String>, name: impl Into<String>) -> Result<Self, TaxonomyError> {
        let key = key.into();
        let name = name.into();

        if key.trim().is_empty() {
            return Err(TaxonomyError::invalid_argument("key", "must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(TaxonomyError::invalid_argument("name", "must not be empty"));
        }

        Ok(BaseInfo {
            key,
            name,
            localized_name: None,
            icon: None,
        })
    }

    pub fn localized(mut self, localized_name: impl Into<String>) -> Self {
        let localized_name = localized_name.into();
        self.localized_name = if localized_name.trim().is_empty() {
            None
        } else {
            Some(localized_name)
        };
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn localized_name(&self) -> Option<&str> {
        self.localized_name.as_deref()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }
}

// ============================================================================
// CLASSIFICATION TRAIT
// ============================================================================

/// Common view over categories, filters and POI types
pub trait Classification {
    fn base(&self) -> &BaseInfo;

    fn kind(&self) -> ClassificationKind;

    fn key(&self) -> &str {
        self.base().key()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    /// Localized name when the catalog has one, raw name otherwise
    fn display_name(&self) -> &str {
        self.base().localized_name().unwrap_or_else(|| self.base().name())
    }

    fn icon(&self) -> Option<&str> {
        self.base().icon()
    }

    /// Case-insensitive substring match over display name, name and key
    ///
    /// An empty (or blank) query matches everything.
    fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        [self.display_name(), self.name(), self.key()]
            .iter()
            .any(|candidate| candidate.to_lowercase().contains(&query))
    }
}
