// 📍 POI Type - leaf of the taxonomy, the tag actually written to a feature

use super::base::{BaseInfo, Classification, ClassificationKind};
use crate::error::TaxonomyError;
use serde::Serialize;
use std::fmt;

// ============================================================================
// OSM TAG
// ============================================================================

/// `key=value` pair written back to the edited map feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OsmTag {
    pub key: String,
    pub value: String,
}

impl OsmTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, TaxonomyError> {
        let key = key.into();
        let value = value.into();

        if key.trim().is_empty() {
            return Err(TaxonomyError::invalid_argument("tag", "must not be empty"));
        }
        if value.trim().is_empty() {
            return Err(TaxonomyError::invalid_argument("value", "must not be empty"));
        }

        Ok(OsmTag { key, value })
    }
}

impl fmt::Display for OsmTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

// ============================================================================
// POI TYPE
// ============================================================================

/// Leaf classification (e.g., "restaurant", "cafe")
///
/// Shared read-only between the taxonomy and selection snapshots via `Arc`;
/// membership in a filter's list is owned by that filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoiType {
    #[serde(flatten)]
    base: BaseInfo,

    /// Semantic tag, absent for purely descriptive entries
    tag: Option<OsmTag>,

    /// Whether the type may be assigned while editing a feature
    editable: bool,
}

impl PoiType {
    /// Create an editable type without an OSM tag
    pub fn new(name: impl Into<String>) -> Result<Self, TaxonomyError> {
        Ok(PoiType {
            base: BaseInfo::new(name)?,
            tag: None,
            editable: true,
        })
    }

    /// Create an editable type carrying `tag=value`
    pub fn with_tag(
        name: impl Into<String>,
        tag: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, TaxonomyError> {
        let mut poi_type = Self::new(name)?;
        poi_type.tag = Some(OsmTag::new(tag, value)?);
        Ok(poi_type)
    }

    /// Build from prepared metadata (used by the catalog loader)
    pub fn from_parts(base: BaseInfo, tag: Option<OsmTag>, editable: bool) -> Self {
        PoiType { base, tag, editable }
    }

    pub fn localized(mut self, localized_name: impl Into<String>) -> Self {
        self.base = self.base.localized(localized_name);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.base = self.base.with_icon(icon);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn tag(&self) -> Option<&OsmTag> {
        self.tag.as_ref()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }
}

impl Classification for PoiType {
    fn base(&self) -> &BaseInfo {
        &self.base
    }

    fn kind(&self) -> ClassificationKind {
        ClassificationKind::PoiType
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poi_type_creation() {
        let cafe = PoiType::new("cafe").unwrap();

        assert_eq!(cafe.key(), "cafe");
        assert_eq!(cafe.kind(), ClassificationKind::PoiType);
        assert!(cafe.tag().is_none());
        assert!(cafe.is_editable());
    }

    #[test]
    fn test_poi_type_with_tag() {
        let cafe = PoiType::with_tag("cafe", "amenity", "cafe")
            .unwrap()
            .localized("Café")
            .with_icon("☕");

        assert_eq!(cafe.tag().unwrap().to_string(), "amenity=cafe");
        assert_eq!(cafe.display_name(), "Café");
        assert_eq!(cafe.icon(), Some("☕"));
    }

    #[test]
    fn test_poi_type_rejects_empty_values() {
        assert!(PoiType::new("").unwrap_err().is_invalid_argument());
        assert!(PoiType::with_tag("cafe", "", "cafe").unwrap_err().is_invalid_argument());
        assert!(PoiType::with_tag("cafe", "amenity", " ").unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_read_only_type() {
        let ruins = PoiType::with_tag("ruins", "historic", "ruins").unwrap().read_only();
        assert!(!ruins.is_editable());
    }
}
