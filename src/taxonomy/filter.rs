// 🗂️ POI Filter - named, ordered group of POI types inside one category
//
// Insertion order IS display order, so the type list is a Vec with key-based
// membership checks rather than a set.

use super::base::{BaseInfo, Classification, ClassificationKind};
use super::category::PoiCategory;
use super::poi_type::PoiType;
use crate::error::TaxonomyError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct PoiFilter {
    #[serde(flatten)]
    base: BaseInfo,

    /// Key of the owning category, fixed at construction
    category: String,

    types: Vec<Arc<PoiType>>,
}

impl PoiFilter {
    /// Create a filter bound to `category`
    ///
    /// The filter is not yet listed by the category; hand it to
    /// [`PoiCategory::add_filter`] to attach it.
    pub fn new(name: impl Into<String>, category: &PoiCategory) -> Result<Self, TaxonomyError> {
        Ok(Self::from_base(BaseInfo::new(name)?, category))
    }

    /// Create a filter from prepared metadata (explicit key, localized name, icon)
    pub fn from_base(base: BaseInfo, category: &PoiCategory) -> Self {
        PoiFilter {
            base,
            category: category.key().to_string(),
            types: Vec::new(),
        }
    }

    /// Key of the owning category
    pub fn category_key(&self) -> &str {
        &self.category
    }

    pub fn belongs_to(&self, category: &PoiCategory) -> bool {
        self.category == category.key()
    }

    /// Append `poi_type` unless a type with the same key is already listed
    ///
    /// Returns `true` when the list grew. A repeated add keeps the original
    /// entry at its original position.
    pub fn add_type(&mut self, poi_type: Arc<PoiType>) -> bool {
        if self.contains(poi_type.key()) {
            return false;
        }
        self.types.push(poi_type);
        true
    }

    /// Types in display order
    pub fn types(&self) -> &[Arc<PoiType>] {
        &self.types
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.types.iter().any(|t| t.key() == type_key)
    }

    pub fn find_type(&self, type_key: &str) -> Option<&Arc<PoiType>> {
        self.types.iter().find(|t| t.key() == type_key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Classification for PoiFilter {
    fn base(&self) -> &BaseInfo {
        &self.base
    }

    fn kind(&self) -> ClassificationKind {
        ClassificationKind::Filter
    }
}
