// 📚 Taxonomy Registry - ordered categories plus the shared, swappable handle
//
// A published Taxonomy is never mutated in place: loaders build a fresh one
// and swap it into SharedTaxonomy. Readers hold an Arc snapshot.

use super::base::{Classification, ClassificationKind};
use super::category::PoiCategory;
use super::filter::PoiFilter;
use super::poi_type::PoiType;
use crate::error::TaxonomyError;
use serde::Serialize;
use std::sync::{Arc, RwLock};

// ============================================================================
// TYPE LOCATION
// ============================================================================

/// Where a POI type lives in the taxonomy
#[derive(Debug, Clone, Copy)]
pub struct TypeLocation<'a> {
    pub category: &'a PoiCategory,
    pub filter: &'a PoiFilter,
    pub poi_type: &'a Arc<PoiType>,
}

// ============================================================================
// TAXONOMY
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct Taxonomy {
    categories: Vec<PoiCategory>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Taxonomy {
            categories: Vec::new(),
        }
    }

    /// Append a fully assembled category
    ///
    /// Rejects a duplicate category key and any type already listed elsewhere.
    pub fn add_category(&mut self, category: PoiCategory) -> Result<(), TaxonomyError> {
        if self.category(category.key()).is_some() {
            return Err(TaxonomyError::duplicate(ClassificationKind::Category, category.key()));
        }

        for (_, poi_type) in category.types() {
            if let Some(location) = self.find_type(poi_type.key()) {
                return Err(TaxonomyError::already_assigned(
                    poi_type.key(),
                    location.filter.key(),
                ));
            }
        }

        self.categories.push(category);
        Ok(())
    }

    /// Add `poi_type` to `filter_key` of `category_key`, enforcing single ownership
    /// across the whole taxonomy
    pub fn assign_type(
        &mut self,
        category_key: &str,
        filter_key: &str,
        poi_type: Arc<PoiType>,
    ) -> Result<bool, TaxonomyError> {
        if let Some(location) = self.find_type(poi_type.key()) {
            if location.category.key() != category_key || location.filter.key() != filter_key {
                return Err(TaxonomyError::already_assigned(
                    poi_type.key(),
                    location.filter.key(),
                ));
            }
        }

        let category = self
            .categories
            .iter_mut()
            .find(|c| c.key() == category_key)
            .ok_or_else(|| TaxonomyError::not_found(ClassificationKind::Category, category_key))?;

        category.assign_type(filter_key, poi_type)
    }

    /// Categories in display order
    pub fn categories(&self) -> &[PoiCategory] {
        &self.categories
    }

    pub fn category(&self, category_key: &str) -> Option<&PoiCategory> {
        self.categories.iter().find(|c| c.key() == category_key)
    }

    /// Filters of a category; `None` when the category is unknown
    pub fn filters(&self, category_key: &str) -> Option<&[PoiFilter]> {
        self.category(category_key).map(PoiCategory::filters)
    }

    /// Types of one filter; `None` when the category or filter is unknown
    pub fn types_in(&self, category_key: &str, filter_key: &str) -> Option<&[Arc<PoiType>]> {
        self.category(category_key)
            .and_then(|c| c.filter(filter_key))
            .map(PoiFilter::types)
    }

    /// Every type in display order (category by category, filter by filter)
    pub fn all_types(&self) -> impl Iterator<Item = TypeLocation<'_>> {
        self.categories.iter().flat_map(|category| {
            category.types().map(move |(filter, poi_type)| TypeLocation {
                category,
                filter,
                poi_type,
            })
        })
    }

    pub fn find_type(&self, type_key: &str) -> Option<TypeLocation<'_>> {
        self.all_types().find(|loc| loc.poi_type.key() == type_key)
    }

    pub fn type_count(&self) -> usize {
        self.categories.iter().map(PoiCategory::type_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// ============================================================================
// SHARED TAXONOMY
// ============================================================================

/// Handle shared between a background loader and selection sessions
///
/// `snapshot()` hands out the taxonomy published at that moment; `replace()`
/// publishes a new one without touching snapshots already taken.
#[derive(Debug, Clone, Default)]
pub struct SharedTaxonomy {
    current: Arc<RwLock<Arc<Taxonomy>>>,
}

impl SharedTaxonomy {
    pub fn new(taxonomy: Taxonomy) -> Self {
        SharedTaxonomy {
            current: Arc::new(RwLock::new(Arc::new(taxonomy))),
        }
    }

    pub fn snapshot(&self) -> Arc<Taxonomy> {
        let guard = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    pub fn replace(&self, taxonomy: Taxonomy) {
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(taxonomy);
    }
}

impl From<Taxonomy> for SharedTaxonomy {
    fn from(taxonomy: Taxonomy) -> Self {
        SharedTaxonomy::new(taxonomy)
    }
}

// ============================================================================
// TESTS
// ============================================================================
