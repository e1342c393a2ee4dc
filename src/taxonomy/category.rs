// 🍽️ POI Category - top-level grouping that exclusively owns its filters
//
// Ownership invariants kept here:
// - every listed filter was built for THIS category
// - a POI type is listed by at most one filter of the category

use super::base::{BaseInfo, Classification, ClassificationKind};
use super::filter::PoiFilter;
use super::poi_type::PoiType;
use crate::error::TaxonomyError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct PoiCategory {
    #[serde(flatten)]
    base: BaseInfo,

    filters: Vec<PoiFilter>,
}

impl PoiCategory {
    /// Create an empty category whose key is its name
    pub fn new(name: impl Into<String>) -> Result<Self, TaxonomyError> {
        Ok(Self::from_base(BaseInfo::new(name)?))
    }

    pub fn from_base(base: BaseInfo) -> Self {
        PoiCategory {
            base,
            filters: Vec::new(),
        }
    }

    /// Attach a filter built with [`PoiFilter::new`] for this category
    pub fn add_filter(&mut self, filter: PoiFilter) -> Result<(), TaxonomyError> {
        if !filter.belongs_to(self) {
            return Err(TaxonomyError::invalid_argument(
                "filter",
                format!(
                    "filter `{}` is bound to category `{}`, not `{}`",
                    filter.key(),
                    filter.category_key(),
                    self.key()
                ),
            ));
        }

        if self.filter(filter.key()).is_some() {
            return Err(TaxonomyError::duplicate(ClassificationKind::Filter, filter.key()));
        }

        for poi_type in filter.types() {
            if let Some(owner) = self.owner_of(poi_type.key()) {
                return Err(TaxonomyError::already_assigned(poi_type.key(), owner.key()));
            }
        }

        self.filters.push(filter);
        Ok(())
    }

    /// Add `poi_type` to the filter `filter_key` of this category
    ///
    /// Same filter twice is a no-op (`Ok(false)`); a type already listed by a
    /// sibling filter is rejected.
    pub fn assign_type(&mut self, filter_key: &str, poi_type: Arc<PoiType>) -> Result<bool, TaxonomyError> {
        if let Some(owner) = self.owner_of(poi_type.key()) {
            if owner.key() != filter_key {
                return Err(TaxonomyError::already_assigned(poi_type.key(), owner.key()));
            }
        }

        let filter = self
            .filters
            .iter_mut()
            .find(|f| f.key() == filter_key)
            .ok_or_else(|| TaxonomyError::not_found(ClassificationKind::Filter, filter_key))?;

        Ok(filter.add_type(poi_type))
    }

    /// Filters in display order
    pub fn filters(&self) -> &[PoiFilter] {
        &self.filters
    }

    pub fn filter(&self, filter_key: &str) -> Option<&PoiFilter> {
        self.filters.iter().find(|f| f.key() == filter_key)
    }

    /// Filter currently listing the type `type_key`
    pub fn owner_of(&self, type_key: &str) -> Option<&PoiFilter> {
        self.filters.iter().find(|f| f.contains(type_key))
    }

    /// All types of the category, filter by filter, in display order
    pub fn types(&self) -> impl Iterator<Item = (&PoiFilter, &Arc<PoiType>)> {
        self.filters
            .iter()
            .flat_map(|filter| filter.types().iter().map(move |t| (filter, t)))
    }

    pub fn type_count(&self) -> usize {
        self.filters.iter().map(PoiFilter::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.type_count() == 0
    }
}

impl Classification for PoiCategory {
    fn base(&self) -> &BaseInfo {
        &self.base
    }

    fn kind(&self) -> ClassificationKind {
        ClassificationKind::Category
    }
}
