// 📦 POI Catalog - taxonomy as data
// Loads categories → filters → types from JSON and assembles a Taxonomy
// through the validating constructors

use crate::taxonomy::{BaseInfo, Classification, OsmTag, PoiCategory, PoiFilter, PoiType, Taxonomy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// CATALOG DOCUMENT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,

    /// Stable key, defaults to `name`
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub localized_name: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterEntry {
    pub name: String,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub localized_name: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    pub name: String,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub localized_name: Option<String>,

    #[serde(default)]
    pub icon: Option<String>,

    /// OSM tag key (e.g., "amenity"); `value` defaults to the type name
    #[serde(default)]
    pub tag: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

fn base_info(
    key: &Option<String>,
    name: &str,
    localized_name: &Option<String>,
    icon: &Option<String>,
) -> Result<BaseInfo> {
    let key = key.clone().unwrap_or_else(|| name.to_string());
    let mut base = BaseInfo::with_key(key, name)?;
    if let Some(localized_name) = localized_name {
        base = base.localized(localized_name.clone());
    }
    if let Some(icon) = icon {
        base = base.with_icon(icon.clone());
    }
    Ok(base)
}

impl TypeEntry {
    fn to_poi_type(&self) -> Result<PoiType> {
        let base = base_info(&self.key, &self.name, &self.localized_name, &self.icon)?;
        let tag = match &self.tag {
            Some(tag) => {
                let value = self.value.clone().unwrap_or_else(|| self.name.clone());
                Some(OsmTag::new(tag.clone(), value)?)
            }
            None => None,
        };
        Ok(PoiType::from_parts(base, tag, self.editable))
    }
}

impl Catalog {
    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse catalog JSON")
    }

    /// Assemble the taxonomy; any invalid node aborts the whole build
    pub fn build(&self) -> Result<Taxonomy> {
        let mut taxonomy = Taxonomy::new();

        for category_entry in &self.categories {
            let category = self
                .build_category(category_entry)
                .with_context(|| format!("Invalid category `{}`", category_entry.name))?;
            taxonomy
                .add_category(category)
                .with_context(|| format!("Cannot register category `{}`", category_entry.name))?;
        }

        info!(
            categories = taxonomy.categories().len(),
            types = taxonomy.type_count(),
            "taxonomy assembled"
        );

        Ok(taxonomy)
    }

    fn build_category(&self, entry: &CategoryEntry) -> Result<PoiCategory> {
        let base = base_info(&entry.key, &entry.name, &entry.localized_name, &entry.icon)?;
        let mut category = PoiCategory::from_base(base);

        for filter_entry in &entry.filters {
            let base = base_info(
                &filter_entry.key,
                &filter_entry.name,
                &filter_entry.localized_name,
                &filter_entry.icon,
            )
            .with_context(|| format!("Invalid filter `{}`", filter_entry.name))?;
            let mut filter = PoiFilter::from_base(base, &category);

            for type_entry in &filter_entry.types {
                let poi_type = type_entry
                    .to_poi_type()
                    .with_context(|| format!("Invalid POI type `{}`", type_entry.name))?;
                if !filter.add_type(Arc::new(poi_type)) {
                    debug!(
                        filter = filter.key(),
                        poi_type = %type_entry.name,
                        "duplicate POI type in filter ignored"
                    );
                }
            }

            category
                .add_filter(filter)
                .with_context(|| format!("Cannot register filter `{}`", filter_entry.name))?;
        }

        Ok(category)
    }
}

/// Load and assemble a catalog file in one step
pub fn load_taxonomy<P: AsRef<Path>>(path: P) -> Result<Taxonomy> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading POI catalog");
    Catalog::from_file(path)?.build()
}

// ============================================================================
// BUILT-IN CATALOG
// ============================================================================

fn tagged(name: &str, localized: &str, tag: &str) -> TypeEntry {
    TypeEntry {
        name: name.to_string(),
        key: None,
        localized_name: Some(localized.to_string()),
        icon: None,
        tag: Some(tag.to_string()),
        value: None,
        editable: true,
    }
}

fn filter(name: &str, localized: &str, types: Vec<TypeEntry>) -> FilterEntry {
    FilterEntry {
        name: name.to_string(),
        key: None,
        localized_name: Some(localized.to_string()),
        icon: None,
        types,
    }
}

fn category(name: &str, localized: &str, icon: &str, filters: Vec<FilterEntry>) -> CategoryEntry {
    CategoryEntry {
        name: name.to_string(),
        key: None,
        localized_name: Some(localized.to_string()),
        icon: Some(icon.to_string()),
        filters,
    }
}

/// Small catalog used when no catalog file is configured
///
/// Structure:
/// - Food: Restaurants (restaurant, cafe, fast_food), Bars (bar, pub)
/// - Shop: Food shops (supermarket, bakery, butcher), Other shops (clothes, hardware)
/// - Tourism: Accommodation (hotel, hostel), Sights (museum, viewpoint, ruins*)
/// - Transport: Fuel & parking (fuel, parking), Public transport (bus_stop)
/// - Emergency: (no filters yet)
///
/// *read-only
pub fn default_catalog() -> Catalog {
    let mut ruins = tagged("ruins", "Ruins", "historic");
    ruins.editable = false;

    Catalog {
        categories: vec![
            category(
                "food",
                "Food",
                "🍽️",
                vec![
                    filter(
                        "restaurants",
                        "Restaurants",
                        vec![
                            tagged("restaurant", "Restaurant", "amenity"),
                            tagged("cafe", "Café", "amenity"),
                            tagged("fast_food", "Fast Food", "amenity"),
                        ],
                    ),
                    filter(
                        "bars",
                        "Bars",
                        vec![tagged("bar", "Bar", "amenity"), tagged("pub", "Pub", "amenity")],
                    ),
                ],
            ),
            category(
                "shop",
                "Shop",
                "🛍️",
                vec![
                    filter(
                        "food_shops",
                        "Food shops",
                        vec![
                            tagged("supermarket", "Supermarket", "shop"),
                            tagged("bakery", "Bakery", "shop"),
                            tagged("butcher", "Butcher", "shop"),
                        ],
                    ),
                    filter(
                        "other_shops",
                        "Other shops",
                        vec![tagged("clothes", "Clothes", "shop"), tagged("hardware", "Hardware", "shop")],
                    ),
                ],
            ),
            category(
                "tourism",
                "Tourism",
                "🏛️",
                vec![
                    filter(
                        "accommodation",
                        "Accommodation",
                        vec![tagged("hotel", "Hotel", "tourism"), tagged("hostel", "Hostel", "tourism")],
                    ),
                    filter(
                        "sights",
                        "Sights",
                        vec![
                            tagged("museum", "Museum", "tourism"),
                            tagged("viewpoint", "Viewpoint", "tourism"),
                            ruins,
                        ],
                    ),
                ],
            ),
            category(
                "transport",
                "Transport",
                "🚗",
                vec![
                    filter(
                        "fuel_parking",
                        "Fuel & parking",
                        vec![tagged("fuel", "Fuel", "amenity"), tagged("parking", "Parking", "amenity")],
                    ),
                    filter(
                        "public_transport",
                        "Public transport",
                        vec![tagged("bus_stop", "Bus stop", "highway")],
                    ),
                ],
            ),
            category("emergency", "Emergency", "🚑", Vec::new()),
        ],
    }
}

/// Built-in catalog as a taxonomy
pub fn default_taxonomy() -> Result<Taxonomy> {
    default_catalog().build()
}

// ============================================================================
// TESTS
// ============================================================================
