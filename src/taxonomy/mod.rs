// POI Taxonomy - Category → Filter → POI Type
//
// Each node has:
// - Stable key that never changes once built
// - Display metadata (name, localized name, icon)
// - Ordered children: insertion order is display order

pub mod base;
pub mod category;
pub mod filter;
pub mod poi_type;
pub mod registry;

pub use base::{BaseInfo, Classification, ClassificationKind};
pub use category::PoiCategory;
pub use filter::PoiFilter;
pub use poi_type::{OsmTag, PoiType};
pub use registry::{SharedTaxonomy, Taxonomy, TypeLocation};
