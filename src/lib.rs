// POI Taxonomy - Core Library
// Category → Filter → POI type model plus the two-screen type picker.
// Used by the CLI/TUI binary and by editors embedding the picker.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod selection;
pub mod taxonomy;

// Re-export commonly used types
pub use catalog::{default_catalog, default_taxonomy, load_taxonomy, Catalog};
pub use error::TaxonomyError;
pub use provider::{DataProvider, EditSession};
pub use selection::{
    CategoryRow, Selection, SelectionAction, SelectionController, SelectionMode,
    SelectionOutcome, SelectionScope, SelectionState, TypeRow,
};
pub use taxonomy::{
    BaseInfo, Classification, ClassificationKind, OsmTag, PoiCategory, PoiFilter, PoiType,
    SharedTaxonomy, Taxonomy, TypeLocation,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
