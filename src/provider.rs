// 🔌 Data Provider - editing context in, final selection out
//
// The selection flow never stores or sends anything itself. Whatever sits
// behind this trait (an edit form, an upload queue) owns the result.

use crate::selection::Selection;
use crate::taxonomy::{Classification, OsmTag, PoiType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// DATA PROVIDER CONTRACT
// ============================================================================

pub trait DataProvider {
    /// Whether `poi_type` may be offered for the edit in progress
    fn accepts(&self, _poi_type: &PoiType) -> bool {
        true
    }

    /// Category key a direct POI-type session should be scoped to
    fn current_category(&self) -> Option<&str> {
        None
    }

    /// Key of the type currently assigned to the feature, if any
    fn current_type(&self) -> Option<&str> {
        None
    }

    /// Receives the outcome of a session that ended in `Selected`
    fn on_selected(&mut self, selection: &Selection);
}

impl<P: DataProvider + ?Sized> DataProvider for &mut P {
    fn accepts(&self, poi_type: &PoiType) -> bool {
        (**self).accepts(poi_type)
    }

    fn current_category(&self) -> Option<&str> {
        (**self).current_category()
    }

    fn current_type(&self) -> Option<&str> {
        (**self).current_type()
    }

    fn on_selected(&mut self, selection: &Selection) {
        (**self).on_selected(selection)
    }
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn accepts(&self, poi_type: &PoiType) -> bool {
        (**self).accepts(poi_type)
    }

    fn current_category(&self) -> Option<&str> {
        (**self).current_category()
    }

    fn current_type(&self) -> Option<&str> {
        (**self).current_type()
    }

    fn on_selected(&mut self, selection: &Selection) {
        (**self).on_selected(selection)
    }
}

// ============================================================================
// EDIT SESSION
// ============================================================================

/// Edit data of one map feature
///
/// Holds the feature's tags and its assigned type. A selection swaps the old
/// type's tag for the new one; unrelated tags are left alone.
#[derive(Debug, Clone, Default)]
pub struct EditSession {
    tags: BTreeMap<String, String>,
    category: Option<String>,
    poi_type: Option<Arc<PoiType>>,
    include_read_only: bool,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing feature's tags
    pub fn with_tags<I, K, V>(tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        EditSession {
            tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::default()
        }
    }

    /// Start from a feature that already has a type
    pub fn with_current(mut self, category: Option<String>, poi_type: Arc<PoiType>) -> Self {
        if let Some(tag) = poi_type.tag() {
            self.tags.insert(tag.key.clone(), tag.value.clone());
        }
        self.category = category;
        self.poi_type = Some(poi_type);
        self
    }

    /// Scope direct POI-type sessions to `category`
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Also offer types marked read-only in the catalog
    pub fn including_read_only(mut self) -> Self {
        self.include_read_only = true;
        self
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn poi_type(&self) -> Option<&Arc<PoiType>> {
        self.poi_type.as_ref()
    }

    fn replace_tag(&mut self, old: Option<&OsmTag>, new: Option<&OsmTag>) {
        if let Some(old) = old {
            if self.tags.get(&old.key) == Some(&old.value) {
                self.tags.remove(&old.key);
            }
        }
        if let Some(new) = new {
            self.tags.insert(new.key.clone(), new.value.clone());
        }
    }
}

impl DataProvider for EditSession {
    fn accepts(&self, poi_type: &PoiType) -> bool {
        self.include_read_only || poi_type.is_editable()
    }

    fn current_category(&self) -> Option<&str> {
        self.category()
    }

    fn current_type(&self) -> Option<&str> {
        self.poi_type.as_ref().map(|t| t.key())
    }

    fn on_selected(&mut self, selection: &Selection) {
        let previous = self.poi_type.take();
        self.replace_tag(
            previous.as_ref().and_then(|t| t.tag()),
            selection.poi_type.tag(),
        );

        debug!(
            poi_type = selection.poi_type.key(),
            previous = previous.as_ref().map(|t| t.key()),
            "edit session updated"
        );

        // a type picked without a category path must not keep the old category
        self.category = selection.category.clone();
        self.poi_type = Some(Arc::clone(&selection.poi_type));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn selection_of(poi_type: PoiType, category: Option<&str>) -> Selection {
        Selection {
            session_id: Uuid::new_v4(),
            poi_type: Arc::new(poi_type),
            category: category.map(str::to_string),
            filter: None,
            selected_at: Utc::now(),
        }
    }

    #[test]
    fn test_edit_session_writes_tag() {
        let mut session = EditSession::with_tags([("name", "Blue Bottle")]);
        let cafe = PoiType::with_tag("cafe", "amenity", "cafe").unwrap();

        session.on_selected(&selection_of(cafe, Some("Food")));

        assert_eq!(session.tags().get("amenity"), Some(&"cafe".to_string()));
        assert_eq!(session.tags().get("name"), Some(&"Blue Bottle".to_string()));
        assert_eq!(session.current_type(), Some("cafe"));
        assert_eq!(session.current_category(), Some("Food"));
    }

    #[test]
    fn test_edit_session_replaces_previous_type_tag() {
        let restaurant = Arc::new(PoiType::with_tag("restaurant", "amenity", "restaurant").unwrap());
        let mut session = EditSession::new().with_current(Some("Food".to_string()), restaurant);
        assert_eq!(session.tags().get("amenity"), Some(&"restaurant".to_string()));

        let bakery = PoiType::with_tag("bakery", "shop", "bakery").unwrap();
        session.on_selected(&selection_of(bakery, None));

        assert!(session.tags().get("amenity").is_none());
        assert_eq!(session.tags().get("shop"), Some(&"bakery".to_string()));
        assert_eq!(session.current_type(), Some("bakery"));
        assert_eq!(session.current_category(), None);
    }

    #[test]
    fn test_edit_session_keeps_tag_edited_by_hand() {
        let restaurant = Arc::new(PoiType::with_tag("restaurant", "amenity", "restaurant").unwrap());
        let mut session = EditSession::new().with_current(None, restaurant);
        session.tags.insert("amenity".to_string(), "fast_food".to_string());

        let bakery = PoiType::with_tag("bakery", "shop", "bakery").unwrap();
        session.on_selected(&selection_of(bakery, None));

        assert_eq!(session.tags().get("amenity"), Some(&"fast_food".to_string()));
        assert_eq!(session.tags().get("shop"), Some(&"bakery".to_string()));
    }

    #[test]
    fn test_edit_session_hides_read_only_types() {
        let ruins = PoiType::with_tag("ruins", "historic", "ruins").unwrap().read_only();
        let cafe = PoiType::new("cafe").unwrap();

        let session = EditSession::new();
        assert!(!session.accepts(&ruins));
        assert!(session.accepts(&cafe));

        let session = EditSession::new().including_read_only();
        assert!(session.accepts(&ruins));
    }

    #[test]
    fn test_default_provider_capabilities() {
        struct Sink(Vec<String>);

        impl DataProvider for Sink {
            fn on_selected(&mut self, selection: &Selection) {
                self.0.push(selection.poi_type.key().to_string());
            }
        }

        let mut sink = Sink(Vec::new());
        let cafe = PoiType::new("cafe").unwrap();
        assert!(sink.accepts(&cafe));
        assert!(sink.current_category().is_none());
        assert!(sink.current_type().is_none());

        fn deliver<P: DataProvider>(mut provider: P, selection: &Selection) {
            provider.on_selected(selection);
        }

        deliver(&mut sink, &selection_of(cafe, None));
        assert_eq!(sink.0, vec!["cafe".to_string()]);
    }
}
