// 🧭 POI Type Selection - two-screen picking flow
//
// CategoryScreen ──pick category──▶ PoiTypeScreen ──pick type──▶ Selected
//       ▲                                │
//       └───────────── back ─────────────┘
// Cancel (or back from the first screen) ──▶ Cancelled
//
// Every session ends in exactly one terminal outcome. Once there, further
// actions are ignored. Invalid actions (unknown key, wrong screen) end the
// session as Cancelled instead of surfacing an error to the UI layer.

use crate::error::TaxonomyError;
use crate::provider::DataProvider;
use crate::taxonomy::{Classification, PoiCategory, PoiType, SharedTaxonomy, Taxonomy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ============================================================================
// SELECTION MODE
// ============================================================================

/// Screen a session starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    CategoryScreen = 0,
    PoiTypeScreen = 1,
}

impl SelectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::CategoryScreen => "category_screen",
            SelectionMode::PoiTypeScreen => "poi_type_screen",
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i64> for SelectionMode {
    type Error = TaxonomyError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(SelectionMode::CategoryScreen),
            1 => Ok(SelectionMode::PoiTypeScreen),
            other => Err(TaxonomyError::invalid_argument(
                "mode",
                format!("unrecognized selection mode {}", other),
            )),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "category" | "category_screen" => Ok(SelectionMode::CategoryScreen),
            "poi_type" | "poi_type_screen" | "type" => Ok(SelectionMode::PoiTypeScreen),
            _ => Err(TaxonomyError::invalid_argument(
                "mode",
                format!("unrecognized selection mode `{}`", s),
            )),
        }
    }
}

// ============================================================================
// SCOPE, STATE, ACTIONS, OUTCOME
// ============================================================================

/// What a session may pick from
#[derive(Debug, Clone)]
pub enum SelectionScope {
    /// The whole taxonomy; the handle is re-read on entry to each screen
    Taxonomy(SharedTaxonomy),

    /// A pre-scoped list of types (direct POI-type sessions only)
    Types(Vec<Arc<PoiType>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    CategoryScreen,
    PoiTypeScreen,
    Selected,
    Cancelled,
}

impl SelectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SelectionState::Selected | SelectionState::Cancelled)
    }
}

/// Discrete user action fed to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionAction {
    PickCategory(String),
    PickType(String),
    Search(String),
    Back,
    Cancel,
}

/// Final pick reported to the data provider
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub session_id: Uuid,
    pub poi_type: Arc<PoiType>,

    /// Category/filter path, when the type came from the taxonomy
    pub category: Option<String>,
    pub filter: Option<String>,

    pub selected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    Selected(Selection),
    Cancelled,
}

impl SelectionOutcome {
    pub fn selection(&self) -> Option<&Selection> {
        match self {
            SelectionOutcome::Selected(selection) => Some(selection),
            SelectionOutcome::Cancelled => None,
        }
    }
}

// ============================================================================
// SCREEN ROWS (snapshots taken on screen entry)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    pub key: String,
    pub name: String,
    pub icon: Option<String>,

    /// Types the provider accepts in this category
    pub type_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeRow {
    pub poi_type: Arc<PoiType>,
    pub category: Option<String>,
    pub filter: Option<String>,
    pub filter_name: Option<String>,

    /// Type currently assigned to the edited feature
    pub is_current: bool,
}

impl TypeRow {
    pub fn key(&self) -> &str {
        self.poi_type.key()
    }
}

#[derive(Debug)]
enum Screen {
    Categories {
        rows: Vec<CategoryRow>,
    },
    PoiTypes {
        category: Option<CategoryRow>,
        rows: Vec<TypeRow>,
        query: String,
    },
    Done(SelectionOutcome),
}

// ============================================================================
// SELECTION CONTROLLER
// ============================================================================

pub struct SelectionController<P: DataProvider> {
    id: Uuid,
    mode: SelectionMode,
    scope: SelectionScope,
    provider: P,
    screen: Screen,
}

impl<P: DataProvider> SelectionController<P> {
    /// Start a session on the screen named by `mode`
    ///
    /// - `CategoryScreen` needs a taxonomy scope.
    /// - `PoiTypeScreen` over a type list shows exactly those types.
    /// - `PoiTypeScreen` over a taxonomy shows the provider's current category,
    ///   or every type when the provider has none.
    pub fn init_with_type(
        mode: SelectionMode,
        scope: SelectionScope,
        provider: P,
    ) -> Result<Self, TaxonomyError> {
        let screen = match (mode, &scope) {
            (SelectionMode::CategoryScreen, SelectionScope::Types(_)) => {
                return Err(TaxonomyError::invalid_argument(
                    "scope",
                    "the category screen needs a taxonomy to list categories from",
                ));
            }
            (SelectionMode::CategoryScreen, SelectionScope::Taxonomy(shared)) => Screen::Categories {
                rows: category_rows(&shared.snapshot(), &provider),
            },
            (SelectionMode::PoiTypeScreen, SelectionScope::Types(types)) => Screen::PoiTypes {
                category: None,
                rows: listed_type_rows(types, &provider),
                query: String::new(),
            },
            (SelectionMode::PoiTypeScreen, SelectionScope::Taxonomy(shared)) => {
                let taxonomy = shared.snapshot();
                match provider.current_category() {
                    Some(key) => {
                        let category = taxonomy.category(key).ok_or_else(|| {
                            TaxonomyError::invalid_argument(
                                "category",
                                format!("data provider names unknown category `{}`", key),
                            )
                        })?;
                        Screen::PoiTypes {
                            category: Some(category_row(category, &provider)),
                            rows: category_type_rows(category, &provider),
                            query: String::new(),
                        }
                    }
                    None => Screen::PoiTypes {
                        category: None,
                        rows: taxonomy
                            .categories()
                            .iter()
                            .flat_map(|c| category_type_rows(c, &provider))
                            .collect(),
                        query: String::new(),
                    },
                }
            }
        };

        let controller = SelectionController {
            id: Uuid::new_v4(),
            mode,
            scope,
            provider,
            screen,
        };

        info!(
            session = %controller.id,
            mode = %mode,
            rows = controller.row_count(),
            "selection session started"
        );

        Ok(controller)
    }

    /// Same as [`init_with_type`](Self::init_with_type) with a raw mode value
    /// (0 = category screen, 1 = POI type screen)
    pub fn init_with_raw_mode(raw_mode: i64, scope: SelectionScope, provider: P) -> Result<Self, TaxonomyError> {
        Self::init_with_type(SelectionMode::try_from(raw_mode)?, scope, provider)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn state(&self) -> SelectionState {
        match &self.screen {
            Screen::Categories { .. } => SelectionState::CategoryScreen,
            Screen::PoiTypes { .. } => SelectionState::PoiTypeScreen,
            Screen::Done(SelectionOutcome::Selected(_)) => SelectionState::Selected,
            Screen::Done(SelectionOutcome::Cancelled) => SelectionState::Cancelled,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub fn outcome(&self) -> Option<&SelectionOutcome> {
        match &self.screen {
            Screen::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Rows of the category screen (empty on any other screen)
    pub fn category_rows(&self) -> &[CategoryRow] {
        match &self.screen {
            Screen::Categories { rows } => rows,
            _ => &[],
        }
    }

    /// Category the POI-type screen is scoped to, if any
    pub fn active_category(&self) -> Option<&CategoryRow> {
        match &self.screen {
            Screen::PoiTypes { category, .. } => category.as_ref(),
            _ => None,
        }
    }

    /// Rows of the POI-type screen matching the search query
    pub fn type_rows(&self) -> Vec<&TypeRow> {
        match &self.screen {
            Screen::PoiTypes { rows, query, .. } => rows
                .iter()
                .filter(|row| row.poi_type.matches_query(query))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn search_query(&self) -> &str {
        match &self.screen {
            Screen::PoiTypes { query, .. } => query,
            _ => "",
        }
    }

    fn row_count(&self) -> usize {
        match &self.screen {
            Screen::Categories { rows } => rows.len(),
            Screen::PoiTypes { rows, .. } => rows.len(),
            Screen::Done(_) => 0,
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    pub fn handle(&mut self, action: SelectionAction) -> SelectionState {
        if self.is_finished() {
            debug!(session = %self.id, ?action, "session already finished, action ignored");
            return self.state();
        }

        match action {
            SelectionAction::PickCategory(key) => self.pick_category(&key),
            SelectionAction::PickType(key) => self.pick_type(&key),
            SelectionAction::Search(query) => self.search(query),
            SelectionAction::Back => self.back(),
            SelectionAction::Cancel => self.cancel(),
        }
    }

    /// Category screen → POI-type screen for `category_key`
    pub fn pick_category(&mut self, category_key: &str) -> SelectionState {
        let row = match &self.screen {
            Screen::Done(_) => return self.state(),
            Screen::PoiTypes { .. } => {
                return self.abort(format!("category `{}` picked on the POI type screen", category_key));
            }
            Screen::Categories { rows } => rows.iter().find(|r| r.key == category_key).cloned(),
        };

        let Some(row) = row else {
            return self.abort(format!("unknown category `{}`", category_key));
        };

        let SelectionScope::Taxonomy(shared) = &self.scope else {
            return self.abort("category screen without a taxonomy".to_string());
        };

        // Re-read the handle: the rows for this screen come from whatever is
        // published now, copied once.
        let taxonomy = shared.snapshot();
        let Some(category) = taxonomy.category(&row.key) else {
            return self.abort(format!("category `{}` is gone from the taxonomy", row.key));
        };

        let rows = category_type_rows(category, &self.provider);
        debug!(session = %self.id, category = %row.key, rows = rows.len(), "category picked");

        self.screen = Screen::PoiTypes {
            category: Some(row),
            rows,
            query: String::new(),
        };
        self.state()
    }

    /// POI-type screen → `Selected`; the provider receives the selection
    pub fn pick_type(&mut self, type_key: &str) -> SelectionState {
        let row = match &self.screen {
            Screen::Done(_) => return self.state(),
            Screen::Categories { .. } => {
                return self.abort(format!("POI type `{}` picked on the category screen", type_key));
            }
            Screen::PoiTypes { rows, .. } => rows.iter().find(|r| r.key() == type_key).cloned(),
        };

        let Some(row) = row else {
            return self.abort(format!("POI type `{}` is not offered", type_key));
        };

        let selection = Selection {
            session_id: self.id,
            poi_type: row.poi_type,
            category: row.category,
            filter: row.filter,
            selected_at: Utc::now(),
        };

        info!(
            session = %self.id,
            poi_type = selection.poi_type.key(),
            category = selection.category.as_deref(),
            "POI type selected"
        );

        self.provider.on_selected(&selection);
        self.screen = Screen::Done(SelectionOutcome::Selected(selection));
        self.state()
    }

    /// Narrow the POI-type screen by a case-insensitive query
    pub fn search(&mut self, query: impl Into<String>) -> SelectionState {
        match &mut self.screen {
            Screen::PoiTypes { query: current, .. } => *current = query.into(),
            _ => debug!(session = %self.id, "search is only available on the POI type screen"),
        }
        self.state()
    }

    /// POI-type screen → category screen when the session came from there;
    /// anything else ends the session
    pub fn back(&mut self) -> SelectionState {
        match (&self.screen, self.mode, &self.scope) {
            (Screen::Done(_), _, _) => self.state(),
            (Screen::PoiTypes { .. }, SelectionMode::CategoryScreen, SelectionScope::Taxonomy(shared)) => {
                let rows = category_rows(&shared.snapshot(), &self.provider);
                debug!(session = %self.id, rows = rows.len(), "back to category screen");
                self.screen = Screen::Categories { rows };
                self.state()
            }
            _ => self.finish_cancelled("back from the first screen"),
        }
    }

    pub fn cancel(&mut self) -> SelectionState {
        if self.is_finished() {
            return self.state();
        }
        self.finish_cancelled("cancelled by user")
    }

    fn abort(&mut self, reason: String) -> SelectionState {
        warn!(session = %self.id, %reason, "selection aborted");
        self.screen = Screen::Done(SelectionOutcome::Cancelled);
        self.state()
    }

    fn finish_cancelled(&mut self, reason: &str) -> SelectionState {
        info!(session = %self.id, reason, "selection cancelled");
        self.screen = Screen::Done(SelectionOutcome::Cancelled);
        self.state()
    }
}

// ============================================================================
// ROW SNAPSHOTS
// ============================================================================

fn category_row<P: DataProvider>(category: &PoiCategory, provider: &P) -> CategoryRow {
    CategoryRow {
        key: category.key().to_string(),
        name: category.display_name().to_string(),
        icon: category.icon().map(str::to_string),
        type_count: category.types().filter(|(_, t)| provider.accepts(t)).count(),
    }
}

fn category_rows<P: DataProvider>(taxonomy: &Taxonomy, provider: &P) -> Vec<CategoryRow> {
    taxonomy
        .categories()
        .iter()
        .map(|category| category_row(category, provider))
        .collect()
}

fn category_type_rows<P: DataProvider>(category: &PoiCategory, provider: &P) -> Vec<TypeRow> {
    let current = provider.current_type();

    category
        .types()
        .filter(|(_, poi_type)| provider.accepts(poi_type))
        .map(|(filter, poi_type)| TypeRow {
            poi_type: Arc::clone(poi_type),
            category: Some(category.key().to_string()),
            filter: Some(filter.key().to_string()),
            filter_name: Some(filter.display_name().to_string()),
            is_current: current == Some(poi_type.key()),
        })
        .collect()
}

fn listed_type_rows<P: DataProvider>(types: &[Arc<PoiType>], provider: &P) -> Vec<TypeRow> {
    let current = provider.current_type();
    let mut rows: Vec<TypeRow> = Vec::with_capacity(types.len());

    for poi_type in types {
        if !provider.accepts(poi_type) || rows.iter().any(|r| r.key() == poi_type.key()) {
            continue;
        }
        rows.push(TypeRow {
            poi_type: Arc::clone(poi_type),
            category: None,
            filter: None,
            filter_name: None,
            is_current: current == Some(poi_type.key()),
        });
    }

    rows
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EditSession;
    use crate::taxonomy::PoiFilter;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Recorder {
        received: Vec<Selection>,
        current_category: Option<String>,
        current_type: Option<String>,
        rejected: Vec<String>,
    }

    impl DataProvider for Recorder {
        fn accepts(&self, poi_type: &PoiType) -> bool {
            !self.rejected.iter().any(|k| k == poi_type.key())
        }

        fn current_category(&self) -> Option<&str> {
            self.current_category.as_deref()
        }

        fn current_type(&self) -> Option<&str> {
            self.current_type.as_deref()
        }

        fn on_selected(&mut self, selection: &Selection) {
            self.received.push(selection.clone());
        }
    }

    fn poi(name: &str) -> Arc<PoiType> {
        Arc::new(PoiType::new(name).unwrap())
    }

    fn sample_taxonomy() -> Taxonomy {
        let mut taxonomy = Taxonomy::new();

        let mut food = PoiCategory::new("Food").unwrap();
        let mut restaurants = PoiFilter::new("Restaurants", &food).unwrap();
        restaurants.add_type(poi("restaurant"));
        restaurants.add_type(poi("cafe"));
        food.add_filter(restaurants).unwrap();
        let mut bars = PoiFilter::new("Bars", &food).unwrap();
        bars.add_type(poi("bar"));
        food.add_filter(bars).unwrap();
        taxonomy.add_category(food).unwrap();

        let mut shop = PoiCategory::new("Shop").unwrap();
        let mut food_shops = PoiFilter::new("Food shops", &shop).unwrap();
        food_shops.add_type(poi("bakery"));
        shop.add_filter(food_shops).unwrap();
        taxonomy.add_category(shop).unwrap();

        taxonomy.add_category(PoiCategory::new("Emergency").unwrap()).unwrap();
        taxonomy
    }

    fn category_session(provider: Recorder) -> SelectionController<Recorder> {
        SelectionController::init_with_type(
            SelectionMode::CategoryScreen,
            SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy())),
            provider,
        )
        .unwrap()
    }

    fn type_keys<P: DataProvider>(controller: &SelectionController<P>) -> Vec<String> {
        controller.type_rows().iter().map(|r| r.key().to_string()).collect()
    }

    #[test]
    fn test_selection_mode_parsing() {
        assert_eq!(SelectionMode::try_from(0).unwrap(), SelectionMode::CategoryScreen);
        assert_eq!(SelectionMode::try_from(1).unwrap(), SelectionMode::PoiTypeScreen);
        assert!(SelectionMode::try_from(2).unwrap_err().is_invalid_argument());
        assert!(SelectionMode::try_from(-1).unwrap_err().is_invalid_argument());

        assert_eq!("CATEGORY_SCREEN".parse::<SelectionMode>().unwrap(), SelectionMode::CategoryScreen);
        assert_eq!("poi-type".parse::<SelectionMode>().unwrap(), SelectionMode::PoiTypeScreen);
        assert_eq!(serde_json::to_string(&SelectionMode::PoiTypeScreen).unwrap(), "\"poi_type_screen\"");
        assert!("map".parse::<SelectionMode>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_init_with_unrecognized_raw_mode_fails() {
        let scope = SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy()));
        let result = SelectionController::init_with_raw_mode(7, scope, Recorder::default());

        assert!(result.err().unwrap().is_invalid_argument());
    }

    #[test]
    fn test_category_screen_requires_taxonomy() {
        let scope = SelectionScope::Types(vec![poi("cafe")]);
        let result = SelectionController::init_with_type(SelectionMode::CategoryScreen, scope, Recorder::default());

        assert!(result.err().unwrap().is_invalid_argument());
    }

    #[test]
    fn test_category_screen_lists_categories_in_order() {
        let controller = category_session(Recorder::default());

        assert_eq!(controller.state(), SelectionState::CategoryScreen);
        let rows: Vec<(&str, usize)> = controller
            .category_rows()
            .iter()
            .map(|r| (r.key.as_str(), r.type_count))
            .collect();
        assert_eq!(rows, vec![("Food", 3), ("Shop", 1), ("Emergency", 0)]);
        assert!(controller.type_rows().is_empty());
        assert!(controller.outcome().is_none());
    }

    #[test]
    fn test_pick_category_then_type() {
        let mut controller = category_session(Recorder::default());

        assert_eq!(controller.pick_category("Food"), SelectionState::PoiTypeScreen);
        assert_eq!(controller.active_category().unwrap().key, "Food");
        assert_eq!(type_keys(&controller), vec!["restaurant", "cafe", "bar"]);

        assert_eq!(controller.pick_type("cafe"), SelectionState::Selected);

        let selection = controller.outcome().unwrap().selection().unwrap();
        assert_eq!(selection.poi_type.key(), "cafe");
        assert_eq!(selection.category.as_deref(), Some("Food"));
        assert_eq!(selection.filter.as_deref(), Some("Restaurants"));
        assert_eq!(selection.session_id, controller.id());

        let provider = controller.into_provider();
        assert_eq!(provider.received.len(), 1);
        assert_eq!(provider.received[0].poi_type.key(), "cafe");
    }

    #[test]
    fn test_direct_type_screen_over_listed_types() {
        let scope = SelectionScope::Types(vec![poi("restaurant"), poi("cafe")]);
        let mut controller =
            SelectionController::init_with_type(SelectionMode::PoiTypeScreen, scope, Recorder::default()).unwrap();

        assert_eq!(controller.state(), SelectionState::PoiTypeScreen);
        assert!(controller.category_rows().is_empty());
        assert!(controller.active_category().is_none());
        assert_eq!(type_keys(&controller), vec!["restaurant", "cafe"]);

        assert_eq!(controller.pick_type("restaurant"), SelectionState::Selected);
        let selection = controller.outcome().unwrap().selection().unwrap();
        assert_eq!(selection.poi_type.key(), "restaurant");
        assert!(selection.category.is_none());
        assert_eq!(controller.provider().received.len(), 1);
    }

    #[test]
    fn test_cancel_on_category_screen() {
        let mut controller = category_session(Recorder::default());

        assert_eq!(controller.handle(SelectionAction::Cancel), SelectionState::Cancelled);
        assert!(matches!(controller.outcome(), Some(SelectionOutcome::Cancelled)));
        assert!(controller.provider().received.is_empty());
    }

    #[test]
    fn test_back_returns_to_categories_and_discards_scope() {
        let mut controller = category_session(Recorder::default());

        controller.pick_category("Food");
        controller.search("caf");
        assert_eq!(controller.back(), SelectionState::CategoryScreen);
        assert!(controller.active_category().is_none());
        assert_eq!(controller.search_query(), "");
        assert_eq!(controller.category_rows().len(), 3);

        controller.pick_category("Shop");
        assert_eq!(type_keys(&controller), vec!["bakery"]);
        assert_eq!(controller.pick_type("bakery"), SelectionState::Selected);
    }

    #[test]
    fn test_back_from_first_screen_cancels() {
        let mut controller = category_session(Recorder::default());
        assert_eq!(controller.back(), SelectionState::Cancelled);

        let scope = SelectionScope::Types(vec![poi("cafe")]);
        let mut direct =
            SelectionController::init_with_type(SelectionMode::PoiTypeScreen, scope, Recorder::default()).unwrap();
        assert_eq!(direct.back(), SelectionState::Cancelled);
        assert!(direct.provider().received.is_empty());
    }

    #[test]
    fn test_terminal_state_is_final() {
        let mut controller = category_session(Recorder::default());
        controller.pick_category("Food");
        controller.pick_type("bar");

        assert_eq!(controller.cancel(), SelectionState::Selected);
        assert_eq!(controller.back(), SelectionState::Selected);
        assert_eq!(controller.pick_type("cafe"), SelectionState::Selected);
        assert_eq!(controller.handle(SelectionAction::PickCategory("Shop".into())), SelectionState::Selected);
        assert_eq!(controller.provider().received.len(), 1);
        assert_eq!(controller.provider().received[0].poi_type.key(), "bar");
    }

    #[test]
    fn test_invalid_actions_end_as_cancelled() {
        let mut controller = category_session(Recorder::default());
        assert_eq!(controller.pick_category("Tourism"), SelectionState::Cancelled);

        let mut controller = category_session(Recorder::default());
        assert_eq!(controller.pick_type("cafe"), SelectionState::Cancelled);

        let mut controller = category_session(Recorder::default());
        controller.pick_category("Food");
        assert_eq!(controller.pick_category("Shop"), SelectionState::Cancelled);

        let mut controller = category_session(Recorder::default());
        controller.pick_category("Food");
        assert_eq!(controller.pick_type("bakery"), SelectionState::Cancelled);
        assert!(controller.provider().received.is_empty());
    }

    #[test]
    fn test_empty_taxonomy_and_empty_category_render_empty() {
        let mut controller = SelectionController::init_with_type(
            SelectionMode::CategoryScreen,
            SelectionScope::Taxonomy(SharedTaxonomy::new(Taxonomy::new())),
            Recorder::default(),
        )
        .unwrap();
        assert_eq!(controller.state(), SelectionState::CategoryScreen);
        assert!(controller.category_rows().is_empty());
        assert_eq!(controller.cancel(), SelectionState::Cancelled);

        let mut controller = category_session(Recorder::default());
        assert_eq!(controller.pick_category("Emergency"), SelectionState::PoiTypeScreen);
        assert!(controller.type_rows().is_empty());

        let controller = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Types(Vec::new()),
            Recorder::default(),
        )
        .unwrap();
        assert!(controller.type_rows().is_empty());
    }

    #[test]
    fn test_search_filters_visible_rows() {
        let mut controller = category_session(Recorder::default());
        controller.pick_category("Food");

        controller.handle(SelectionAction::Search("CAF".into()));
        assert_eq!(type_keys(&controller), vec!["cafe"]);
        assert_eq!(controller.search_query(), "CAF");

        controller.search("zzz");
        assert!(controller.type_rows().is_empty());

        // hidden rows can still be picked by key
        assert_eq!(controller.pick_type("bar"), SelectionState::Selected);
    }

    #[test]
    fn test_search_on_category_screen_is_ignored() {
        let mut controller = category_session(Recorder::default());

        assert_eq!(controller.search("food"), SelectionState::CategoryScreen);
        assert_eq!(controller.search_query(), "");
        assert_eq!(controller.category_rows().len(), 3);
    }

    #[test]
    fn test_provider_restricts_types_and_marks_current() {
        let provider = Recorder {
            rejected: vec!["bar".to_string()],
            current_type: Some("cafe".to_string()),
            ..Recorder::default()
        };
        let mut controller = category_session(provider);

        assert_eq!(controller.category_rows()[0].type_count, 2);

        controller.pick_category("Food");
        assert_eq!(type_keys(&controller), vec!["restaurant", "cafe"]);
        let current: Vec<bool> = controller.type_rows().iter().map(|r| r.is_current).collect();
        assert_eq!(current, vec![false, true]);

        assert_eq!(controller.pick_type("bar"), SelectionState::Cancelled);
    }

    #[test]
    fn test_direct_type_screen_uses_provider_category() {
        let provider = Recorder {
            current_category: Some("Shop".to_string()),
            ..Recorder::default()
        };
        let controller = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy())),
            provider,
        )
        .unwrap();

        assert_eq!(controller.active_category().unwrap().key, "Shop");
        assert_eq!(type_keys(&controller), vec!["bakery"]);
    }

    #[test]
    fn test_direct_type_screen_without_category_lists_everything() {
        let controller = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy())),
            Recorder::default(),
        )
        .unwrap();

        assert_eq!(type_keys(&controller), vec!["restaurant", "cafe", "bar", "bakery"]);
    }

    #[test]
    fn test_direct_type_screen_with_unknown_category_fails() {
        let provider = Recorder {
            current_category: Some("Tourism".to_string()),
            ..Recorder::default()
        };
        let result = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy())),
            provider,
        );

        assert!(result.err().unwrap().is_invalid_argument());
    }

    #[test]
    fn test_listed_types_are_deduplicated() {
        let scope = SelectionScope::Types(vec![poi("cafe"), poi("bar"), poi("cafe")]);
        let controller =
            SelectionController::init_with_type(SelectionMode::PoiTypeScreen, scope, Recorder::default()).unwrap();

        assert_eq!(type_keys(&controller), vec!["cafe", "bar"]);
    }

    #[test]
    fn test_rows_are_snapshotted_on_screen_entry() {
        let shared = SharedTaxonomy::new(sample_taxonomy());
        let mut controller = SelectionController::init_with_type(
            SelectionMode::CategoryScreen,
            SelectionScope::Taxonomy(shared.clone()),
            Recorder::default(),
        )
        .unwrap();

        controller.pick_category("Food");
        shared.replace(Taxonomy::new());

        // the open screen keeps what it showed
        assert_eq!(type_keys(&controller), vec!["restaurant", "cafe", "bar"]);

        // going back re-reads the published taxonomy
        controller.back();
        assert!(controller.category_rows().is_empty());
    }

    #[test]
    fn test_category_removed_by_reload_cancels() {
        let shared = SharedTaxonomy::new(sample_taxonomy());
        let mut controller = SelectionController::init_with_type(
            SelectionMode::CategoryScreen,
            SelectionScope::Taxonomy(shared.clone()),
            Recorder::default(),
        )
        .unwrap();

        shared.replace(Taxonomy::new());
        assert_eq!(controller.pick_category("Food"), SelectionState::Cancelled);
    }

    #[test]
    fn test_edit_session_receives_tag() {
        let mut taxonomy = Taxonomy::new();
        let mut food = PoiCategory::new("Food").unwrap();
        let mut restaurants = PoiFilter::new("Restaurants", &food).unwrap();
        restaurants.add_type(Arc::new(PoiType::with_tag("cafe", "amenity", "cafe").unwrap()));
        food.add_filter(restaurants).unwrap();
        taxonomy.add_category(food).unwrap();

        let mut edit = EditSession::with_tags([("name", "Corner")]);
        let mut controller = SelectionController::init_with_type(
            SelectionMode::CategoryScreen,
            SelectionScope::Taxonomy(taxonomy.into()),
            &mut edit,
        )
        .unwrap();
        controller.pick_category("Food");
        controller.pick_type("cafe");
        drop(controller);

        assert_eq!(edit.tags().get("amenity"), Some(&"cafe".to_string()));
        assert_eq!(edit.category(), Some("Food"));
    }

    #[test]
    fn test_listed_type_pick_keeps_current_marker_reachable() {
        let taxonomy = sample_taxonomy();
        let restaurant = Arc::clone(taxonomy.find_type("restaurant").unwrap().poi_type);
        let bakery = Arc::clone(taxonomy.find_type("bakery").unwrap().poi_type);
        let shared = SharedTaxonomy::new(taxonomy);

        let mut edit = EditSession::new().with_current(Some("Food".to_string()), restaurant);
        let mut controller = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Types(vec![bakery]),
            &mut edit,
        )
        .unwrap();
        assert_eq!(controller.pick_type("bakery"), SelectionState::Selected);
        drop(controller);

        assert_eq!(edit.current_type(), Some("bakery"));
        assert_eq!(edit.current_category(), None);

        let controller = SelectionController::init_with_type(
            SelectionMode::PoiTypeScreen,
            SelectionScope::Taxonomy(shared),
            &mut edit,
        )
        .unwrap();
        let current: Vec<String> = controller
            .type_rows()
            .iter()
            .filter(|r| r.is_current)
            .map(|r| r.key().to_string())
            .collect();
        assert_eq!(current, vec!["bakery"]);
    }

    fn action_strategy() -> impl Strategy<Value = SelectionAction> {
        prop_oneof![
            3 => prop::sample::select(vec!["Food", "Shop", "Emergency", "Tourism"])
                .prop_map(|k| SelectionAction::PickCategory(k.to_string())),
            3 => prop::sample::select(vec!["restaurant", "cafe", "bar", "bakery", "volcano"])
                .prop_map(|k| SelectionAction::PickType(k.to_string())),
            1 => "[a-z]{0,3}".prop_map(SelectionAction::Search),
            3 => Just(SelectionAction::Back),
            1 => Just(SelectionAction::Cancel),
        ]
    }

    /// Every way a session can legally start
    #[derive(Debug, Clone, Copy)]
    enum Start {
        Categories,
        TypesOfTaxonomy,
        TypesOfCategory,
        ListedTypes,
    }

    fn start_strategy() -> impl Strategy<Value = Start> {
        prop_oneof![
            Just(Start::Categories),
            Just(Start::TypesOfTaxonomy),
            Just(Start::TypesOfCategory),
            Just(Start::ListedTypes),
        ]
    }

    fn session(start: Start) -> SelectionController<Recorder> {
        let shared = || SelectionScope::Taxonomy(SharedTaxonomy::new(sample_taxonomy()));
        let (mode, scope, provider) = match start {
            Start::Categories => (SelectionMode::CategoryScreen, shared(), Recorder::default()),
            Start::TypesOfTaxonomy => (SelectionMode::PoiTypeScreen, shared(), Recorder::default()),
            Start::TypesOfCategory => (
                SelectionMode::PoiTypeScreen,
                shared(),
                Recorder {
                    current_category: Some("Food".to_string()),
                    ..Recorder::default()
                },
            ),
            Start::ListedTypes => (
                SelectionMode::PoiTypeScreen,
                SelectionScope::Types(vec![poi("restaurant"), poi("bakery")]),
                Recorder::default(),
            ),
        };
        SelectionController::init_with_type(mode, scope, provider).unwrap()
    }

    proptest! {
        #[test]
        fn prop_exactly_one_terminal_outcome(
            start in start_strategy(),
            actions in prop::collection::vec(action_strategy(), 0..24),
        ) {
            let mut controller = session(start);
            prop_assert!(!controller.is_finished());
            let mut first_terminal: Option<SelectionState> = None;

            for action in actions {
                let state = controller.handle(action);
                if let Some(terminal) = first_terminal {
                    prop_assert_eq!(state, terminal);
                } else if state.is_terminal() {
                    first_terminal = Some(state);
                }
            }

            let end = controller.cancel();
            prop_assert!(end.is_terminal());
            if let Some(terminal) = first_terminal {
                prop_assert_eq!(end, terminal);
            }

            let received = controller.provider().received.len();
            match controller.outcome() {
                Some(SelectionOutcome::Selected(_)) => prop_assert_eq!(received, 1),
                Some(SelectionOutcome::Cancelled) => prop_assert_eq!(received, 0),
                None => prop_assert!(false, "session finished without an outcome"),
            }
        }
    }
}
