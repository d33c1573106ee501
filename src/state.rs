use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use disaster_dash::data::category::SeverityCategory;
use disaster_dash::data::filter::{FilterConfig, LocationFilter, View, filtered_indices};
use disaster_dash::data::loader::DatasetCache;
use disaster_dash::data::model::Dataset;
use disaster_dash::data::stats::Summary;

use crate::color::ColorMap;

/// Number of locations offered in the location filter.
pub const LOCATION_CHOICES: usize = 20;

// ---------------------------------------------------------------------------
// Dashboard pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Temporal,
    DisasterTypes,
    Geographic,
    SeverityImpact,
    Response,
    Correlations,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::Overview,
        Page::Temporal,
        Page::DisasterTypes,
        Page::Geographic,
        Page::SeverityImpact,
        Page::Response,
        Page::Correlations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Temporal => "Temporal",
            Page::DisasterTypes => "Disaster Types",
            Page::Geographic => "Geographic",
            Page::SeverityImpact => "Severity & Impact",
            Page::Response => "Response",
            Page::Correlations => "Correlations",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Cache of the currently open file (None until user loads a file).
    cache: Option<DatasetCache>,

    /// Shared handle to the loaded dataset.
    pub dataset: Option<Arc<Dataset>>,

    /// Filter selections edited by the side panel.
    pub filters: FilterConfig,

    /// The filters `visible_indices` was computed with.
    applied: Option<FilterConfig>,

    /// Indices of events passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Summary of the visible events (cached).
    pub summary: Option<Summary>,

    /// Locations offered in the filter panel (most frequent first).
    pub location_choices: Vec<String>,

    /// Colours per disaster type.
    pub type_colors: Option<ColorMap>,

    pub page: Page,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: None,
            dataset: None,
            filters: FilterConfig::all(&Dataset::default()),
            applied: None,
            visible_indices: Vec::new(),
            summary: None,
            location_choices: Vec::new(),
            type_colors: None,
            page: Page::Overview,
            status_message: None,
        }
    }
}

impl AppState {
    /// Open `path` and make it the active dataset. Re-opening the same path
    /// reuses the cached dataset.
    pub fn open(&mut self, path: &Path) {
        let same_file = self.cache.as_ref().is_some_and(|c| c.path() == path);
        if !same_file {
            self.cache = Some(DatasetCache::new(path));
        }
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.get() {
            Ok(dataset) => {
                log::info!(
                    "Opened {} with {} events, {} disaster types, {} locations",
                    path.display(),
                    dataset.len(),
                    dataset.disaster_types().len(),
                    dataset.locations().len()
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                self.cache = None;
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and colours.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.filters = FilterConfig::all(&dataset);
        self.applied = None;
        self.location_choices = dataset.top_locations(LOCATION_CHOICES);
        self.type_colors = Some(ColorMap::new(dataset.disaster_types()));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the summary if the filters changed.
    pub fn refilter(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        if self.applied.as_ref() == Some(&self.filters) {
            return;
        }
        self.visible_indices = filtered_indices(ds, &self.filters);
        self.summary = Some(Summary::compute(
            self.visible_indices.iter().filter_map(|&i| ds.get(i)),
        ));
        log::debug!(
            "Filters matched {} of {} events",
            self.visible_indices.len(),
            ds.len()
        );
        self.applied = Some(self.filters.clone());
    }

    /// The visible events as a view of the shared dataset.
    pub fn view(&self) -> Option<View<'_>> {
        let ds = self.dataset.as_deref()?;
        Some(View::from_indices(ds, self.visible_indices.clone()))
    }

    /// Restore the "everything selected" filters.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters = FilterConfig::all(ds);
        }
        self.refilter();
    }

    pub fn toggle_severity(&mut self, category: SeverityCategory, on: bool) {
        toggle(&mut self.filters.severity_categories, category, on);
    }

    /// Switch the location filter between "All" and an explicit set that
    /// starts out with every offered location.
    pub fn set_all_locations(&mut self, all: bool) {
        self.filters.locations = if all {
            LocationFilter::All
        } else {
            LocationFilter::Only(self.location_choices.iter().cloned().collect())
        };
    }
}

/// Insert or remove `value` depending on `on`.
pub fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T, on: bool) {
    if on {
        set.insert(value);
    } else {
        set.remove(&value);
    }
}
