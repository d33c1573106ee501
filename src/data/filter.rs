use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::SeverityCategory;
use super::model::{CleanedEvent, Dataset};

/// Selection value that disables the location predicate.
pub const ALL_LOCATIONS: &str = "All";

// ---------------------------------------------------------------------------
// Filter configuration
// ---------------------------------------------------------------------------

/// Inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days covered, both ends included. Zero if reversed.
    pub fn days(&self) -> i64 {
        ((self.end - self.start).num_days() + 1).max(0)
    }
}

/// Location predicate: either disabled or set membership.
///
/// Serialized as `"All"` or `{"only": [...]}`. A bare list is accepted on
/// input too, and any selection containing `"All"` reads back as `All`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LocationRepr", into = "LocationRepr")]
pub enum LocationFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

/// On-disk shapes of a [`LocationFilter`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LocationRepr {
    Sentinel(String),
    List(Vec<String>),
    Tagged(TaggedLocations),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaggedLocations {
    Only(BTreeSet<String>),
}

impl TryFrom<LocationRepr> for LocationFilter {
    type Error = String;

    fn try_from(repr: LocationRepr) -> Result<Self, Self::Error> {
        match repr {
            LocationRepr::Sentinel(s) if s.eq_ignore_ascii_case(ALL_LOCATIONS) => Ok(LocationFilter::All),
            LocationRepr::Sentinel(s) => Err(format!(
                "unknown location selection '{s}', expected \"{ALL_LOCATIONS}\" or a list"
            )),
            LocationRepr::List(list) => Ok(LocationFilter::from_selection(list)),
            LocationRepr::Tagged(TaggedLocations::Only(set)) => Ok(LocationFilter::from_selection(set)),
        }
    }
}

impl From<LocationFilter> for LocationRepr {
    fn from(filter: LocationFilter) -> Self {
        match filter {
            LocationFilter::All => LocationRepr::Sentinel(ALL_LOCATIONS.to_string()),
            LocationFilter::Only(set) => LocationRepr::Tagged(TaggedLocations::Only(set)),
        }
    }
}

impl LocationFilter {
    /// Build from a UI-style selection, where picking `"All"` disables the
    /// predicate regardless of what else is picked.
    pub fn from_selection<I, S>(selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = selection.into_iter().map(Into::into).collect();
        if set.contains(ALL_LOCATIONS) {
            LocationFilter::All
        } else {
            LocationFilter::Only(set)
        }
    }

    pub fn matches(&self, location: &str) -> bool {
        match self {
            LocationFilter::All => true,
            LocationFilter::Only(set) => set.contains(ALL_LOCATIONS) || set.contains(location),
        }
    }
}

/// Every user-selectable predicate of the dashboard, as plain data.
///
/// All predicates are conjoined. An empty set in any dimension matches no
/// rows; only [`LocationFilter::All`] switches a predicate off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub date_range: DateRange,
    pub disaster_types: BTreeSet<String>,
    pub severity_categories: BTreeSet<SeverityCategory>,
    #[serde(default)]
    pub locations: LocationFilter,
    pub aid_types: BTreeSet<String>,
    #[serde(default)]
    pub major_only: bool,
}

impl FilterConfig {
    /// A configuration that selects every row of `dataset`.
    pub fn all(dataset: &Dataset) -> Self {
        let (start, end) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        FilterConfig {
            date_range: DateRange { start, end },
            disaster_types: dataset.disaster_types().clone(),
            severity_categories: SeverityCategory::ALL.into_iter().collect(),
            locations: LocationFilter::All,
            aid_types: dataset.aid_types().clone(),
            major_only: false,
        }
    }

    pub fn matches(&self, event: &CleanedEvent) -> bool {
        let e = &event.event;
        self.date_range.contains(e.date)
            && self.disaster_types.contains(&e.disaster_type)
            && self
                .severity_categories
                .contains(&event.derived.severity_category)
            && self.locations.matches(&e.location)
            && self.aid_types.contains(&e.aid_provided)
            && (!self.major_only || e.is_major_disaster)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// View – a filtered, read-only subsequence of a dataset
// ---------------------------------------------------------------------------

/// Rows of a dataset selected by a filter, in original order.
#[derive(Debug, Clone)]
pub struct View<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> View<'a> {
    /// A view over every row.
    pub fn full(dataset: &'a Dataset) -> Self {
        View {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// A view over the given row indices. Out-of-range indices are skipped.
    pub fn from_indices(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        let indices = indices.into_iter().filter(|&i| i < dataset.len()).collect();
        View { dataset, indices }
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CleanedEvent> + '_ {
        let events = self.dataset.events();
        self.indices.iter().map(move |&i| &events[i])
    }

    /// Narrow this view further; the result is still a view of the same dataset.
    pub fn refine(&self, config: &FilterConfig) -> View<'a> {
        let events = self.dataset.events();
        View {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| config.matches(&events[i]))
                .collect(),
        }
    }
}

/// Return indices of events that pass every predicate of `config`.
pub fn filtered_indices(dataset: &Dataset, config: &FilterConfig) -> Vec<usize> {
    dataset
        .events()
        .iter()
        .enumerate()
        .filter(|(_, ev)| config.matches(ev))
        .map(|(i, _)| i)
        .collect()
}

/// Apply `config` to `dataset`, producing a new view. The dataset is untouched.
pub fn filter<'a>(dataset: &'a Dataset, config: &FilterConfig) -> View<'a> {
    View {
        dataset,
        indices: filtered_indices(dataset, config),
    }
}
