//! Filter engine: narrows the dataset to the working view.
//!
//! A [`FilterSpec`] is a conjunction of optional constraints. Wildcard fields
//! place no constraint, so the default spec selects every record. Applying a
//! spec never fails and preserves dataset order; an empty view is a valid
//! result.
//!
//! # Examples
//!
//! ```
//! use gamelytics_data::{Dataset, FilterSpec, Selection};
//!
//! let dataset = Dataset::default();
//! let spec = FilterSpec {
//!     genre: "Strategy".parse().unwrap(),
//!     ..FilterSpec::default()
//! };
//! assert_eq!(spec.genre, Selection::Only("Strategy".to_owned()));
//! assert!(spec.apply(&dataset).is_empty());
//! ```

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    dataset::Dataset,
    player::{GameDifficulty, PlayerRecord},
};

const ALL: &str = "All";
/// Parse token of [`LocationFilter::Other`], distinct from any real location
/// name such as "Other".
pub const OTHER_LOCATIONS_TOKEN: &str = "outside-top";
const OTHER_LOCATIONS_LABEL: &str = "Outside top 10";

/// A categorical constraint: everything, or one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T> Selection<T> {
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    #[must_use]
    pub fn as_only(&self) -> Option<&T> {
        match self {
            Self::All => None,
            Self::Only(value) => Some(value),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(value) => value.fmt(f),
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid selection: {value:?}")]
pub struct ParseSelectionError {
    #[error(not(source))]
    pub value: String,
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = ParseSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(ALL) {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only).map_err(|_| ParseSelectionError {
            value: s.to_owned(),
        })
    }
}

/// Location constraint; `Other` selects locations outside the dataset's most
/// frequent ones.
///
/// The bucket parses from [`OTHER_LOCATIONS_TOKEN`] or its display label, so
/// a real location called "Other" stays selectable.
///
/// ```
/// use gamelytics_data::LocationFilter;
///
/// assert_eq!("outside-top".parse::<LocationFilter>().unwrap(), LocationFilter::Other);
/// assert_eq!(
///     "Other".parse::<LocationFilter>().unwrap(),
///     LocationFilter::Only("Other".to_owned())
/// );
/// assert_ne!(LocationFilter::Other.to_string(), "Other");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LocationFilter {
    #[default]
    All,
    Only(String),
    Other,
}

impl fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(location) => f.write_str(location),
            Self::Other => f.write_str(OTHER_LOCATIONS_LABEL),
        }
    }
}

impl FromStr for LocationFilter {
    type Err = ParseSelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseSelectionError { value: s.to_owned() });
        }
        Ok(if s.eq_ignore_ascii_case(ALL) {
            Self::All
        } else if s.eq_ignore_ascii_case(OTHER_LOCATIONS_TOKEN)
            || s.eq_ignore_ascii_case(OTHER_LOCATIONS_LABEL)
        {
            Self::Other
        } else {
            Self::Only(s.to_owned())
        })
    }
}

/// Conjunction of constraints selecting the working view.
///
/// Implements `Hash + Eq` so that it can key memoized results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FilterSpec {
    pub genre: Selection<String>,
    pub difficulty: Selection<GameDifficulty>,
    pub device: Selection<String>,
    pub location: LocationFilter,
    /// Inclusive lower bound on the signup date.
    pub signup_from: Option<NaiveDate>,
    /// Inclusive upper bound on the signup date.
    pub signup_to: Option<NaiveDate>,
}

impl FilterSpec {
    /// Whether no field constrains the view.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `record` satisfies every constraint.
    ///
    /// Category names compare case-insensitively.
    #[must_use]
    pub fn matches(&self, dataset: &Dataset, record: &PlayerRecord) -> bool {
        let same = |expected: &String, actual: &str| expected.eq_ignore_ascii_case(actual);
        self.genre
            .as_only()
            .is_none_or(|genre| same(genre, &record.game_genre))
            && self
                .difficulty
                .as_only()
                .is_none_or(|difficulty| *difficulty == record.game_difficulty)
            && self
                .device
                .as_only()
                .is_none_or(|device| same(device, &record.device))
            && match &self.location {
                LocationFilter::All => true,
                LocationFilter::Only(location) => same(location, &record.location),
                LocationFilter::Other => !dataset.is_top_location(&record.location),
            }
            && self.signup_from.is_none_or(|from| record.signup_date >= from)
            && self.signup_to.is_none_or(|to| record.signup_date <= to)
    }

    /// Indices of the matching records, ascending.
    #[must_use]
    pub fn matching_indices(&self, dataset: &Dataset) -> Vec<usize> {
        dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(dataset, record))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Returns the view of the records satisfying this spec, in dataset order.
    #[must_use]
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        if self.is_wildcard() {
            return FilteredView::all(dataset);
        }
        FilteredView {
            records: dataset
                .records()
                .iter()
                .filter(|record| self.matches(dataset, record))
                .collect(),
        }
    }
}

/// Borrowed subsequence of a dataset.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    records: Vec<&'a PlayerRecord>,
}

impl<'a> FilteredView<'a> {
    #[must_use]
    pub fn all(dataset: &'a Dataset) -> Self {
        Self {
            records: dataset.records().iter().collect(),
        }
    }

    /// Builds a view from record indices, skipping indices out of range.
    #[must_use]
    pub fn from_indices(dataset: &'a Dataset, indices: &[usize]) -> Self {
        Self {
            records: indices
                .iter()
                .filter_map(|&idx| dataset.records().get(idx))
                .collect(),
        }
    }

    #[must_use]
    pub fn records(&self) -> &[&'a PlayerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a PlayerRecord> + '_ {
        self.records.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Narrows this view further.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&PlayerRecord) -> bool,
    {
        Self {
            records: self
                .records
                .iter()
                .copied()
                .filter(|record| predicate(*record))
                .collect(),
        }
    }
}

impl<'v, 'a> IntoIterator for &'v FilteredView<'a> {
    type Item = &'a PlayerRecord;
    type IntoIter = std::iter::Copied<std::slice::Iter<'v, &'a PlayerRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter().copied()
    }
}
