use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use crate::player::PlayerRecord;

/// Number of most frequent locations listed individually; the rest are
/// grouped into the [`LocationFilter::Other`](crate::LocationFilter::Other) bucket.
pub const TOP_LOCATION_COUNT: usize = 10;

/// The loaded dataset: all player records in file order.
///
/// Read-only for the lifetime of a session. The most frequent locations are
/// computed once on construction so that the outside-top-10 location filter
/// does not rescan the dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<PlayerRecord>,
    top_locations: Vec<String>,
}

impl Dataset {
    #[must_use]
    pub fn new(records: Vec<PlayerRecord>) -> Self {
        let top_locations = most_frequent(records.iter().map(|r| r.location.as_str()))
            .into_iter()
            .take(TOP_LOCATION_COUNT)
            .map(str::to_owned)
            .collect();
        Self {
            records,
            top_locations,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most frequent locations, by count descending then name.
    #[must_use]
    pub fn top_locations(&self) -> &[String] {
        &self.top_locations
    }

    #[must_use]
    pub fn is_top_location(&self, location: &str) -> bool {
        self.top_locations.iter().any(|l| l == location)
    }

    /// Sorted distinct values of a categorical field.
    ///
    /// ```
    /// # use gamelytics_data::Dataset;
    /// let dataset = Dataset::default();
    /// assert!(dataset.distinct_values(|r| r.device.as_str()).is_empty());
    /// ```
    pub fn distinct_values<F>(&self, key: F) -> Vec<String>
    where
        F: Fn(&PlayerRecord) -> &str,
    {
        self.records
            .iter()
            .map(key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Earliest and latest signup date, `None` for an empty dataset.
    #[must_use]
    pub fn signup_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.signup_date).min()?;
        let last = self.records.iter().map(|r| r.signup_date).max()?;
        Some((first, last))
    }
}

fn most_frequent<'a, I>(values: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = HashMap::<&str, usize>::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut counts = counts.into_iter().collect::<Vec<_>>();
    counts.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    counts.into_iter().map(|(name, _)| name).collect()
}
