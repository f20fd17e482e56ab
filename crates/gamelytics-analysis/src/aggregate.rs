//! Grouped aggregates over a filtered view.
//!
//! All helpers return ordered, NaN-free output: an empty view yields an empty
//! result, and means over empty groups never occur because groups only exist
//! when they have members.

use std::collections::BTreeMap;

use gamelytics_data::{FilteredView, PlayerRecord};
use gamelytics_stats::descriptive::ratio_or_zero;
use serde::Serialize;

/// Count, mean and sum of a value for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary<K> {
    pub key: K,
    pub count: usize,
    pub mean: f64,
    pub sum: f64,
}

/// Occurrences of one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount<K> {
    pub key: K,
    pub count: usize,
    /// Fraction of the view, in `[0, 1]`.
    pub share: f64,
}

/// Groups the view by `key` and summarizes `value` per group, ordered by key.
#[expect(clippy::cast_precision_loss)]
pub fn group_by<K, FK, FV>(
    view: &FilteredView<'_>,
    mut key: FK,
    mut value: FV,
) -> Vec<GroupSummary<K>>
where
    K: Ord,
    FK: FnMut(&PlayerRecord) -> K,
    FV: FnMut(&PlayerRecord) -> f64,
{
    let mut groups: BTreeMap<K, (usize, f64)> = BTreeMap::new();
    for record in view {
        let entry = groups.entry(key(record)).or_default();
        entry.0 += 1;
        entry.1 += value(record);
    }
    groups
        .into_iter()
        .map(|(key, (count, sum))| GroupSummary {
            key,
            count,
            mean: sum / count as f64,
            sum,
        })
        .collect()
}

/// Mean of `value` per group, ordered by key.
pub fn mean_by<K, FK, FV>(view: &FilteredView<'_>, key: FK, value: FV) -> Vec<(K, f64)>
where
    K: Ord,
    FK: FnMut(&PlayerRecord) -> K,
    FV: FnMut(&PlayerRecord) -> f64,
{
    group_by(view, key, value)
        .into_iter()
        .map(|group| (group.key, group.mean))
        .collect()
}

/// Occurrence counts ordered by count descending, then key.
///
/// ```
/// # use gamelytics_data::FilteredView;
/// # use gamelytics_analysis::aggregate::value_counts;
/// let view = FilteredView::default();
/// assert!(value_counts(&view, |r| r.device.clone()).is_empty());
/// ```
#[expect(clippy::cast_precision_loss)]
pub fn value_counts<K, FK>(view: &FilteredView<'_>, mut key: FK) -> Vec<ValueCount<K>>
where
    K: Ord,
    FK: FnMut(&PlayerRecord) -> K,
{
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for record in view {
        *counts.entry(key(record)).or_default() += 1;
    }
    let total = view.len() as f64;
    let mut counts = counts
        .into_iter()
        .map(|(key, count)| ValueCount {
            key,
            count,
            share: ratio_or_zero(count as f64, total),
        })
        .collect::<Vec<_>>();
    // stable: equal counts stay in key order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Collects `value` for every record of the view.
pub fn values_of<FV>(view: &FilteredView<'_>, value: FV) -> Vec<f64>
where
    FV: FnMut(&PlayerRecord) -> f64,
{
    view.iter().map(value).collect()
}

/// Number of records satisfying `predicate`.
pub fn count_where<F>(view: &FilteredView<'_>, mut predicate: F) -> usize
where
    F: FnMut(&PlayerRecord) -> bool,
{
    view.iter().filter(|record| predicate(*record)).count()
}

#[cfg(test)]
mod tests {
    use gamelytics_data::Dataset;

    use super::*;
    use crate::fixtures::player;

    fn record(id: u64, device: &str, spent: f64) -> PlayerRecord {
        PlayerRecord {
            device: device.to_owned(),
            has_purchased: spent > 0.0,
            total_spent_usd: spent,
            ..player(id)
        }
    }

    #[test]
    fn test_group_by_orders_keys_and_summarizes() {
        let dataset = Dataset::new(vec![
            record(1, "PC", 10.0),
            record(2, "Android", 0.0),
            record(3, "PC", 20.0),
        ]);
        let view = FilteredView::all(&dataset);
        let groups = group_by(&view, |r| r.device.clone(), |r| r.total_spent_usd);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Android");
        assert_eq!(groups[1].count, 2);
        assert_eq!(groups[1].sum, 30.0);
        assert_eq!(groups[1].mean, 15.0);
    }

    #[test]
    fn test_value_counts_by_count_then_key() {
        let dataset = Dataset::new(vec![
            record(1, "iOS", 0.0),
            record(2, "Android", 0.0),
            record(3, "PC", 0.0),
            record(4, "PC", 0.0),
        ]);
        let view = FilteredView::all(&dataset);
        let counts = value_counts(&view, |r| r.device.clone());
        let keys = counts.iter().map(|c| c.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, ["PC", "Android", "iOS"]);
        assert_eq!(counts[0].share, 0.5);
    }

    #[test]
    fn test_empty_view_gives_empty_output() {
        let view = FilteredView::default();
        assert!(group_by(&view, |r| r.age, |r| r.play_time_hours).is_empty());
        assert!(mean_by(&view, |r| r.age, |r| r.play_time_hours).is_empty());
        assert_eq!(count_where(&view, |r| r.is_active), 0);
    }
}
