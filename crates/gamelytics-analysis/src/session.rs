//! Session context with memoized filtering and export.
//!
//! A [`Session`] owns the loaded dataset for the lifetime of the dashboard.
//! Filtering and CSV serialization are pure functions of the [`FilterSpec`],
//! so their results are cached per spec and never invalidated.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use gamelytics_data::{Dataset, FilterSpec, FilteredView, csv_io};

#[derive(Debug, Default)]
pub struct Session {
    dataset: Dataset,
    indices: RefCell<HashMap<FilterSpec, Rc<[usize]>>>,
    exports: RefCell<HashMap<FilterSpec, Rc<[u8]>>>,
}

impl Session {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            indices: RefCell::default(),
            exports: RefCell::default(),
        }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn indices(&self, spec: &FilterSpec) -> Rc<[usize]> {
        if let Some(indices) = self.indices.borrow().get(spec) {
            return Rc::clone(indices);
        }
        let indices: Rc<[usize]> = spec.matching_indices(&self.dataset).into();
        log::debug!("Filter {spec:?} matched {} records", indices.len());
        self.indices
            .borrow_mut()
            .insert(spec.clone(), Rc::clone(&indices));
        indices
    }

    /// Records of the dataset matching `spec`, in dataset order.
    #[must_use]
    pub fn view(&self, spec: &FilterSpec) -> FilteredView<'_> {
        if spec.is_wildcard() {
            return FilteredView::all(&self.dataset);
        }
        FilteredView::from_indices(&self.dataset, &self.indices(spec))
    }

    /// CSV bytes of the view selected by `spec`, header included.
    ///
    /// Equal specs always yield identical bytes.
    pub fn export_csv(&self, spec: &FilterSpec) -> Result<Rc<[u8]>, csv::Error> {
        if let Some(bytes) = self.exports.borrow().get(spec) {
            return Ok(Rc::clone(bytes));
        }
        let bytes: Rc<[u8]> = csv_io::to_csv_bytes(&self.view(spec))?.into();
        self.exports
            .borrow_mut()
            .insert(spec.clone(), Rc::clone(&bytes));
        Ok(bytes)
    }

    /// Number of distinct filter specs cached so far.
    #[cfg(test)]
    fn cached_filters(&self) -> usize {
        self.indices.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use gamelytics_data::{PlayerRecord, Selection, csv_io::read_dataset};

    use super::*;
    use crate::fixtures::player;

    fn session() -> Session {
        let records = (0..12_u64)
            .map(|id| PlayerRecord {
                game_genre: ["Puzzle", "Strategy", "RPG"][usize::try_from(id % 3).unwrap()]
                    .to_owned(),
                ..player(id)
            })
            .collect();
        Session::new(Dataset::new(records))
    }

    fn strategy() -> FilterSpec {
        FilterSpec {
            genre: Selection::Only("Strategy".to_owned()),
            ..FilterSpec::default()
        }
    }

    #[test]
    fn test_view_is_cached_per_spec() {
        let session = session();
        let first = session.view(&strategy());
        assert_eq!(first.len(), 4);
        assert_eq!(session.cached_filters(), 1);
        let second = session.view(&strategy());
        assert_eq!(session.cached_filters(), 1);
        let ids = |view: &FilteredView<'_>| view.iter().map(|r| r.player_id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ids(&first), [1, 4, 7, 10]);
    }

    #[test]
    fn test_wildcard_view_skips_cache() {
        let session = session();
        assert_eq!(session.view(&FilterSpec::default()).len(), 12);
        assert_eq!(session.cached_filters(), 0);
    }

    #[test]
    fn test_export_is_deterministic_and_reloadable() {
        let session = session();
        let first = session.export_csv(&strategy()).unwrap();
        let second = session.export_csv(&strategy()).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let fresh = Session::new(session.dataset().clone());
        assert_eq!(*fresh.export_csv(&strategy()).unwrap(), *first);

        let reloaded = read_dataset(&*first).unwrap();
        let expected = session
            .view(&strategy())
            .iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(reloaded.records(), expected.as_slice());
    }

    #[test]
    fn test_empty_view_exports_header_only() {
        let session = session();
        let spec = FilterSpec {
            genre: Selection::Only("Racing".to_owned()),
            ..FilterSpec::default()
        };
        let bytes = session.export_csv(&spec).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("PlayerID,"));
    }
}
