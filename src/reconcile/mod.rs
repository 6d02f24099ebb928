//! Keyed enter/update/exit reconciliation between rendered elements and the
//! next frame.
//!
//! [`reconcile`] is a pure function over its two inputs. Callers apply the
//! result through [`ElementStore`] (or their own map) before the next call.

mod store;

pub use store::{ElementStore, VisualElement};
pub(crate) use store::ElementUpdate;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::Frame;

/// Partition of the union of previous and next keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Keys new in the next frame, in its rank order.
    pub entering: Vec<String>,
    /// Keys present on both sides, in the next frame's rank order.
    pub updating: Vec<String>,
    /// Keys absent from the next frame, in previous element order.
    pub exiting: Vec<String>,
}

impl Reconciliation {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entering.is_empty() && self.updating.is_empty() && self.exiting.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.entering.len() + self.updating.len() + self.exiting.len()
    }

    /// Checks that every key of `previous ∪ next` sits in exactly one set.
    #[must_use]
    pub fn is_partition_of<'a, P, N>(&self, previous: P, next: N) -> bool
    where
        P: IntoIterator<Item = &'a str>,
        N: IntoIterator<Item = &'a str>,
    {
        let union: IndexSet<&str> = previous.into_iter().chain(next).collect();
        let mut seen: IndexSet<&str> = IndexSet::with_capacity(self.total());
        for key in self
            .entering
            .iter()
            .chain(&self.updating)
            .chain(&self.exiting)
        {
            if !seen.insert(key.as_str()) {
                return false;
            }
        }
        seen.len() == union.len() && union.iter().all(|key| seen.contains(key))
    }
}

/// Computes the ENTER/UPDATE/EXIT sets for moving `previous` onto `next`.
#[must_use]
pub fn reconcile<V>(previous: &IndexMap<String, V>, next: &Frame) -> Reconciliation {
    let next_keys: IndexSet<&str> = next.keys().collect();
    debug_assert_eq!(
        next_keys.len(),
        next.len(),
        "frame {} repeats an entity key",
        next.key
    );

    let mut result = Reconciliation::default();
    for key in &next_keys {
        if previous.contains_key(*key) {
            result.updating.push((*key).to_owned());
        } else {
            result.entering.push((*key).to_owned());
        }
    }
    result.exiting = previous
        .keys()
        .filter(|key| !next_keys.contains(key.as_str()))
        .cloned()
        .collect();

    debug_assert!(
        result.is_partition_of(previous.keys().map(String::as_str), next_keys.iter().copied()),
        "reconciliation for frame {} is not a partition",
        next.key
    );
    result
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::reconcile;
    use crate::core::{Frame, PeriodKey, Record};

    fn frame(year: i32, entities: &[(&str, f64)]) -> Frame {
        Frame {
            key: PeriodKey::year(year),
            entities: entities
                .iter()
                .map(|(name, value)| Record::new(*name, PeriodKey::year(year), *value))
                .collect(),
            rank_limit: None,
        }
    }

    #[test]
    fn first_frame_enters_everything() {
        let previous: IndexMap<String, ()> = IndexMap::new();
        let result = reconcile(&previous, &frame(2020, &[("A", 2.0), ("B", 1.0)]));
        assert_eq!(result.entering, vec!["A", "B"]);
        assert!(result.updating.is_empty());
        assert!(result.exiting.is_empty());
    }

    #[test]
    fn updating_follows_next_rank_order() {
        let mut previous = IndexMap::new();
        previous.insert("A".to_owned(), ());
        previous.insert("B".to_owned(), ());
        previous.insert("C".to_owned(), ());

        let result = reconcile(&previous, &frame(2021, &[("C", 9.0), ("D", 5.0), ("A", 1.0)]));
        assert_eq!(result.updating, vec!["C", "A"]);
        assert_eq!(result.entering, vec!["D"]);
        assert_eq!(result.exiting, vec!["B"]);
        assert!(result.is_partition_of(
            previous.keys().map(String::as_str),
            ["C", "D", "A"].into_iter()
        ));
    }

    #[test]
    fn empty_next_frame_exits_everything() {
        let mut previous = IndexMap::new();
        previous.insert("A".to_owned(), 1);
        let result = reconcile(&previous, &frame(2022, &[]));
        assert_eq!(result.exiting, vec!["A"]);
        assert_eq!(result.total(), 1);
    }
}
