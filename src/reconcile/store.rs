use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::Record;
use crate::layout::{BarGeometry, BarTarget, Easing, Tween};

use super::Reconciliation;

/// Rendered state of one entity between its ENTER and EXIT.
///
/// `instance` is unique per ENTER: an entity that exits and later re-enters
/// gets a fresh instance with the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualElement {
    pub key: String,
    pub instance: u64,
    pub rank: usize,
    pub position: (f64, f64),
    pub extent: f64,
    pub thickness: f64,
    pub value: f64,
    pub display_value: String,
    pub category_color: String,
    pub icon_ref: Option<String>,
    pub tween: Tween,
}

impl VisualElement {
    /// Geometry at `now_ms`, part-way through the current transition.
    #[must_use]
    pub fn sample(&self, now_ms: f64) -> BarGeometry {
        self.tween.sample(now_ms)
    }
}

/// Keyed element map that applies a [`Reconciliation`] in one step.
///
/// After [`ElementStore::apply`] the iteration order equals the frame's rank
/// order, exits are gone and every surviving element points at its new
/// target.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: IndexMap<String, VisualElement>,
    next_instance: u64,
}

/// Target data for one element of the incoming frame.
pub(crate) struct ElementUpdate<'a> {
    pub record: &'a Record,
    pub target: BarTarget,
    pub display_value: String,
}

impl ElementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements(&self) -> &IndexMap<String, VisualElement> {
        &self.elements
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&VisualElement> {
        self.elements.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Applies `plan` and returns the removed elements in exit order.
    ///
    /// `updates` must hold an entry for every entering and updating key.
    /// Entering bars start at zero extent in their target slot; updating bars
    /// retarget from wherever they are at `now_ms`.
    pub(crate) fn apply(
        &mut self,
        plan: &Reconciliation,
        mut updates: IndexMap<String, ElementUpdate<'_>>,
        now_ms: f64,
        duration_ms: f64,
        easing: Easing,
    ) -> Vec<VisualElement> {
        let exited = plan
            .exiting
            .iter()
            .filter_map(|key| self.elements.shift_remove(key))
            .collect();

        for key in &plan.updating {
            let update = updates
                .shift_remove(key)
                .unwrap_or_else(|| panic!("missing layout target for updating key `{key}`"));
            let element = self
                .elements
                .get_mut(key)
                .unwrap_or_else(|| panic!("updating key `{key}` has no element"));
            element
                .tween
                .retarget(update.target.geometry(), now_ms, duration_ms);
            element.tween.easing = easing;
            refresh(element, update);
        }

        for key in &plan.entering {
            let update = updates
                .shift_remove(key)
                .unwrap_or_else(|| panic!("missing layout target for entering key `{key}`"));
            let start = BarGeometry::new(update.target.y, 0.0);
            let mut element = VisualElement {
                key: key.clone(),
                instance: self.next_instance,
                rank: 0,
                position: (0.0, 0.0),
                extent: 0.0,
                thickness: 0.0,
                value: 0.0,
                display_value: String::new(),
                category_color: String::new(),
                icon_ref: None,
                tween: Tween::new(start, update.target.geometry(), now_ms, duration_ms)
                    .with_easing(easing),
            };
            self.next_instance += 1;
            refresh(&mut element, update);
            self.elements.insert(key.clone(), element);
        }

        self.elements.sort_by(|_, a, _, b| a.rank.cmp(&b.rank));
        exited
    }
}

fn refresh(element: &mut VisualElement, update: ElementUpdate<'_>) {
    element.rank = update.target.rank;
    element.position = (0.0, update.target.y);
    element.extent = update.target.extent;
    element.thickness = update.target.thickness;
    element.value = update.record.primary_value;
    element.display_value = update.display_value;
    element.category_color.clone_from(&update.record.category_color);
    element.icon_ref.clone_from(&update.record.icon_ref);
}
