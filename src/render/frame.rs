use serde::{Deserialize, Serialize};

use crate::core::PeriodKey;
use crate::error::{RaceError, RaceResult};
use crate::layout::BarGeometry;
use crate::reconcile::VisualElement;

/// Geometry and label of one element as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub key: String,
    pub instance: u64,
    pub rank: usize,
    /// Geometry at the start of the transition.
    pub from: BarGeometry,
    /// Final target geometry.
    pub to: BarGeometry,
    pub thickness: f64,
    pub display_value: String,
    pub category_color: String,
    pub icon_ref: Option<String>,
}

impl ElementFrame {
    #[must_use]
    pub fn from_element(element: &VisualElement) -> Self {
        Self {
            key: element.key.clone(),
            instance: element.instance,
            rank: element.rank,
            from: element.tween.from,
            to: element.tween.to,
            thickness: element.thickness,
            display_value: element.display_value.clone(),
            category_color: element.category_color.clone(),
            icon_ref: element.icon_ref.clone(),
        }
    }

    /// Element frozen at `at`, used for exits which are removed immediately.
    #[must_use]
    pub fn removed(element: &VisualElement, at: BarGeometry) -> Self {
        Self {
            from: at,
            to: at,
            ..Self::from_element(element)
        }
    }

    pub fn validate(&self) -> RaceResult<()> {
        for (value, name) in [
            (self.from.y, "from.y"),
            (self.from.extent, "from.extent"),
            (self.to.y, "to.y"),
            (self.to.extent, "to.extent"),
            (self.thickness, "thickness"),
        ] {
            if !value.is_finite() {
                return Err(RaceError::InvalidData(format!(
                    "element `{}` has non-finite {name}",
                    self.key
                )));
            }
        }
        if self.to.extent < 0.0 || self.thickness < 0.0 {
            return Err(RaceError::InvalidData(format!(
                "element `{}` has negative size",
                self.key
            )));
        }
        Ok(())
    }
}

/// Element-set diff for one frame of the ranked-bar view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDiff {
    pub period: PeriodKey,
    /// Text of the period caption shown with the chart.
    pub period_label: String,
    pub started_at_ms: f64,
    pub transition_ms: f64,
    pub entering: Vec<ElementFrame>,
    pub updating: Vec<ElementFrame>,
    pub exiting: Vec<ElementFrame>,
}

impl FrameDiff {
    pub fn validate(&self) -> RaceResult<()> {
        if !self.transition_ms.is_finite() || self.transition_ms < 0.0 {
            return Err(RaceError::InvalidData(
                "transition duration must be finite and >= 0".to_owned(),
            ));
        }
        for element in self
            .entering
            .iter()
            .chain(&self.updating)
            .chain(&self.exiting)
        {
            element.validate()?;
        }
        Ok(())
    }

    #[must_use]
    pub fn element(&self, key: &str) -> Option<&ElementFrame> {
        self.entering
            .iter()
            .chain(&self.updating)
            .find(|element| element.key == key)
    }
}

/// Position of one swarm point for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmPointFrame {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub category_color: String,
}

/// Current swarm configuration, emitted once per solver tick batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmFrame {
    pub period: Option<PeriodKey>,
    pub alpha: f64,
    pub points: Vec<SwarmPointFrame>,
}

impl SwarmFrame {
    pub fn validate(&self) -> RaceResult<()> {
        for point in &self.points {
            if !point.x.is_finite() || !point.y.is_finite() {
                return Err(RaceError::InvalidData(format!(
                    "swarm point `{}` has non-finite position",
                    point.key
                )));
            }
            if !point.radius.is_finite() || point.radius < 0.0 {
                return Err(RaceError::InvalidData(format!(
                    "swarm point `{}` has invalid radius",
                    point.key
                )));
            }
        }
        Ok(())
    }
}
