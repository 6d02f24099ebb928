use serde::{Deserialize, Serialize};

use crate::core::{
    FrameBuilder, FrameBuilderConfig, FrameSet, Margins, PeriodKey, PlotArea, Record, Viewport,
};
use crate::error::{RaceError, RaceResult};
use crate::layout::{Easing, ForceConfig, RankedBarConfig};
use crate::timeline::{PlaybackMode, TimelineConfig};

use super::ValueLabelFormat;

/// Bar chart race bootstrap configuration.
///
/// Serializable so hosts can persist a chart setup next to their dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceChartConfig {
    #[serde(default = "default_race_viewport")]
    pub viewport: Viewport,
    #[serde(default = "default_race_margins")]
    pub margins: Margins,
    #[serde(default)]
    pub rank_limit: Option<usize>,
    #[serde(default = "default_domain_headroom")]
    pub domain_headroom: f64,
    #[serde(default)]
    pub bars: RankedBarConfig,
    #[serde(default = "default_transition_ms")]
    pub transition_ms: f64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub label_format: ValueLabelFormat,
}

fn default_race_viewport() -> Viewport {
    Viewport::new(960, 600)
}

fn default_race_margins() -> Margins {
    Margins::new(60.0, 30.0, 50.0, 250.0)
}

fn default_domain_headroom() -> f64 {
    FrameBuilderConfig::default().domain_headroom
}

fn default_transition_ms() -> f64 {
    750.0
}

impl Default for RaceChartConfig {
    fn default() -> Self {
        Self {
            viewport: default_race_viewport(),
            margins: default_race_margins(),
            rank_limit: None,
            domain_headroom: default_domain_headroom(),
            bars: RankedBarConfig::default(),
            transition_ms: default_transition_ms(),
            easing: Easing::default(),
            timeline: TimelineConfig::default(),
            label_format: ValueLabelFormat::default(),
        }
    }
}

impl RaceChartConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Keeps only the best `limit` entities of every frame.
    #[must_use]
    pub fn with_rank_limit(mut self, limit: usize) -> Self {
        self.rank_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_domain_headroom(mut self, headroom: f64) -> Self {
        self.domain_headroom = headroom;
        self
    }

    #[must_use]
    pub fn with_band_padding(mut self, padding: f64) -> Self {
        self.bars.band_padding = padding;
        self
    }

    #[must_use]
    pub fn with_min_band_height(mut self, height_px: f64) -> Self {
        self.bars.min_band_height_px = height_px;
        self
    }

    #[must_use]
    pub fn with_transition_ms(mut self, transition_ms: f64) -> Self {
        self.transition_ms = transition_ms;
        self
    }

    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Sets the wait between frames and the longer pause at period
    /// boundaries.
    #[must_use]
    pub fn with_delays(mut self, base_delay_ms: u64, boundary_pause_ms: u64) -> Self {
        self.timeline.base_delay_ms = base_delay_ms;
        self.timeline.boundary_pause_ms = boundary_pause_ms;
        self
    }

    #[must_use]
    pub fn with_playback(mut self, playback: PlaybackMode) -> Self {
        self.timeline.playback = playback;
        self
    }

    #[must_use]
    pub fn with_label_format(mut self, label_format: ValueLabelFormat) -> Self {
        self.label_format = label_format;
        self
    }

    #[must_use]
    pub fn frame_builder_config(&self) -> FrameBuilderConfig {
        FrameBuilderConfig {
            rank_limit: self.rank_limit,
            domain_headroom: self.domain_headroom,
        }
    }

    /// Groups `records` into frames with this chart's rank limit and headroom.
    pub fn build_frames<F>(&self, records: &[Record], group_fn: F) -> RaceResult<FrameSet>
    where
        F: Fn(&Record) -> PeriodKey,
    {
        Ok(FrameBuilder::new(self.frame_builder_config())?.build(records, group_fn))
    }

    pub fn plot_area(&self) -> RaceResult<PlotArea> {
        PlotArea::resolve(self.viewport, self.margins)
    }

    pub fn validate(&self) -> RaceResult<()> {
        self.plot_area()?;
        self.frame_builder_config().validate()?;
        self.bars.validate()?;
        if !self.transition_ms.is_finite() || self.transition_ms < 0.0 {
            return Err(RaceError::InvalidConfig(
                "transition duration must be finite and >= 0".to_owned(),
            ));
        }
        self.label_format.validate()
    }

    pub fn to_json_pretty(&self) -> RaceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            RaceError::InvalidConfig(format!("failed to serialize race chart config: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> RaceResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            RaceError::InvalidConfig(format!("failed to parse race chart config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// How the swarm reacts when the timeline advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReseedPolicy {
    /// Show exactly the entities of the current period.
    #[default]
    TimeFiltered,
    /// Keep the current points and replace their values with seeded random
    /// draws from the global value range.
    RandomJitter { seed: u64 },
}

/// Swarm chart bootstrap configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwarmChartConfig {
    #[serde(default = "default_swarm_viewport")]
    pub viewport: Viewport,
    #[serde(default = "default_swarm_margins")]
    pub margins: Margins,
    #[serde(default = "default_point_radius")]
    pub point_radius: f64,
    /// Padding of the category bands along x.
    #[serde(default)]
    pub category_padding: f64,
    #[serde(default)]
    pub force: ForceConfig,
    /// Steps run before the first render.
    #[serde(default = "default_initial_iterations")]
    pub initial_iterations: usize,
    /// Steps rendered after each reseed or value change.
    #[serde(default = "default_frame_iterations")]
    pub frame_iterations: usize,
    #[serde(default)]
    pub reseed_policy: ReseedPolicy,
    #[serde(default = "default_swarm_timeline")]
    pub timeline: TimelineConfig,
}

fn default_swarm_viewport() -> Viewport {
    Viewport::new(800, 500)
}

fn default_swarm_margins() -> Margins {
    Margins::new(20.0, 30.0, 40.0, 40.0)
}

fn default_point_radius() -> f64 {
    4.0
}

fn default_initial_iterations() -> usize {
    120
}

fn default_frame_iterations() -> usize {
    300
}

fn default_swarm_timeline() -> TimelineConfig {
    TimelineConfig {
        boundary_pause_ms: TimelineConfig::default().base_delay_ms,
        ..TimelineConfig::default()
    }
}

impl Default for SwarmChartConfig {
    fn default() -> Self {
        Self {
            viewport: default_swarm_viewport(),
            margins: default_swarm_margins(),
            point_radius: default_point_radius(),
            category_padding: 0.0,
            force: ForceConfig::default(),
            initial_iterations: default_initial_iterations(),
            frame_iterations: default_frame_iterations(),
            reseed_policy: ReseedPolicy::default(),
            timeline: default_swarm_timeline(),
        }
    }
}

impl SwarmChartConfig {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    #[must_use]
    pub fn with_point_radius(mut self, radius: f64) -> Self {
        self.point_radius = radius;
        self
    }

    #[must_use]
    pub fn with_min_separation(mut self, separation: f64) -> Self {
        self.force.min_separation = separation;
        self
    }

    #[must_use]
    pub fn with_strengths(mut self, strength_x: f64, strength_y: f64) -> Self {
        self.force.strength_x = strength_x;
        self.force.strength_y = strength_y;
        self
    }

    #[must_use]
    pub fn with_velocity_decay(mut self, decay: f64) -> Self {
        self.force.velocity_decay = decay;
        self
    }

    /// Enables seeded random offsets when placing new points.
    #[must_use]
    pub fn with_seed_jitter(mut self, jitter: f64, seed: u64) -> Self {
        self.force.seed_jitter = jitter;
        self.force.seed = seed;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, initial: usize, per_frame: usize) -> Self {
        self.initial_iterations = initial;
        self.frame_iterations = per_frame;
        self
    }

    #[must_use]
    pub fn with_reseed_policy(mut self, policy: ReseedPolicy) -> Self {
        self.reseed_policy = policy;
        self
    }

    #[must_use]
    pub fn with_timeline(mut self, timeline: TimelineConfig) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn plot_area(&self) -> RaceResult<PlotArea> {
        PlotArea::resolve(self.viewport, self.margins)
    }

    pub fn validate(&self) -> RaceResult<()> {
        self.plot_area()?;
        if !self.point_radius.is_finite() || self.point_radius < 0.0 {
            return Err(RaceError::InvalidConfig(
                "point radius must be finite and >= 0".to_owned(),
            ));
        }
        if !self.category_padding.is_finite() || !(0.0..1.0).contains(&self.category_padding) {
            return Err(RaceError::InvalidConfig(
                "category padding must be finite and in [0, 1)".to_owned(),
            ));
        }
        self.force.validate()?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> RaceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            RaceError::InvalidConfig(format!("failed to serialize swarm chart config: {e}"))
        })
    }

    pub fn from_json_str(input: &str) -> RaceResult<Self> {
        let config: Self = serde_json::from_str(input).map_err(|e| {
            RaceError::InvalidConfig(format!("failed to parse swarm chart config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{RaceChartConfig, ReseedPolicy, SwarmChartConfig};
    use crate::timeline::PlaybackMode;

    #[test]
    fn race_defaults_leave_a_plot_area() {
        let config = RaceChartConfig::default();
        config.validate().expect("valid defaults");
        let area = config.plot_area().expect("area");
        assert_eq!((area.width, area.height), (680.0, 490.0));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = RaceChartConfig::from_json_str(r#"{ "rank_limit": 10 }"#).expect("parse");
        assert_eq!(config.rank_limit, Some(10));
        assert_eq!(config.transition_ms, 750.0);
        assert_eq!(config.timeline.playback, PlaybackMode::Once);
    }

    #[test]
    fn invalid_headroom_is_rejected() {
        let config = RaceChartConfig::default().with_domain_headroom(0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn swarm_config_round_trips_through_json() {
        let config = SwarmChartConfig::default()
            .with_min_separation(1.5)
            .with_reseed_policy(ReseedPolicy::RandomJitter { seed: 7 });
        let json = config.to_json_pretty().expect("serialize");
        let restored = SwarmChartConfig::from_json_str(&json).expect("parse");
        assert_eq!(restored, config);
    }
}
