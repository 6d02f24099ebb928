use indexmap::{IndexMap, IndexSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::core::{
    BandScale, Frame, FrameBuilder, FrameSet, LinearScale, PeriodKey, PlotArea, Record,
};
use crate::error::{RaceError, RaceResult};
use crate::layout::{ForceSimulation, SimulationPoint};
use crate::render::{Renderer, SwarmFrame, SwarmPointFrame};
use crate::timeline::{FrameClock, RunOutcome, TimelineScheduler};

use super::{ReseedPolicy, SwarmChartConfig, SwarmSnapshot};

#[derive(Debug, Clone)]
struct ShownPoint {
    value: f64,
    category_color: String,
}

/// Swarm chart facade: entities placed by category (x) and value (y).
///
/// The category axis covers every entity of the dataset so a point keeps
/// its column whichever period is shown. The value axis spans the raw value
/// range, growing upwards.
pub struct SwarmEngine<R: Renderer> {
    renderer: R,
    config: SwarmChartConfig,
    plot_area: PlotArea,
    frames: Vec<Frame>,
    value_extent: (f64, f64),
    x_scale: BandScale,
    y_scale: LinearScale,
    simulation: ForceSimulation,
    shown: IndexMap<String, ShownPoint>,
    period: Option<PeriodKey>,
    rng: StdRng,
}

impl<R: Renderer> SwarmEngine<R> {
    /// Creates an engine over `frames`; `categories` orders the x axis.
    pub fn new(
        renderer: R,
        config: SwarmChartConfig,
        frames: &FrameSet,
        categories: IndexSet<String>,
    ) -> RaceResult<Self> {
        config.validate()?;
        if frames.is_empty() {
            return Err(RaceError::NoData);
        }

        let plot_area = config.plot_area()?;
        let x_scale = BandScale::new(categories, (0.0, plot_area.width), config.category_padding)?;
        let y_scale = LinearScale::new(
            value_axis_domain(frames.value_extent),
            (plot_area.height, 0.0),
        )?;
        let seed = match config.reseed_policy {
            ReseedPolicy::RandomJitter { seed } => seed,
            ReseedPolicy::TimeFiltered => config.force.seed,
        };
        debug!(
            frame_count = frames.frames.len(),
            categories = x_scale.len(),
            policy = ?config.reseed_policy,
            "created swarm engine"
        );

        Ok(Self {
            renderer,
            simulation: ForceSimulation::new(config.force)?,
            config,
            plot_area,
            frames: frames.frames.clone(),
            value_extent: frames.value_extent,
            x_scale,
            y_scale,
            shown: IndexMap::new(),
            period: None,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Builds per-period frames from `records` and an x axis in first-seen
    /// entity order.
    pub fn from_records(
        renderer: R,
        config: SwarmChartConfig,
        records: &[Record],
    ) -> RaceResult<Self> {
        let frames = FrameBuilder::default().build(records, |record| record.period);
        let categories = FrameBuilder::entity_order(records);
        Self::new(renderer, config, &frames, categories)
    }

    #[must_use]
    pub fn config(&self) -> &SwarmChartConfig {
        &self.config
    }

    #[must_use]
    pub fn plot_area(&self) -> PlotArea {
        self.plot_area
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[must_use]
    pub fn x_scale(&self) -> &BandScale {
        &self.x_scale
    }

    #[must_use]
    pub fn y_scale(&self) -> LinearScale {
        self.y_scale
    }

    #[must_use]
    pub fn simulation(&self) -> &ForceSimulation {
        &self.simulation
    }

    #[must_use]
    pub fn period(&self) -> Option<PeriodKey> {
        self.period
    }

    /// Current value driving the y target of `key`.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.shown.get(key).map(|point| point.value)
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Replaces the simulated set with exactly the entities of `period`.
    ///
    /// Entities still shown keep their position and velocity; the others are
    /// seeded near their targets. The solver is reheated either way.
    pub fn show_period(&mut self, period: PeriodKey) -> RaceResult<()> {
        let index = self
            .frames
            .binary_search_by(|frame| frame.key.cmp(&period))
            .map_err(|_| RaceError::InvalidData(format!("no frame for period {period}")))?;

        let mut shown = IndexMap::with_capacity(self.frames[index].len());
        let mut points = Vec::with_capacity(self.frames[index].len());
        for record in &self.frames[index].entities {
            let (x, y) = self.target_of(&record.entity, record.primary_value)?;
            points.push(
                SimulationPoint::new(record.entity.clone(), self.config.point_radius)
                    .with_target(x, y),
            );
            shown.insert(
                record.entity.clone(),
                ShownPoint {
                    value: record.primary_value,
                    category_color: record.category_color.clone(),
                },
            );
        }

        self.simulation.reseed(points);
        self.simulation.reheat();
        self.shown = shown;
        self.period = Some(period);
        debug!(period = %period, points = self.shown.len(), "showing swarm period");
        Ok(())
    }

    /// Replaces every shown value with a seeded draw from the value range
    /// and reheats so points drift to their new targets.
    pub fn jitter_values(&mut self) -> RaceResult<()> {
        let (min, max) = self.value_extent;
        let mut targets = IndexMap::with_capacity(self.shown.len());
        for (key, point) in &mut self.shown {
            point.value = min + self.rng.random::<f64>() * (max - min);
            let x = self.x_scale.center(key).ok_or_else(|| unknown_category(key))?;
            targets.insert(key.clone(), (x, self.y_scale.map(point.value)?));
        }

        self.simulation.retarget(
            |point| targets.get(&point.key).map_or(point.target_x, |t| t.0),
            |point| targets.get(&point.key).map_or(point.target_y, |t| t.1),
        );
        self.simulation.reheat();
        trace!(points = targets.len(), "jittered swarm values");
        Ok(())
    }

    /// Shows the first period and relaxes it before the first render.
    pub fn initial_layout(&mut self) -> RaceResult<SwarmFrame> {
        let first = self.frames.first().map(|frame| frame.key).ok_or(RaceError::NoData)?;
        self.show_period(first)?;
        self.tick(self.config.initial_iterations)
    }

    /// Runs `iterations` solver steps and renders the result.
    pub fn tick(&mut self, iterations: usize) -> RaceResult<SwarmFrame> {
        self.simulation.run(iterations);
        let frame = self.swarm_frame();
        self.renderer.render_swarm(&frame)?;
        Ok(frame)
    }

    /// Reacts to the timeline reaching `period` according to the reseed
    /// policy, then relaxes and renders.
    pub fn advance(&mut self, period: PeriodKey) -> RaceResult<SwarmFrame> {
        match self.config.reseed_policy {
            ReseedPolicy::TimeFiltered => self.show_period(period)?,
            ReseedPolicy::RandomJitter { .. } if self.period.is_none() => {
                self.show_period(period)?;
            }
            ReseedPolicy::RandomJitter { .. } => self.jitter_values()?,
        }
        self.tick(self.config.frame_iterations)
    }

    #[must_use]
    pub fn scheduler(&self) -> TimelineScheduler {
        TimelineScheduler::new(self.config.timeline)
    }

    pub fn play<C: FrameClock>(
        &mut self,
        scheduler: &mut TimelineScheduler,
        clock: &mut C,
    ) -> RaceResult<RunOutcome> {
        let frames = self.frames.clone();
        let outcome = scheduler.run(&frames, clock, |tick| {
            self.advance(tick.frame.key).map(|_| ())
        })?;
        debug!(?outcome, "swarm playback finished");
        Ok(outcome)
    }

    #[must_use]
    pub fn swarm_frame(&self) -> SwarmFrame {
        SwarmFrame {
            period: self.period,
            alpha: self.simulation.alpha(),
            points: self
                .simulation
                .points()
                .iter()
                .map(|point| SwarmPointFrame {
                    key: point.key.clone(),
                    x: point.position.0,
                    y: point.position.1,
                    radius: point.radius,
                    category_color: self
                        .shown
                        .get(&point.key)
                        .map(|shown| shown.category_color.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SwarmSnapshot {
        SwarmSnapshot {
            viewport: self.config.viewport,
            plot_area: self.plot_area,
            value_domain: self.y_scale.domain(),
            period: self.period,
            reseed_policy: self.config.reseed_policy,
            alpha: self.simulation.alpha(),
            ticks: self.simulation.ticks(),
            points: self
                .simulation
                .points()
                .iter()
                .map(|point| (point.key.clone(), point.clone()))
                .collect(),
        }
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    fn target_of(&self, key: &str, value: f64) -> RaceResult<(f64, f64)> {
        let x = self.x_scale.center(key).ok_or_else(|| unknown_category(key))?;
        Ok((x, self.y_scale.map(value)?))
    }
}

/// Widens a single-valued extent so the lone value maps to mid-height.
fn value_axis_domain((min, max): (f64, f64)) -> (f64, f64) {
    if min < max {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    }
}

fn unknown_category(key: &str) -> RaceError {
    RaceError::InvalidData(format!("entity `{key}` has no category band"))
}

#[cfg(test)]
mod tests {
    use super::value_axis_domain;

    #[test]
    fn flat_extent_is_widened_around_the_value() {
        assert_eq!(value_axis_domain((3.0, 3.0)), (2.5, 3.5));
        assert_eq!(value_axis_domain((1.0, 4.0)), (1.0, 4.0));
    }
}
