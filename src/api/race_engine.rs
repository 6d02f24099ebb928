use std::borrow::Cow;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::{Frame, FrameSet, PeriodKey, PlotArea};
use crate::error::{RaceError, RaceResult};
use crate::layout::{BarGeometry, RankedBarLayout};
use crate::reconcile::{ElementStore, ElementUpdate, VisualElement, reconcile};
use crate::render::{ElementFrame, FrameDiff, Renderer};
use crate::timeline::{FrameClock, RunOutcome, TimelineScheduler};

use super::{RaceChartConfig, RaceChartSnapshot, ValueLabelFormatterFn};

/// Bar chart race facade: turns frames into renderer diffs.
///
/// Each `apply_frame` call reconciles the frame against the live elements,
/// lays it out on the shared value scale and hands the resulting
/// [`FrameDiff`] to the renderer. Instances own all of their state.
pub struct RaceChartEngine<R: Renderer> {
    renderer: R,
    config: RaceChartConfig,
    plot_area: PlotArea,
    layout: RankedBarLayout,
    store: ElementStore,
    label_formatter: Option<ValueLabelFormatterFn>,
    label_formatter_generation: u64,
    period: Option<PeriodKey>,
    frames_applied: usize,
}

impl<R: Renderer> RaceChartEngine<R> {
    /// Creates an engine for `frames`, whose value domain fixes the bar scale.
    pub fn new(renderer: R, config: RaceChartConfig, frames: &FrameSet) -> RaceResult<Self> {
        config.validate()?;
        if frames.is_empty() {
            return Err(RaceError::NoData);
        }

        let plot_area = config.plot_area()?;
        let layout = RankedBarLayout::new(
            frames.value_domain,
            plot_area.height,
            plot_area.width,
            config.bars,
        )?;
        debug!(
            frame_count = frames.frames.len(),
            capacity = layout.capacity(),
            domain_max = frames.value_domain.1,
            "created race chart engine"
        );

        Ok(Self {
            renderer,
            config,
            plot_area,
            layout,
            store: ElementStore::new(),
            label_formatter: None,
            label_formatter_generation: 0,
            period: None,
            frames_applied: 0,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RaceChartConfig {
        &self.config
    }

    #[must_use]
    pub fn plot_area(&self) -> PlotArea {
        self.plot_area
    }

    #[must_use]
    pub fn layout(&self) -> &RankedBarLayout {
        &self.layout
    }

    #[must_use]
    pub fn elements(&self) -> &IndexMap<String, VisualElement> {
        self.store.elements()
    }

    #[must_use]
    pub fn element(&self, key: &str) -> Option<&VisualElement> {
        self.store.get(key)
    }

    /// Period of the last applied frame.
    #[must_use]
    pub fn period(&self) -> Option<PeriodKey> {
        self.period
    }

    #[must_use]
    pub fn frames_applied(&self) -> usize {
        self.frames_applied
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Overrides the configured label format with a host formatter.
    pub fn set_label_formatter(&mut self, formatter: ValueLabelFormatterFn) {
        self.label_formatter = Some(formatter);
        self.label_formatter_generation = self.label_formatter_generation.saturating_add(1);
    }

    pub fn clear_label_formatter(&mut self) {
        if self.label_formatter.take().is_some() {
            self.label_formatter_generation = self.label_formatter_generation.saturating_add(1);
        }
    }

    #[must_use]
    pub fn label_formatter_generation(&self) -> u64 {
        self.label_formatter_generation
    }

    /// Moves the chart onto `frame`, starting its transitions at `now_ms`.
    ///
    /// Entities beyond the band capacity are treated as absent. Layout
    /// failures leave the element set untouched.
    pub fn apply_frame(&mut self, frame: &Frame, now_ms: f64) -> RaceResult<FrameDiff> {
        if !now_ms.is_finite() {
            return Err(RaceError::InvalidData("frame time must be finite".to_owned()));
        }

        let visible = self.layout.visible_count(frame);
        let shown = if visible < frame.len() {
            Cow::Owned(frame.top(visible))
        } else {
            Cow::Borrowed(frame)
        };

        let plan = reconcile(self.store.elements(), &shown);
        let targets = self.layout.layout(&shown)?;
        let mut updates = IndexMap::with_capacity(targets.len());
        for (record, (key, target)) in shown.entities.iter().zip(targets) {
            let display_value = self.format_value(record.primary_value);
            updates.insert(
                key,
                ElementUpdate {
                    record,
                    target,
                    display_value,
                },
            );
        }

        let exited = self.store.apply(
            &plan,
            updates,
            now_ms,
            self.config.transition_ms,
            self.config.easing,
        );

        let diff = FrameDiff {
            period: frame.key,
            period_label: frame.key.to_string(),
            started_at_ms: now_ms,
            transition_ms: self.config.transition_ms,
            entering: self.element_frames(&plan.entering),
            updating: self.element_frames(&plan.updating),
            exiting: exited
                .iter()
                .map(|element| ElementFrame::removed(element, element.sample(now_ms)))
                .collect(),
        };

        self.period = Some(frame.key);
        self.frames_applied += 1;
        debug!(
            period = %frame.key,
            entering = diff.entering.len(),
            updating = diff.updating.len(),
            exiting = diff.exiting.len(),
            hidden = frame.len() - visible,
            "applied frame"
        );

        self.renderer.render(&diff)?;
        Ok(diff)
    }

    /// Interpolated geometry of every live element at `now_ms`.
    #[must_use]
    pub fn sample(&self, now_ms: f64) -> IndexMap<String, BarGeometry> {
        self.store
            .elements()
            .iter()
            .map(|(key, element)| (key.clone(), element.sample(now_ms)))
            .collect()
    }

    /// Scheduler preconfigured with this chart's timeline settings.
    #[must_use]
    pub fn scheduler(&self) -> TimelineScheduler {
        TimelineScheduler::new(self.config.timeline)
    }

    /// Plays `frames` through `scheduler`, applying each frame at its
    /// scheduled time.
    pub fn play<C: FrameClock>(
        &mut self,
        scheduler: &mut TimelineScheduler,
        frames: &[Frame],
        clock: &mut C,
    ) -> RaceResult<RunOutcome> {
        let outcome = scheduler.run(frames, clock, |tick| {
            trace!(index = tick.index, cycle = tick.cycle, "timeline tick");
            self.apply_frame(tick.frame, tick.elapsed_ms as f64)
                .map(|_| ())
        })?;
        debug!(?outcome, "race chart playback finished");
        Ok(outcome)
    }

    /// Drops every live element so the next frame enters from scratch.
    pub fn reset(&mut self) {
        self.store.clear();
        self.period = None;
    }

    #[must_use]
    pub fn snapshot(&self) -> RaceChartSnapshot {
        RaceChartSnapshot {
            viewport: self.config.viewport,
            plot_area: self.plot_area,
            value_domain: self.layout.value_scale().domain(),
            capacity: self.layout.capacity(),
            period: self.period,
            frames_applied: self.frames_applied,
            label_formatter_generation: self.label_formatter_generation,
            elements: self.store.elements().clone(),
        }
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    fn format_value(&self, value: f64) -> String {
        match &self.label_formatter {
            Some(formatter) => formatter(value),
            None => self.config.label_format.format(value),
        }
    }

    fn element_frames(&self, keys: &[String]) -> Vec<ElementFrame> {
        keys.iter()
            .filter_map(|key| self.store.get(key))
            .map(ElementFrame::from_element)
            .collect()
    }
}
