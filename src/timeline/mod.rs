//! Frame-advance scheduler.
//!
//! The scheduler is an explicit state machine
//! (`Idle → Running → (Paused) → Running → Done`) driven either by
//! [`TimelineScheduler::run`] with a [`FrameClock`], or one advance at a time
//! through [`TimelineScheduler::step`] by hosts that own their timer.

mod clock;

pub use clock::{FrameClock, RecordingClock, StopHandle, ThreadClock, WaitOutcome};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{Frame, PeriodKey};
use crate::error::{RaceError, RaceResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackMode {
    /// Play every frame once, then stop.
    #[default]
    Once,
    /// Wrap back to the first frame after the last one.
    Loop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub base_delay_ms: u64,
    /// Wait after a frame that closes a coarser period (e.g. December).
    pub boundary_pause_ms: u64,
    #[serde(default)]
    pub playback: PlaybackMode,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 2_000,
            boundary_pause_ms: 5_000,
            playback: PlaybackMode::Once,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoneReason {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    Idle,
    Running,
    /// Holding on a period boundary.
    Paused,
    Done(DoneReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitKind {
    Base,
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub kind: WaitKind,
    pub duration: Duration,
}

/// Result of one [`TimelineScheduler::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A frame was rendered; wait this long before the next step.
    Wait(Wait),
    /// Nothing left to do; `on_frame` was not called unless a frame was
    /// rendered by this very step.
    Done(DoneReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { frames_rendered: usize },
    Cancelled { frames_rendered: usize },
}

/// What `on_frame` receives for each advance.
#[derive(Debug, Clone, Copy)]
pub struct FrameTick<'a> {
    pub index: usize,
    pub frame: &'a Frame,
    /// Scheduled time of this frame since the run started.
    pub elapsed_ms: u64,
    /// Completed passes over the frame list (always 0 in `Once` mode).
    pub cycle: u64,
}

/// `true` when `current` is the last sub-period of its year and `next`
/// starts another year.
#[must_use]
pub fn is_period_boundary(current: PeriodKey, next: PeriodKey) -> bool {
    current.is_sub_period() && current.year != next.year
}

#[derive(Debug)]
pub struct TimelineScheduler {
    config: TimelineConfig,
    state: SchedulerState,
    cursor: usize,
    elapsed_ms: u64,
    cycle: u64,
    frames_rendered: usize,
    stop: StopHandle,
}

impl TimelineScheduler {
    #[must_use]
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            cursor: 0,
            elapsed_ms: 0,
            cycle: 0,
            frames_rendered: 0,
            stop: StopHandle::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> TimelineConfig {
        self.config
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Index of the next frame to render.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    #[must_use]
    pub fn frames_rendered(&self) -> usize {
        self.frames_rendered
    }

    /// Handle that cancels this scheduler from anywhere, including another
    /// thread blocked outside the run loop.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn cancel(&mut self) {
        self.stop.stop();
        if !matches!(self.state, SchedulerState::Done(_)) {
            self.transition(SchedulerState::Done(DoneReason::Cancelled));
        }
    }

    /// Rewinds to frame 0 so a finished or cancelled timeline can play again.
    pub fn restart(&mut self) {
        self.stop.reset();
        self.cursor = 0;
        self.elapsed_ms = 0;
        self.cycle = 0;
        self.frames_rendered = 0;
        self.transition(SchedulerState::Idle);
    }

    /// Wait owed after rendering frame `index`, or `None` after the final
    /// frame of a `Once` run.
    #[must_use]
    pub fn wait_after(&self, frames: &[Frame], index: usize) -> Option<Wait> {
        let current = frames.get(index)?;
        let next = match frames.get(index + 1) {
            Some(next) => next,
            None if self.config.playback == PlaybackMode::Loop => frames.first()?,
            None => return None,
        };
        Some(if is_period_boundary(current.key, next.key) {
            Wait {
                kind: WaitKind::Boundary,
                duration: Duration::from_millis(self.config.boundary_pause_ms),
            }
        } else {
            Wait {
                kind: WaitKind::Base,
                duration: Duration::from_millis(self.config.base_delay_ms),
            }
        })
    }

    /// Renders the frame under the cursor and reports the wait that follows.
    ///
    /// The caller must honor the returned wait before stepping again;
    /// [`TimelineScheduler::run`] does this with a [`FrameClock`].
    pub fn step<F>(&mut self, frames: &[Frame], mut on_frame: F) -> RaceResult<Step>
    where
        F: FnMut(FrameTick<'_>) -> RaceResult<()>,
    {
        if frames.is_empty() {
            return Err(RaceError::NoData);
        }
        if let SchedulerState::Done(reason) = self.state {
            return Ok(Step::Done(reason));
        }
        if self.stop.is_stopped() {
            self.transition(SchedulerState::Done(DoneReason::Cancelled));
            return Ok(Step::Done(DoneReason::Cancelled));
        }

        let index = self.cursor.min(frames.len() - 1);
        self.transition(SchedulerState::Running);
        on_frame(FrameTick {
            index,
            frame: &frames[index],
            elapsed_ms: self.elapsed_ms,
            cycle: self.cycle,
        })?;
        self.frames_rendered += 1;
        trace!(index, period = %frames[index].key, "rendered frame");

        match self.wait_after(frames, index) {
            Some(wait) => {
                if index + 1 >= frames.len() {
                    self.cursor = 0;
                    self.cycle += 1;
                } else {
                    self.cursor = index + 1;
                }
                if wait.kind == WaitKind::Boundary {
                    self.transition(SchedulerState::Paused);
                }
                Ok(Step::Wait(wait))
            }
            None => {
                self.cursor = frames.len();
                self.transition(SchedulerState::Done(DoneReason::Completed));
                Ok(Step::Done(DoneReason::Completed))
            }
        }
    }

    /// Marks the wait returned by the last step as served.
    pub fn finish_wait(&mut self, wait: Wait) {
        self.elapsed_ms = self
            .elapsed_ms
            .saturating_add(u64::try_from(wait.duration.as_millis()).unwrap_or(u64::MAX));
        if self.state == SchedulerState::Paused {
            self.transition(SchedulerState::Running);
        }
    }

    /// Plays `frames` until done or cancelled.
    ///
    /// Fails with [`RaceError::NoData`] for an empty frame list. Errors from
    /// `on_frame` abort the run and are returned unchanged.
    pub fn run<C, F>(
        &mut self,
        frames: &[Frame],
        clock: &mut C,
        mut on_frame: F,
    ) -> RaceResult<RunOutcome>
    where
        C: FrameClock,
        F: FnMut(FrameTick<'_>) -> RaceResult<()>,
    {
        if frames.is_empty() {
            return Err(RaceError::NoData);
        }
        debug!(
            frame_count = frames.len(),
            playback = ?self.config.playback,
            "starting timeline"
        );

        loop {
            match self.step(frames, &mut on_frame)? {
                Step::Wait(wait) => match clock.wait(wait.duration, &self.stop) {
                    WaitOutcome::Elapsed => self.finish_wait(wait),
                    WaitOutcome::Cancelled => {
                        self.transition(SchedulerState::Done(DoneReason::Cancelled));
                        return Ok(self.outcome(DoneReason::Cancelled));
                    }
                },
                Step::Done(reason) => return Ok(self.outcome(reason)),
            }
        }
    }

    fn outcome(&self, reason: DoneReason) -> RunOutcome {
        let frames_rendered = self.frames_rendered;
        match reason {
            DoneReason::Completed => RunOutcome::Completed { frames_rendered },
            DoneReason::Cancelled => RunOutcome::Cancelled { frames_rendered },
        }
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "timeline state");
            self.state = next;
        }
    }
}
