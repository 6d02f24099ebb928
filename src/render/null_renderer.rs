use crate::error::RaceResult;
use crate::render::{FrameDiff, Renderer, SwarmFrame};

/// No-op renderer used by tests and headless engine usage.
///
/// It still validates frame content so tests can catch invalid geometry before
/// a real backend is introduced.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames_rendered: usize,
    pub last_entering_count: usize,
    pub last_updating_count: usize,
    pub last_exiting_count: usize,
    pub last_point_count: usize,
}

impl Renderer for NullRenderer {
    fn render(&mut self, diff: &FrameDiff) -> RaceResult<()> {
        diff.validate()?;
        self.frames_rendered += 1;
        self.last_entering_count = diff.entering.len();
        self.last_updating_count = diff.updating.len();
        self.last_exiting_count = diff.exiting.len();
        Ok(())
    }

    fn render_swarm(&mut self, frame: &SwarmFrame) -> RaceResult<()> {
        frame.validate()?;
        self.frames_rendered += 1;
        self.last_point_count = frame.points.len();
        Ok(())
    }
}
