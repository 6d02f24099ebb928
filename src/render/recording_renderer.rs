use crate::error::RaceResult;
use crate::render::{FrameDiff, Renderer, SwarmFrame};

/// Renderer that keeps every validated diff, for regression tests and
/// offline export.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    pub diffs: Vec<FrameDiff>,
    pub swarm_frames: Vec<SwarmFrame>,
}

impl RecordingRenderer {
    #[must_use]
    pub fn last_diff(&self) -> Option<&FrameDiff> {
        self.diffs.last()
    }

    #[must_use]
    pub fn last_swarm_frame(&self) -> Option<&SwarmFrame> {
        self.swarm_frames.last()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, diff: &FrameDiff) -> RaceResult<()> {
        diff.validate()?;
        self.diffs.push(diff.clone());
        Ok(())
    }

    fn render_swarm(&mut self, frame: &SwarmFrame) -> RaceResult<()> {
        frame.validate()?;
        self.swarm_frames.push(frame.clone());
        Ok(())
    }
}
