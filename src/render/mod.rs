mod frame;
mod null_renderer;
mod recording_renderer;

pub use frame::{ElementFrame, FrameDiff, SwarmFrame, SwarmPointFrame};
pub use null_renderer::NullRenderer;
pub use recording_renderer::RecordingRenderer;

use crate::error::RaceResult;

/// Contract implemented by any painting backend (DOM, canvas, terminal).
///
/// Backends receive fully resolved element-set diffs with target geometry
/// and transition duration; how they are painted is up to the backend.
pub trait Renderer {
    fn render(&mut self, diff: &FrameDiff) -> RaceResult<()>;

    fn render_swarm(&mut self, frame: &SwarmFrame) -> RaceResult<()> {
        frame.validate()
    }
}
