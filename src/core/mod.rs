pub mod frame;
pub mod primitives;
pub mod scale;
pub mod types;

pub use frame::{BuildDiagnostic, Frame, FrameBuilder, FrameBuilderConfig, FrameSet};
pub use primitives::{MISSING_VALUE, coerce_decimal, coerce_number, is_missing};
pub use scale::{BandScale, LinearScale};
pub use types::{DEFAULT_CATEGORY_COLOR, Margins, PeriodKey, PlotArea, Record, Viewport};
