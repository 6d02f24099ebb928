//! race-chart: reconciliation and layout engine for animated ranking charts.
//!
//! Records are grouped into period frames, reconciled against the live
//! element set by key, laid out (ranked bars or a force-relaxed swarm) and
//! handed to a [`render::Renderer`] as element-set diffs. A
//! [`timeline::TimelineScheduler`] advances through the frames.

pub mod api;
pub mod core;
pub mod error;
pub mod layout;
pub mod reconcile;
pub mod render;
pub mod telemetry;
pub mod timeline;

pub use api::{RaceChartConfig, RaceChartEngine, SwarmChartConfig, SwarmEngine};
pub use error::{RaceError, RaceResult};
