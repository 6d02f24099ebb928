//! Layout engines sharing the reconciliation contract.
//!
//! - [`ranked_bar`]: band slot and bar length per ranked entity.
//! - [`force`]: swarm placement by iterative relaxation.
//! - [`transition`]: interpolation between successive targets.

pub mod force;
pub mod ranked_bar;
pub mod transition;

pub use force::{ForceConfig, ForceSimulation, SimulationPoint, relax};
pub use ranked_bar::{BarTarget, RankedBarConfig, RankedBarLayout};
pub use transition::{BarGeometry, Easing, Tween};
