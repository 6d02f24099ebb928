//! Opt-in `tracing` output for hosts embedding the engines.
//!
//! Events are emitted under the module targets of the crate:
//!
//! - `race_chart::core::frame`: frame build counts and dropped records (`warn`).
//! - `race_chart::api::race_engine`: applied frames and playback outcome.
//! - `race_chart::api::swarm_engine`: shown periods and jitter passes.
//! - `race_chart::timeline`: scheduler state changes and rendered ticks.
//! - `race_chart::layout::force`: reseeds, reheats and solver runs.
//!
//! Per-frame detail is logged at `trace`, lifecycle events at `debug`.

/// Filter used when `RUST_LOG` is unset: warnings from frame building and
/// lifecycle events from the scheduler.
pub const DEFAULT_FILTER: &str = "race_chart=warn,race_chart::timeline=debug";

/// Installs a compact fmt subscriber honouring `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`].
///
/// Returns `false` without the `telemetry` feature, or when the host already
/// installed a global subscriber.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}

#[cfg(all(test, not(feature = "telemetry")))]
mod tests {
    use super::init_default_tracing;

    #[test]
    fn init_is_a_no_op_without_the_feature() {
        assert!(!init_default_tracing());
    }
}
