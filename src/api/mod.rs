//! Public engine facades and their configuration.

mod engine_config;
mod label_format;
mod race_engine;
mod snapshot;
mod swarm_engine;

pub use engine_config::{RaceChartConfig, ReseedPolicy, SwarmChartConfig};
pub use label_format::{ValueLabelFormat, ValueLabelFormatterFn, format_si};
pub use race_engine::RaceChartEngine;
pub use snapshot::{
    RACE_SNAPSHOT_JSON_SCHEMA_V1, RaceChartSnapshot, RaceChartSnapshotJsonContractV1,
    SWARM_SNAPSHOT_JSON_SCHEMA_V1, SwarmSnapshot, SwarmSnapshotJsonContractV1,
};
pub use swarm_engine::SwarmEngine;
