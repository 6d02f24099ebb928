use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{PeriodKey, PlotArea, Viewport};
use crate::error::{RaceError, RaceResult};
use crate::layout::SimulationPoint;
use crate::reconcile::VisualElement;

use super::ReseedPolicy;

pub const RACE_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;
pub const SWARM_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;

/// Serializable state of a race engine, used by regression tests and
/// debugging tooling. Elements are listed in rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceChartSnapshot {
    pub viewport: Viewport,
    pub plot_area: PlotArea,
    pub value_domain: (f64, f64),
    pub capacity: usize,
    pub period: Option<PeriodKey>,
    pub frames_applied: usize,
    pub label_formatter_generation: u64,
    pub elements: IndexMap<String, VisualElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    pub viewport: Viewport,
    pub plot_area: PlotArea,
    pub value_domain: (f64, f64),
    pub period: Option<PeriodKey>,
    pub reseed_policy: ReseedPolicy,
    pub alpha: f64,
    pub ticks: u64,
    pub points: IndexMap<String, SimulationPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceChartSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: RaceChartSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: SwarmSnapshot,
}

impl RaceChartSnapshot {
    pub fn to_json_pretty(&self) -> RaceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RaceError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }

    pub fn to_json_contract_v1_pretty(&self) -> RaceResult<String> {
        let payload = RaceChartSnapshotJsonContractV1 {
            schema_version: RACE_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            RaceError::InvalidData(format!("failed to serialize race snapshot contract v1: {e}"))
        })
    }

    /// Accepts either a bare snapshot or a versioned contract payload.
    pub fn from_json_compat_str(input: &str) -> RaceResult<Self> {
        from_compat_str::<Self, RaceChartSnapshotJsonContractV1>(
            input,
            RACE_SNAPSHOT_JSON_SCHEMA_V1,
            |payload| (payload.schema_version, payload.snapshot),
        )
    }
}

impl SwarmSnapshot {
    pub fn to_json_pretty(&self) -> RaceResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RaceError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }

    pub fn to_json_contract_v1_pretty(&self) -> RaceResult<String> {
        let payload = SwarmSnapshotJsonContractV1 {
            schema_version: SWARM_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            RaceError::InvalidData(format!("failed to serialize swarm snapshot contract v1: {e}"))
        })
    }

    pub fn from_json_compat_str(input: &str) -> RaceResult<Self> {
        from_compat_str::<Self, SwarmSnapshotJsonContractV1>(
            input,
            SWARM_SNAPSHOT_JSON_SCHEMA_V1,
            |payload| (payload.schema_version, payload.snapshot),
        )
    }
}

fn from_compat_str<S, P>(input: &str, expected: u32, unwrap: fn(P) -> (u32, S)) -> RaceResult<S>
where
    S: DeserializeOwned,
    P: DeserializeOwned,
{
    if let Ok(snapshot) = serde_json::from_str::<S>(input) {
        return Ok(snapshot);
    }
    let payload: P = serde_json::from_str(input).map_err(|e| {
        RaceError::InvalidData(format!("failed to parse snapshot json payload: {e}"))
    })?;
    let (schema_version, snapshot) = unwrap(payload);
    if schema_version != expected {
        return Err(RaceError::InvalidData(format!(
            "unsupported snapshot schema version: {schema_version}"
        )));
    }
    Ok(snapshot)
}
