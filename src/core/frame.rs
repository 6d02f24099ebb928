use std::collections::{BTreeMap, HashSet};

use indexmap::IndexSet;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{PeriodKey, Record};
use crate::error::{RaceError, RaceResult};

/// One time-ordered snapshot of ranked entities.
///
/// `entities` is sorted descending by primary value; equal values keep the
/// order they had in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub key: PeriodKey,
    pub entities: Vec<Record>,
    pub rank_limit: Option<usize>,
}

impl Frame {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|record| record.entity.as_str())
    }

    #[must_use]
    pub fn get(&self, entity: &str) -> Option<&Record> {
        self.entities.iter().find(|record| record.entity == entity)
    }

    /// Returns a copy keeping only the `limit` best-ranked entities.
    #[must_use]
    pub fn top(&self, limit: usize) -> Self {
        let mut entities = self.entities.clone();
        entities.truncate(limit);
        Self {
            key: self.key,
            entities,
            rank_limit: Some(self.rank_limit.map_or(limit, |current| current.min(limit))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BuildDiagnostic {
    /// Record dropped because it has no entity or no usable primary value.
    MalformedRecord { index: usize, reason: String },
    /// A second row for an entity already present in the same frame; the
    /// first row is kept.
    DuplicateKeyInFrame {
        period: PeriodKey,
        entity: String,
        index: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameBuilderConfig {
    pub rank_limit: Option<usize>,
    /// Multiplier applied to the global maximum when deriving the value domain.
    pub domain_headroom: f64,
}

impl Default for FrameBuilderConfig {
    fn default() -> Self {
        Self {
            rank_limit: None,
            domain_headroom: 1.1,
        }
    }
}

impl FrameBuilderConfig {
    pub fn validate(self) -> RaceResult<Self> {
        if self.rank_limit == Some(0) {
            return Err(RaceError::InvalidConfig(
                "rank limit must be > 0 when set".to_owned(),
            ));
        }
        if !self.domain_headroom.is_finite() || self.domain_headroom < 1.0 {
            return Err(RaceError::InvalidConfig(
                "domain headroom must be finite and >= 1".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Output of a frame build: ordered frames plus the global value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSet {
    pub frames: Vec<Frame>,
    /// `(0, max * headroom)` over every retained entity of every frame.
    pub value_domain: (f64, f64),
    /// Raw `(min, max)` over every valid record.
    pub value_extent: (f64, f64),
    pub diagnostics: Vec<BuildDiagnostic>,
}

impl FrameSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn malformed_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, BuildDiagnostic::MalformedRecord { .. }))
            .count()
    }

    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, BuildDiagnostic::DuplicateKeyInFrame { .. }))
            .count()
    }

    #[must_use]
    pub fn frame(&self, key: PeriodKey) -> Option<&Frame> {
        self.frames
            .binary_search_by(|frame| frame.key.cmp(&key))
            .ok()
            .map(|index| &self.frames[index])
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameBuilder {
    config: FrameBuilderConfig,
}

impl FrameBuilder {
    pub fn new(config: FrameBuilderConfig) -> RaceResult<Self> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> FrameBuilderConfig {
        self.config
    }

    /// Groups records into frames ordered by the key `group_fn` assigns.
    ///
    /// Malformed rows and duplicate keys are reported in the returned
    /// diagnostics and never abort the build.
    pub fn build<F>(&self, records: &[Record], group_fn: F) -> FrameSet
    where
        F: Fn(&Record) -> PeriodKey,
    {
        let mut diagnostics = Vec::new();
        let mut groups: BTreeMap<PeriodKey, Vec<(usize, &Record)>> = BTreeMap::new();
        let mut extent: Option<(f64, f64)> = None;

        for (index, record) in records.iter().enumerate() {
            if let Some(reason) = malformed_reason(record) {
                diagnostics.push(BuildDiagnostic::MalformedRecord { index, reason });
                continue;
            }
            let value = record.primary_value;
            extent = Some(match extent {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            });
            groups
                .entry(group_fn(record))
                .or_default()
                .push((index, record));
        }

        let mut frames = Vec::with_capacity(groups.len());
        let mut global_max = f64::NEG_INFINITY;
        for (key, rows) in groups {
            let mut seen = HashSet::with_capacity(rows.len());
            let mut entities = Vec::with_capacity(rows.len());
            for (index, record) in rows {
                let entity = record.entity.trim();
                if !seen.insert(entity.to_owned()) {
                    diagnostics.push(BuildDiagnostic::DuplicateKeyInFrame {
                        period: key,
                        entity: entity.to_owned(),
                        index,
                    });
                    continue;
                }
                let mut record = record.clone();
                record.entity = entity.to_owned();
                record.period = key;
                entities.push(record);
            }

            // `sort_by_key` is stable, so ties keep input order.
            entities.sort_by_key(|record| std::cmp::Reverse(OrderedFloat(record.primary_value)));
            if let Some(limit) = self.config.rank_limit {
                entities.truncate(limit);
            }
            for record in &entities {
                global_max = global_max.max(record.primary_value);
            }

            frames.push(Frame {
                key,
                entities,
                rank_limit: self.config.rank_limit,
            });
        }

        let value_domain = if global_max.is_finite() && global_max > 0.0 {
            (0.0, global_max * self.config.domain_headroom)
        } else {
            (0.0, 1.0)
        };
        let value_extent = extent.unwrap_or((0.0, 0.0));

        let set = FrameSet {
            frames,
            value_domain,
            value_extent,
            diagnostics,
        };
        let malformed = set.malformed_count();
        let duplicates = set.duplicate_count();
        if malformed > 0 || duplicates > 0 {
            warn!(malformed, duplicates, "dropped records while building frames");
        }
        debug!(
            record_count = records.len(),
            frame_count = set.frames.len(),
            domain_max = set.value_domain.1,
            "built frames"
        );
        set
    }

    /// Distinct entities in first-seen order, skipping malformed rows.
    #[must_use]
    pub fn entity_order(records: &[Record]) -> IndexSet<String> {
        records
            .iter()
            .filter(|record| malformed_reason(record).is_none())
            .map(|record| record.entity.trim().to_owned())
            .collect()
    }
}

fn malformed_reason(record: &Record) -> Option<String> {
    if record.entity.trim().is_empty() {
        return Some("entity is empty".to_owned());
    }
    if !record.primary_value.is_finite() {
        return Some(format!(
            "primary value for `{}` is missing",
            record.entity.trim()
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{BuildDiagnostic, FrameBuilder, FrameBuilderConfig};
    use crate::core::{MISSING_VALUE, PeriodKey, Record};

    fn record(entity: &str, year: i32, value: f64) -> Record {
        Record::new(entity, PeriodKey::year(year), value)
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            record("C", 2020, 5.0),
            record("A", 2020, 7.0),
            record("B", 2020, 5.0),
        ];
        let set = FrameBuilder::default().build(&records, |r| r.period);
        let order: Vec<&str> = set.frames[0].keys().collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn frames_follow_key_order_not_input_order() {
        let records = vec![
            record("A", 2022, 1.0),
            record("A", 2020, 1.0),
            record("A", 2021, 1.0),
        ];
        let set = FrameBuilder::default().build(&records, |r| r.period);
        let years: Vec<i32> = set.frames.iter().map(|f| f.key.year).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
    }

    #[test]
    fn malformed_rows_are_counted_not_fatal() {
        let records = vec![
            record("A", 2020, 1.0),
            record("  ", 2020, 2.0),
            record("B", 2020, MISSING_VALUE),
        ];
        let set = FrameBuilder::default().build(&records, |r| r.period);
        assert_eq!(set.malformed_count(), 2);
        assert_eq!(set.frames.len(), 1);
        assert_eq!(set.frames[0].len(), 1);
        assert!(matches!(
            set.diagnostics[0],
            BuildDiagnostic::MalformedRecord { index: 1, .. }
        ));
    }

    #[test]
    fn zero_rank_limit_is_rejected() {
        let config = FrameBuilderConfig {
            rank_limit: Some(0),
            ..FrameBuilderConfig::default()
        };
        assert!(FrameBuilder::new(config).is_err());
    }

    #[test]
    fn non_positive_values_fall_back_to_unit_domain() {
        let records = vec![record("A", 2020, -4.0), record("B", 2020, 0.0)];
        let set = FrameBuilder::default().build(&records, |r| r.period);
        assert_eq!(set.value_domain, (0.0, 1.0));
        assert_eq!(set.value_extent, (-4.0, 0.0));
    }
}
