use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{RaceError, RaceResult};

/// Linear map from a value domain onto a pixel range.
///
/// One instance is built per visualization from the global value domain and
/// shared by every frame, so extents stay comparable across the animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> RaceResult<Self> {
        let (domain_start, domain_end) = domain;
        let (range_start, range_end) = range;
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(RaceError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }
        if !range_start.is_finite() || !range_end.is_finite() {
            return Err(RaceError::InvalidData(
                "scale range must be finite".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
            range_start,
            range_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    pub fn map(self, value: f64) -> RaceResult<f64> {
        if !value.is_finite() {
            return Err(RaceError::InvalidData("value must be finite".to_owned()));
        }

        let normalized = (value - self.domain_start) / (self.domain_end - self.domain_start);
        Ok(self.range_start + normalized * (self.range_end - self.range_start))
    }
}

/// Ordinal scale dividing a pixel range into equal bands, one per key.
///
/// `padding` is applied both between bands and at the outer edges, and the
/// leftover space is centered.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    keys: IndexSet<String>,
    range_start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    pub fn new<I, S>(keys: I, range: (f64, f64), padding: f64) -> RaceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !padding.is_finite() || !(0.0..1.0).contains(&padding) {
            return Err(RaceError::InvalidConfig(
                "band padding must be finite and in [0, 1)".to_owned(),
            ));
        }
        let (start, end) = range;
        if !start.is_finite() || !end.is_finite() || end <= start {
            return Err(RaceError::InvalidData(
                "band range must be finite and increasing".to_owned(),
            ));
        }

        let keys: IndexSet<String> = keys.into_iter().map(Into::into).collect();
        let count = keys.len() as f64;
        let span = end - start;
        let (step, bandwidth, offset) = if keys.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let step = span / (count + padding).max(1.0);
            let used = step * (count - padding);
            (step, step * (1.0 - padding), (span - used) * 0.5)
        };

        Ok(Self {
            keys,
            range_start: start + offset,
            step,
            bandwidth,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Leading edge of the band assigned to `key`.
    #[must_use]
    pub fn position(&self, key: &str) -> Option<f64> {
        self.keys
            .get_index_of(key)
            .map(|index| self.range_start + self.step * index as f64)
    }

    #[must_use]
    pub fn center(&self, key: &str) -> Option<f64> {
        self.position(key).map(|start| start + self.bandwidth * 0.5)
    }
}
