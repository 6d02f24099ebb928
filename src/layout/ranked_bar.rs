use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Frame, LinearScale};
use crate::error::{RaceError, RaceResult};

use super::BarGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedBarConfig {
    /// Share of each band left empty between bars, in `[0, 1)`.
    pub band_padding: f64,
    /// Smallest band height that still fits a bar; bounds the band capacity.
    pub min_band_height_px: f64,
}

impl Default for RankedBarConfig {
    fn default() -> Self {
        Self {
            band_padding: 0.1,
            min_band_height_px: 12.0,
        }
    }
}

impl RankedBarConfig {
    pub fn validate(self) -> RaceResult<Self> {
        if !self.band_padding.is_finite() || !(0.0..1.0).contains(&self.band_padding) {
            return Err(RaceError::InvalidConfig(
                "band padding must be finite and in [0, 1)".to_owned(),
            ));
        }
        if !self.min_band_height_px.is_finite() || self.min_band_height_px <= 0.0 {
            return Err(RaceError::InvalidConfig(
                "minimum band height must be finite and > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Final slot and length assigned to one ranked entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarTarget {
    pub rank: usize,
    pub y: f64,
    pub extent: f64,
    pub thickness: f64,
}

impl BarTarget {
    #[must_use]
    pub fn geometry(self) -> BarGeometry {
        BarGeometry::new(self.y, self.extent)
    }
}

/// Band layout for a ranked frame.
///
/// The value scale is fixed at construction from the global domain, so the
/// same value maps to the same extent in every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedBarLayout {
    value_scale: LinearScale,
    band_extent: f64,
    capacity: usize,
    config: RankedBarConfig,
}

impl RankedBarLayout {
    pub fn new(
        value_domain: (f64, f64),
        band_extent: f64,
        available_width: f64,
        config: RankedBarConfig,
    ) -> RaceResult<Self> {
        let config = config.validate()?;
        if !band_extent.is_finite() || band_extent <= 0.0 {
            return Err(RaceError::InvalidConfig(
                "band extent must be finite and > 0".to_owned(),
            ));
        }
        if !available_width.is_finite() || available_width <= 0.0 {
            return Err(RaceError::InvalidConfig(
                "available width must be finite and > 0".to_owned(),
            ));
        }

        let value_scale = LinearScale::new(value_domain, (0.0, available_width))?;
        let capacity = (band_extent / config.min_band_height_px).floor() as usize;
        if capacity == 0 {
            return Err(RaceError::InvalidConfig(format!(
                "band extent {band_extent} cannot fit a single band of {} px",
                config.min_band_height_px
            )));
        }

        Ok(Self {
            value_scale,
            band_extent,
            capacity,
            config,
        })
    }

    #[must_use]
    pub fn value_scale(&self) -> LinearScale {
        self.value_scale
    }

    /// Maximum number of bands that fit the band extent.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn visible_count(&self, frame: &Frame) -> usize {
        frame.len().min(self.capacity)
    }

    #[must_use]
    pub fn band_height(&self, frame: &Frame) -> f64 {
        let count = self.visible_count(frame);
        if count == 0 {
            return 0.0;
        }
        self.band_extent / count as f64
    }

    /// Maps a value onto the bar length; values below the domain clamp to 0.
    pub fn extent_of(&self, value: f64) -> RaceResult<f64> {
        Ok(self.value_scale.map(value)?.max(0.0))
    }

    /// Targets for the entities of `frame` that fit the band capacity, in
    /// rank order.
    pub fn layout(&self, frame: &Frame) -> RaceResult<IndexMap<String, BarTarget>> {
        let band_height = self.band_height(frame);
        let thickness = band_height * (1.0 - self.config.band_padding);

        frame
            .entities
            .iter()
            .take(self.visible_count(frame))
            .enumerate()
            .map(|(rank, record)| {
                let target = BarTarget {
                    rank,
                    y: rank as f64 * band_height,
                    extent: self.extent_of(record.primary_value)?,
                    thickness,
                };
                Ok((record.entity.clone(), target))
            })
            .collect()
    }
}
