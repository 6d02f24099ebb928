use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::primitives::coerce_number;
use crate::error::{RaceError, RaceResult};

pub const DEFAULT_CATEGORY_COLOR: &str = "steelblue";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Outer margins reserved for axes and labels around the plot area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    #[must_use]
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[must_use]
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Drawable region left once margins are subtracted from the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn resolve(viewport: Viewport, margins: Margins) -> RaceResult<Self> {
        if !viewport.is_valid() {
            return Err(RaceError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        for (value, name) in [
            (margins.top, "top"),
            (margins.right, "right"),
            (margins.bottom, "bottom"),
            (margins.left, "left"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RaceError::InvalidConfig(format!(
                    "margin `{name}` must be finite and >= 0"
                )));
            }
        }

        let width = f64::from(viewport.width) - margins.left - margins.right;
        let height = f64::from(viewport.height) - margins.top - margins.bottom;
        if width <= 0.0 || height <= 0.0 {
            return Err(RaceError::InvalidConfig(format!(
                "margins leave no plot area: {width}x{height}"
            )));
        }

        Ok(Self { width, height })
    }
}

/// Orderable time key of a frame: a whole year or one month of a year.
///
/// The derived order is chronological; a year-only key sorts before the
/// months of the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Option<u8>,
}

impl PeriodKey {
    #[must_use]
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn month(year: i32, month: u8) -> RaceResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(RaceError::InvalidData(format!(
                "month must be in 1..=12, got {month}"
            )));
        }
        Ok(Self {
            year,
            month: Some(month),
        })
    }

    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: u8::try_from(date.month()).ok(),
        }
    }

    /// Collapses a monthly key onto its year.
    #[must_use]
    pub fn to_year(self) -> Self {
        Self::year(self.year)
    }

    #[must_use]
    pub fn is_sub_period(self) -> bool {
        self.month.is_some()
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{}-{month:02}", self.year),
            None => write!(f, "{}", self.year),
        }
    }
}

/// Parses `2021`, `2021-03` or a calendar date such as `2021-03-15`; a full
/// date collapses onto its month.
impl FromStr for PeriodKey {
    type Err = RaceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let invalid = || RaceError::InvalidData(format!("unrecognized period `{trimmed}`"));
        let mut parts = trimmed.split('-');
        let year = parts
            .next()
            .and_then(|year| year.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Self::year(year)),
            (Some(month), None) => {
                let month = month.parse::<u8>().map_err(|_| invalid())?;
                Self::month(year, month)
            }
            (Some(_), Some(_)) => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(Self::from_date)
                .map_err(|_| invalid()),
        }
    }
}

/// One observation delivered by the data source.
///
/// `entity` is the reconciliation key and must identify the same firm in
/// every period. A missing primary value is carried as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity: String,
    pub period: PeriodKey,
    pub primary_value: f64,
    #[serde(default)]
    pub secondary_value: Option<f64>,
    #[serde(default = "default_category_color")]
    pub category_color: String,
    #[serde(default)]
    pub icon_ref: Option<String>,
}

impl Record {
    #[must_use]
    pub fn new(entity: impl Into<String>, period: PeriodKey, primary_value: f64) -> Self {
        Self {
            entity: entity.into(),
            period,
            primary_value,
            secondary_value: None,
            category_color: default_category_color(),
            icon_ref: None,
        }
    }

    /// Builds a record from raw table text.
    ///
    /// An unrecognized period is an error; an unparsable value becomes the
    /// missing sentinel so the frame builder reports it as malformed.
    pub fn from_row(entity: impl Into<String>, period: &str, value: &str) -> RaceResult<Self> {
        Ok(Self::new(entity, period.parse()?, coerce_number(value)))
    }

    #[must_use]
    pub fn with_secondary_value(mut self, value: f64) -> Self {
        self.secondary_value = Some(value);
        self
    }

    #[must_use]
    pub fn with_category_color(mut self, color: impl Into<String>) -> Self {
        self.category_color = color.into();
        self
    }

    #[must_use]
    pub fn with_icon_ref(mut self, icon_ref: impl Into<String>) -> Self {
        self.icon_ref = Some(icon_ref.into());
        self
    }
}

fn default_category_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_owned()
}
