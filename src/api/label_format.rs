use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, RaceResult};

/// Host-supplied formatter for element value labels.
pub type ValueLabelFormatterFn = Arc<dyn Fn(f64) -> String + Send + Sync + 'static>;

/// Built-in value label styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueLabelFormat {
    /// `value / divisor` with fixed decimals, wrapped in prefix and suffix.
    Scaled {
        divisor: f64,
        decimals: u8,
        prefix: String,
        suffix: String,
    },
    /// SI-prefixed value with `significant` digits; giga renders as `B`.
    Si { significant: u8 },
    Plain { decimals: u8 },
}

impl Default for ValueLabelFormat {
    fn default() -> Self {
        Self::millions("")
    }
}

impl ValueLabelFormat {
    /// Millions with one decimal, e.g. `€12.3M`.
    #[must_use]
    pub fn millions(currency_prefix: impl Into<String>) -> Self {
        Self::Scaled {
            divisor: 1_000_000.0,
            decimals: 1,
            prefix: currency_prefix.into(),
            suffix: "M".to_owned(),
        }
    }

    pub fn validate(&self) -> RaceResult<()> {
        match self {
            Self::Scaled {
                divisor, decimals, ..
            } => {
                if !divisor.is_finite() || *divisor == 0.0 {
                    return Err(RaceError::InvalidConfig(
                        "label divisor must be finite and non-zero".to_owned(),
                    ));
                }
                validate_precision(*decimals)
            }
            Self::Si { significant } => {
                if *significant == 0 {
                    return Err(RaceError::InvalidConfig(
                        "SI label needs at least one significant digit".to_owned(),
                    ));
                }
                validate_precision(*significant)
            }
            Self::Plain { decimals } => validate_precision(*decimals),
        }
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return "–".to_owned();
        }
        match self {
            Self::Scaled {
                divisor,
                decimals,
                prefix,
                suffix,
            } => {
                let scaled = value / divisor;
                let sign = if scaled < 0.0 { "-" } else { "" };
                let magnitude = scaled.abs();
                let decimals = usize::from(*decimals);
                format!("{sign}{prefix}{magnitude:.decimals$}{suffix}")
            }
            Self::Si { significant } => format_si(value, *significant),
            Self::Plain { decimals } => {
                let decimals = usize::from(*decimals);
                format!("{value:.decimals$}")
            }
        }
    }
}

fn validate_precision(precision: u8) -> RaceResult<()> {
    if precision > 12 {
        return Err(RaceError::InvalidConfig(
            "label precision must be <= 12".to_owned(),
        ));
    }
    Ok(())
}

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "B", "T", "P", "E", "Z", "Y",
];

/// Formats `value` with an SI prefix and `significant` digits.
#[must_use]
pub fn format_si(value: f64, significant: u8) -> String {
    let significant = i32::from(significant.max(1));
    if value == 0.0 {
        let decimals = (significant - 1) as usize;
        return format!("{:.decimals$}", 0.0);
    }

    let rounded = round_significant(value, significant);
    let exponent = rounded.abs().log10().floor() as i32;
    let si_exponent = (exponent.div_euclid(3) * 3).clamp(-24, 24);
    let scaled = rounded / 10f64.powi(si_exponent);
    let decimals = (significant - 1 - (exponent - si_exponent)).max(0) as usize;
    let prefix = SI_PREFIXES[((si_exponent + 24) / 3) as usize];
    format!("{scaled:.decimals$}{prefix}")
}

fn round_significant(value: f64, significant: i32) -> f64 {
    let exponent = value.abs().log10().floor() as i32;
    let shift = significant - 1 - exponent;
    // Keep the scale factor an exact power of ten.
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}
