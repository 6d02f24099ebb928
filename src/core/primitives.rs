use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Sentinel stored in numeric record fields the data source could not coerce.
pub const MISSING_VALUE: f64 = f64::NAN;

/// Coerces a raw table cell into a number.
///
/// Surrounding whitespace is ignored and an empty cell counts as zero, the
/// same way browser numeric coercion treats it. Plain decimal text is read
/// exactly as a [`Decimal`] first; exponent forms fall back to `f64` parsing.
/// Anything unparsable maps to [`MISSING_VALUE`] instead of failing.
#[must_use]
pub fn coerce_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Ok(value) = trimmed.parse::<Decimal>() {
        return coerce_decimal(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => MISSING_VALUE,
    }
}

#[must_use]
pub fn is_missing(value: f64) -> bool {
    !value.is_finite()
}

/// Converts a decimal amount, mapping values `f64` cannot hold to
/// [`MISSING_VALUE`].
#[must_use]
pub fn coerce_decimal(value: Decimal) -> f64 {
    value
        .to_f64()
        .filter(|value| value.is_finite())
        .unwrap_or(MISSING_VALUE)
}

#[cfg(test)]
mod tests {
    use super::{coerce_decimal, coerce_number, is_missing};
    use rust_decimal::Decimal;

    #[test]
    fn coerce_number_accepts_padded_numbers() {
        assert_eq!(coerce_number(" 12.5 "), 12.5);
        assert_eq!(coerce_number("-3"), -3.0);
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("1e3"), 1_000.0);
    }

    #[test]
    fn coerce_number_maps_garbage_to_missing() {
        assert!(is_missing(coerce_number("n/a")));
        assert!(is_missing(coerce_number("12,5")));
        assert!(is_missing(coerce_number("inf")));
    }

    #[test]
    fn decimal_text_matches_decimal_conversion() {
        let value = coerce_decimal(Decimal::new(12345, 2));
        assert!((value - 123.45).abs() <= 1e-12);
        assert_eq!(coerce_number("123.45"), value);
        assert_eq!(coerce_number("-0.5"), -0.5);
    }
}
