//! Target temperature parsing for `cmd.setpoint.set`.

use crate::error::ValidationError;

/// Parse a requested target temperature into whole degrees.
///
/// Accepts an integer string (`"21"`) or a dotted decimal (`"21.5"`). The
/// first fractional digit decides the rounding: `5` and above round up to
/// the next whole degree, anything below is dropped.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTemperature`] when the text is not a
/// number.
pub fn parse_target_temp(raw: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidTemperature(raw.to_string());
    let text = raw.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    let negative = whole.starts_with('-');
    let mut degrees: i64 = whole.parse().map_err(|_| invalid())?;

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let first_digit = fraction.bytes().next().map_or(0, |b| b - b'0');
    if first_digit >= 5 {
        let rounded = if negative {
            degrees.checked_sub(1)
        } else {
            degrees.checked_add(1)
        };
        degrees = rounded.ok_or_else(invalid)?;
    }
    Ok(degrees)
}
