// ABOUTME: SMPP time-string helpers for schedule_delivery_time and validity_period
// ABOUTME: Builds the 16-character absolute (YYMMDDhhmmsstnnp) and relative forms

use super::fixed_string::{FixedStringError, TimeString};

/// Build an absolute SMPP time string `YYMMDDhhmmsstnnp`.
///
/// `tenths` is tenths of a second, `utc_offset_quarters` the distance from
/// UTC in quarter hours (0..=48) and `east` its direction ('+' when the
/// local time is ahead of UTC).
#[allow(clippy::too_many_arguments)]
pub fn absolute(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    tenths: u8,
    utc_offset_quarters: u8,
    east: bool,
) -> Result<TimeString, TimeStringError> {
    if month == 0 || month > 12 || day == 0 || day > 31 {
        return Err(TimeStringError::OutOfRange("date"));
    }
    if hour > 23 || minute > 59 || second > 59 || tenths > 9 {
        return Err(TimeStringError::OutOfRange("time"));
    }
    if utc_offset_quarters > 48 {
        return Err(TimeStringError::OutOfRange("utc offset"));
    }
    let value = format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}{}{:02}{}",
        year % 100,
        month,
        day,
        hour,
        minute,
        second,
        tenths,
        utc_offset_quarters,
        if east { '+' } else { '-' }
    );
    TimeString::new(value).map_err(TimeStringError::Length)
}

/// Build a relative SMPP time string `YYMMDDhhmmss000R`, meaning "this far
/// from now" in SMSC-local time.
pub fn relative(
    years: u8,
    months: u8,
    days: u8,
    hours: u8,
    minutes: u8,
    seconds: u8,
) -> Result<TimeString, TimeStringError> {
    if years > 99 || months > 99 || days > 99 || hours > 99 || minutes > 99 || seconds > 99 {
        return Err(TimeStringError::OutOfRange("relative interval"));
    }
    let value = format!(
        "{years:02}{months:02}{days:02}{hours:02}{minutes:02}{seconds:02}000R"
    );
    TimeString::new(value).map_err(TimeStringError::Length)
}

/// Validate a caller-supplied time string: empty (immediate / default), or
/// 16 characters in either the absolute or the relative form.
pub fn validate(value: &str) -> Result<(), TimeStringError> {
    if value.is_empty() {
        return Ok(());
    }
    let bytes = value.as_bytes();
    if bytes.len() != 16 {
        return Err(TimeStringError::BadFormat);
    }
    if !bytes[..13].iter().all(u8::is_ascii_digit) {
        return Err(TimeStringError::BadFormat);
    }
    match bytes[15] {
        b'R' => {
            // Relative: the tenths and offset digits are zero by definition.
            if &bytes[12..15] != b"000" {
                return Err(TimeStringError::BadFormat);
            }
        }
        b'+' | b'-' => {
            if !bytes[13..15].iter().all(u8::is_ascii_digit) {
                return Err(TimeStringError::BadFormat);
            }
        }
        _ => return Err(TimeStringError::BadFormat),
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeStringError {
    #[error("time component out of range: {0}")]
    OutOfRange(&'static str),
    #[error("time string must be empty or 16 characters in YYMMDDhhmmsstnnp form")]
    BadFormat,
    #[error(transparent)]
    Length(FixedStringError),
}
