//! Conversions from raw dump tokens to typed values.
//!
//! All functions here are pure and allocation-light; the registry
//! composes them into per-record transformers.

use crate::utils::error::ParseError;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Byte offset of the `-` separating date and time in a dump timestamp
const DATE_TIME_SEPARATOR: usize = 10;

/// Length of `YYYY-MM-DD-HH:MM:SS`, the shortest accepted timestamp
const TIMESTAMP_MIN_LEN: usize = 19;

/// Parse a dump timestamp into unix-epoch nanoseconds
///
/// **Public** - used by phase transformers
///
/// Dump timestamps look like `2020-11-10-10:50:37.794688309`: an ISO-8601
/// date-time with `-` instead of `T`. They carry no zone and are read as UTC.
///
/// # Errors
/// * `ParseError::TimestampTooShort` - shorter than `YYYY-MM-DD-HH:MM:SS`
/// * `ParseError::InvalidTimestamp` - not a valid date-time
/// * `ParseError::TimestampOutOfRange` - does not fit i64 nanoseconds
pub fn parse_timestamp(value: &str) -> Result<i64, ParseError> {
    if value.len() < TIMESTAMP_MIN_LEN {
        return Err(ParseError::TimestampTooShort(value.to_string()));
    }

    let iso = match (
        value.get(..DATE_TIME_SEPARATOR),
        value.get(DATE_TIME_SEPARATOR + 1..),
    ) {
        (Some(date), Some(time)) => format!("{}T{}", date, time),
        _ => value.to_string(),
    };

    let parsed = NaiveDateTime::parse_from_str(&iso, "%Y-%m-%dT%H:%M:%S%.f").map_err(|source| {
        ParseError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })?;

    parsed
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| ParseError::TimestampOutOfRange(value.to_string()))
}

/// Strip list punctuation around a numeric token: `1170,` or `<42>`
pub fn clean_id(token: &str) -> &str {
    token
        .trim_end_matches(',')
        .trim_matches(|c: char| c == '<' || c == '>')
}

/// Parse an identifier token after `clean_id`
///
/// # Errors
/// * `ParseError::InvalidInteger` - token is not a signed 64-bit integer
pub fn parse_id(token: &str) -> Result<i64, ParseError> {
    let cleaned = clean_id(token);
    cleaned
        .parse::<i64>()
        .map_err(|source| ParseError::InvalidInteger {
            token: token.to_string(),
            source,
        })
}

/// Parse one 64-bit half of a gateway uid, e.g. `0x9d4251f41ddb76f0,`
///
/// # Errors
/// * `ParseError::InvalidInteger` - token is not hexadecimal
pub fn parse_hex_u64(token: &str) -> Result<u64, ParseError> {
    let trimmed = token.trim_matches(|c: char| c == ',' || c.is_whitespace());
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    u64::from_str_radix(digits, 16).map_err(|source| ParseError::InvalidInteger {
        token: token.to_string(),
        source,
    })
}

/// Rebuild a canonical uuid from two printed 64-bit halves
///
/// Each half is printed as a number but stored little-endian, so the bytes
/// of each half are reversed before they are laid out.
pub fn swapped_uuid(first: u64, last: u64) -> String {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&first.to_le_bytes());
    bytes[8..].copy_from_slice(&last.to_le_bytes());
    Uuid::from_bytes(bytes).hyphenated().to_string()
}

/// Parse an inline `key: value, key: value` block
///
/// **Public** - used by session-scoped edge transformers
///
/// # Returns
/// Pairs in input order, keys and values trimmed
///
/// # Errors
/// * `ParseError::InvalidPair` - an entry has no `:`
pub fn parse_kv_block(block: &str) -> Result<Vec<(&str, &str)>, ParseError> {
    block
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once(':')
                .map(|(key, value)| (key.trim(), value.trim()))
                .ok_or_else(|| ParseError::InvalidPair(entry.to_string()))
        })
        .collect()
}
