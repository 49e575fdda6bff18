use memchr::memchr;
use thiserror::Error;

pub const DELIMITER: u8 = b';';

/// One parsed line, borrowing its key from the reader's buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: f64,
}

/// Why a line was skipped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing ';' delimiter")]
    MissingDelimiter,

    #[error("value is not a number")]
    InvalidValue,

    /// NaN and infinities would leave min/max ordering undefined.
    #[error("value is not finite")]
    NonFinite,
}

/// Drops any trailing `\n` / `\r` left over from the line terminator.
#[inline]
pub fn trim_line_ending(mut line: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r'] = line {
        line = rest;
    }
    line
}

/// Splits a raw line on the first `;` and parses the remainder as `f64`.
#[inline]
pub fn parse_record(line: &[u8]) -> Result<Record<'_>, ParseError> {
    let line = trim_line_ending(line);
    let semicolon = memchr(DELIMITER, line).ok_or(ParseError::MissingDelimiter)?;
    let (key, rest) = line.split_at(semicolon);
    let value =
        fast_float::parse::<f64, _>(&rest[1..]).map_err(|_| ParseError::InvalidValue)?;
    if !value.is_finite() {
        return Err(ParseError::NonFinite);
    }
    Ok(Record { key, value })
}
