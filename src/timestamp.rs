use chrono::NaiveDate;
use memchr::memchr;

use crate::error::{ConvertError, Result};

const INPUT_DATE_FORMAT: &str = "%d-%b-%Y";
const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d";

/// `22-Feb-2021` -> `2021-02-22`
pub fn reformat_date(input: &str) -> Result<String> {
    let date =
        NaiveDate::parse_from_str(input, INPUT_DATE_FORMAT).map_err(|source| ConvertError::Parse {
            input: input.to_string(),
            source,
        })?;
    Ok(date.format(OUTPUT_DATE_FORMAT).to_string())
}

/// Chop sub-seconds: `18:15:47.926` -> `18:15:47`.
pub fn reformat_time(input: &str) -> &str {
    match memchr(b'.', input.as_bytes()) {
        Some(dot) => &input[..dot],
        None => input,
    }
}

/// Rewrite a `DD-Mon-YYYY HH:MM:SS[.fff]` timestamp.
///
/// With `discard_date` only the time of day is returned and the date part is
/// never parsed, so a malformed date only fails when it is retained.
pub fn reformat_datetime(input: &str, discard_date: bool) -> Result<String> {
    let space = memchr(b' ', input.as_bytes()).ok_or_else(|| ConvertError::Format {
        input: input.to_string(),
    })?;
    let (date, time) = (&input[..space], &input[space + 1..]);
    let time = reformat_time(time);

    if discard_date {
        return Ok(time.to_string());
    }

    let date = reformat_date(date)?;
    let mut out = String::with_capacity(date.len() + 1 + time.len());
    out.push_str(&date);
    out.push(' ');
    out.push_str(time);
    Ok(out)
}
