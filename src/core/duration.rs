use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)([hms]?)").expect("valid duration token regex"));

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("empty time string")]
    Empty,
    #[error("invalid time format: {0}")]
    Invalid(String),
}

/// Parse a staff-entered delay into whole seconds.
///
/// Accepted forms:
/// - `1:30` (hours:minutes), `1:30:00` (hours:minutes:seconds)
/// - `90m`, `1h30m`, `3600s` (units may be fractional, e.g. `1.5h`)
/// - `15` (bare number, minutes)
///
/// The token form must consume the whole string; `15x` is rejected
/// rather than silently read as 15 minutes.
pub fn parse_duration_secs(input: &str) -> Result<u64, DurationParseError> {
    let s = input.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err(DurationParseError::Empty);
    }

    if s.contains(':') {
        return parse_colon_form(&s);
    }

    let mut total = 0f64;
    let mut consumed = 0usize;
    for cap in TOKEN_RE.captures_iter(&s) {
        let whole = cap.get(0).expect("capture 0 always present");
        if whole.start() != consumed {
            return Err(DurationParseError::Invalid(input.to_string()));
        }
        consumed = whole.end();

        let value: f64 = cap[1]
            .parse()
            .map_err(|_| DurationParseError::Invalid(input.to_string()))?;
        total += match &cap[2] {
            "h" => value * 3600.0,
            "s" => value,
            // bare numbers and the `m` suffix both mean minutes
            _ => value * 60.0,
        };
    }

    if consumed != s.len() || consumed == 0 {
        return Err(DurationParseError::Invalid(input.to_string()));
    }
    Ok(total as u64)
}

fn parse_colon_form(s: &str) -> Result<u64, DurationParseError> {
    let parts: Vec<&str> = s.split(':').collect();
    let nums: Result<Vec<u64>, _> = parts.iter().map(|p| p.parse::<u64>()).collect();
    let nums = nums.map_err(|_| DurationParseError::Invalid(s.to_string()))?;
    match nums.as_slice() {
        [h, m] => Ok(h * 3600 + m * 60),
        [h, m, sec] => Ok(h * 3600 + m * 60 + sec),
        _ => Err(DurationParseError::Invalid(s.to_string())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core_duration.rs"]
mod tests;
