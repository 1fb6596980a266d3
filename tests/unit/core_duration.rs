use super::*;

#[test]
fn colon_form_hours_minutes() {
    assert_eq!(parse_duration_secs("1:30").unwrap(), 5400);
}

#[test]
fn colon_form_with_seconds() {
    assert_eq!(parse_duration_secs("1:30:00").unwrap(), 5400);
    assert_eq!(parse_duration_secs("2:15:30").unwrap(), 8130);
}

#[test]
fn unit_tokens() {
    assert_eq!(parse_duration_secs("90m").unwrap(), 5400);
    assert_eq!(parse_duration_secs("1h30m").unwrap(), 5400);
    assert_eq!(parse_duration_secs("3600s").unwrap(), 3600);
}

#[test]
fn bare_number_is_minutes() {
    assert_eq!(parse_duration_secs("15").unwrap(), 900);
}

#[test]
fn fractional_units() {
    assert_eq!(parse_duration_secs("1.5h").unwrap(), 5400);
    assert_eq!(parse_duration_secs("0.5m").unwrap(), 30);
}

#[test]
fn whitespace_and_case_are_tolerated() {
    assert_eq!(parse_duration_secs(" 1H30M ").unwrap(), 5400);
}

#[test]
fn empty_string_is_rejected() {
    assert_eq!(parse_duration_secs("").unwrap_err(), DurationParseError::Empty);
    assert_eq!(
        parse_duration_secs("   ").unwrap_err(),
        DurationParseError::Empty
    );
}

#[test]
fn garbage_is_rejected() {
    assert!(parse_duration_secs("abc").is_err());
    assert!(parse_duration_secs("h").is_err());
    assert!(parse_duration_secs("1:2:3:4").is_err());
    assert!(parse_duration_secs("1:xx").is_err());
}

#[test]
fn trailing_garbage_is_rejected() {
    assert!(parse_duration_secs("15x").is_err());
    assert!(parse_duration_secs("1h30m!").is_err());
}
