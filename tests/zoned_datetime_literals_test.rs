use forthic::literals::{to_zoned_datetime, ForthicValue};

// Literal Parsing Tests

#[test]
fn test_parse_utc_datetime_with_z_suffix_converts_to_default_timezone() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-24T10:15:00Z");

    assert!(result.is_some());
    // 10:15 UTC is 06:15 in New York (EDT, UTC-4) in May.
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 6);
        assert_eq!(dt.minute, 15);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_iana_timezone_with_bracket_notation() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-20T08:00:00[America/Los_Angeles]");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        // No explicit offset/Z: the bracketed zone is treated as the timezone the
        // wall-clock fields are already expressed in, so it passes through unchanged.
        assert_eq!(dt.hour, 8);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_datetime_with_offset_and_iana_timezone() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-20T08:00:00-07:00[America/Los_Angeles]");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        // -07:00 is the Los Angeles summer offset, so the bracketed zone reproduces
        // the same wall-clock hour the offset already encoded.
        assert_eq!(dt.hour, 8);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_datetime_with_offset_only() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-24T10:15:00-05:00");

    assert!(result.is_some());
    // 10:15-05:00 is 15:15 UTC, which is 11:15 in New York (EDT, UTC-4) in May.
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 11);
        assert_eq!(dt.minute, 15);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_datetime_without_timezone_uses_default() {
    let parser = to_zoned_datetime("America/Los_Angeles");
    let result = parser("2025-05-24T10:15:00");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 10);
        assert_eq!(dt.minute, 15);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_various_iana_timezones() {
    let parser = to_zoned_datetime("UTC");

    for s in [
        "2025-05-20T14:30:00[Europe/London]",
        "2025-05-20T09:00:00[Asia/Tokyo]",
        "2025-05-20T18:00:00[Australia/Sydney]",
    ] {
        assert!(parser(s).is_some(), "expected {s} to parse");
    }
}

#[test]
fn test_unparseable_bracket_zone_falls_back_to_default_timezone() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-20T08:00:00[Invalid/Timezone]");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 8);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_returns_none_for_strings_without_t() {
    let parser = to_zoned_datetime("America/New_York");

    assert!(parser("2025-05-20").is_none());
    assert!(parser("regular-word").is_none());
    assert!(parser("08:00:00").is_none());
}

#[test]
fn test_returns_none_for_malformed_datetime_strings() {
    let parser = to_zoned_datetime("America/New_York");

    assert!(parser("2025-13-45T10:15:00").is_none()); // Invalid month/day
    assert!(parser("not-a-datetime[America/Los_Angeles]").is_none());
    assert!(parser("2025-05-20T25:00:00").is_none()); // Invalid hour
}

#[test]
fn test_returns_none_for_brackets_without_datetime() {
    let parser = to_zoned_datetime("America/New_York");

    assert!(parser("[America/Los_Angeles]").is_none());
    assert!(parser("word[bracket]").is_none());
}

#[test]
fn test_parse_datetime_with_seconds() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-20T08:30:45[America/Los_Angeles]");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 8);
        assert_eq!(dt.minute, 30);
        assert_eq!(dt.second, 45);
    } else {
        panic!("Expected DateTime");
    }
}

#[test]
fn test_parse_utc_datetime_with_brackets() {
    let parser = to_zoned_datetime("America/New_York");
    let result = parser("2025-05-20T08:00:00Z[UTC]");

    assert!(result.is_some());
    if let ForthicValue::DateTime(dt) = result.unwrap() {
        assert_eq!(dt.hour, 8);
    } else {
        panic!("Expected DateTime");
    }
}
