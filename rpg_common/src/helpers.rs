/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Interprets the conventional "switch this off" spellings used for optional list-valued settings.
pub fn is_disabled_marker(value: &str) -> bool {
    ["none", "false", "0", "off", ""].contains(&value.trim().to_lowercase().as_str())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("TRUE".into()), false));
        assert!(parse_boolean_flag(Some(" on ".into()), false));
        assert!(!parse_boolean_flag(Some("0".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn disabled_markers() {
        assert!(is_disabled_marker("None"));
        assert!(is_disabled_marker(" "));
        assert!(!is_disabled_marker("196.201.214.200"));
    }
}
