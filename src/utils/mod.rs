use regex::Regex;

/// Picks the most useful diagnostic out of yt-dlp's stderr: the last
/// `ERROR:` line, otherwise the last non-empty line.
pub fn failure_message(stderr_lines: &[String]) -> Option<String> {
    let re = Regex::new(r"^ERROR:\s*(.+)$").ok()?;

    let last_error = stderr_lines
        .iter()
        .rev()
        .find_map(|line| re.captures(line.trim()).map(|caps| caps[1].trim().to_string()));

    last_error.or_else(|| {
        stderr_lines
            .iter()
            .rev()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
            .map(ToOwned::to_owned)
    })
}

/// Text of a panic payload, for payloads raised with a message.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_prefers_last_error_line() {
        let stderr = lines(&[
            "ERROR: first problem",
            "WARNING: minor",
            "ERROR: [generic] Unsupported URL: https://example/video",
            "",
        ]);
        assert_eq!(
            failure_message(&stderr).as_deref(),
            Some("[generic] Unsupported URL: https://example/video")
        );
    }

    #[test]
    fn test_falls_back_to_last_non_empty_line() {
        let stderr = lines(&["Traceback (most recent call last):", "KeyError: 'title'", "  "]);
        assert_eq!(failure_message(&stderr).as_deref(), Some("KeyError: 'title'"));
    }

    #[test]
    fn test_no_diagnostic() {
        assert_eq!(failure_message(&[]), None);
        assert_eq!(failure_message(&lines(&["", "   "])), None);
    }

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 7");

        let payload = std::panic::catch_unwind(|| panic!("static boom")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static boom");
    }
}
