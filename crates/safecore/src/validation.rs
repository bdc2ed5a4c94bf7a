//! Wizard input validation
//!
//! Step handlers re-prompt with the specific reason on failure; validation
//! never mutates scene state. Limits live in `config::limits` so the
//! prompts and the checks stay in sync.

use chrono::{Local, NaiveDate};
use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::config::limits;

static SERVICE_NAME_RE: Lazy<Regex> = lazy_regex!(r"^[a-zA-Z0-9\s\.\-_]+$");
static TAG_RE: Lazy<Regex> = lazy_regex!(r"^[a-zA-Z0-9\-_]+$");
static HASHTAG_RE: Lazy<Regex> = lazy_regex!(r"#(\w+)");

/// Validates a service name for password storage.
pub fn validate_service_name(service_name: &str) -> Result<(), String> {
    if service_name.trim().is_empty() {
        return Err("Service name cannot be empty".to_string());
    }
    if service_name.len() > limits::MAX_SERVICE_NAME {
        return Err(format!(
            "Service name must be less than {} characters",
            limits::MAX_SERVICE_NAME
        ));
    }
    if !SERVICE_NAME_RE.is_match(service_name) {
        return Err("Service name contains invalid characters".to_string());
    }
    Ok(())
}

/// Validates a stored username.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.len() > limits::MAX_USERNAME {
        return Err(format!("Username must be less than {} characters", limits::MAX_USERNAME));
    }
    Ok(())
}

/// Validates a stored password (not the master password — strength rules
/// live in `security::auth`).
pub fn validate_stored_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    if password.len() > limits::MAX_STORED_PASSWORD {
        return Err(format!(
            "Password must be less than {} characters",
            limits::MAX_STORED_PASSWORD
        ));
    }
    Ok(())
}

/// Validates task content.
pub fn validate_task_content(content: &str) -> Result<(), String> {
    if content.trim().is_empty() {
        return Err("Task content cannot be empty".to_string());
    }
    if content.len() > limits::MAX_TASK_CONTENT {
        return Err(format!(
            "Task content must be less than {} characters",
            limits::MAX_TASK_CONTENT
        ));
    }
    Ok(())
}

/// Validates and parses a YYYY-MM-DD due date; rejects dates in the past.
pub fn validate_due_date(date_str: &str) -> Result<NaiveDate, String> {
    let parsed = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| "Invalid date format. Use YYYY-MM-DD (e.g., 2026-12-31)".to_string())?;
    if parsed < Local::now().date_naive() {
        return Err("Due date cannot be in the past".to_string());
    }
    Ok(parsed)
}

/// Validates a parsed tag list.
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    if tags.len() > limits::MAX_TAGS {
        return Err(format!("Maximum {} tags allowed", limits::MAX_TAGS));
    }
    for tag in tags {
        if tag.len() > limits::MAX_TAG_LEN {
            return Err(format!("Each tag must be less than {} characters", limits::MAX_TAG_LEN));
        }
        if !TAG_RE.is_match(tag) {
            return Err(format!("Tag '{}' contains invalid characters", tag));
        }
    }
    Ok(())
}

/// Validates a file name.
pub fn validate_file_name(file_name: &str) -> Result<(), String> {
    if file_name.trim().is_empty() {
        return Err("File name cannot be empty".to_string());
    }
    if file_name.len() > limits::MAX_FILE_NAME {
        return Err(format!(
            "File name must be less than {} characters",
            limits::MAX_FILE_NAME
        ));
    }
    for c in ['<', '>', ':', '"', '/', '\\', '|', '?', '*'] {
        if file_name.contains(c) {
            return Err(format!("File name cannot contain '{}'", c));
        }
    }
    Ok(())
}

/// Strips null bytes and surrounding whitespace from user input.
pub fn sanitize_input(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}

/// Parses tags from free text: hashtags first, comma-separated as fallback.
/// Tags come back lowercased, deduplicated, capped at the tag limit.
pub fn parse_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = HASHTAG_RE
        .captures_iter(text)
        .map(|c| c[1].to_lowercase())
        .collect();

    if tags.is_empty() && text.contains(',') {
        tags = text
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
    }

    tags.sort();
    tags.dedup();
    tags.truncate(limits::MAX_TAGS);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ==================== Service name ====================

    #[test]
    fn test_validate_service_name_valid() {
        let cases = vec!["Gmail", "my-bank.com", "Work VPN_2", "a"];
        for name in cases {
            assert!(validate_service_name(name).is_ok(), "failed for: {}", name);
        }
    }

    #[test]
    fn test_validate_service_name_invalid() {
        assert!(validate_service_name("").is_err());
        assert!(validate_service_name("   ").is_err());
        assert!(validate_service_name(&"x".repeat(101)).is_err());
        assert!(validate_service_name("evil<script>").is_err());
        assert!(validate_service_name("path/to").is_err());
    }

    // ==================== Passwords / usernames ====================

    #[test]
    fn test_validate_stored_password_limits() {
        assert!(validate_stored_password("hunter2").is_ok());
        assert!(validate_stored_password("").is_err());
        assert!(validate_stored_password(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_username_limits() {
        assert!(validate_username("alice@example.com").is_ok());
        assert!(validate_username(" ").is_err());
        assert!(validate_username(&"x".repeat(256)).is_err());
    }

    // ==================== Due dates ====================

    #[test]
    fn test_validate_due_date_parses_future_dates() {
        let future = Local::now().date_naive() + chrono::Days::new(7);
        let formatted = future.format("%Y-%m-%d").to_string();
        assert_eq!(validate_due_date(&formatted), Ok(future));
    }

    #[test]
    fn test_validate_due_date_rejects_bad_input() {
        assert!(validate_due_date("tomorrow").is_err());
        assert!(validate_due_date("2020-01-01").is_err()); // past
        assert!(validate_due_date("2026-13-40").is_err());
    }

    // ==================== Tags ====================

    #[test]
    fn test_parse_tags_from_hashtags() {
        let mut tags = parse_tags("save this #Work #important #work");
        tags.sort();
        assert_eq!(tags, vec!["important", "work"]);
    }

    #[test]
    fn test_parse_tags_comma_fallback() {
        let mut tags = parse_tags("work, Urgent , finance");
        tags.sort();
        assert_eq!(tags, vec!["finance", "urgent", "work"]);
    }

    #[test]
    fn test_parse_tags_caps_at_limit() {
        let text: String = (0..20).map(|i| format!("#tag{} ", i)).collect();
        assert_eq!(parse_tags(&text).len(), limits::MAX_TAGS);
    }

    #[test]
    fn test_validate_tags_rejects_bad_entries() {
        assert!(validate_tags(&["ok".to_string()]).is_ok());
        assert!(validate_tags(&["bad tag".to_string()]).is_err());
        assert!(validate_tags(&["x".repeat(51)]).is_err());
        let too_many: Vec<String> = (0..11).map(|i| format!("t{}", i)).collect();
        assert!(validate_tags(&too_many).is_err());
    }

    // ==================== Files / sanitize ====================

    #[test]
    fn test_validate_file_name_rejects_reserved_chars() {
        assert!(validate_file_name("report.pdf").is_ok());
        for bad in ["a/b.txt", "a\\b.txt", "a:b", "a*b", "a?b", "a|b", "a<b", "a>b", "a\"b"] {
            assert!(validate_file_name(bad).is_err(), "should fail for: {}", bad);
        }
    }

    #[test]
    fn test_sanitize_input_strips_nulls_and_whitespace() {
        assert_eq!(sanitize_input("  hi\0there  "), "hithere");
    }
}
