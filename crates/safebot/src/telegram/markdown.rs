//! MarkdownV2 helpers
//!
//! Telegram's MarkdownV2 parse mode rejects a message if any reserved
//! character is unescaped, so every piece of user-originated text that lands
//! inside a formatted message goes through [`escape`] first.

/// Escapes all MarkdownV2 reserved characters in user-provided text.
pub fn escape(text: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_reserved_chars() {
        assert_eq!(escape("a.b"), "a\\.b");
        assert_eq!(escape("file_name (v2).pdf"), "file\\_name \\(v2\\)\\.pdf");
        assert_eq!(escape("plain text"), "plain text");
    }

    #[test]
    fn test_escape_is_idempotent_on_clean_text() {
        let clean = "Просто текст without markup";
        assert_eq!(escape(clean), clean);
    }
}
