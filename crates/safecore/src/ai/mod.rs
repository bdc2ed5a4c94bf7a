//! Assistant collaborator — natural-language search and summarization

pub mod gemini;

use async_trait::async_trait;

use crate::error::AppResult;

// Re-exports for convenience
pub use gemini::GeminiClient;

/// One searchable item: its record id plus a short plaintext summary line.
/// Callers decrypt whatever the summary needs before building it; nothing
/// encrypted ever reaches the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchItem {
    pub id: String,
    pub summary: String,
}

/// AI collaborator contract. The bot only forwards prepared plaintext and
/// displays whatever comes back; prompt details stay behind this trait.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Returns the ids of `items` relevant to `query`, best match first.
    /// `item_type` is a plural noun for the prompt ("passwords", "tasks",
    /// "files").
    async fn search(&self, query: &str, items: &[SearchItem], item_type: &str) -> AppResult<Vec<String>>;

    /// Produces a short summary of the given task lines.
    async fn summarize_tasks(&self, task_lines: &[String]) -> AppResult<String>;

    /// Suggests up to five lowercase tags for a piece of content.
    async fn suggest_tags(&self, content: &str, content_type: &str) -> AppResult<Vec<String>>;
}

/// Case-insensitive substring match over the item summaries. Used as the
/// fallback when the remote assistant is unavailable.
pub fn substring_search(query: &str, items: &[SearchItem]) -> Vec<String> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.summary.to_lowercase().contains(&needle))
        .map(|item| item.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substring_search_matches_case_insensitively() {
        let items = vec![
            SearchItem { id: "1".into(), summary: "Service: GitHub, Tags: work".into() },
            SearchItem { id: "2".into(), summary: "Service: Gmail, Tags: personal".into() },
        ];
        assert_eq!(substring_search("github", &items), vec!["1".to_string()]);
        assert_eq!(substring_search("nothing", &items), Vec::<String>::new());
    }
}
