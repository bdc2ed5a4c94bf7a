//! Google Gemini REST client (`generateContent`).
//!
//! Free-tier text generation is all this bot needs: ranking item ids for a
//! search query, summarizing tasks, and suggesting tags. Transport failures
//! retry with exponential backoff; when the API is unreachable or returns
//! nothing usable, search degrades to plain substring matching so the
//! feature never hard-fails on the user.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};

use crate::ai::{substring_search, Assistant, SearchItem};
use crate::config;
use crate::error::{AppError, AppResult};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// Assistant implementation backed by the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> AppResult<Self> {
        let http = reqwest::Client::builder().timeout(config::ai::timeout()).build()?;
        Ok(Self {
            http,
            api_key,
            endpoint: format!("{}/{}:generateContent", API_BASE, config::ai::MODEL),
        })
    }

    /// Builds the client from the configured `GEMINI_API_KEY`.
    pub fn from_config() -> AppResult<Self> {
        Self::new(config::GEMINI_API_KEY.clone())
    }

    /// Overrides the endpoint (tests point this at a local mock).
    #[doc(hidden)]
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn generate(&self, prompt: String) -> AppResult<String> {
        if self.api_key.is_empty() {
            return Err(AppError::Assistant("GEMINI_API_KEY is not configured".to_string()));
        }
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let send = || async {
            self.http
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json::<GeminiResponse>()
                .await
        };
        let response = send
            .retry(ExponentialBuilder::default().with_max_times(2))
            .when(|e: &reqwest::Error| e.is_timeout() || e.is_connect())
            .await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| AppError::Assistant("empty response from Gemini".to_string()))
    }
}

#[async_trait]
impl Assistant for GeminiClient {
    async fn search(&self, query: &str, items: &[SearchItem], item_type: &str) -> AppResult<Vec<String>> {
        if items.is_empty() {
            return Ok(vec![]);
        }
        let items_text: String = items
            .iter()
            .map(|item| format!("{}. {}\n", item.id, item.summary))
            .collect();
        let prompt = format!(
            "Given this search query: \"{query}\"\n\n\
             And these {item_type}:\n{items_text}\n\
             Return the IDs of the most relevant items, ranked by relevance.\n\
             Only return item IDs that match the query, separated by commas.\n\
             If no items match, return \"NONE\".\n\n\
             Example response: \"1,3,5\" or \"NONE\"\n"
        );

        match self.generate(prompt).await {
            Ok(text) if text == "NONE" => Ok(vec![]),
            Ok(text) => {
                let known: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
                Ok(text
                    .split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| known.contains(&id.as_str()))
                    .collect())
            }
            Err(e) => {
                log::warn!("Assistant search failed, falling back to substring match: {}", e);
                Ok(substring_search(query, items))
            }
        }
    }

    async fn summarize_tasks(&self, task_lines: &[String]) -> AppResult<String> {
        if task_lines.is_empty() {
            return Ok("You have no tasks.".to_string());
        }
        let tasks_text = task_lines.join("\n");
        let prompt = format!(
            "Summarize these tasks in a concise, helpful way:\n\n{tasks_text}\n\n\
             Provide:\n\
             1. Total number of tasks\n\
             2. Breakdown by status\n\
             3. Priority items that need attention\n\
             4. Brief overview\n\n\
             Keep it under 200 words."
        );
        self.generate(prompt).await.or_else(|e| {
            log::warn!("Task summarization failed: {}", e);
            Ok(format!(
                "You have {} tasks. Unable to generate detailed summary.",
                task_lines.len()
            ))
        })
    }

    async fn suggest_tags(&self, content: &str, content_type: &str) -> AppResult<Vec<String>> {
        let prompt = format!(
            "Suggest 3-5 relevant tags for this {content_type}:\n\n\"{content}\"\n\n\
             Return only the tags, comma-separated, lowercase, no hashtags.\n\
             Example: work, important, finance"
        );
        let text = self.generate(prompt).await?;
        Ok(text
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .take(5)
            .collect())
    }
}
