use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

/// Returned without a network call when no API key is configured.
pub const FALLBACK_NOT_CONFIGURED: &str =
    "AI insights are unavailable. Configure an API key to get personalized insights for your mood entries.";

/// Returned when the generation API call fails for any reason.
pub const FALLBACK_UNAVAILABLE: &str = "Unable to generate insight at this time.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    pub text: String,
    pub source: InsightSource,
}

impl Insight {
    fn fallback(text: &str) -> Self {
        Self {
            text: text.to_string(),
            source: InsightSource::Fallback,
        }
    }

    /// Only generated text is worth persisting; fallbacks stay transient so
    /// a later request can still backfill a real insight.
    pub fn is_generated(&self) -> bool {
        self.source == InsightSource::Llm
    }
}

/// The entry fields the prompt is built from.
#[derive(Debug, Clone, Copy)]
pub struct InsightSubject<'a> {
    pub mood: &'a str,
    pub text_note: &'a str,
    pub date: Option<DateTime<Utc>>,
}

impl<'a> From<&'a MoodEntry> for InsightSubject<'a> {
    fn from(entry: &'a MoodEntry) -> Self {
        Self {
            mood: &entry.mood,
            text_note: &entry.text_note,
            date: Some(entry.date),
        }
    }
}

impl<'a> From<&'a NewMoodEntry> for InsightSubject<'a> {
    fn from(entry: &'a NewMoodEntry) -> Self {
        Self {
            mood: &entry.mood,
            text_note: &entry.text_note,
            date: Some(entry.date),
        }
    }
}

/// Client for the text-generation API. Cheap to clone; the underlying
/// `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct InsightGenerator {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl InsightGenerator {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.insight_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.claude_api_key.clone(),
            api_url: config.claude_api_url.clone(),
            model: config.claude_model.clone(),
            max_tokens: config.insight_max_tokens,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generates an insight for one entry. Never fails: any problem with the
    /// API degrades to a fixed fallback text. One attempt, no retries.
    pub async fn generate(&self, subject: InsightSubject<'_>) -> Insight {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("No insight API key configured, using fallback");
            return Insight::fallback(FALLBACK_NOT_CONFIGURED);
        };

        let prompt = build_prompt(&subject);
        match self.call_claude(api_key, &prompt).await {
            Ok(text) => {
                tracing::info!(mood = %subject.mood, chars = text.len(), "Generated insight");
                Insight {
                    text,
                    source: InsightSource::Llm,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Insight API unavailable, using fallback");
                Insight::fallback(FALLBACK_UNAVAILABLE)
            }
        }
    }

    async fn call_claude(&self, api_key: &str, prompt: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": self.max_tokens,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Insight API error {}: {}", status, body);
        }

        let body: MessagesResponse = response.json().await?;
        let text = body
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");
        let text = text.trim();

        if text.is_empty() {
            anyhow::bail!("Insight API returned no text");
        }
        Ok(text.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

pub fn build_prompt(subject: &InsightSubject<'_>) -> String {
    let note = if subject.text_note.trim().is_empty() {
        "No note provided"
    } else {
        subject.text_note
    };
    let date = subject
        .date
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        r#"Analyze this mood entry and provide meaningful insights:
Mood: {}
Note: {}
Date: {}

Please provide:
1. A brief analysis of the mood
2. Potential patterns or triggers
3. Constructive suggestions

Keep the response concise and helpful."#,
        subject.mood, note, date
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn subject<'a>(mood: &'a str, note: &'a str) -> InsightSubject<'a> {
        InsightSubject {
            mood,
            text_note: note,
            date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_prompt_includes_entry_fields() {
        let prompt = build_prompt(&subject("Anxious", "Big presentation tomorrow"));
        assert!(prompt.contains("Mood: Anxious"));
        assert!(prompt.contains("Note: Big presentation tomorrow"));
        assert!(prompt.contains("Date: 2024-01-01T10:00:00+00:00"));
        assert!(prompt.contains("1. A brief analysis of the mood"));
        assert!(prompt.contains("2. Potential patterns or triggers"));
        assert!(prompt.contains("3. Constructive suggestions"));
    }

    #[test]
    fn test_prompt_handles_missing_note_and_date() {
        let prompt = build_prompt(&InsightSubject {
            mood: "Calm",
            text_note: "  ",
            date: None,
        });
        assert!(prompt.contains("Note: No note provided"));
        assert!(prompt.contains("Date: Not specified"));
    }

    #[tokio::test]
    async fn test_generate_without_key_returns_fallback() {
        let generator = InsightGenerator::new(&Config::default()).unwrap();
        assert!(!generator.is_configured());

        let insight = generator.generate(subject("Happy", "Good day")).await;
        assert_eq!(insight.text, FALLBACK_NOT_CONFIGURED);
        assert_eq!(insight.source, InsightSource::Fallback);
        assert!(!insight.is_generated());
    }

    #[tokio::test]
    async fn test_generate_with_unreachable_api_returns_fallback() {
        let config = Config {
            claude_api_key: Some("test-key".into()),
            claude_api_url: "http://127.0.0.1:1/v1/messages".into(),
            insight_timeout_secs: 2,
            ..Config::default()
        };
        let generator = InsightGenerator::new(&config).unwrap();

        let insight = generator.generate(subject("Sad", "Rainy")).await;
        assert_eq!(insight.text, FALLBACK_UNAVAILABLE);
        assert_eq!(insight.source, InsightSource::Fallback);
    }

    #[test]
    fn test_messages_response_parses_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"1. You seem happy."},{"type":"tool_use","id":"x"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert_eq!(parsed.content[0].text.as_deref(), Some("1. You seem happy."));
        assert!(parsed.content[1].text.is_none());
    }
}
