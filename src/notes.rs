use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};

use crate::output::OutputFiles;
use crate::{NotesResult, Status};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-thinking-exp-01-21";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const NOTES_PROMPT: &str = "
    Please analyze this transcript and create:
    1. Detailed bullet-point notes of the key points and concepts
    2. A clear, concise summary in simple language that anyone can understand
    3. present the notes in a way that is easy to read and understand use BOLD for the key points and concepts, maintain space between the bullet points and topics

    Format the response as follows:

    KEY NOTES:
    • [bullet points here]

    SUMMARY:
    [layman's terms summary here]

    only return the notes and summary, no other text

    Transcript:
    {transcript}
    ";

/// A generative text model reachable with a caller-supplied API key
#[async_trait]
pub trait NotesClient: Send + Sync {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String>;
}

/// Google Gemini `generateContent` client
pub struct Gemini {
    client: reqwest::Client,
    model: String,
    timeout: Duration,
}

impl Gemini {
    pub fn new(client: reqwest::Client, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl NotesClient for Gemini {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String> {
        debug!("Generating notes via Gemini API with model {}", self.model);

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "text": prompt }
                    ]
                }
            ]
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Gemini API returned {status}: {body}");
        }

        let json: serde_json::Value = resp.json().await?;
        extract_gemini_text(&json)
    }
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Gemini API response format");
}

pub fn build_prompt(transcript: &str) -> String {
    NOTES_PROMPT.replace("{transcript}", transcript)
}

/// Ask the model for notes and a summary of `transcript`.
///
/// Failures never propagate; they come back as an error `NotesResult`.
/// The raw response is persisted before code fences are stripped.
pub async fn generate_notes(
    client: &dyn NotesClient,
    transcript: &str,
    api_key: &str,
    files: &OutputFiles,
) -> NotesResult {
    match client.complete(api_key, &build_prompt(transcript)).await {
        Ok(text) => {
            if let Err(e) = files.write_notes(&text) {
                warn!("Failed to write notes file: {e}");
            }
            NotesResult {
                status: Status::Success,
                message: "Notes and summary generated successfully".to_string(),
                content: Some(text.replace("```", "")),
            }
        }
        Err(e) => {
            warn!("Notes generation failed: {e}");
            NotesResult {
                status: Status::Error,
                message: format!("Error generating notes and summary: {e}"),
                content: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<String, String>);

    #[async_trait]
    impl NotesClient for Canned {
        async fn complete(&self, _api_key: &str, _prompt: &str) -> Result<String> {
            self.0.clone().map_err(|e| eyre::eyre!(e))
        }
    }

    #[test]
    fn test_build_prompt_interpolates_verbatim() {
        let prompt = build_prompt("hello {there}");
        assert!(prompt.contains("Transcript:\n    hello {there}\n"));
        assert!(prompt.contains("KEY NOTES:"));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "KEY NOTES:\n"}, {"text": "• point"}]
                    }
                }
            ]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "KEY NOTES:\n• point");
    }

    #[test]
    fn test_extract_gemini_text_empty() {
        let json = serde_json::json!({"candidates": []});
        assert!(extract_gemini_text(&json).is_err());

        let json = serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(extract_gemini_text(&json).is_err());
    }

    #[tokio::test]
    async fn test_generate_notes_strips_fences_and_persists_raw() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles::new(dir.path().to_path_buf());
        let client = Canned(Ok("```markdown\nKEY NOTES:\n```".to_string()));

        let result = generate_notes(&client, "text", "key", &files).await;

        assert_eq!(result.status, Status::Success);
        assert_eq!(result.content.as_deref(), Some("markdown\nKEY NOTES:\n"));
        let raw = std::fs::read_to_string(files.notes_path()).unwrap();
        assert_eq!(raw, "```markdown\nKEY NOTES:\n```");
    }

    #[tokio::test]
    async fn test_generate_notes_failure_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let files = OutputFiles::new(dir.path().to_path_buf());
        let client = Canned(Err("quota exceeded".to_string()));

        let result = generate_notes(&client, "text", "key", &files).await;

        assert_eq!(result.status, Status::Error);
        assert_eq!(result.message, "Error generating notes and summary: quota exceeded");
        assert!(result.content.is_none());
        assert!(!files.notes_path().exists());
    }
}
