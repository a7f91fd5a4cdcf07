use crate::config::ChatClientConfig;
use crate::models::ANSWER_LETTERS;
use anyhow::Context;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic_id: String,
    pub topic_label: String,
    pub question_count: usize,
    pub context: String,
}

pub trait AiQuizClient: Send + Sync {
    /// Returns the raw model reply; parsing happens in the caller.
    fn generate_quiz_json(&self, request: &GenerationRequest) -> BoxFuture<'static, anyhow::Result<String>>;
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

pub fn build_prompt(request: &GenerationRequest, max_context_chars: usize) -> String {
    let context = truncate_chars(&request.context, max_context_chars);
    format!(
        r#"Role: senior tax examiner at the Directorate General of Taxes (DJP).
Task: write {count} difficult, tricky multiple-choice questions (options A-E) about "{label}".
Use only the material below and write in the same language as the material.

Material:
{context}

Output a valid JSON array only, without Markdown:
[
  {{
    "question": "...",
    "options": ["A. ...", "B. ...", "C. ...", "D. ...", "E. ..."],
    "answer": "A"
  }}
]"#,
        count = request.question_count,
        label = request.topic_label,
        context = context,
    )
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client (Groq by default).
#[derive(Clone)]
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: ChatClientConfig,
    max_context_chars: usize,
}

impl ChatCompletionClient {
    pub fn new(config: ChatClientConfig, max_context_chars: usize) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            config,
            max_context_chars,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }
}

impl AiQuizClient for ChatCompletionClient {
    fn generate_quiz_json(&self, request: &GenerationRequest) -> BoxFuture<'static, anyhow::Result<String>> {
        let http = self.http.clone();
        let endpoint = self.endpoint();
        let api_key = self.config.api_key.clone();
        let model = self.config.model.clone();
        let temperature = self.config.temperature;
        let prompt = build_prompt(request, self.max_context_chars);
        let topic_id = request.topic_id.clone();

        Box::pin(async move {
            tracing::debug!(topic = %topic_id, model = %model, "requesting chat completion");
            let body = ChatRequest {
                model: &model,
                messages: vec![ChatMessage { role: "user", content: &prompt }],
                temperature,
            };
            let resp = http
                .post(&endpoint)
                .bearer_auth(&api_key)
                .json(&body)
                .send()
                .await
                .context("chat completion request failed")?;

            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                anyhow::bail!("chat completion returned {}: {}", status, text.trim());
            }

            let parsed: ChatResponse = resp.json().await.context("cannot decode chat completion")?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            if content.trim().is_empty() {
                anyhow::bail!("chat completion returned empty content");
            }
            Ok(content)
        })
    }
}

/// Offline stand-in that answers with well-formed items.
#[derive(Clone)]
pub struct MockAiClient;

impl AiQuizClient for MockAiClient {
    fn generate_quiz_json(&self, request: &GenerationRequest) -> BoxFuture<'static, anyhow::Result<String>> {
        let label = request.topic_label.clone();
        let count = request.question_count;
        Box::pin(async move {
            let items: Vec<serde_json::Value> = (0..count)
                .map(|idx| {
                    serde_json::json!({
                        "question": format!("{}: soal {}", label, idx + 1),
                        "options": ANSWER_LETTERS
                            .iter()
                            .map(|letter| format!("{}. pilihan {}", letter, letter.to_lowercase()))
                            .collect::<Vec<_>>(),
                        "answer": ANSWER_LETTERS[idx % ANSWER_LETTERS.len()]
                    })
                })
                .collect();
            Ok(serde_json::Value::Array(items).to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parse_quiz_items;

    fn request(context: &str) -> GenerationRequest {
        GenerationRequest {
            topic_id: "ppn".into(),
            topic_label: "Pajak Pertambahan Nilai".into(),
            question_count: 3,
            context: context.into(),
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("pajak", 10), "pajak");
        assert_eq!(truncate_chars("pajak", 3), "paj");
        assert_eq!(truncate_chars("ééé", 2), "éé");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn prompt_contains_count_label_and_truncated_material() {
        let material = "x".repeat(50);
        let prompt = build_prompt(&request(&material), 10);
        assert!(prompt.contains("write 3 difficult"));
        assert!(prompt.contains("Pajak Pertambahan Nilai"));
        assert!(prompt.contains(&"x".repeat(10)));
        assert!(!prompt.contains(&"x".repeat(11)));
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let mut config = ChatClientConfig {
            api_key: "k".into(),
            base_url: "https://api.groq.com/openai/v1/".into(),
            model: "m".into(),
            temperature: 0.5,
            timeout_secs: 5,
        };
        let client = ChatCompletionClient::new(config.clone(), 100).unwrap();
        assert_eq!(client.endpoint(), "https://api.groq.com/openai/v1/chat/completions");
        config.base_url = "http://localhost:1234/v1/chat/completions".into();
        let client = ChatCompletionClient::new(config, 100).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[tokio::test]
    async fn mock_output_parses_cleanly() {
        let schema: serde_json::Value =
            serde_json::from_str(include_str!("../contracts/quiz_items.schema.json")).unwrap();
        let raw = MockAiClient.generate_quiz_json(&request("materi")).await.unwrap();
        let items = parse_quiz_items(&raw, &schema).unwrap();
        assert_eq!(items.len(), 3);
        assert!(items[0].question.starts_with("Pajak Pertambahan Nilai"));
    }
}
