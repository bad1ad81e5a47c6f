//! Classroom ideas and encouragement from a hosted text-generation model.
//!
//! Failures never reach the caller: every request has a fixed fallback
//! message, which is also used when no API key is configured.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

pub const SUGGESTION_FALLBACK: &str =
    "죄송해요, 아이디어를 가져오는 중에 문제가 발생했어요. 잠시 후 다시 시도해주세요!";
pub const ENCOURAGEMENT_FALLBACK: &str = "오늘 하루도 우리 함께 즐겁게 보내보자!";

const ENCOURAGEMENT_PROMPT: &str =
    "초등학교 선생님이 학생들에게 아침 조회 시간에 전할만한 짧고 따뜻한 응원의 메시지 한 문장을 만들어줘.";

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Model service returned status {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Model returned no text")]
    EmptyResponse,
}

/// Sampling parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: Option<f32>,
}

impl Sampling {
    pub const SUGGESTIONS: Sampling = Sampling {
        temperature: 0.8,
        top_p: Some(0.95),
    };

    pub const ENCOURAGEMENT: Sampling = Sampling {
        temperature: 1.0,
        top_p: None,
    };
}

/// Something that turns a prompt into text.
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        sampling: Sampling,
    ) -> impl Future<Output = Result<String, AssistantError>>;
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Points the client at another host, e.g. a local proxy.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, sampling: Sampling) -> Result<String, AssistantError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
            },
        };

        debug!("Requesting text from {}", self.model);
        let response = self
            .http
            .post(self.build_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistantError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(AssistantError::Service { status, message });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistantError::Request(e.to_string()))?;
        body.text().ok_or(AssistantError::EmptyResponse)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, joined.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Asks the model for classroom help, falling back to fixed messages.
pub struct Assistant<G> {
    generator: Option<G>,
}

impl<G: TextGenerator> Assistant<G> {
    /// `None` means no API key: every call returns its fallback.
    pub fn new(generator: Option<G>) -> Self {
        Self { generator }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Ideas for running the class around `topic`. `None` for a blank topic.
    pub async fn class_suggestions(&self, topic: &str) -> Option<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return None;
        }

        let prompt = format!(
            "초등학교 학급 운영에 대한 아이디어를 제안해줘. 주제: {}. 답변은 한국어로, 초등학교 선생님이 아이들을 위해 읽어주거나 참고하기 좋은 따뜻하고 재미있는 말투로 작성해줘.",
            topic
        );
        Some(
            self.generate_or(&prompt, Sampling::SUGGESTIONS, SUGGESTION_FALLBACK)
                .await,
        )
    }

    /// One sentence of encouragement for morning assembly.
    pub async fn encouragement(&self) -> String {
        self.generate_or(
            ENCOURAGEMENT_PROMPT,
            Sampling::ENCOURAGEMENT,
            ENCOURAGEMENT_FALLBACK,
        )
        .await
    }

    async fn generate_or(&self, prompt: &str, sampling: Sampling, fallback: &str) -> String {
        let Some(generator) = &self.generator else {
            return fallback.to_string();
        };

        match generator.generate(prompt, sampling).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback.to_string(),
            Err(e) => {
                warn!("Text generation failed: {}", e);
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Scripted {
        reply: Result<&'static str, ()>,
        prompts: RefCell<Vec<(String, Sampling)>>,
    }

    impl Scripted {
        fn replying(reply: Result<&'static str, ()>) -> Self {
            Self {
                reply,
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str, sampling: Sampling) -> Result<String, AssistantError> {
            self.prompts
                .borrow_mut()
                .push((prompt.to_string(), sampling));
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(AssistantError::Request("connection refused".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_suggestions_include_topic() {
        let assistant = Assistant::new(Some(Scripted::replying(Ok("칭찬 릴레이를 해보세요"))));

        let reply = assistant.class_suggestions("  친구 사랑 주간 ").await;
        assert_eq!(reply.as_deref(), Some("칭찬 릴레이를 해보세요"));

        let prompts = assistant.generator.as_ref().unwrap().prompts.borrow();
        assert!(prompts[0].0.contains("주제: 친구 사랑 주간."));
        assert_eq!(prompts[0].1, Sampling::SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_blank_topic_makes_no_request() {
        let assistant = Assistant::new(Some(Scripted::replying(Ok("x"))));
        assert!(assistant.class_suggestions("   ").await.is_none());
        assert!(assistant.generator.as_ref().unwrap().prompts.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failure_uses_fallback() {
        let assistant = Assistant::new(Some(Scripted::replying(Err(()))));
        assert_eq!(
            assistant.class_suggestions("청소").await.as_deref(),
            Some(SUGGESTION_FALLBACK)
        );
        assert_eq!(assistant.encouragement().await, ENCOURAGEMENT_FALLBACK);
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback() {
        let assistant = Assistant::new(Some(Scripted::replying(Ok("  "))));
        assert_eq!(assistant.encouragement().await, ENCOURAGEMENT_FALLBACK);
    }

    #[tokio::test]
    async fn test_unconfigured_uses_fallback() {
        let assistant: Assistant<GeminiClient> = Assistant::new(None);
        assert!(!assistant.is_configured());
        assert_eq!(assistant.encouragement().await, ENCOURAGEMENT_FALLBACK);
    }

    #[test]
    fn test_build_url() {
        let client = GeminiClient::new("key", DEFAULT_MODEL).with_endpoint("http://localhost:9000/");
        assert_eq!(
            client.build_url(),
            "http://localhost:9000/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                top_p: None,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["temperature"], 1.0);
        assert!(json["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn test_response_text() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"오늘도 "},{"text":"힘내자!"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("오늘도 힘내자!"));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }
}
