//! Classifier trait and the chat-completion backed implementation

use async_trait::async_trait;
use docvault_core::{Classification, InferenceConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parse::parse_analysis;
use crate::{InferenceError, InferenceResult};

/// Fixed system instruction sent with every classification request.
const SYSTEM_INSTRUCTION: &str = "Analyze the following document and provide: \
    1) A category (invoice, contract, report, etc.) 2) A one-sentence summary";

/// At most this many characters of extracted text are sent to the service.
const MAX_SNIPPET_CHARS: usize = 1000;

/// Trait for deriving a category and summary from extracted text.
///
/// Total by contract: implementations must absorb every failure and return
/// the default classification instead of erroring the caller.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str) -> Classification;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Classifier backed by an OpenAI-style chat-completion endpoint
pub struct InferenceClassifier {
    client: Client,
    config: InferenceConfig,
}

impl InferenceClassifier {
    pub fn new(config: InferenceConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn complete(&self, snippet: &str) -> InferenceResult<String> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: snippet.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status().as_u16()));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| InferenceError::Malformed("response contained no choices".to_string()))
    }
}

#[async_trait]
impl Classifier for InferenceClassifier {
    async fn classify(&self, text: &str) -> Classification {
        let snippet = truncate_chars(text, MAX_SNIPPET_CHARS);

        match self.complete(snippet).await {
            Ok(analysis) => {
                let classification = parse_analysis(analysis.trim());
                debug!(
                    category = %classification.category,
                    defaulted = classification.is_unknown(),
                    "Classified document text"
                );
                classification
            }
            Err(e) => {
                warn!(error = %e, "Classification failed, using defaults");
                Classification::unknown()
            }
        }
    }
}

/// Classifier returning a preset result. Useful for wiring tests.
pub struct FixedClassifier {
    classification: Classification,
}

impl FixedClassifier {
    pub fn new(classification: Classification) -> Self {
        Self { classification }
    }
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _text: &str) -> Classification {
        self.classification.clone()
    }
}

/// Truncate to at most `max_chars` characters without splitting a char.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
