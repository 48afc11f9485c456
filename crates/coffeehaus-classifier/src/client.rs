//! HTTP client for the Anthropic Messages API, used as an intent classifier.

use std::time::Duration;

use coffeehaus_core::SearchIntent;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;
use crate::extract::json_object;
use crate::prompt::{user_prompt, SYSTEM_PROMPT};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: [UserMessage; 1],
}

#[derive(Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Turns a free-text query into a [`SearchIntent`].
///
/// Use [`ClassifierClient::new`] for production or
/// [`ClassifierClient::with_base_url`] to point at a mock server in tests.
pub struct ClassifierClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: Url,
}

impl ClassifierClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ClassifierError> {
        Self::with_base_url(api_key, model, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`ClassifierError::Api`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("v1/messages"))
            .map_err(|e| ClassifierError::Api {
                status: 0,
                message: format!("invalid base URL '{base_url}': {e}"),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint,
        })
    }

    /// Classifies `query`. `user_location` is advisory text, either
    /// `"lat,lng"` or `"unknown"`.
    ///
    /// # Errors
    ///
    /// - [`ClassifierError::Http`] on network failure.
    /// - [`ClassifierError::Api`] on a non-2xx status.
    /// - [`ClassifierError::EmptyResponse`] if the reply has no text block.
    /// - [`ClassifierError::Parse`] if the text is not a valid intent object.
    pub async fn classify(
        &self,
        query: &str,
        user_location: &str,
    ) -> Result<SearchIntent, ClassifierError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: [UserMessage {
                role: "user",
                content: user_prompt(query, user_location),
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response.json().await?;
        let reply = body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ClassifierError::EmptyResponse)?;

        let intent: SearchIntent =
            serde_json::from_str(json_object(&reply)).map_err(|source| ClassifierError::Parse {
                reply: reply.clone(),
                source,
            })?;

        tracing::debug!(
            query,
            kind = %intent.kind,
            normalized = %intent.normalized_query,
            "classified search query"
        );
        Ok(intent)
    }
}
