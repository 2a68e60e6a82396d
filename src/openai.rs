//! Shared OpenAI client construction.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Timeout applied to every OpenAI request. Whisper uploads of near-25 MB
/// waveforms can take a while, so this is deliberately generous.
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with the standard request timeout.
///
/// The API key is picked up from `OPENAI_API_KEY` at construction time.
pub fn create_client() -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
