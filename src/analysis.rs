//! LLM-based interview analysis.

use crate::alignment::AlignedEntry;
use crate::config::AnalysisSettings;
use crate::error::{Result, TolkError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use tracing::{debug, info, instrument};

const SYSTEM_PROMPT: &str =
    "You are an experienced technical interviewer reviewing interview transcripts.";

const USER_PROMPT_TEMPLATE: &str = "\
Below is a speaker-labeled transcript of an interview. Analyze it and provide:

1. A summary of the task or topic discussed
2. The candidate's strengths
3. The candidate's motivation
4. An assessment of their communication level
5. Areas for improvement

Transcript:

{transcript}";

/// Client requesting a structured summary of an aligned transcript from a
/// chat-completion model.
pub struct AnalysisClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl AnalysisClient {
    /// Create a new analysis client from settings.
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            client: create_client(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }

    /// Request an analysis of the given transcript entries.
    ///
    /// Returns the raw completion text. No retry on failure.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn analyze(&self, entries: &[AlignedEntry]) -> Result<String> {
        info!("Requesting analysis with {}", self.model);

        let transcript = format_transcript(entries);
        let user_prompt = USER_PROMPT_TEMPLATE.replace("{transcript}", &transcript);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| TolkError::Analysis(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| TolkError::Analysis(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| TolkError::Analysis(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TolkError::OpenAI(format!("Analysis request failed: {}", e)))?;

        let analysis = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| TolkError::Analysis("Empty response from LLM".to_string()))?
            .clone();

        debug!("Received analysis ({} chars)", analysis.len());
        Ok(analysis)
    }
}

/// Format aligned entries as `speaker: text` lines for the prompt.
fn format_transcript(entries: &[AlignedEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.speaker, e.text))
        .collect::<Vec<_>>()
        .join("\n")
}
