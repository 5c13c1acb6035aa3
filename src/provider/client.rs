//! OpenAI-compatible provider client
//!
//! Non-streaming chat completions with tool support.

use super::ProviderConfig;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionTool, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(
        "{var} environment variable is not set. \
         Please set it in your .env file or export it in your shell."
    )]
    MissingApiKey { var: String },
    #[error("Failed to build request: {0}")]
    Request(#[source] OpenAIError),
    #[error("API call failed: {0}")]
    Api(#[source] OpenAIError),
}

/// OpenAI-compatible client wrapper
#[derive(Clone)]
pub struct ProviderClient {
    config: ProviderConfig,
    client: Client<OpenAIConfig>,
}

impl ProviderClient {
    /// Create a new provider client from config
    ///
    /// Fails when the API key variable is absent from both the environment
    /// and any `.env` file.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = Self::get_api_key(&config)?;

        let openai_config = OpenAIConfig::new()
            .with_api_key(&api_key)
            .with_api_base(&config.base_url);

        let client = Client::with_config(openai_config);

        Ok(Self { config, client })
    }

    fn get_api_key(config: &ProviderConfig) -> Result<String, ProviderError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ProviderError::MissingApiKey {
                var: config.api_key_env.clone(),
            }),
        }
    }

    /// Get the provider config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send a non-streaming chat completion request with tools
    pub async fn chat_with_tools(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Vec<ChatCompletionTool>,
        model: Option<&str>,
    ) -> Result<CreateChatCompletionResponse, ProviderError> {
        let model = model.unwrap_or(&self.config.default_model);

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(model).messages(messages);

        if !tools.is_empty() {
            request_builder.tools(tools);
        }

        let request = request_builder.build().map_err(ProviderError::Request)?;

        let start = std::time::Instant::now();
        tracing::debug!(target: "llm", model = model, "Starting LLM call");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| {
                tracing::error!(target: "llm", error = %e, "LLM call failed");
                ProviderError::Api(e)
            })?;

        tracing::debug!(
            target: "llm",
            model = model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            input_tokens = response.usage.as_ref().map(|u| u.prompt_tokens),
            output_tokens = response.usage.as_ref().map(|u| u.completion_tokens),
            "LLM call completed"
        );

        Ok(response)
    }
}
