//! Agent system
//!
//! - `instructions`: system prompt built from the user config
//! - `runner`: the `Orchestrator` interface and the tool-calling `ChatAgent`
//! - `EmailAssistant`: wires config, tools and orchestrator together

mod instructions;
mod runner;

pub use instructions::{build_instructions, format_contacts, AGENT_NAME};
pub use runner::*;

use crate::config::{ConfigError, ConfigStore};
use crate::mailer::Mailer;
use crate::provider::{ProviderClient, ProviderConfig, ProviderError};
use crate::tool::ToolRegistry;
use crate::tools;
use async_openai::error::OpenAIError;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to build message: {0}")]
    Message(#[from] OpenAIError),
    #[error("Model returned no choices")]
    EmptyResponse,
    #[error("Agent stopped after {0} iterations without a final answer")]
    MaxIterations(usize),
}

impl AgentError {
    /// Missing credentials or other environment problems
    pub fn is_environment(&self) -> bool {
        matches!(
            self,
            AgentError::Provider(ProviderError::MissingApiKey { .. })
        )
    }
}

/// The email assistant: one orchestrator run per user request
pub struct EmailAssistant {
    orchestrator: Box<dyn Orchestrator>,
    tools: ToolRegistry,
    store: ConfigStore,
}

impl EmailAssistant {
    pub fn new(
        orchestrator: Box<dyn Orchestrator>,
        tools: ToolRegistry,
        store: ConfigStore,
    ) -> Self {
        Self {
            orchestrator,
            tools,
            store,
        }
    }

    /// Build the production assistant.
    ///
    /// Fails with an environment error when the model API key is missing.
    pub fn create(
        provider: ProviderConfig,
        store: ConfigStore,
        mailer: Mailer,
    ) -> Result<Self, AgentError> {
        let model = provider.default_model.clone();
        let client = ProviderClient::new(provider)?;
        tracing::info!(model = %model, provider = %client.config().name, "Email agent created");

        let agent = ChatAgent::new(AGENT_NAME, client);
        let tools = tools::create_registry(store.clone(), Arc::new(mailer));

        Ok(Self::new(Box::new(agent), tools, store))
    }

    /// Handle one request and return the agent's final text
    pub async fn respond(&self, prompt: &str) -> Result<String, AgentError> {
        let instructions = build_instructions(&self.store.load()?);
        self.orchestrator.run(&instructions, &self.tools, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Captures the instructions it was given
    #[derive(Default)]
    struct Recorder {
        instructions: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Orchestrator for Recorder {
        async fn run(
            &self,
            instructions: &str,
            tools: &ToolRegistry,
            prompt: &str,
        ) -> Result<String, AgentError> {
            self.instructions.lock().unwrap().push(instructions.to_string());
            Ok(format!("{} tools, prompt: {}", tools.names().len(), prompt))
        }
    }

    #[tokio::test]
    async fn test_instructions_follow_current_config() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("c.json"));
        let recorder = Recorder::default();
        let seen = recorder.instructions.clone();

        let tools = tools::create_registry(store.clone(), Arc::new(Mailer::default()));
        let assistant = EmailAssistant::new(Box::new(recorder), tools, store.clone());

        let reply = assistant.respond("email mom").await.unwrap();
        assert_eq!(reply, "4 tools, prompt: email mom");

        store.add_contact("Mom", "mom@example.com").unwrap();
        assistant.respond("email mom").await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].contains("No contacts saved yet."));
        assert!(seen[1].contains("- mom: mom@example.com"));
    }

    #[test]
    fn test_missing_api_key_is_environment_error() {
        let provider = ProviderConfig::custom(
            "Test",
            "http://localhost:1",
            "EMAIL_AGENT_TEST_KEY_THAT_IS_NEVER_SET",
            "test-model",
        );
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("c.json"));

        let err = match EmailAssistant::create(provider, store, Mailer::default()) {
            Ok(_) => panic!("expected missing key error"),
            Err(e) => e,
        };
        assert!(err.is_environment());
        assert!(err
            .to_string()
            .starts_with("EMAIL_AGENT_TEST_KEY_THAT_IS_NEVER_SET environment variable is not set"));
    }
}
