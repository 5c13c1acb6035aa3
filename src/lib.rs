//! Email Agent - a command-line assistant that composes and sends email
//!
//! This crate provides:
//! - A JSON contact book and user profile on local disk
//! - SMTP-over-TLS delivery with structured failure outcomes
//! - Four tools for the model: send, look up, add contact, extract address
//! - A tool-calling agent loop over an OpenAI-compatible endpoint
//! - CLI/REPL front end with privacy redaction

pub mod cli;
pub mod config;
pub mod mailer;
pub mod markdown;
pub mod redact;
pub mod telemetry;

// Agent system
pub mod agent;
pub mod provider;
pub mod tool;
pub mod tools;

pub use agent::{AgentError, ChatAgent, EmailAssistant, Orchestrator};
pub use config::{ConfigError, ConfigStore, UserConfig};
pub use mailer::{Mailer, SendOutcome};
pub use provider::{ProviderClient, ProviderConfig};
pub use telemetry::Telemetry;
pub use tool::{Tool, ToolRegistry, ToolResult};
