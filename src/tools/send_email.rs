//! Send email tool - hands a composed message to the mailer

use crate::mailer::{Mailer, SendOutcome};
use crate::tool::{parse_args, Tool, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct Args {
    recipient: String,
    subject: String,
    body: String,
}

pub struct SendEmailTool {
    mailer: Arc<Mailer>,
}

impl SendEmailTool {
    pub fn new(mailer: Arc<Mailer>) -> Self {
        Self { mailer }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email_tool"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::with_string_params(
            "send_email_tool",
            "Send an email to the specified recipient.",
            &[
                ("recipient", "Email address of the recipient"),
                ("subject", "Subject line of the email"),
                ("body", "Content of the email"),
            ],
        )
    }

    async fn execute(&self, args: serde_json::Value) -> ToolResult {
        let args: Args = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        // SMTP is blocking
        let mailer = self.mailer.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            mailer.send(&args.recipient, &args.subject, &args.body)
        })
        .await
        .unwrap_or_else(|e| SendOutcome::Failed(e.to_string()));

        ToolResult::json(&outcome.to_payload(), !outcome.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::{MailCredentials, MailSession, MailTransport, TransportError};
    use serde_json::json;

    struct Unreachable;

    impl MailTransport for Unreachable {
        fn open(
            &self,
            _credentials: &MailCredentials,
        ) -> Result<Box<dyn MailSession>, TransportError> {
            Err(TransportError::Connect("network is unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let tool = SendEmailTool::new(Arc::new(Mailer::new(Unreachable)));
        let result = tool.execute(json!({"recipient": "a@b.co"})).await;
        assert!(result.is_error);
        assert!(result.output.contains("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_failure_is_error_payload() {
        let tool = SendEmailTool::new(Arc::new(Mailer::new(Unreachable)));
        let result = tool
            .execute(json!({
                "recipient": "mom@example.com",
                "subject": "Dinner",
                "body": "Are we still on for Sunday?"
            }))
            .await;

        assert!(result.is_error);
        let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert!(payload["error"].is_string());
    }
}
