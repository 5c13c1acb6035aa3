//! Extract email tool - pulls addresses out of free text

use crate::redact::extract_emails;
use crate::tool::{parse_args, Tool, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Args {
    text: String,
}

pub struct ExtractEmailTool;

impl ExtractEmailTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExtractEmailTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ExtractEmailTool {
    fn name(&self) -> &str {
        "extract_email_from_text"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::with_string_params(
            "extract_email_from_text",
            "Extract email addresses from text.",
            &[("text", "Text to extract email addresses from")],
        )
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: Args = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        ToolResult::json(&Value::from(extract_emails(&args.text)), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_extracts_inline_address() {
        let result = ExtractEmailTool::new()
            .execute(json!({"text": "email hugo at ythugoisthegoat@gmail.com"}))
            .await;
        assert!(!result.is_error);
        assert_eq!(result.output, r#"["ythugoisthegoat@gmail.com"]"#);
    }

    #[tokio::test]
    async fn test_no_address_is_empty_list() {
        let result = ExtractEmailTool::new()
            .execute(json!({"text": "email mom about dinner"}))
            .await;
        assert_eq!(result.output, "[]");
    }
}
