//! Tool system
//!
//! Tools implement the `Tool` trait and are registered with `ToolRegistry`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool definition for LLM (matches OpenAI format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    /// Definition whose parameters are all required strings
    pub fn with_string_params(
        name: &str,
        description: &str,
        params: &[(&str, &str)],
    ) -> Self {
        let properties: serde_json::Map<String, Value> = params
            .iter()
            .map(|(param, about)| {
                (
                    param.to_string(),
                    serde_json::json!({ "type": "string", "description": about }),
                )
            })
            .collect();
        let required: Vec<&str> = params.iter().map(|(param, _)| *param).collect();

        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": properties,
                "required": required,
                "additionalProperties": false
            }),
        }
    }
}

/// Result of a tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }

    /// Serialize a JSON value as the tool output
    pub fn json(value: &Value, is_error: bool) -> Self {
        Self {
            output: value.to_string(),
            is_error,
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used for dispatch)
    fn name(&self) -> &str;

    /// Get the tool definition for LLM
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> ToolResult;
}

/// Parse tool arguments, mapping failures to an error result
pub fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, ToolResult> {
    serde_json::from_value(args).map_err(|e| ToolResult::error(format!("Invalid arguments: {}", e)))
}

/// Summarize args into a short string for logs
pub fn summarize_args(args: &Value) -> String {
    match args {
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .take(2) // max 2 args shown
                .map(|(k, v)| {
                    let val = match v {
                        Value::String(s) => truncate(s, 30),
                        Value::Number(n) => n.to_string(),
                        Value::Bool(b) => b.to_string(),
                        _ => "...".to_string(),
                    };
                    format!("{}={}", k, val)
                })
                .collect();
            parts.join(", ")
        }
        _ => "...".to_string(),
    }
}

/// Truncate a string with ellipsis
pub fn truncate(s: &str, max: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}...", &s[..idx]),
    }
}

/// Registry of available tools, ordered by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Get all tool definitions (for LLM)
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Convert to OpenAI ChatCompletionTool format
    pub fn to_openai_tools(&self) -> Vec<async_openai::types::ChatCompletionTool> {
        self.definitions()
            .into_iter()
            .map(|def| async_openai::types::ChatCompletionTool {
                r#type: async_openai::types::ChatCompletionToolType::Function,
                function: async_openai::types::FunctionObject {
                    name: def.name,
                    description: Some(def.description),
                    parameters: Some(def.parameters),
                    strict: None,
                },
            })
            .collect()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        match self.get(name) {
            Some(tool) => tool.execute(args).await,
            None => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::with_string_params(
                "echo",
                "Echo text back",
                &[("text", "Text to echo")],
            )
        }

        async fn execute(&self, args: Value) -> ToolResult {
            #[derive(Deserialize)]
            struct Args {
                text: String,
            }
            match parse_args::<Args>(args) {
                Ok(a) => ToolResult::success(a.text),
                Err(e) => e,
            }
        }
    }

    #[test]
    fn test_string_params_are_all_required() {
        let def = ToolDefinition::with_string_params(
            "t",
            "d",
            &[("a", "first"), ("b", "second")],
        );
        assert_eq!(def.parameters["required"], json!(["a", "b"]));
        assert_eq!(def.parameters["properties"]["b"]["type"], "string");
        assert_eq!(def.parameters["properties"]["a"]["description"], "first");
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);

        let ok = registry.execute("echo", json!({"text": "hi"})).await;
        assert!(!ok.is_error);
        assert_eq!(ok.output, "hi");

        let bad = registry.execute("echo", json!({})).await;
        assert!(bad.is_error);
        assert!(bad.output.starts_with("Invalid arguments"));

        let missing = registry.execute("nope", json!({})).await;
        assert!(missing.is_error);
        assert_eq!(missing.output, "Unknown tool: nope");
    }

    #[test]
    fn test_openai_tools_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);

        let tools = registry.to_openai_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "echo");
        assert_eq!(tools[0].function.description.as_deref(), Some("Echo text back"));
    }

    #[test]
    fn test_summarize_args() {
        let summary = summarize_args(&json!({"name": "mom", "email": "a@b.co"}));
        assert!(summary.contains("name=mom"));
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
