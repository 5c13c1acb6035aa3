//! Contact book tools - lookup and upsert against the config store

use crate::config::ConfigStore;
use crate::tool::{parse_args, Tool, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct LookupArgs {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    name: String,
    email: String,
}

/// Resolve a contact name to an address
pub struct GetContactTool {
    store: ConfigStore,
}

impl GetContactTool {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetContactTool {
    fn name(&self) -> &str {
        "get_contact_tool"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::with_string_params(
            "get_contact_tool",
            "Look up a contact's email address by name. Returns null if the contact is unknown.",
            &[("name", "Name of the contact to look up")],
        )
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: LookupArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        match self.store.contact_email(&args.name) {
            Ok(email) => ToolResult::json(&Value::from(email), false),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Save a contact for future lookups
pub struct AddContactTool {
    store: ConfigStore,
}

impl AddContactTool {
    pub fn new(store: ConfigStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for AddContactTool {
    fn name(&self) -> &str {
        "add_contact_tool"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::with_string_params(
            "add_contact_tool",
            "Add a new contact to the address book.",
            &[
                ("name", "Name of the contact to add"),
                ("email", "Email address of the contact"),
            ],
        )
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: AddArgs = match parse_args(args) {
            Ok(a) => a,
            Err(e) => return e,
        };

        match self.store.add_contact(&args.name, &args.email) {
            Ok(config) => match serde_json::to_value(&config) {
                Ok(value) => ToolResult::json(&value, false),
                Err(e) => ToolResult::error(e.to_string()),
            },
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}
