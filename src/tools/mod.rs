//! Email agent tools
//!
//! Each tool implements our `Tool` trait from `crate::tool` and takes only
//! required string arguments.

mod contacts;
mod extract_email;
mod send_email;

pub use contacts::{AddContactTool, GetContactTool};
pub use extract_email::ExtractEmailTool;
pub use send_email::SendEmailTool;

use crate::config::ConfigStore;
use crate::mailer::Mailer;
use crate::tool::ToolRegistry;
use std::sync::Arc;

/// Create a registry with the four email agent tools
pub fn create_registry(store: ConfigStore, mailer: Arc<Mailer>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(SendEmailTool::new(mailer));
    registry.register(GetContactTool::new(store.clone()));
    registry.register(AddContactTool::new(store));
    registry.register(ExtractEmailTool::new());

    registry
}
