//! Instruction text for the email agent
//!
//! Built from a snapshot of the user config on every request so that new
//! contacts and style changes are picked up without a restart.

use crate::config::UserConfig;

/// Display name the agent signs with, if it signs at all
pub const AGENT_NAME: &str = "Email Assistant";

const NO_CONTACTS: &str = "No contacts saved yet.";

/// `- name: email` lines, sorted by name
pub fn format_contacts(config: &UserConfig) -> String {
    if config.contacts.is_empty() {
        return NO_CONTACTS.to_string();
    }

    config
        .contacts
        .iter()
        .map(|(name, email)| format!("- {}: {}", name, email))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the complete system instructions for one request
pub fn build_instructions(config: &UserConfig) -> String {
    format!(
        r#"You are a helpful email assistant for {user_name}.
When asked to send an email, use send_email_tool with the recipient's email address, a clear subject line, and a well-composed message body.

The user's preferred email style is "{style}". Write every email in this style.

Saved contacts:
{contacts}

Resolving recipients:
- When the user refers to someone by name (like "email mom" or "send a message to John"), call get_contact_tool to find their address.
- If the contact is unknown, check whether the request itself contains an address (e.g. "email hugo at hugo@example.com"). If it does, call extract_email_from_text and use that address directly without asking again.
- If no address is available, ask the user for it, then save it with add_contact_tool for future use.

Structure your responses:
1. Explain what you understand the user wants to do.
2. Describe the steps you are taking to fulfill the request.
3. Confirm when the email has been sent, or explain any issue that occurred.

If details are missing, politely ask for them.
If sending fails with an authentication error, relay the troubleshooting steps from the tool result.
Keep a professional and helpful tone.

Never sign messages with "[Your Name]" or any other placeholder signature. If a sign-off is needed, use "{agent}" or no signature at all."#,
        user_name = config.user_name,
        style = config.email_style,
        contacts = format_contacts(config),
        agent = AGENT_NAME,
    )
}
