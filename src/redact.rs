//! Email address matching
//!
//! One pattern is shared by the extraction tool and by privacy-mode output
//! masking, so whatever the agent can pull out of a prompt is also what gets
//! hidden on screen.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// `local-part@domain.tld`, with a final segment of two or more letters
pub const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// All non-overlapping addresses in `text`, in order of appearance
pub fn extract_emails(text: &str) -> Vec<String> {
    email_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace the local part of every address with one `*` per character
pub fn censor_emails(text: &str) -> String {
    email_regex()
        .replace_all(text, |caps: &Captures| {
            let email = &caps[0];
            match email.split_once('@') {
                Some((local, domain)) => {
                    format!("{}@{}", "*".repeat(local.chars().count()), domain)
                }
                None => email.to_string(),
            }
        })
        .into_owned()
}

/// Output filter selected by `--privacy`
pub fn redact(text: &str, privacy: bool) -> String {
    if privacy {
        censor_emails(text)
    } else {
        text.to_string()
    }
}
