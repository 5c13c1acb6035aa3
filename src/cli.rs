//! Terminal front end: rendering, privacy filtering and the settings editor

use crate::agent::{AgentError, EmailAssistant};
use crate::config::ConfigStore;
use crate::markdown::render_markdown;
use crate::redact::redact;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};
use std::future::Future;
use std::io::Write;
use std::time::Duration;

pub const GREEN: &str = "\x1b[32m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const RED: &str = "\x1b[31m";
pub const BOLD: &str = "\x1b[1m";
pub const RESET: &str = "\x1b[0m";

const MIN_PANEL_WIDTH: usize = 40;

/// Output modes chosen on the command line, fixed for the whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Mask the local part of every email address shown
    pub privacy: bool,
    /// Show agent steps and full error chains
    pub verbose: bool,
}

impl DisplayOptions {
    pub fn redact(&self, text: &str) -> String {
        redact(text, self.privacy)
    }
}

/// One line typed at the interactive prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Exit,
    Configure,
    Empty,
    Request(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => ReplInput::Empty,
            "exit" | "quit" | "q" => ReplInput::Exit,
            "config" | "configure" | "settings" => ReplInput::Configure,
            _ => ReplInput::Request(line.to_string()),
        }
    }
}

/// Line-oriented question/answer input
pub trait Prompter {
    /// Ask a question. An empty answer yields `default` when one is given.
    fn ask(&mut self, question: &str, default: Option<&str>) -> anyhow::Result<String>;
}

impl Prompter for rustyline::DefaultEditor {
    fn ask(&mut self, question: &str, default: Option<&str>) -> anyhow::Result<String> {
        let prompt = match default {
            Some(d) => format!("{} [{}]: ", question, d),
            None => format!("{}: ", question),
        };
        let answer = self.readline(&prompt)?;
        let answer = answer.trim();

        Ok(match default {
            Some(d) if answer.is_empty() => d.to_string(),
            _ => answer.to_string(),
        })
    }
}

/// Draw `body` inside a rounded box with a title in the top border
pub fn render_panel(title: &str, body: &str, color: &str) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let content_width = lines
        .iter()
        .map(|l| visible_width(l))
        .max()
        .unwrap_or(0)
        .max(title.chars().count() + 2)
        .max(MIN_PANEL_WIDTH);

    let title_fill = content_width + 2 - title.chars().count() - 3;
    let mut out = format!(
        "{color}╭─ {RESET}{BOLD}{title}{RESET}{color} {}╮{RESET}\n",
        "─".repeat(title_fill),
    );
    for line in &lines {
        let pad = content_width - visible_width(line);
        out.push_str(&format!(
            "{color}│{RESET} {}{} {color}│{RESET}\n",
            line,
            " ".repeat(pad)
        ));
    }
    out.push_str(&format!("{color}╰{}╯{RESET}", "─".repeat(content_width + 2)));
    out
}

/// Printed width of `s`, ignoring ANSI colour sequences
fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

/// Agent response panel: markdown rendered, addresses masked in privacy mode
pub fn format_agent_response(response: &str, options: &DisplayOptions) -> String {
    let body = render_markdown(response, |text| options.redact(text));
    render_panel("Agent Response", &body, GREEN)
}

/// Startup notices for the active modes
pub fn mode_notices(options: &DisplayOptions) -> Vec<String> {
    let mut notices = Vec::new();
    if options.privacy {
        notices.push(format!(
            "{YELLOW}Privacy mode enabled - email addresses will be censored{RESET}"
        ));
    }
    if options.verbose {
        notices.push(format!(
            "{YELLOW}Verbose mode enabled - showing detailed agent steps{RESET}"
        ));
    }
    notices
}

fn spinner(message: &str) -> ProgressBar {
    // Cleared even when the request is abandoned mid-flight
    let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("{BOLD}{GREEN}{}{RESET}", message));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run one request through the assistant and print the response panel
pub async fn run_request(
    assistant: &EmailAssistant,
    prompt: &str,
    options: &DisplayOptions,
) -> Result<(), AgentError> {
    // Verbose logs go to stderr; a spinner would fight with them
    let progress = (!options.verbose).then(|| spinner("Running email agent..."));

    let result = assistant.respond(prompt).await;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let response = result?;
    println!("{}", format_agent_response(&response, options));
    Ok(())
}

/// Drive `work` to completion unless `interrupt` fires first
pub async fn interruptible<F, I>(work: F, interrupt: I) -> Option<F::Output>
where
    F: Future,
    I: Future,
{
    tokio::select! {
        output = work => Some(output),
        _ = interrupt => None,
    }
}

/// Interactive editor for name, style and contacts
pub fn configure_user_settings(
    store: &ConfigStore,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
    options: &DisplayOptions,
) -> anyhow::Result<()> {
    writeln!(
        out,
        "{}",
        render_panel("Email Agent Settings", "User Configuration", BLUE)
    )?;

    let current_name = store.user_name()?;
    writeln!(out, "Current name: {CYAN}{}{RESET}", current_name)?;
    let new_name = prompter.ask("Enter your name", Some(&current_name))?;
    if new_name != current_name {
        store.set_user_name(&new_name)?;
        writeln!(out, "Name updated to: {GREEN}{}{RESET}", new_name)?;
    }

    let current_style = store.email_style()?;
    writeln!(out, "Current email style: {CYAN}{}{RESET}", current_style)?;
    writeln!(out, "Available styles: professional, casual, formal, friendly")?;
    let new_style = prompter.ask("Enter preferred email style", Some(&current_style))?;
    if new_style != current_style {
        store.set_email_style(&new_style)?;
        writeln!(out, "Email style updated to: {GREEN}{}{RESET}", new_style)?;
    }

    let contacts = store.all_contacts()?;
    if !contacts.is_empty() {
        writeln!(out, "\n{BOLD}Current Contacts:{RESET}")?;
        for (name, email) in &contacts {
            writeln!(out, "- {CYAN}{}{RESET}: {}", name, options.redact(email))?;
        }
    }

    loop {
        writeln!(out)?;
        let add_more = prompter.ask("Add a new contact? (yes/no)", Some("no"))?;
        if !matches!(add_more.to_lowercase().as_str(), "yes" | "y") {
            break;
        }

        let name = prompter.ask("Contact name", None)?;
        let email = prompter.ask("Contact email", None)?;
        if name.is_empty() || email.is_empty() {
            writeln!(out, "{RED}Contact name and email are both required{RESET}")?;
            continue;
        }

        store.add_contact(&name, &email)?;
        writeln!(out, "Added contact: {GREEN}{}{RESET}", name)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Answers questions from a fixed script
    struct Scripted {
        answers: VecDeque<&'static str>,
        asked: Vec<String>,
    }

    impl Scripted {
        fn new(answers: &[&'static str]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: vec![],
            }
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, question: &str, default: Option<&str>) -> anyhow::Result<String> {
            self.asked.push(question.to_string());
            let answer = self
                .answers
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted at '{}'", question))?;
            Ok(match default {
                Some(d) if answer.is_empty() => d.to_string(),
                _ => answer.to_string(),
            })
        }
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c in chars.by_ref() {
                    if c == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_repl_input() {
        assert_eq!(ReplInput::parse("EXIT"), ReplInput::Exit);
        assert_eq!(ReplInput::parse(" q "), ReplInput::Exit);
        assert_eq!(ReplInput::parse("quit"), ReplInput::Exit);
        assert_eq!(ReplInput::parse("Settings"), ReplInput::Configure);
        assert_eq!(ReplInput::parse("config"), ReplInput::Configure);
        assert_eq!(ReplInput::parse("configure"), ReplInput::Configure);
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(
            ReplInput::parse("email mom about dinner"),
            ReplInput::Request("email mom about dinner".to_string())
        );
    }

    #[test]
    fn test_response_panel_redacts_in_privacy_mode() {
        let options = DisplayOptions {
            privacy: true,
            verbose: false,
        };
        let panel = strip_ansi(&format_agent_response(
            "Sent to jane@company.com please",
            &options,
        ));
        assert!(panel.contains("Agent Response"));
        assert!(panel.contains("Sent to ****@company.com please"));
        assert!(!panel.contains("jane@"));

        let plain = strip_ansi(&format_agent_response(
            "Sent to jane@company.com",
            &DisplayOptions::default(),
        ));
        assert!(plain.contains("jane@company.com"));
    }

    #[test]
    fn test_panel_lines_have_equal_width() {
        let panel = strip_ansi(&render_panel("Title", "short\na much longer line of text", GREEN));
        let widths: Vec<usize> = panel.lines().map(|l| l.chars().count()).collect();
        assert_eq!(widths.len(), 4);
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn test_response_panel_renders_markdown() {
        let panel = format_agent_response(
            "I emailed **Mom** at mom@example.com:\n\n- subject: Dinner\n- sent: yes",
            &DisplayOptions {
                privacy: true,
                verbose: false,
            },
        );
        let text = strip_ansi(&panel);
        assert!(text.contains("I emailed Mom at ***@example.com:"));
        assert!(text.contains("• subject: Dinner"));
        assert!(!text.contains("**"));

        // Styling does not count towards the border width
        let widths: Vec<usize> = text.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[tokio::test]
    async fn test_interrupt_abandons_pending_work() {
        let abandoned = interruptible(std::future::pending::<u8>(), async {}).await;
        assert_eq!(abandoned, None);

        let finished = interruptible(async { 7 }, std::future::pending::<()>()).await;
        assert_eq!(finished, Some(7));
    }

    #[test]
    fn test_mode_notices() {
        assert!(mode_notices(&DisplayOptions::default()).is_empty());
        let both = mode_notices(&DisplayOptions {
            privacy: true,
            verbose: true,
        });
        assert_eq!(both.len(), 2);
        assert!(both[0].contains("Privacy mode enabled"));
        assert!(both[1].contains("Verbose mode enabled"));
    }

    #[test]
    fn test_settings_editor_updates_and_adds() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("c.json"));
        let mut prompter = Scripted::new(&[
            "Ada",      // name
            "",         // keep style
            "y",        // add contact
            "Mom",
            "mom@example.com",
            "no",
        ]);
        let mut out = Vec::new();

        configure_user_settings(&store, &mut prompter, &mut out, &DisplayOptions::default())
            .unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.user_name, "Ada");
        assert_eq!(config.email_style, "professional and semi-casual");
        assert_eq!(config.contacts["mom"], "mom@example.com");

        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("Name updated to: Ada"));
        assert!(!text.contains("Email style updated"));
        assert!(text.contains("Added contact: Mom"));
    }

    #[test]
    fn test_settings_editor_censors_contact_list() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("c.json"));
        store.add_contact("boss", "pat@work.com").unwrap();

        let mut prompter = Scripted::new(&["", "", ""]);
        let mut out = Vec::new();
        let options = DisplayOptions {
            privacy: true,
            verbose: false,
        };

        configure_user_settings(&store, &mut prompter, &mut out, &options).unwrap();

        let text = strip_ansi(&String::from_utf8(out).unwrap());
        assert!(text.contains("- boss: ***@work.com"));
        assert_eq!(prompter.asked.len(), 3);
        // Stored value is untouched
        assert_eq!(store.contact_email("boss").unwrap().as_deref(), Some("pat@work.com"));
    }

    #[test]
    fn test_settings_editor_skips_incomplete_contact() {
        let temp = TempDir::new().unwrap();
        let store = ConfigStore::new(temp.path().join("c.json"));
        let mut prompter = Scripted::new(&["", "", "yes", "Bob", "", "no"]);
        let mut out = Vec::new();

        configure_user_settings(&store, &mut prompter, &mut out, &DisplayOptions::default())
            .unwrap();

        assert!(store.all_contacts().unwrap().is_empty());
    }
}
