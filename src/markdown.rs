//! Markdown to ANSI terminal text
//!
//! Covers what the agent actually writes: paragraphs, headings, emphasis,
//! lists, inline code and code blocks. Everything else degrades to its text.

use crate::cli::{BOLD, CYAN, RESET};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const STRIKE: &str = "\x1b[9m";
const RULE_WIDTH: usize = 40;

/// Render `source` for the terminal.
///
/// `filter` sees every run of visible text before any styling is added, so
/// rewriting it (privacy masking) cannot touch escape sequences.
pub fn render_markdown(source: &str, filter: impl Fn(&str) -> String) -> String {
    let options = Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options);

    let mut out = String::new();
    let mut text = String::new();
    // One entry per open list: next number for ordered lists
    let mut lists: Vec<Option<u64>> = Vec::new();
    let mut in_code_block = false;

    for event in parser {
        if let Event::Text(t) = &event {
            text.push_str(t);
            continue;
        }
        if !text.is_empty() {
            let rendered = filter(text.as_str());
            if in_code_block {
                for line in rendered.lines() {
                    out.push_str(&format!("    {CYAN}{}{RESET}\n", line));
                }
            } else {
                out.push_str(&rendered);
            }
            text.clear();
        }

        match event {
            Event::Start(Tag::Heading { .. }) => out.push_str(BOLD),
            Event::End(TagEnd::Heading(_)) => {
                out.push_str(RESET);
                out.push_str("\n\n");
            }
            Event::End(TagEnd::Paragraph) => {
                out.push_str(if lists.is_empty() { "\n\n" } else { "\n" });
            }
            Event::Start(Tag::Strong) => out.push_str(BOLD),
            Event::Start(Tag::Emphasis) => out.push_str(ITALIC),
            Event::Start(Tag::Strikethrough) => out.push_str(STRIKE),
            Event::Start(Tag::Link { .. }) => out.push_str(UNDERLINE),
            Event::End(TagEnd::Strong)
            | Event::End(TagEnd::Emphasis)
            | Event::End(TagEnd::Strikethrough)
            | Event::End(TagEnd::Link) => out.push_str(RESET),
            Event::Code(code) => {
                out.push_str(&format!("{CYAN}{}{RESET}", filter(&*code)));
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                out.push('\n');
            }
            Event::Start(Tag::List(first)) => {
                if !lists.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                lists.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                lists.pop();
                if lists.is_empty() {
                    out.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                let depth = lists.len().saturating_sub(1);
                out.push_str(&"  ".repeat(depth));
                match lists.last_mut() {
                    Some(Some(n)) => {
                        out.push_str(&format!("{}. ", n));
                        *n += 1;
                    }
                    _ => out.push_str("• "),
                }
            }
            Event::End(TagEnd::Item) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Rule => {
                out.push_str(&"─".repeat(RULE_WIDTH));
                out.push_str("\n\n");
            }
            _ => {}
        }
    }

    if !text.is_empty() {
        out.push_str(&filter(text.as_str()));
    }

    out.trim_end().to_string()
}
