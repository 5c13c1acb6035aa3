//! LLM Provider layer
//!
//! Works with any server exposing the OpenAI chat completions API.

mod client;
mod config;

pub use client::*;
pub use config::*;
