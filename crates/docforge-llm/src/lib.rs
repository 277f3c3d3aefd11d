//! # docforge-llm
//!
//! Prompt assembly and the remote chat-completions client for the
//! docforge generation orchestrator: the Prompt Builder (C4) and the LLM
//! Client (C5).
//!
//! Both halves are deliberately simple and composable: [`build_prompt`]
//! is a pure function over [`PromptInput`], and [`LlmClient`] is a
//! stateless wrapper around one HTTP call. The Job Scheduler
//! (`docforge-jobs`) is what wires section/job data into these two
//! pieces.

/// LLM Client (C5).
pub mod client;
/// Prompt Builder (C4).
pub mod prompt;
/// Wire types for the chat-completions contract (§6.2).
pub mod types;

pub use client::LlmClient;
pub use prompt::{build_prompt, PromptInput, DEFAULT_MASTER_TEMPLATE};
pub use types::{ChatMessage, ChatRequest, ChatResponse, CompletionRequest, CompletionResult};
