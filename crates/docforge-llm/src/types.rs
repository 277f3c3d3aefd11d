//! Wire types for the chat-completions contract consumed by the LLM
//! Client (C5, §6.2).

use serde::{Deserialize, Serialize};

/// One message in a chat-completions request. Docforge only ever sends a
/// single `user`-role message built by the Prompt Builder.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// A RAG collection attachment, included only when the caller requested
/// knowledge collections (§4.5).
#[derive(Debug, Clone, Serialize)]
pub struct CollectionFile {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
}

/// Request body posted to `<base>/api/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<CollectionFile>,
}

/// The two accepted response shapes (§6.2): the standard
/// `choices[0].message.content` form, and a `{"response": ...}` fallback
/// some endpoints use instead. Any other shape fails to deserialize and
/// is surfaced as an upstream error.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChatResponse {
    Choices {
        choices: Vec<Choice>,
        #[serde(default)]
        usage: Option<Usage>,
    },
    Fallback {
        response: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessageContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageContent {
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: u64,
}

/// Everything the LLM Client needs for one completion call, gathered by
/// the caller (single-section `/generate` or the Job Scheduler) from a
/// principal's credential and the section/job's sampling parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub collection_ids: Vec<String>,
}

/// The extracted result of a completion (§4.5): generated text plus
/// token usage, `0` when the endpoint didn't report it.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub content: String,
    pub tokens_used: u64,
}
