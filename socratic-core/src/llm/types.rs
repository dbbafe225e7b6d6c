//! Types shared by generation backends.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_GENERATION_BUDGET;

/// Hosted backend an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    OpenAI,
    Groq,
    Anthropic,
    /// Test doubles and in-process generators
    Local,
}

impl Backend {
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::Groq => Some("https://api.groq.com/openai/v1"),
            Self::Anthropic => Some("https://api.anthropic.com"),
            Self::Local => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Groq => "llama-3.1-70b-versatile",
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Groq => write!(f, "groq"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A single generation call: the premise context plus an advisory budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text handed to the backend unchanged
    pub context: String,
    /// Advisory size hint, sent as `max_tokens`
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            max_tokens: DEFAULT_GENERATION_BUDGET,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
