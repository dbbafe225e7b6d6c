//! Generation backends.
//!
//! The reasoning core only ever sees [`GenerationCapability`]: one call that
//! turns a premise context into text. Each hosted backend gets one adapter.
//!
//! ## Example
//!
//! ```rust,ignore
//! use socratic_core::llm::{
//!     ChatCompletionsClient, ClientConfig, GenerationCapability, GenerationRequest,
//! };
//!
//! let client = ChatCompletionsClient::groq(
//!     ClientConfig::new(std::env::var("GROQ_API_KEY")?)
//!         .with_system_prompt("Reason step by step."),
//! )?;
//!
//! let prompt = "Based on the premises:\n- P\nProvide a logical conclusion.";
//! let text = client
//!     .generate(GenerationRequest::new(prompt).with_max_tokens(100))
//!     .await?;
//! ```

mod client;
mod types;

pub use client::{AnthropicClient, ChatCompletionsClient, ClientConfig, GenerationCapability};
#[cfg(test)]
pub use client::MockGenerator;
pub use types::{Backend, GenerationRequest};
