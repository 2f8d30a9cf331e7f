//! Optional generative-model backends.
//!
//! The engine only talks to a [`TextGenerator`]. Every call goes through
//! [`generate_with_timeout`], so a slow or unreachable backend surfaces as
//! [`CoreError::ExternalServiceUnavailable`] and never blocks the caller
//! past the configured timeout.

mod openai;

pub use openai::OpenAiGenerator;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{CoreError, Result};

/// A prompt sent to a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Instructions for the model
    pub system: String,
    /// The task and context text
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Every generative backend implements this trait.
///
/// Implementations hold no per-call state and may be shared across tasks.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs and errors (e.g. "openai").
    fn name(&self) -> &str;

    /// Produce a free-text completion for `prompt`.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// Call `generator` with a per-attempt timeout and up to `retries` extra
/// attempts. Empty completions count as failures.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
    timeout: Duration,
    retries: u32,
) -> Result<String> {
    // At most one retry.
    let attempts = 1 + retries.min(1);
    let mut last_error = CoreError::unavailable(generator.name(), "no attempt made");

    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(timeout, generator.complete(prompt)).await {
            Ok(result) => result,
            Err(elapsed) => Err(CoreError::from(elapsed)),
        };

        match outcome {
            Ok(text) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
            Ok(_) => {
                last_error = CoreError::unavailable(generator.name(), "empty completion");
            }
            Err(e) => last_error = e,
        }

        tracing::debug!(
            generator = generator.name(),
            attempt,
            error = %last_error,
            "generator attempt failed"
        );
        if attempt < attempts {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    Err(match last_error {
        err @ CoreError::ExternalServiceUnavailable { .. } => err,
        other => CoreError::unavailable(generator.name(), other.to_string()),
    })
}
