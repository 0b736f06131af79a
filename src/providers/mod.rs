/*!
 * Provider implementations for the translation capability.
 *
 * This module contains the `Provider` seam the orchestrator talks to and its
 * implementations:
 * - OpenAI: any OpenAI-compatible chat-completions API (OpenRouter, OpenAI, LM Studio)
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One translation request
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// Text to translate
    pub text: String,
    /// Source language tag
    pub source_language: String,
    /// Target language tag
    pub target_language: String,
    /// Sampling temperature, provider default when `None`
    pub temperature: Option<f32>,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            temperature: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Common trait for all translation providers
///
/// Implementations make exactly one attempt per call and classify their
/// failures through `ProviderError::is_transient`; retrying is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one piece of text
    ///
    /// # Arguments
    /// * `request` - The text and language pair
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or a classified error
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

pub mod mock;
pub mod openai;
