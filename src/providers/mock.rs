/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::flaky(n)` - Fails transiently `n` times, then succeeds
 * - `MockProvider::failing()` - Always fails with a transient error
 * - `MockProvider::fatal(status)` - Always fails with a non-retryable status
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Always succeeds with a translation
    Working,
    /// Fails with `status` for the first `failures` calls, then succeeds
    FailThenSucceed { failures: usize, status: u16 },
    /// Always fails with a transient 503
    Failing,
    /// Always fails with the given status (400, 401, ...)
    Fatal { status: u16 },
    /// Fails with a 400 for requests matching the predicate, succeeds otherwise
    FatalWhen { predicate: fn(&TranslationRequest) -> bool },
    /// Succeeds with an empty string
    Empty,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of calls received, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Texts received, in call order
    received: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&TranslationRequest) -> String>,
    /// Per-call latency (optional)
    delay: Option<fn(&TranslationRequest) -> u64>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            delay: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a provider that answers 503 `failures` times before succeeding
    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::FailThenSucceed { failures, status: 503 })
    }

    /// Create a failing mock provider that always returns a transient error
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a provider that always fails with a non-retryable status
    pub fn fatal(status: u16) -> Self {
        Self::new(MockBehavior::Fatal { status })
    }

    /// Create a provider that rejects requests matching `predicate`
    pub fn fatal_when(predicate: fn(&TranslationRequest) -> bool) -> Self {
        Self::new(MockBehavior::FatalWhen { predicate })
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&TranslationRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Delay every call by the returned number of milliseconds
    pub fn with_delay(mut self, delay_ms: fn(&TranslationRequest) -> u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received so far, in call order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    fn respond(&self, request: &TranslationRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => format!("[TRANSLATED to {}] {}", request.target_language, request.text),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            received: Arc::clone(&self.received),
            custom_response: self.custom_response,
            delay: self.delay,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(request.text.clone());

        if let Some(delay_ms) = self.delay {
            tokio::time::sleep(Duration::from_millis(delay_ms(request))).await;
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(request)),

            MockBehavior::FailThenSucceed { failures, status } => {
                if count < failures {
                    Err(ProviderError::from_status(
                        status,
                        format!("Simulated failure (request #{})", count + 1),
                    ))
                } else {
                    Ok(self.respond(request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated provider outage".to_string(),
            }),

            MockBehavior::Fatal { status } => Err(ProviderError::from_status(
                status,
                "Simulated fatal failure",
            )),

            MockBehavior::FatalWhen { predicate } => {
                if predicate(request) {
                    Err(ProviderError::from_status(400, "Simulated rejected request"))
                } else {
                    Ok(self.respond(request))
                }
            }

            MockBehavior::Empty => Ok(String::new()),
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            MockBehavior::Fatal { status } => Err(ProviderError::from_status(status, "Simulated fatal failure")),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
