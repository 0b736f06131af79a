/*!
 * Per-chapter translation orchestration.
 *
 * A chapter body is chunked, every chunk is sent to the provider strictly in
 * order with retries for transient failures, and the successful outputs are
 * reassembled by chunk index and normalized. Any chunk failure aborts the
 * whole chapter; nothing partial is returned.
 */

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::providers::{Provider, TranslationRequest};

use super::chunker::{Chunk, Chunker};
use super::concurrency::RequestGate;
use super::normalizer::normalize;
use super::retry::{RetryDecision, RetryMachine, RetryPolicy};

/// Separator placed between translated chunks
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Cooperative cancellation shared between a caller and its workers
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask running translations to stop before their next request
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters collected while translating one chapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationStats {
    /// Number of chunks the body was split into
    pub chunks: usize,
    /// Provider calls made, retries included
    pub attempts: u32,
    /// Backoff waits taken, in order
    pub waits: Vec<Duration>,
}

impl TranslationStats {
    pub fn total_wait(&self) -> Duration {
        self.waits.iter().sum()
    }
}

/// Result of a successful chapter translation
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterTranslation {
    /// Normalized translated text
    pub text: String,
    pub stats: TranslationStats,
}

/// Called as `(chapter_order, done_chunks, total_chunks)` after every translated chunk
pub type ChunkProgress = Arc<dyn Fn(usize, usize, usize) + Send + Sync>;

/// Translates chapter bodies through a provider
#[derive(Clone)]
pub struct ChapterTranslator {
    provider: Arc<dyn Provider>,
    chunker: Chunker,
    policy: RetryPolicy,
    source_language: String,
    target_language: String,
    temperature: Option<f32>,
    gate: Option<Arc<RequestGate>>,
    progress: Option<ChunkProgress>,
}

impl fmt::Debug for ChapterTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChapterTranslator")
            .field("provider", &self.provider.name())
            .field("chunker", &self.chunker)
            .field("policy", &self.policy)
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("temperature", &self.temperature)
            .field("gate", &self.gate)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl ChapterTranslator {
    /// Create a translator with default chunking and retry settings
    pub fn new(
        provider: Arc<dyn Provider>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            chunker: Chunker::default(),
            policy: RetryPolicy::default(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            temperature: None,
            gate: None,
            progress: None,
        }
    }

    /// Create a translator from the application config
    pub fn from_config(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self::new(provider, &config.source_language, &config.target_language)
            .with_chunker(Chunker::new(config.chunking.max_chars))
            .with_policy(RetryPolicy::from_config(&config.translation.common))
            .with_temperature(config.translation.common.temperature)
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_source_language(mut self, source_language: impl Into<String>) -> Self {
        self.source_language = source_language.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Route every request through a shared gate
    pub fn with_gate(mut self, gate: Arc<RequestGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Report chunk progress to `callback`
    pub fn with_progress(mut self, callback: impl Fn(usize, usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Translate one chapter body
    ///
    /// # Arguments
    /// * `chapter_order` - Order of the chapter, used for log lines and chunk tags
    /// * `body` - Source text of the chapter
    /// * `cancel` - Checked before every request
    ///
    /// # Returns
    /// * The normalized translation with statistics, or the error of the first failing chunk
    pub async fn translate_body(
        &self,
        chapter_order: usize,
        body: &str,
        cancel: &CancellationFlag,
    ) -> Result<ChapterTranslation, TranslationError> {
        let mut chunks = self.chunker.chunks_for(chapter_order, body);
        let mut stats = TranslationStats {
            chunks: chunks.len(),
            ..Default::default()
        };

        if chunks.is_empty() {
            debug!("Chapter {} has an empty body, nothing to translate", chapter_order);
            return Ok(ChapterTranslation {
                text: String::new(),
                stats,
            });
        }

        let total = chunks.len();
        for chunk in chunks.iter_mut() {
            debug!(
                "Chapter {}: translating chunk {}/{} ({} chars)",
                chapter_order,
                chunk.index + 1,
                total,
                chunk.text.chars().count()
            );
            self.translate_chunk(chunk, cancel, &mut stats).await?;
            if let Some(progress) = &self.progress {
                progress(chapter_order, chunk.index + 1, total);
            }
        }

        let text = normalize(&reassemble(chunks));
        Ok(ChapterTranslation { text, stats })
    }

    /// Run the retry loop for a single chunk
    async fn translate_chunk(
        &self,
        chunk: &mut Chunk,
        cancel: &CancellationFlag,
        stats: &mut TranslationStats,
    ) -> Result<(), TranslationError> {
        let mut request = TranslationRequest::new(
            chunk.text.as_str(),
            self.source_language.as_str(),
            self.target_language.as_str(),
        );
        if let Some(temperature) = self.temperature {
            request = request.temperature(temperature);
        }

        let mut machine = RetryMachine::new(self.policy.clone());

        loop {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled {
                    chunk_index: chunk.index,
                });
            }

            let permit = match &self.gate {
                Some(gate) => gate.acquire().await,
                None => None,
            };

            let attempt = machine.begin_attempt();
            stats.attempts += 1;
            let result = self.provider.translate(&request).await;
            drop(permit);
            chunk.retries = machine.attempts().saturating_sub(1);

            let provider_error = match result {
                Ok(text) => {
                    machine.record_success();
                    chunk.translated = Some(text.trim().to_string());
                    return Ok(());
                }
                Err(e) => e,
            };

            match machine.record_failure(&provider_error) {
                RetryDecision::Wait(delay) => {
                    warn!(
                        "Chapter {} chunk {}: attempt {} failed with a transient error ({}), retrying in {:?}",
                        chunk.chapter_order,
                        chunk.index,
                        attempt + 1,
                        provider_error,
                        delay
                    );
                    if let Some(gate) = &self.gate {
                        gate.pause_for(delay);
                    }
                    stats.waits.push(delay);
                    tokio::time::sleep(delay).await;
                    machine.resume();
                }
                RetryDecision::Fatal => {
                    error!(
                        "Chapter {} chunk {}: non-retryable error: {}",
                        chunk.chapter_order, chunk.index, provider_error
                    );
                    return Err(TranslationError::Fatal {
                        chunk_index: chunk.index,
                        source: provider_error,
                    });
                }
                RetryDecision::Exhausted => {
                    error!(
                        "Chapter {} chunk {}: giving up after {} attempts: {}",
                        chunk.chapter_order,
                        chunk.index,
                        machine.attempts(),
                        provider_error
                    );
                    return Err(TranslationError::RetriesExhausted {
                        chunk_index: chunk.index,
                        attempts: machine.attempts(),
                        last: provider_error,
                    });
                }
            }
        }
    }
}

/// Join translated chunks by their original index
///
/// Chunks may arrive in any order; untranslated chunks are skipped.
pub fn reassemble(mut chunks: Vec<Chunk>) -> String {
    chunks.sort_by_key(|chunk| chunk.index);
    chunks
        .into_iter()
        .filter_map(|chunk| chunk.translated)
        .map(|text| text.trim().to_string())
        .collect::<Vec<_>>()
        .join(CHUNK_SEPARATOR)
}
