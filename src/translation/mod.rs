/*!
 * Chapter translation.
 *
 * This module turns chapter bodies into translated text through a provider.
 * It is split into several submodules:
 *
 * - `chunker`: Budgeted splitting of a chapter body at paragraph and scene breaks
 * - `retry`: Backoff policy and the per-chunk retry state machine
 * - `orchestrator`: Sequential chunk translation, reassembly and cancellation
 * - `normalizer`: Chapter-wide cleanup of the reassembled translation
 * - `concurrency`: Request gate shared by concurrent chapter workers
 * - `batch`: Bounded parallel translation of many chapters
 */

// Re-export main types for easier usage
pub use self::batch::{BatchReport, BatchTranslator, ChapterOutcome};
pub use self::chunker::{Chunk, Chunker};
pub use self::concurrency::RequestGate;
pub use self::normalizer::normalize;
pub use self::orchestrator::{
    CancellationFlag, ChapterTranslation, ChapterTranslator, ChunkProgress, TranslationStats, reassemble,
};
pub use self::retry::{RetryDecision, RetryMachine, RetryPolicy, RetryState};

// Submodules
pub mod batch;
pub mod chunker;
pub mod concurrency;
pub mod normalizer;
pub mod orchestrator;
pub mod retry;
