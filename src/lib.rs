/*!
 * # novelwai - chapter segmentation and AI translation for web novels
 *
 * A Rust library that splits long-form fiction into chapters and translates
 * them through an OpenAI-compatible chat-completions API.
 *
 * ## Features
 *
 * - Data-driven chapter heading recognition (Western, Chinese, Japanese and
 *   Korean conventions) with size-based fallbacks
 * - Chunking at paragraph and scene breaks under a character budget
 * - Translation through OpenRouter, OpenAI or LM Studio
 * - Bounded retries with exponential backoff for transient failures
 * - All-or-nothing commit of a chapter's translation
 * - Optional parallel translation of chapters behind a shared request gate
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document and chapter model
 * - `segmentation`: Chapter boundary detection and fallbacks
 * - `translation`: Chunking, retry, orchestration, normalization and batching
 * - `providers`: The provider seam and its implementations:
 *   - `providers::openai`: OpenAI-compatible chat-completions client
 *   - `providers::mock`: Scripted provider for tests
 * - `app_controller`: Entry point wiring everything together
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod segmentation;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use document::{Chapter, ChapterStatus, Document};
pub use errors::{AppError, ProviderError, SegmentationError, TranslationError};
pub use language_utils::{display_name, get_language_name};
pub use segmentation::Segmenter;
pub use translation::{BatchTranslator, CancellationFlag, ChapterTranslator};
