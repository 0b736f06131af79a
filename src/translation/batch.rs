/*!
 * Batch translation of chapters.
 *
 * Chapters are independent, so several can be translated at once. Each chapter
 * still runs its own sequential orchestrator; the workers share one request
 * gate, and results are committed in chapter order once everything settles.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use log::{error, info};

use crate::app_config::Config;
use crate::document::Chapter;
use crate::errors::TranslationError;
use crate::providers::Provider;

use super::concurrency::RequestGate;
use super::orchestrator::{CancellationFlag, ChapterTranslator, TranslationStats};

/// Outcome of one chapter in a batch
#[derive(Debug)]
pub struct ChapterOutcome {
    /// Order of the chapter
    pub order: usize,
    /// Statistics on success, the aborting error otherwise
    pub result: Result<TranslationStats, TranslationError>,
}

/// Per-chapter outcomes of a batch, in chapter order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ChapterOutcome>,
}

impl BatchReport {
    /// Orders of the chapters that were committed
    pub fn succeeded(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.order)
            .collect()
    }

    /// Failed chapters with their errors
    pub fn failed(&self) -> Vec<(usize, &TranslationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.order, e)))
            .collect()
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Translates many chapters with bounded parallelism
#[derive(Debug, Clone)]
pub struct BatchTranslator {
    /// Orchestrator shared by every worker, wired to the gate
    translator: ChapterTranslator,

    /// Maximum number of chapters in flight
    concurrent_chapters: usize,

    /// Gate shared by every worker
    gate: Arc<RequestGate>,
}

impl BatchTranslator {
    /// Create a batch translator; the translator is routed through `gate`
    pub fn new(translator: ChapterTranslator, concurrent_chapters: usize, gate: Arc<RequestGate>) -> Self {
        Self {
            translator: translator.with_gate(Arc::clone(&gate)),
            concurrent_chapters: concurrent_chapters.max(1),
            gate,
        }
    }

    /// Create a batch translator from the application config
    pub fn from_config(provider: Arc<dyn Provider>, config: &Config) -> Self {
        Self::new(
            ChapterTranslator::from_config(provider, config),
            config.translation.common.concurrent_chapters,
            Arc::new(RequestGate::from_config(&config.translation)),
        )
    }

    pub fn concurrent_chapters(&self) -> usize {
        self.concurrent_chapters
    }

    pub fn gate(&self) -> &Arc<RequestGate> {
        &self.gate
    }

    /// Translate chapters and commit each successful result atomically
    ///
    /// A failing chapter never affects another chapter's committed text, and
    /// keeps whatever translation it held before.
    pub async fn translate_chapters(&self, chapters: &mut [Chapter], cancel: &CancellationFlag) -> BatchReport {
        self.translate_chapters_with_progress(chapters, cancel, |_, _| {}).await
    }

    /// Translate chapters, calling `progress_callback(done, total)` as each one settles
    pub async fn translate_chapters_with_progress(
        &self,
        chapters: &mut [Chapter],
        cancel: &CancellationFlag,
        progress_callback: impl Fn(usize, usize),
    ) -> BatchReport {
        let total = chapters.len();
        let processed = AtomicUsize::new(0);
        let jobs: Vec<_> = chapters
            .iter_mut()
            .enumerate()
            .map(|(slot, chapter)| {
                let previous = chapter.mark_in_progress();
                (slot, chapter.order(), chapter.body().to_string(), previous)
            })
            .collect();

        let translator = &self.translator;
        let processed = &processed;
        let progress_callback = &progress_callback;
        let mut results = stream::iter(jobs)
            .map(|(slot, order, body, previous)| async move {
                info!("Translating chapter {} ({} of {})", order, slot + 1, total);
                let start_time = Instant::now();
                let result = translator.translate_body(order, &body, cancel).await;
                match &result {
                    Ok(translation) => info!(
                        "Chapter {} translated in {:?} ({} chunks, {} attempts)",
                        order,
                        start_time.elapsed(),
                        translation.stats.chunks,
                        translation.stats.attempts
                    ),
                    Err(e) => error!("Chapter {} failed: {}", order, e),
                }

                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                progress_callback(current, total);
                (slot, previous, result)
            })
            .buffer_unordered(self.concurrent_chapters)
            .collect::<Vec<_>>()
            .await;

        // Sort results by slot to commit in the original order
        results.sort_by_key(|(slot, _, _)| *slot);

        let mut report = BatchReport::default();
        for (slot, previous, result) in results {
            let chapter = &mut chapters[slot];
            let result = match result {
                Ok(translation) => {
                    chapter.commit_translation(translation.text);
                    Ok(translation.stats)
                }
                Err(e) => {
                    chapter.record_failure(previous);
                    Err(e)
                }
            };
            report.outcomes.push(ChapterOutcome {
                order: chapter.order(),
                result,
            });
        }
        report.outcomes.sort_by_key(|outcome| outcome.order);

        report
    }
}
