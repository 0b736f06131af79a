use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::document::{Chapter, Document};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::openai::OpenAI;
use crate::providers::Provider;
use crate::segmentation::Segmenter;
use crate::translation::{
    BatchReport, BatchTranslator, CancellationFlag, ChapterTranslator, RequestGate, TranslationStats,
};

// @module: Application controller for novel translation

/// Main application controller for segmentation and translation
#[derive(Debug)]
pub struct Controller {
    // @field: Library configuration
    config: Config,

    // @field: Chapter segmenter built from the configured pattern table
    segmenter: Segmenter,

    // @field: Translation capability
    provider: Arc<dyn Provider>,
}

impl Controller {
    // @method: Create a controller talking to the configured chat-completions API
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let provider = OpenAI::from_config(&config.translation)
            .context("Failed to create translation client")?;
        info!(
            "Using {} with model {}",
            config.translation.provider.display_name(),
            provider.model()
        );
        Self::with_provider(config, Arc::new(provider))
    }

    // @method: Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Result<Self> {
        let segmenter = Segmenter::new(&config.segmentation)
            .context("Failed to build chapter segmenter")?;
        Ok(Self {
            config,
            segmenter,
            provider,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// Check that the provider answers
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Split a document into ordered chapters
    pub fn segment(&self, document: &Document) -> Vec<Chapter> {
        let chapters = self.segmenter.split(document.text());
        info!(
            "Segmented {} into {} chapters",
            document.title().unwrap_or("document"),
            chapters.len()
        );
        chapters
    }

    /// Orchestrator for the configured language pair
    pub fn translator(&self) -> ChapterTranslator {
        ChapterTranslator::from_config(Arc::clone(&self.provider), &self.config)
    }

    /// Translate one chapter and commit the result atomically
    ///
    /// Requests go through a gate built from the provider config, so the rate
    /// limit applies here too. On failure the chapter keeps any translation it
    /// already had.
    pub async fn translate_chapter(
        &self,
        chapter: &mut Chapter,
        cancel: &CancellationFlag,
    ) -> Result<TranslationStats, TranslationError> {
        let translator = self.translator().with_gate(Arc::new(self.request_gate()));
        let previous = chapter.mark_in_progress();
        info!("Translating chapter {}: {}", chapter.order(), chapter.display_title());
        let start_time = Instant::now();

        let result = translator.translate_body(chapter.order(), chapter.body(), cancel).await;
        match result {
            Ok(translation) => {
                info!(
                    "Chapter {} translated in {:?} ({} chunks, {} attempts, {:?} in backoff)",
                    chapter.order(),
                    start_time.elapsed(),
                    translation.stats.chunks,
                    translation.stats.attempts,
                    translation.stats.total_wait()
                );
                chapter.commit_translation(translation.text);
                Ok(translation.stats)
            }
            Err(e) => {
                error!("Chapter {} failed: {}", chapter.order(), e);
                chapter.record_failure(previous);
                Err(e)
            }
        }
    }

    /// Translate many chapters
    ///
    /// Chapters run one after another unless `concurrent_chapters` is above 1,
    /// in which case they share a request gate sized from the provider config.
    pub async fn translate_chapters(&self, chapters: &mut [Chapter], cancel: &CancellationFlag) -> BatchReport {
        self.batch_translator(self.translator())
            .translate_chapters_with_progress(chapters, cancel, log_progress)
            .await
    }

    /// Segment a document and translate all of its chapters
    ///
    /// When the configured source language is "auto", the document's own
    /// language tag is used for the prompts.
    pub async fn translate_document(
        &self,
        document: &Document,
        cancel: &CancellationFlag,
    ) -> (Vec<Chapter>, BatchReport) {
        if language_utils::language_codes_match(document.source_language(), &self.config.target_language) {
            warn!(
                "Document is already tagged as {}, translating anyway",
                language_utils::display_name(document.source_language())
            );
        }
        let mut chapters = self.segment(document);

        let mut translator = self.translator();
        if self.config.source_language.eq_ignore_ascii_case(language_utils::AUTO_DETECT) {
            translator = translator.with_source_language(document.source_language());
        }

        let report = self
            .batch_translator(translator)
            .translate_chapters_with_progress(&mut chapters, cancel, log_progress)
            .await;
        (chapters, report)
    }

    fn request_gate(&self) -> RequestGate {
        RequestGate::from_config(&self.config.translation)
    }

    fn batch_translator(&self, translator: ChapterTranslator) -> BatchTranslator {
        BatchTranslator::new(
            translator,
            self.config.translation.common.concurrent_chapters,
            Arc::new(self.request_gate()),
        )
    }
}

fn log_progress(done: usize, total: usize) {
    info!("Progress: {}/{} chapters settled", done, total);
}
