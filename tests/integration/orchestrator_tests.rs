/*!
 * Integration tests for per-chapter translation orchestration
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use novelwai::app_config::Config;
use novelwai::document::{Chapter, ChapterStatus};
use novelwai::errors::{ProviderError, TranslationError};
use novelwai::providers::mock::MockProvider;
use novelwai::providers::{Provider, TranslationRequest};
use novelwai::translation::{CancellationFlag, ChapterTranslator, Chunker, RetryPolicy};
use novelwai::Controller;

use crate::common::{init_test_logging, paragraphs};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1), 20)
}

#[tokio::test]
async fn test_translateBody_transientTwiceThenSuccess_shouldCallThreeTimes() {
    init_test_logging();
    let provider = Arc::new(MockProvider::flaky(2));
    let translator = ChapterTranslator::new(provider.clone(), "ko", "en").with_policy(fast_policy(5));

    let translation = translator
        .translate_body(1, "안녕하세요.", &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(translation.text, "[TRANSLATED to en] 안녕하세요.");
    assert_eq!(provider.calls(), 3);
    assert_eq!(translation.stats.attempts, 3);
    let waits = &translation.stats.waits;
    assert_eq!(waits.len(), 2);
    assert!(waits[0] < waits[1], "backoff must grow: {:?}", waits);
}

#[tokio::test]
async fn test_translateBody_fatalStatus_shouldNotRetry() {
    let provider = Arc::new(MockProvider::fatal(401));
    let translator = ChapterTranslator::new(provider.clone(), "ko", "en").with_policy(fast_policy(5));

    let error = translator
        .translate_body(1, "Hello.", &CancellationFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        TranslationError::Fatal { source: ProviderError::AuthenticationError(_), .. }
    ));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_translateBody_persistentTransient_shouldExhaustRetries() {
    let provider = Arc::new(MockProvider::failing());
    let translator = ChapterTranslator::new(provider.clone(), "ko", "en").with_policy(fast_policy(3));

    let error = translator
        .translate_body(4, "Hello.", &CancellationFlag::new())
        .await
        .unwrap_err();

    match error {
        TranslationError::RetriesExhausted { chunk_index, attempts, last } => {
            assert_eq!(chunk_index, 0);
            assert_eq!(attempts, 3);
            assert!(last.is_transient());
        }
        other => panic!("expected RetriesExhausted, got {:?}", other),
    }
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_translateBody_manyChunks_shouldSubmitAndJoinInOrder() {
    let body = paragraphs(6, 100);
    let provider = Arc::new(MockProvider::working().with_custom_response(|req| req.text.to_uppercase()));
    let translator = ChapterTranslator::new(provider.clone(), "en", "en").with_chunker(Chunker::new(150));

    let translation = translator
        .translate_body(1, &body, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(translation.stats.chunks, 6);
    assert_eq!(translation.text, body.to_uppercase());
    let received = provider.received();
    assert_eq!(received.len(), 6);
    assert!(received[0].starts_with('a') && received[5].starts_with('f'));
}

#[tokio::test]
async fn test_translateBody_failingMiddleChunk_shouldAbortChapter() {
    let provider = Arc::new(MockProvider::fatal_when(|req| req.text.starts_with('c')));
    let translator = ChapterTranslator::new(provider.clone(), "en", "fr").with_chunker(Chunker::new(150));

    let error = translator
        .translate_body(1, &paragraphs(5, 100), &CancellationFlag::new())
        .await
        .unwrap_err();

    assert_eq!(error.chunk_index(), 2);
    assert_eq!(provider.calls(), 3);
}

/// Cancels the shared flag while serving its first request
#[derive(Debug)]
struct CancelOnFirstCall {
    flag: CancellationFlag,
}

#[async_trait]
impl Provider for CancelOnFirstCall {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        self.flag.cancel();
        Ok(request.text.clone())
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "cancel-on-first-call"
    }
}

#[tokio::test]
async fn test_translateBody_cancelledBetweenChunks_shouldStopBeforeNextChunk() {
    let flag = CancellationFlag::new();
    let provider = Arc::new(CancelOnFirstCall { flag: flag.clone() });
    let translator = ChapterTranslator::new(provider, "en", "fr").with_chunker(Chunker::new(150));

    let error = translator
        .translate_body(1, &paragraphs(3, 100), &flag)
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Cancelled { chunk_index: 1 }));
}

/// Cancels the shared flag and fails transiently on every request
#[derive(Debug)]
struct CancelThenUnavailable {
    flag: CancellationFlag,
    calls: AtomicUsize,
}

#[async_trait]
impl Provider for CancelThenUnavailable {
    async fn translate(&self, _request: &TranslationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.flag.cancel();
        Err(ProviderError::from_status(503, "Service unavailable"))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "cancel-then-unavailable"
    }
}

#[tokio::test]
async fn test_translateBody_cancelledDuringFailingCall_shouldNotRetry() {
    let flag = CancellationFlag::new();
    let provider = Arc::new(CancelThenUnavailable {
        flag: flag.clone(),
        calls: AtomicUsize::new(0),
    });
    let translator = ChapterTranslator::new(provider.clone(), "en", "fr").with_policy(fast_policy(5));

    let error = translator.translate_body(1, "Hello.", &flag).await.unwrap_err();

    assert!(matches!(error, TranslationError::Cancelled { chunk_index: 0 }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_translateBody_withProgress_shouldReportEveryChunkInOrder() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let translator = ChapterTranslator::new(Arc::new(MockProvider::flaky(1)), "en", "fr")
        .with_chunker(Chunker::new(150))
        .with_policy(fast_policy(5))
        .with_progress(move |order, done, total| sink.lock().push((order, done, total)));

    translator
        .translate_body(7, &paragraphs(3, 100), &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![(7, 1, 3), (7, 2, 3), (7, 3, 3)]);
}

#[tokio::test]
async fn test_translateChapter_failureAfterSuccess_shouldKeepPreviousTranslation() {
    let mut chapter = Chapter::new(1, Some("Chapter 1".to_string()), "Hello world.");

    let first = Controller::with_provider(Config::default(), Arc::new(MockProvider::working())).unwrap();
    first.translate_chapter(&mut chapter, &CancellationFlag::new()).await.unwrap();
    let committed = chapter.translated_text().map(str::to_string);
    let committed_at = chapter.translated_at();
    assert!(committed.is_some());

    let second = Controller::with_provider(Config::default(), Arc::new(MockProvider::fatal(400))).unwrap();
    assert!(second.translate_chapter(&mut chapter, &CancellationFlag::new()).await.is_err());

    assert_eq!(chapter.translated_text().map(str::to_string), committed);
    assert_eq!(chapter.translated_at(), committed_at);
    assert_eq!(chapter.status(), ChapterStatus::Translated);
}
