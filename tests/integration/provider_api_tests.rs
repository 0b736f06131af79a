/*!
 * Integration tests for the chat-completions client against a local server
 */

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use novelwai::errors::{ProviderError, TranslationError};
use novelwai::providers::openai::OpenAI;
use novelwai::providers::{Provider, TranslationRequest};
use novelwai::translation::{CancellationFlag, ChapterTranslator, RetryPolicy};

use crate::common::fake_server::{FakeServer, Reply, closed_endpoint};
use crate::common::init_test_logging;

fn request() -> TranslationRequest {
    TranslationRequest::new("그는 웃었다 .", "ko", "en").temperature(0.3)
}

fn client(endpoint: String) -> OpenAI {
    OpenAI::new("test-key", endpoint, "test-model").with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_translate_success_shouldReturnContentAndSendHeaders() {
    init_test_logging();
    let server = FakeServer::start(vec![Reply::completion("He laughed.")]).await;

    let text = client(server.endpoint()).translate(&request()).await.unwrap();
    assert_eq!(text, "He laughed.");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let recorded = &requests[0];
    assert_eq!(recorded.authorization.as_deref(), Some("Bearer test-key"));
    assert_eq!(recorded.referer.as_deref(), Some("http://localhost:5000"));
    assert_eq!(recorded.title.as_deref(), Some("Novel Translation"));

    let body = &recorded.body;
    assert_eq!(body["model"], "test-model");
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("from Korean to English"));
    assert_eq!(body["messages"][1]["content"], "그는 웃었다 .");
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_translate_emptyApiKey_shouldOmitAuthorization() {
    let server = FakeServer::start(vec![Reply::completion("ok")]).await;
    let client = OpenAI::new("", server.endpoint(), "local-model");

    client.translate(&request()).await.unwrap();
    assert!(server.requests()[0].authorization.is_none());
}

#[tokio::test]
async fn test_translate_transientStatuses_shouldClassifyAsTransient() {
    for status in [429u16, 500, 502, 503, 504] {
        let server = FakeServer::start(vec![Reply::error(status)]).await;
        let error = client(server.endpoint()).translate(&request()).await.unwrap_err();
        assert!(error.is_transient(), "status {} gave {:?}", status, error);
    }
}

#[tokio::test]
async fn test_translate_rateLimited_shouldBeRateLimitError() {
    let server = FakeServer::start(vec![Reply::error(429)]).await;
    let error = client(server.endpoint()).translate(&request()).await.unwrap_err();
    assert!(matches!(error, ProviderError::RateLimitExceeded(_)));
}

#[tokio::test]
async fn test_translate_clientErrors_shouldBeFatal() {
    let server = FakeServer::start(vec![Reply::error(400)]).await;
    let error = client(server.endpoint()).translate(&request()).await.unwrap_err();
    assert!(matches!(error, ProviderError::ApiError { status_code: 400, .. }));
    assert!(!error.is_transient());

    let server = FakeServer::start(vec![Reply::error(401)]).await;
    let error = client(server.endpoint()).translate(&request()).await.unwrap_err();
    assert!(matches!(error, ProviderError::AuthenticationError(_)));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_translate_malformedBodies_shouldBeFatalParseErrors() {
    for body in ["this is not json", r#"{"choices": []}"#, r#"{"choices": [{"message": {"role": "assistant"}}]}"#] {
        let server = FakeServer::start(vec![Reply::raw(200, body)]).await;
        let error = client(server.endpoint()).translate(&request()).await.unwrap_err();
        assert!(matches!(error, ProviderError::ParseError(_)), "body {:?} gave {:?}", body, error);
        assert!(!error.is_transient());
    }
}

#[tokio::test]
async fn test_translate_refusedConnection_shouldBeTransient() {
    let error = client(closed_endpoint().await).translate(&request()).await.unwrap_err();
    assert!(matches!(error, ProviderError::ConnectionError(_)));
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_translate_slowServer_shouldTimeOutAsTransient() {
    let server = FakeServer::start(vec![Reply::completion("late").delayed(Duration::from_secs(2))]).await;
    let client = client(server.endpoint()).with_timeout(Duration::from_millis(200));

    let error = client.translate(&request()).await.unwrap_err();
    assert!(matches!(error, ProviderError::ConnectionError(_)), "got {:?}", error);
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_testConnection_shouldExpectPong() {
    let server = FakeServer::start(vec![Reply::completion("Pong.")]).await;
    assert_ok!(client(server.endpoint()).test_connection().await);

    let server = FakeServer::start(vec![Reply::completion("Hello there")]).await;
    assert_err!(client(server.endpoint()).test_connection().await);
}

#[tokio::test]
async fn test_orchestrator_overHttp_shouldRetryServiceUnavailable() {
    let server = FakeServer::start(vec![Reply::error(503), Reply::error(502), Reply::completion("Done .")]).await;
    let provider = Arc::new(client(server.endpoint()));
    let translator = ChapterTranslator::new(provider, "ko", "en")
        .with_policy(RetryPolicy::new(5, Duration::from_millis(1), 20));

    let translation = translator
        .translate_body(1, "끝.", &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(translation.text, "Done.");
    assert_eq!(server.hits(), 3);
}

#[tokio::test]
async fn test_orchestrator_overHttp_shouldStopOnBadRequest() {
    let server = FakeServer::start(vec![Reply::error(400), Reply::completion("never")]).await;
    let translator = ChapterTranslator::new(Arc::new(client(server.endpoint())), "ko", "en")
        .with_policy(RetryPolicy::new(5, Duration::from_millis(1), 20));

    let error = translator
        .translate_body(1, "끝.", &CancellationFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Fatal { chunk_index: 0, .. }));
    assert_eq!(server.hits(), 1);
}
