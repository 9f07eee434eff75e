//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses, optionally bound to a completion purpose
//! - Simulated delays for timeout testing
//! - Error injection for outage testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response_for(CompletionPurpose::CategoryDetection, r#"{"category":"family_law"}"#)
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionPurpose, CompletionRequest, CompletionResponse, ProviderInfo,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    /// Returned once the queue has nothing for a request.
    fallback: MockResponse,
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

#[derive(Debug, Clone)]
struct Scripted {
    purpose: Option<CompletionPurpose>,
    response: MockResponse,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion with this content.
    Success(String),
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::timeout(timeout_secs),
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a mock that answers `{}` (nothing found) when unscripted.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockResponse::Success("{}".to_string()),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a mock that fails every unscripted call, simulating an outage.
    pub fn unavailable() -> Self {
        Self::new().with_fallback(MockResponse::Error(MockError::Unavailable {
            message: "mock outage".to_string(),
        }))
    }

    /// Adds a successful response for any purpose.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(None, MockResponse::Success(content.into()))
    }

    /// Adds a successful response consumed only by requests of `purpose`.
    pub fn with_response_for(self, purpose: CompletionPurpose, content: impl Into<String>) -> Self {
        self.push(Some(purpose), MockResponse::Success(content.into()))
    }

    /// Adds an error response for any purpose.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(None, MockResponse::Error(error))
    }

    /// Replaces what unscripted calls return.
    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = response;
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.lock_calls().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.lock_calls().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.lock_calls().clear();
    }

    fn push(self, purpose: Option<CompletionPurpose>, response: MockResponse) -> Self {
        self.lock_responses().push_back(Scripted { purpose, response });
        self
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<CompletionRequest>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// First queued response usable for `purpose`, or the fallback.
    fn next_response(&self, purpose: CompletionPurpose) -> MockResponse {
        let mut queue = self.lock_responses();
        let position = queue
            .iter()
            .position(|s| s.purpose.map_or(true, |p| p == purpose));
        match position.and_then(|i| queue.remove(i)) {
            Some(scripted) => scripted.response,
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let purpose = request.metadata.purpose;
        self.lock_calls().push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response(purpose) {
            MockResponse::Success(content) => {
                Ok(CompletionResponse::new(content, self.info.model.clone()))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SessionId;
    use crate::ports::{MessageRole, RequestMetadata};

    fn request(purpose: CompletionPurpose) -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(SessionId::new(), purpose))
            .with_message(MessageRole::User, "Hello")
    }

    #[tokio::test]
    async fn returns_responses_in_order() {
        let provider = MockAIProvider::new().with_response("First").with_response("Second");

        let r1 = provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();
        let r2 = provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
        assert_eq!(r1.model, "mock-model-1");
    }

    #[tokio::test]
    async fn returns_empty_object_after_exhausted() {
        let provider = MockAIProvider::new().with_response("Only one");
        provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();
        let r2 = provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();
        assert_eq!(r2.content, "{}");
    }

    #[tokio::test]
    async fn purpose_bound_responses_skip_other_purposes() {
        let provider = MockAIProvider::new()
            .with_response_for(CompletionPurpose::FieldExtraction, "fields")
            .with_response_for(CompletionPurpose::CategoryDetection, "category");

        let detection = provider.complete(request(CompletionPurpose::CategoryDetection)).await.unwrap();
        let extraction = provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();

        assert_eq!(detection.content, "category");
        assert_eq!(extraction.content, "fields");
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let provider = MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });
        let err = provider
            .complete(request(CompletionPurpose::FieldExtraction))
            .await
            .unwrap_err();
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn unavailable_mock_always_fails() {
        let provider = MockAIProvider::unavailable();
        for _ in 0..3 {
            let result = provider.complete(request(CompletionPurpose::CategoryDetection)).await;
            assert!(matches!(result, Err(AIError::Unavailable { .. })));
        }
        assert_eq!(provider.call_count(), 3);
        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn respects_delay() {
        let provider = MockAIProvider::new().with_delay(Duration::from_millis(50));
        let start = std::time::Instant::now();
        provider.complete(request(CompletionPurpose::FieldExtraction)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
