//! Stand-in provider used when no AI credentials are configured.
//!
//! Every call fails with `AIError::NotConfigured`, so detection and
//! extraction run on their deterministic strategies.

use async_trait::async_trait;

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, ProviderInfo};

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAIProvider;

#[async_trait]
impl AIProvider for DisabledAIProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        Err(AIError::NotConfigured)
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("disabled", "none")
    }
}
