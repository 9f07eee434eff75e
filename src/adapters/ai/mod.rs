//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port.
//!
//! ## Available Adapters
//!
//! - `OpenAIProvider` - OpenAI-compatible chat completions
//! - `MockAIProvider` - Configurable mock for testing
//! - `DisabledAIProvider` - Always fails; used when no API key is configured

mod disabled_provider;
mod mock_provider;
mod openai_provider;

pub use disabled_provider::DisabledAIProvider;
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
