//! LLM client module
//!
//! One stateless [`LlmClient`] is shared by every agent in a run. The only
//! implementation talks to OpenAI-compatible chat completion endpoints.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "openai" => {
            debug!("create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "anthropic".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::UnknownProvider(p)) if p == "anthropic"));
    }

    #[test]
    #[serial]
    fn test_missing_api_key_rejected() {
        unsafe { std::env::remove_var("AT_NO_SUCH_KEY") };
        let config = LlmConfig {
            api_key_env: "AT_NO_SUCH_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(create_client(&config), Err(LlmError::MissingApiKey(_))));
    }

    #[test]
    #[serial]
    fn test_openai_client_created_with_key() {
        unsafe { std::env::set_var("AT_CLIENT_KEY", "sk-test") };
        let config = LlmConfig {
            api_key_env: "AT_CLIENT_KEY".to_string(),
            ..LlmConfig::default()
        };
        assert!(create_client(&config).is_ok());
        unsafe { std::env::remove_var("AT_CLIENT_KEY") };
    }
}
