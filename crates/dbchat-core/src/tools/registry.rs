//! Tool registry
//!
//! Loads the provider's advertised tools once and caches the signatures for
//! the session's lifetime. There is no live refresh mid-conversation: a
//! changed tool set would not be reflected in the model's context anyway.

use tracing::debug;

use super::{ToolProvider, ToolSignature};
use crate::error::Result;

/// Cached catalog of the capabilities offered to the model
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    signatures: Vec<ToolSignature>,
}

impl ToolRegistry {
    /// Discover tools from the provider
    ///
    /// Must be called once before the orchestration loop runs. Fails with
    /// `Error::ProviderUnavailable` if the provider cannot be reached.
    pub async fn load(provider: &dyn ToolProvider) -> Result<Self> {
        let signatures = provider.list_tools().await?;
        debug!(count = signatures.len(), "Loaded tool signatures");
        Ok(Self { signatures })
    }

    /// Registry with no tools (sessions without a tool provider)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn signatures(&self) -> &[ToolSignature] {
        &self.signatures
    }

    pub fn get(&self, name: &str) -> Option<&ToolSignature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
