//! Configuration management
//!
//! Handles loading and saving application configuration: model provider
//! settings and the tool server endpoint.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::provider::DEFAULT_MODEL;

/// Environment variable consulted when no tool server URL is configured
pub const MCP_URL_ENV: &str = "DBCHAT_MCP_URL";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Tool server settings
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model to use
    pub model: String,
    /// API key (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key
    pub api_key_env: String,
    /// Iteration budget per user message
    pub max_iterations: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_iterations: crate::session::DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ProviderConfig {
    /// Get the API key, checking the environment variable if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        if let Ok(key) = std::env::var(&self.api_key_env) {
            if !key.is_empty() {
                return Some(key);
            }
        }

        None
    }
}

/// Tool server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// HTTP endpoint URL (e.g. "http://localhost:8000/mcp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Command to spawn for a stdio server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments for the stdio server command
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Resolved tool server endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpEndpoint {
    /// HTTP POST transport
    Http(String),
    /// Child process over stdio
    Stdio { command: String, args: Vec<String> },
    /// No tool server configured; sessions run without tools
    Disabled,
}

impl McpConfig {
    /// Resolve the endpoint: explicit URL, then the environment
    /// variable, then a stdio command, otherwise disabled.
    pub fn endpoint(&self) -> McpEndpoint {
        if let Some(url) = &self.url {
            if !url.is_empty() {
                return McpEndpoint::Http(url.clone());
            }
        }

        if let Ok(url) = std::env::var(MCP_URL_ENV) {
            if !url.is_empty() {
                return McpEndpoint::Http(url);
            }
        }

        if let Some(command) = &self.command {
            if !command.is_empty() {
                return McpEndpoint::Stdio {
                    command: command.clone(),
                    args: self.args.clone(),
                };
            }
        }

        McpEndpoint::Disabled
    }
}

impl Config {
    /// Get the default config path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".to_string()))?;
        Ok(config_dir.join("dbchat").join("config.toml"))
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save the configuration to disk, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_endpoint() {
        let config = Config::default();
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert!(config.mcp.url.is_none());
    }

    #[test]
    fn explicit_url_wins_over_command() {
        let mcp = McpConfig {
            url: Some("http://localhost:8000/mcp".to_string()),
            command: Some("mcp-server".to_string()),
            args: vec![],
        };
        assert_eq!(
            mcp.endpoint(),
            McpEndpoint::Http("http://localhost:8000/mcp".to_string())
        );
    }

    #[test]
    fn command_used_when_no_url() {
        let mcp = McpConfig {
            url: None,
            command: Some("mysql-mcp".to_string()),
            args: vec!["--stdio".to_string()],
        };
        match mcp.endpoint() {
            McpEndpoint::Stdio { command, args } => {
                assert_eq!(command, "mysql-mcp");
                assert_eq!(args, vec!["--stdio"]);
            }
            other => panic!("expected stdio endpoint, got {:?}", other),
        }
    }

    #[test]
    fn parses_minimal_toml() {
        let config: Config = toml::from_str(
            r#"
            [provider]
            model = "gpt-4o-mini"

            [mcp]
            url = "http://mcp-server:8000/mcp"
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.api_key_env, "OPENAI_API_KEY");
        assert_eq!(
            config.mcp.endpoint(),
            McpEndpoint::Http("http://mcp-server:8000/mcp".to_string())
        );
    }
}
