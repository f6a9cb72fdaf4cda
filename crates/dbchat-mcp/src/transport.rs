//! MCP Transport layer implementations

use async_trait::async_trait;
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Transport trait for MCP communication
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, message: Value) -> io::Result<()>;
    async fn receive(&mut self) -> io::Result<Option<Value>>;
    async fn close(&mut self) -> io::Result<()>;
}

/// Stdio transport for subprocess communication
///
/// Messages are newline-delimited JSON on the child's stdin/stdout.
pub struct StdioTransport {
    child: Child,
    reader: Option<BufReader<tokio::process::ChildStdout>>,
}

impl StdioTransport {
    pub async fn spawn(command: &str, args: &[&str]) -> io::Result<Self> {
        debug!(command, "Spawning MCP server subprocess");
        let mut child = Command::new(command)
            .args(args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("Failed to capture stdout"))?;

        Ok(Self {
            child,
            reader: Some(BufReader::new(stdout)),
        })
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, message: Value) -> io::Result<()> {
        let stdin = self
            .child
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::other("Stdin not available"))?;

        let json = serde_json::to_string(&message)?;
        stdin.write_all(json.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;

        Ok(())
    }

    async fn receive(&mut self) -> io::Result<Option<Value>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| io::Error::other("Reader not available"))?;

        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;

        if n == 0 {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(&line)?;
        Ok(Some(value))
    }

    async fn close(&mut self) -> io::Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}

/// HTTP transport for a remote MCP endpoint
///
/// Each request is POSTed to the endpoint URL; the JSON-RPC response comes
/// back in the HTTP response body, so receive() returns the last response.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
    pending: Option<Value>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            pending: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&mut self, message: Value) -> io::Result<()> {
        // Notifications carry no id and get no response body worth keeping
        let is_notification = message.get("id").is_none();

        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(io::Error::other)?
            .error_for_status()
            .map_err(io::Error::other)?;

        if is_notification {
            self.pending = None;
            return Ok(());
        }

        let body: Value = response.json().await.map_err(io::Error::other)?;
        self.pending = Some(body);
        Ok(())
    }

    async fn receive(&mut self) -> io::Result<Option<Value>> {
        Ok(self.pending.take())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}
