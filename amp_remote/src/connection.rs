use crate::config::AmpConfig;
use serde::Serialize;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Exchanging,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("network unavailable")]
    NetworkUnavailable,
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("connection dropped: {0}")]
    ConnectionDropped(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl ConnectionError {
    /// True when the request made it onto the wire before the failure.
    pub fn reached_device(&self) -> bool {
        matches!(
            self,
            ConnectionError::ConnectionDropped(_) | ConnectionError::Timeout(_)
        )
    }
}

/// Owns the single TCP session to the device. Every exchange runs on a fresh
/// connection that is closed again afterwards, whatever the outcome.
pub struct ConnectionManager {
    config: AmpConfig,
    stream: Option<TcpStream>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(config: AmpConfig) -> Self {
        Self {
            config,
            stream: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn config(&self) -> &AmpConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True from the start of a connect attempt until the next teardown. A
    /// connect or exchange abandoned mid-flight leaves this set.
    pub fn is_active(&self) -> bool {
        self.state != ConnectionState::Disconnected
    }

    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        let addr = self.config.endpoint();
        self.state = ConnectionState::Connecting;
        debug!("connecting to {addr}");

        let attempt = time::timeout(self.config.connect_timeout, TcpStream::connect(&addr)).await;
        let stream = match attempt {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                self.state = ConnectionState::Disconnected;
                return Err(ConnectionError::ConnectFailed { addr, source });
            }
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                return Err(ConnectionError::ConnectFailed {
                    addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
                });
            }
        };
        let _ = stream.set_nodelay(true);

        info!("connected to {addr}");
        self.stream = Some(stream);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Sends one request line and collects the reply. The connection is torn
    /// down before returning.
    pub async fn send_and_receive(&mut self, request_line: &str) -> Result<String, ConnectionError> {
        if self.stream.is_none() {
            self.connect().await?;
        }
        let result = self.exchange(request_line).await;
        self.disconnect().await;
        result
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            debug!("connection closed");
        }
        self.state = ConnectionState::Disconnected;
    }

    async fn exchange(&mut self, request_line: &str) -> Result<String, ConnectionError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(ConnectionError::ConnectionDropped("not connected".to_string()));
        };
        self.state = ConnectionState::Exchanging;

        stream
            .write_all(request_line.as_bytes())
            .await
            .map_err(|e| ConnectionError::ConnectionDropped(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| ConnectionError::ConnectionDropped(e.to_string()))?;
        debug!(bytes = request_line.len(), "request sent: {:?}", request_line.trim_end());

        let response = read_until_idle(
            stream,
            self.config.idle_timeout,
            self.config.response_timeout,
        )
        .await?;
        debug!(bytes = response.len(), "response received");
        Ok(response)
    }
}

/// Reads until EOF, or until the peer goes quiet for `idle` after sending at
/// least one byte. `deadline` bounds the whole read.
async fn read_until_idle(
    stream: &mut TcpStream,
    idle: Duration,
    deadline: Duration,
) -> Result<String, ConnectionError> {
    let until = Instant::now() + deadline;
    let mut response: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let remaining = until.saturating_duration_since(Instant::now());
        let wait = if response.is_empty() {
            remaining
        } else {
            idle.min(remaining)
        };

        match time::timeout(wait, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => response.extend_from_slice(&chunk[..n]),
            Ok(Err(e)) => {
                warn!("read failed after {} byte(s): {e}", response.len());
                return Err(ConnectionError::ConnectionDropped(e.to_string()));
            }
            Err(_) if response.is_empty() => return Err(ConnectionError::Timeout(deadline)),
            Err(_) => break,
        }
    }

    if response.is_empty() {
        return Err(ConnectionError::ConnectionDropped(
            "peer closed before responding".to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}
