//! Liveness probe: a bare TCP connect that is closed right away

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use crate::util::CONNECT_TIMEOUT_MS;

/// Result of a single probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connection established (and closed again)
    Reachable,

    /// The target actively refused the connection
    Refused,

    /// Any other failure (timeout, resolution, unreachable network, ...)
    Transient(String),
}

/// Checks whether an endpoint accepts connections
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, host: &str, port: u16) -> ProbeOutcome;
}

/// Probes by opening a TCP connection; no payload is sent
#[derive(Debug, Clone, Copy)]
pub struct TcpProber {
    connect_timeout: Duration,
}

impl TcpProber {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(Duration::from_millis(CONNECT_TIMEOUT_MS))
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, host: &str, port: u16) -> ProbeOutcome {
        match timeout(self.connect_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => {
                trace!("connected to {host}:{port}");
                drop(stream);
                ProbeOutcome::Reachable
            }
            Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => ProbeOutcome::Refused,
            Ok(Err(e)) => ProbeOutcome::Transient(e.to_string()),
            Err(_) => ProbeOutcome::Transient(format!(
                "connect timed out after {}ms",
                self.connect_timeout.as_millis()
            )),
        }
    }
}
