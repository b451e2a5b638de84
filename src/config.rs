//! Runtime configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::protocol::DEFAULT_PORT;

/// Default time a challenge waits for an answer.
pub const DEFAULT_CHALLENGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default period of the expired-challenge sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Question bank file; the built-in bank is used when absent.
    pub questions_path: Option<PathBuf>,
    pub challenge_timeout: Duration,
    pub sweep_interval: Duration,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            questions_path: None,
            challenge_timeout: DEFAULT_CHALLENGE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}
