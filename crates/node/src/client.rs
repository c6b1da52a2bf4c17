// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP client for a lock node

use std::time::Duration;

use async_trait::async_trait;
use dsync_core::{LockArgs, LockSnapshot, LockerError, NetLocker};
use tokio::net::TcpStream;

use crate::protocol::{self, ProtocolError, Request, Response, PROTOCOL_VERSION};

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for establishing the TCP connection
pub fn timeout_connect() -> Duration {
    parse_duration_ms("DSYNC_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(1))
}

/// Timeout for writing the request and for reading the response
pub fn timeout_io() -> Duration {
    parse_duration_ms("DSYNC_TIMEOUT_IO_MS").unwrap_or(Duration::from_secs(5))
}

/// [`NetLocker`] that talks to a `lockd` node over TCP
///
/// Opens one connection per call. The coordinator applies its own deadline
/// on top of these timeouts.
#[derive(Clone, Debug)]
pub struct RemoteLocker {
    endpoint: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl RemoteLocker {
    /// Client for `endpoint` (`host:port`), timeouts taken from the environment
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: timeout_connect(),
            io_timeout: timeout_io(),
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, io: Duration) -> Self {
        self.connect_timeout = connect;
        self.io_timeout = io;
        self
    }

    /// Send one request and wait for its response
    pub async fn send(&self, request: Request) -> Result<Response, LockerError> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.endpoint))
            .await
            .map_err(|_| LockerError::Timeout(self.endpoint.clone()))?
            .map_err(|e| LockerError::Unreachable(self.endpoint.clone(), e.to_string()))?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request).map_err(|e| self.protocol_error(e))?;
        tokio::time::timeout(self.io_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| LockerError::Timeout(self.endpoint.clone()))?
            .map_err(|e| self.protocol_error(e))?;

        let response_bytes = tokio::time::timeout(self.io_timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| LockerError::Timeout(self.endpoint.clone()))?
            .map_err(|e| self.protocol_error(e))?;

        protocol::decode(&response_bytes).map_err(|e| self.protocol_error(e))
    }

    /// Get the node's protocol version
    pub async fn hello(&self) -> Result<String, LockerError> {
        match self
            .send(Request::Hello {
                version: PROTOCOL_VERSION.to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            other => Err(self.unexpected(other)),
        }
    }

    pub async fn ping(&self) -> Result<(), LockerError> {
        match self.send(Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(self.unexpected(other)),
        }
    }

    /// Uptime in seconds and every entry on the node
    pub async fn status(&self) -> Result<(u64, Vec<LockSnapshot>), LockerError> {
        match self.send(Request::Status).await? {
            Response::Status { uptime_secs, locks } => Ok((uptime_secs, locks)),
            other => Err(self.unexpected(other)),
        }
    }

    /// Drop `resource` on this node whoever holds it
    pub async fn force_unlock(&self, resource: &str) -> Result<bool, LockerError> {
        self.call(Request::ForceUnlock {
            resource: resource.to_string(),
        })
        .await
    }

    async fn call(&self, request: Request) -> Result<bool, LockerError> {
        match self.send(request).await? {
            Response::Granted { granted } => Ok(granted),
            other => Err(self.unexpected(other)),
        }
    }

    fn protocol_error(&self, e: ProtocolError) -> LockerError {
        match e {
            ProtocolError::Timeout => LockerError::Timeout(self.endpoint.clone()),
            ProtocolError::Io(e) => LockerError::Unreachable(self.endpoint.clone(), e.to_string()),
            other => LockerError::Protocol(self.endpoint.clone(), other.to_string()),
        }
    }

    fn unexpected(&self, response: Response) -> LockerError {
        match response {
            Response::Error { message } => LockerError::Remote(self.endpoint.clone(), message),
            other => LockerError::Protocol(
                self.endpoint.clone(),
                format!("unexpected response: {:?}", other),
            ),
        }
    }
}

#[async_trait]
impl NetLocker for RemoteLocker {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn lock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(Request::Lock { args: args.clone() }).await
    }

    async fn unlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(Request::Unlock { args: args.clone() }).await
    }

    async fn rlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(Request::RLock { args: args.clone() }).await
    }

    async fn runlock(&self, args: &LockArgs) -> Result<bool, LockerError> {
        self.call(Request::RUnlock { args: args.clone() }).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
