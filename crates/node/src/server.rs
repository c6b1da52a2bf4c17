// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP server and connection handling.

use std::future::Future;
use std::time::Instant;

use dsync_core::LockNode;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// What a running node serves from
#[derive(Clone, Debug)]
pub struct ServerState {
    pub node: LockNode,
    pub start_time: Instant,
}

impl ServerState {
    pub fn new(node: LockNode) -> Self {
        Self {
            node,
            start_time: Instant::now(),
        }
    }
}

/// Accept connections until `shutdown` resolves
///
/// Each connection is handled on its own task. When `shutdown` fires the
/// listener is closed and in-flight connections are aborted.
pub async fn serve<F>(listener: TcpListener, state: ServerState, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, peer)) => {
                        debug!(%peer, "connection accepted");
                        let state = state.clone();
                        connections.spawn(async move {
                            if let Err(e) = handle_connection(&state, stream).await {
                                error!("Error handling connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }

            // Reap finished connection tasks
            Some(_) = connections.join_next(), if !connections.is_empty() => {}

            _ = &mut shutdown => {
                info!(in_flight = connections.len(), "Server stopping");
                break;
            }
        }
    }

    connections.shutdown().await;
}

/// Handle a single client connection
pub async fn handle_connection(state: &ServerState, stream: TcpStream) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(protocol::ProtocolError::Json(e)) => {
            // Malformed body: tell the client instead of just hanging up
            let response = Response::Error {
                message: format!("invalid request: {}", e),
            };
            protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    let response = handle_request(state, request);

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
pub fn handle_request(state: &ServerState, request: Request) -> Response {
    let node = &state.node;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                debug!(client = %version, server = PROTOCOL_VERSION, "protocol version differs");
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }

        Request::Lock { args } => Response::Granted {
            granted: node.lock(&args),
        },

        Request::Unlock { args } => Response::Granted {
            granted: node.unlock(&args),
        },

        Request::RLock { args } => Response::Granted {
            granted: node.rlock(&args),
        },

        Request::RUnlock { args } => Response::Granted {
            granted: node.runlock(&args),
        },

        Request::ForceUnlock { resource } => Response::Granted {
            granted: node.force_unlock(&resource),
        },

        Request::Status => Response::Status {
            uptime_secs: state.start_time.elapsed().as_secs(),
            locks: node.snapshot(),
        },
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
