//! One-shot TCP client for the request server.
//!
//! Each call opens a fresh connection, writes one request, reads one
//! response and closes. There are no retries.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use switchctl_config::Endpoint;
use switchctl_protocol::{CodecError, Request, Response, read_message, write_message};

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Failures while exchanging a request with the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint host did not resolve.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The TCP connection could not be established.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The server did not answer within the timeout.
    #[error("timed out waiting for {endpoint}")]
    Timeout { endpoint: String },

    /// Sending the request failed.
    #[error("failed to send request to {endpoint}: {source}")]
    Write {
        endpoint: String,
        #[source]
        source: CodecError,
    },

    /// The server closed the connection without answering.
    #[error("{endpoint} closed the connection without a response")]
    Closed { endpoint: String },

    /// The response could not be decoded.
    #[error("invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: CodecError,
    },
}

/// Client sending one request per connection.
#[derive(Debug, Clone, Copy)]
pub struct RequestClient {
    timeout: Duration,
}

impl RequestClient {
    /// Creates a client applying `timeout` to connect, write and read.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `request` to `endpoint` and waits for the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the stage that failed.
    pub fn send(&self, endpoint: &Endpoint, request: &Request) -> Result<Response, TransportError> {
        let name = endpoint.to_string();
        let address = endpoint.resolve().map_err(|source| TransportError::Resolve {
            endpoint: name.clone(),
            source,
        })?;
        let mut stream =
            TcpStream::connect_timeout(&address, self.timeout).map_err(|source| {
                if is_timeout(&source) {
                    TransportError::Timeout {
                        endpoint: name.clone(),
                    }
                } else {
                    TransportError::Connect {
                        endpoint: name.clone(),
                        source,
                    }
                }
            })?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|source| TransportError::Connect {
                endpoint: name.clone(),
                source,
            })?;

        debug!(target: CLIENT_TARGET, endpoint = %name, ctype = %request.ctype, cmd = %request.cmd, "sending request");
        write_message(&mut stream, request).map_err(|source| classify(&name, source, true))?;

        match read_message::<_, Response>(&mut stream) {
            Ok(Some(response)) => {
                debug!(target: CLIENT_TARGET, endpoint = %name, "received response");
                Ok(response)
            }
            Ok(None) => Err(TransportError::Closed { endpoint: name }),
            Err(source) => Err(classify(&name, source, false)),
        }
    }
}

fn classify(endpoint: &str, source: CodecError, writing: bool) -> TransportError {
    let endpoint = endpoint.to_owned();
    match source {
        CodecError::Io(error) if is_timeout(&error) => TransportError::Timeout { endpoint },
        CodecError::Truncated if !writing => TransportError::Closed { endpoint },
        other if writing => TransportError::Write {
            endpoint,
            source: other,
        },
        other => TransportError::Decode {
            endpoint,
            source: other,
        },
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
