//! Per-connection request handling.
//!
//! Each accepted connection carries exactly one request. The responder
//! reads it under a timeout, routes it, writes one response, and closes.

use std::io;
use std::net::TcpStream;
use std::time::Duration;

use tracing::{debug, warn};

use switchctl_protocol::{CodecError, Request, Response, read_message, write_message};

use crate::router::{DISPATCH_TARGET, RequestRouter};
use crate::transport::ConnectionHandler;

/// Connection handler that answers one request per connection.
#[derive(Debug)]
pub(crate) struct Responder {
    router: RequestRouter,
    read_timeout: Duration,
}

impl Responder {
    pub(crate) const fn new(router: RequestRouter, read_timeout: Duration) -> Self {
        Self {
            router,
            read_timeout,
        }
    }

    fn respond(&self, mut stream: TcpStream) {
        if let Err(error) = stream.set_read_timeout(Some(self.read_timeout)) {
            warn!(target: DISPATCH_TARGET, %error, "failed to set responder read timeout");
            return;
        }

        let response = match read_message::<_, Request>(&mut stream) {
            Ok(Some(request)) => self.router.route(&request),
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without request");
                return;
            }
            Err(CodecError::Malformed(error)) => {
                debug!(target: DISPATCH_TARGET, %error, "malformed request");
                Response::invalid_command()
            }
            Err(CodecError::Truncated) => {
                debug!(target: DISPATCH_TARGET, "client disconnected mid-request");
                return;
            }
            Err(CodecError::Io(error)) if is_disconnect(&error) => {
                debug!(target: DISPATCH_TARGET, %error, "client reset before request");
                return;
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "failed to read request");
                return;
            }
        };

        if let Err(error) = write_message(&mut stream, &response) {
            warn!(target: DISPATCH_TARGET, %error, "failed to write response");
        }
    }
}

impl ConnectionHandler for Responder {
    fn handle(&self, stream: TcpStream) {
        self.respond(stream);
    }
}

fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}
