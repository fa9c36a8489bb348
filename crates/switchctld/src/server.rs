//! Running request server.

use std::net::SocketAddr;
use std::sync::Arc;

use switchctl_config::Config;
use switchctl_device::DeviceRegistry;

use crate::health::HealthReporter;
use crate::responder::Responder;
use crate::router::RequestRouter;
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

/// Request server accepting connections on a background thread.
///
/// Dropping the server asks the listener to stop without waiting for it;
/// call [`RequestServer::stop`] to wait.
pub struct RequestServer {
    handle: ListenerHandle,
    address: SocketAddr,
    reporter: Arc<dyn HealthReporter>,
}

impl RequestServer {
    pub(crate) fn start(
        config: &Config,
        registry: Arc<DeviceRegistry>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, ListenerError> {
        let listener = SocketListener::bind(config.listen_endpoint())?;
        let address = listener.local_addr();
        let router = RequestRouter::new(registry, config.search_timeout());
        let responder = Arc::new(Responder::new(router, config.responder_timeout()));
        let handle = listener.start(responder)?;
        Ok(Self {
            handle,
            address,
            reporter,
        })
    }

    /// Address the server is bound to.
    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        self.address
    }

    /// Stops accepting connections and waits for the accept thread.
    ///
    /// Responders already running finish on their own threads.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the accept thread panicked.
    pub fn stop(self) -> Result<(), ListenerError> {
        self.handle.shutdown();
        let Self {
            handle, reporter, ..
        } = self;
        let joined = handle.join();
        reporter.server_stopped();
        joined
    }
}
