use std::fmt;
use std::sync::{Arc, Weak};

use tracing::info;

use super::{OutageWindow, Service};

/// Identifier handed out by the owning service, unique per service
pub type ClientId = u32;

/// Caller-supplied hook run when the client is notified of an outage
type DownCallback = Arc<dyn Fn(&Client) + Send + Sync>;

/// Something that wants to hear about a service going down
///
/// `update` runs inline on the poll worker that confirmed the outage, so
/// implementations must return promptly.
pub trait ServiceListener: Send + Sync {
    fn update(&self);
}

/// A registered observer of one service
///
/// The client carries its preferred polling interval and the outage window
/// during which it does not want to be notified. Its id and service reference
/// are filled in by [`Service::register_client`].
#[derive(Clone)]
pub struct Client {
    id: ClientId,
    polling_interval_ms: u64,
    outage_window: Option<OutageWindow>,
    service: Weak<Service>,
    callback: Option<DownCallback>,
}

impl Client {
    pub fn new(polling_interval_ms: u64, outage_window: OutageWindow) -> Self {
        Self {
            id: 0,
            polling_interval_ms,
            outage_window: Some(outage_window),
            service: Weak::new(),
            callback: None,
        }
    }

    /// Client without an outage window (rejected by validation)
    pub fn without_outage_window(polling_interval_ms: u64) -> Self {
        Self {
            id: 0,
            polling_interval_ms,
            outage_window: None,
            service: Weak::new(),
            callback: None,
        }
    }

    /// Attach a hook that runs on every down notification for this client
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Client) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn polling_interval_ms(&self) -> u64 {
        self.polling_interval_ms
    }

    pub fn outage_window(&self) -> Option<&OutageWindow> {
        self.outage_window.as_ref()
    }

    /// The service this client is registered with, if it is still alive
    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.upgrade()
    }

    /// Whether the client is inside its outage window right now
    pub fn in_outage_window(&self) -> bool {
        self.outage_window
            .as_ref()
            .is_some_and(OutageWindow::is_active)
    }

    pub(crate) fn bind(&mut self, id: ClientId, service: Weak<Service>) {
        self.id = id;
        self.service = service;
    }

    fn service_display(&self) -> String {
        self.service
            .upgrade()
            .map(|service| service.to_string())
            .unwrap_or_else(|| String::from("unknown"))
    }
}

impl ServiceListener for Client {
    fn update(&self) {
        info!(
            "client {}: got it, service {} is down",
            self.id,
            self.service_display()
        );

        if let Some(callback) = &self.callback {
            callback(self);
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("polling_interval_ms", &self.polling_interval_ms)
            .field("outage_window", &self.outage_window)
            .field("service", &self.service_display())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
