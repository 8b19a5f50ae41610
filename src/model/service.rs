use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::util::MIN_POLLING_INTERVAL_MS;

use super::client::{Client, ClientId, ServiceListener};

/// Registry key of a monitored target: lower-cased host plus port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    host: String,
    port: u16,
}

impl ServiceKey {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_ascii_lowercase(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Default)]
struct ClientList {
    clients: Vec<Client>,
    next_id: ClientId,
}

/// A monitored TCP endpoint together with the clients interested in it
///
/// Services are always handled through `Arc<Service>`; every field that the
/// poll worker touches is either atomic or behind a lock so registration can
/// run concurrently with polling.
pub struct Service {
    me: Weak<Service>,
    host: String,
    port: u16,
    key: ServiceKey,

    /// `true` means UP
    status: AtomicBool,

    /// Effective polling interval, derived from the registered clients
    polling_interval_ms: AtomicU64,

    /// Cleared once to stop the worker; never set again
    continue_polling: AtomicBool,

    clients: RwLock<ClientList>,
}

impl Service {
    pub fn new(host: impl Into<String>, port: u16) -> Arc<Self> {
        let host = host.into();
        let key = ServiceKey::new(&host, port);

        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            host,
            port,
            key,
            status: AtomicBool::new(true),
            polling_interval_ms: AtomicU64::new(MIN_POLLING_INTERVAL_MS),
            continue_polling: AtomicBool::new(true),
            clients: RwLock::new(ClientList::default()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn status(&self) -> bool {
        self.status.load(Ordering::SeqCst)
    }

    pub fn polling_interval_ms(&self) -> u64 {
        self.polling_interval_ms.load(Ordering::SeqCst)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms())
    }

    pub fn is_monitoring(&self) -> bool {
        self.continue_polling.load(Ordering::SeqCst)
    }

    /// Ask the worker to stop at its next loop iteration
    pub fn stop(&self) {
        self.continue_polling.store(false, Ordering::SeqCst);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().clients.len()
    }

    pub fn clients_snapshot(&self) -> Vec<Client> {
        self.clients.read().clients.clone()
    }

    /// Register a client and re-derive the effective polling interval
    ///
    /// The client gets the next id of this service and is bound to it.
    pub fn register_client(&self, mut client: Client) -> ClientId {
        let mut list = self.clients.write();

        let id = list.next_id;
        list.next_id += 1;
        client.bind(id, self.me.clone());
        list.clients.push(client);

        let interval = effective_polling_interval(&list.clients);
        self.polling_interval_ms.store(interval, Ordering::SeqCst);

        debug!("{self}: registered client {id}, polling every {interval}ms");
        id
    }

    /// Set the status, notifying clients when the service goes down
    ///
    /// Only the UP to DOWN transition notifies; returns whether the status
    /// actually changed.
    pub fn set_status(&self, status: bool) -> bool {
        let previous = self.status.swap(status, Ordering::SeqCst);
        let changed = previous != status;

        if changed && !status {
            let notified = self.notify_all_clients();
            debug!("{self}: notified {notified} client(s) of outage");
        }

        changed
    }

    /// Notify every client that is not inside its outage window
    ///
    /// Windows are evaluated at notification time. Skipped clients are not
    /// queued for later.
    fn notify_all_clients(&self) -> usize {
        // snapshot so callbacks run without the lock held
        let clients = self.clients_snapshot();
        let mut notified = 0;

        for client in &clients {
            if client.in_outage_window() {
                trace!("{self}: client {} is in its outage window", client.id());
                continue;
            }

            client.update();
            notified += 1;
        }

        notified
    }
}

/// Minimum client interval at or above the floor, or the floor itself
fn effective_polling_interval(clients: &[Client]) -> u64 {
    clients
        .iter()
        .map(Client::polling_interval_ms)
        .filter(|interval| *interval >= MIN_POLLING_INTERVAL_MS)
        .min()
        .unwrap_or(MIN_POLLING_INTERVAL_MS)
}

impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Service {}

impl Hash for Service {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("status", &self.status())
            .field("polling_interval_ms", &self.polling_interval_ms())
            .field("continue_polling", &self.is_monitoring())
            .field("clients", &self.client_count())
            .finish()
    }
}
