//! Connection registry: the single source of truth for "who is currently
//! reachable and how".
//!
//! Structures:
//! - `conns`: `conn_id -> Connection` for every open socket.
//! - `admins`: set of admin conn_ids (admins are broadcast to, never
//!   resolved by identity).
//! - `drivers` / `customers`: `user_id -> conn_id` unicast maps.
//! - `identities`: `conn_id -> Identity` reverse side-table written at
//!   authenticate time, consulted at disconnect so cleanup removes exactly
//!   the entries this connection owns, never a scan.
//!
//! Identity mappings are last-writer-wins: a later authenticate for the same
//! driver/customer id silently replaces the earlier mapping. The earlier
//! connection stays open but becomes unreachable by identity routing.

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use tokio::sync::mpsc;

use std::sync::atomic::{AtomicU64, Ordering};

use limopulse_core::identity::{Identity, Role};

/// Opaque connection identifier, assigned at accept time.
pub type ConnId = u64;

/// One connection's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<Message>,
}

/// Registry cardinalities reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryCounts {
    pub connected: usize,
    pub admins: usize,
    pub drivers: usize,
    pub customers: usize,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<ConnId, Connection>,
    admins: DashSet<ConnId>,
    drivers: DashMap<String, ConnId>,
    customers: DashMap<String, ConnId>,
    identities: DashMap<ConnId, Identity>,
    seq: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            admins: DashSet::new(),
            drivers: DashMap::new(),
            customers: DashMap::new(),
            identities: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Track a newly accepted connection. The id is valid until
    /// `unregister`.
    pub fn add_conn(&self, conn: Connection) -> ConnId {
        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        self.conns.insert(id, conn);
        id
    }

    /// Add `conn_id` to the admin audience. Idempotent.
    pub fn register_admin(&self, user_id: &str, conn_id: ConnId) {
        self.drop_identity_entries(conn_id);
        self.admins.insert(conn_id);
        self.identities
            .insert(conn_id, Identity::new(user_id, Role::Admin));
    }

    /// Map `driver_id` to `conn_id`, overwriting any earlier mapping.
    pub fn register_driver(&self, driver_id: &str, conn_id: ConnId) {
        self.drop_identity_entries(conn_id);
        self.drivers.insert(driver_id.to_owned(), conn_id);
        self.identities
            .insert(conn_id, Identity::new(driver_id, Role::Driver));
    }

    /// Map `customer_id` to `conn_id`, overwriting any earlier mapping.
    pub fn register_customer(&self, customer_id: &str, conn_id: ConnId) {
        self.drop_identity_entries(conn_id);
        self.customers.insert(customer_id.to_owned(), conn_id);
        self.identities
            .insert(conn_id, Identity::new(customer_id, Role::Customer));
    }

    /// Remove every entry this connection owns. A no-op for connections that
    /// never authenticated. Driver/customer mappings are only removed while
    /// they still point at `conn_id`: a newer authenticate for the same
    /// identity must survive the orphaned older connection's disconnect.
    pub fn unregister(&self, conn_id: ConnId) {
        self.conns.remove(&conn_id);
        let Some((_, identity)) = self.identities.remove(&conn_id) else {
            return;
        };
        match identity.role {
            Role::Admin => {
                self.admins.remove(&conn_id);
            }
            Role::Driver => {
                self.drivers.remove_if(&identity.user_id, |_, v| *v == conn_id);
            }
            Role::Customer => {
                self.customers
                    .remove_if(&identity.user_id, |_, v| *v == conn_id);
            }
        }
    }

    /// Currently mapped connection for a driver id, if any. Absence is a
    /// normal outcome (driver offline), not an error.
    pub fn resolve_driver(&self, driver_id: &str) -> Option<ConnId> {
        self.drivers.get(driver_id).map(|r| *r.value())
    }

    /// Currently mapped connection for a customer id, if any.
    pub fn resolve_customer(&self, customer_id: &str) -> Option<ConnId> {
        self.customers.get(customer_id).map(|r| *r.value())
    }

    /// Snapshot of the admin audience.
    pub fn all_admin_conns(&self) -> Vec<ConnId> {
        self.admins.iter().map(|r| *r.key()).collect()
    }

    /// Snapshot of every open connection (webhook `status_update` broadcasts
    /// to everyone, authenticated or not).
    pub fn all_conns(&self) -> Vec<ConnId> {
        self.conns.iter().map(|r| *r.key()).collect()
    }

    /// Outbound queue handle for a connection, if still open.
    pub fn sender(&self, conn_id: ConnId) -> Option<Connection> {
        self.conns.get(&conn_id).map(|r| r.value().clone())
    }

    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            connected: self.conns.len(),
            admins: self.admins.len(),
            drivers: self.drivers.len(),
            customers: self.customers.len(),
        }
    }

    /// Remove the bucket entries of a previous authenticate on the same
    /// connection, keeping the side-table and buckets consistent when a
    /// connection re-authenticates under a different identity.
    fn drop_identity_entries(&self, conn_id: ConnId) {
        let Some((_, prev)) = self.identities.remove(&conn_id) else {
            return;
        };
        match prev.role {
            Role::Admin => {
                self.admins.remove(&conn_id);
            }
            Role::Driver => {
                self.drivers.remove_if(&prev.user_id, |_, v| *v == conn_id);
            }
            Role::Customer => {
                self.customers.remove_if(&prev.user_id, |_, v| *v == conn_id);
            }
        }
    }
}
