//! Connection handle and test database naming

use serde::{Deserialize, Serialize};

use crate::models::Snapshot;
use crate::service::{DatabaseAdmin, ServiceError};

/// Prefix applied to the configured logical name to derive the test
/// database identifier
pub const TEST_DATABASE_PREFIX: &str = "test_";

/// Derive the test database identifier from the configured logical name.
///
/// Pure and deterministic, so creation and destruction always target the
/// same identifier within a run. Uniqueness across concurrent runs is the
/// caller's responsibility.
pub fn test_database_name(configured: &str) -> String {
    format!("{TEST_DATABASE_PREFIX}{configured}")
}

/// Where and how to reach the target database service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Base URL of the service admin API
    pub endpoint: String,
    /// Configured logical database name (the alias under test)
    pub database: String,
    /// Optional bearer token for the admin API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            endpoint: "http://localhost:8686".to_string(),
            database: "app".to_string(),
            token: None,
        }
    }
}

/// Caller-owned handle to the target database service.
///
/// The harness never owns its lifecycle: it only updates the active
/// database name, closes the handle, and lazily reopens it against the new
/// name. The handle also holds the initial-state snapshot for the lifetime
/// of the run.
#[derive(Debug)]
pub struct Connection {
    settings: ConnectionSettings,
    active: String,
    open: bool,
    snapshot: Option<Snapshot>,
}

impl Connection {
    pub fn new(settings: ConnectionSettings) -> Self {
        let active = settings.database.clone();
        Connection {
            settings,
            active,
            open: false,
            snapshot: None,
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// The configured logical name the test identifier is derived from
    pub fn configured_name(&self) -> &str {
        &self.settings.database
    }

    /// The database this handle currently points at
    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Point the handle at `name` and close it; the next use reopens
    /// lazily against the new name.
    pub fn switch_to(&mut self, name: impl Into<String>) {
        self.active = name.into();
        self.close();
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Surface any remaining connection error eagerly instead of at first
    /// use. A no-op when the handle is already open.
    pub fn ensure_open(&mut self, admin: &dyn DatabaseAdmin) -> Result<(), ServiceError> {
        if !self.open {
            admin.ping(&self.active)?;
            self.open = true;
        }
        Ok(())
    }

    pub fn attach_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MemoryAdmin;

    #[test]
    fn test_name_resolver_is_deterministic() {
        assert_eq!(test_database_name("app"), "test_app");
        assert_eq!(test_database_name("app"), test_database_name("app"));
        assert_eq!(test_database_name("billing"), "test_billing");
    }

    #[test]
    fn test_connection_starts_at_configured_name() {
        let conn = Connection::new(ConnectionSettings::default());
        assert_eq!(conn.configured_name(), "app");
        assert_eq!(conn.active_name(), "app");
        assert!(!conn.is_open());
        assert!(conn.snapshot().is_none());
    }

    #[test]
    fn test_switch_to_closes_the_handle() {
        let admin = MemoryAdmin::new();
        admin.seed("app");
        admin.seed("test_app");

        let mut conn = Connection::new(ConnectionSettings::default());
        conn.ensure_open(&admin).expect("configured db is reachable");
        assert!(conn.is_open());

        conn.switch_to("test_app");
        assert_eq!(conn.active_name(), "test_app");
        assert!(!conn.is_open());
    }

    #[test]
    fn test_ensure_open_pings_once() {
        let admin = MemoryAdmin::new();
        admin.seed("app");

        let mut conn = Connection::new(ConnectionSettings::default());
        conn.ensure_open(&admin).expect("reachable");
        conn.ensure_open(&admin).expect("already open");
        assert_eq!(admin.pings(), 1);
    }

    #[test]
    fn test_ensure_open_surfaces_missing_database() {
        let admin = MemoryAdmin::new();
        let mut conn = Connection::new(ConnectionSettings::default());
        let err = conn.ensure_open(&admin).expect_err("nothing to reach");
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(!conn.is_open());
    }
}
