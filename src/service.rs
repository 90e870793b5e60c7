//! Database service admin client
//!
//! The target service creates and drops named databases directly through
//! its admin API; there is no separate bootstrap or default-catalog
//! connection. `HttpAdmin` talks to the real service, `MemoryAdmin` is an
//! in-memory stand-in for tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use crate::connection::ConnectionSettings;

/// Errors surfaced by the service admin API
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database '{0}' already exists")]
    AlreadyExists(String),

    #[error("database '{0}' does not exist")]
    NotFound(String),

    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("service unreachable: {0}")]
    Transport(String),
}

/// Admin surface of the database service needed to manage test databases
pub trait DatabaseAdmin {
    /// Create the named database. Fails with `AlreadyExists` on conflict.
    fn create_database(&self, name: &str) -> Result<(), ServiceError>;

    /// Drop the named database. Fails with `NotFound` when it is absent.
    fn drop_database(&self, name: &str) -> Result<(), ServiceError>;

    /// Cheap liveness check against a specific database
    fn ping(&self, name: &str) -> Result<(), ServiceError>;

    /// Execute a single DDL statement against a database
    fn execute_ddl(&self, name: &str, statement: &str) -> Result<(), ServiceError>;
}

/// Create a shared HTTP agent with a transport timeout for admin requests
pub(crate) fn http_agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(30)))
        .build()
        .new_agent()
}

/// Map a transport-layer failure onto the admin error taxonomy
fn classify(name: &str, err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::StatusCode(409) => ServiceError::AlreadyExists(name.to_string()),
        ureq::Error::StatusCode(404) => ServiceError::NotFound(name.to_string()),
        ureq::Error::StatusCode(status) => ServiceError::Status {
            status,
            message: "unexpected response from service".to_string(),
        },
        err => ServiceError::Transport(err.to_string()),
    }
}

/// HTTP client for the service admin API
pub struct HttpAdmin {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl HttpAdmin {
    pub fn new(settings: &ConnectionSettings) -> Self {
        HttpAdmin {
            agent: http_agent(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        }
    }

    fn database_url(&self, name: &str) -> String {
        format!("{}/v1/databases/{}", self.endpoint, urlencoding::encode(name))
    }

    fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }
}

impl DatabaseAdmin for HttpAdmin {
    fn create_database(&self, name: &str) -> Result<(), ServiceError> {
        let url = format!("{}/v1/databases", self.endpoint);
        let mut request = self.agent.post(&url);
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        request
            .send_json(serde_json::json!({ "name": name }))
            .map(|_| ())
            .map_err(|err| classify(name, err))
    }

    fn drop_database(&self, name: &str) -> Result<(), ServiceError> {
        let mut request = self.agent.delete(&self.database_url(name));
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        request.call().map(|_| ()).map_err(|err| classify(name, err))
    }

    fn ping(&self, name: &str) -> Result<(), ServiceError> {
        let url = format!("{}/health", self.database_url(name));
        let mut request = self.agent.get(&url);
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        request.call().map(|_| ()).map_err(|err| classify(name, err))
    }

    fn execute_ddl(&self, name: &str, statement: &str) -> Result<(), ServiceError> {
        let url = format!("{}/ddl", self.database_url(name));
        let mut request = self.agent.post(&url);
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        request
            .send_json(serde_json::json!({ "statements": [statement] }))
            .map(|_| ())
            .map_err(|err| classify(name, err))
    }
}

/// In-memory stand-in for the service admin API (for testing)
#[derive(Debug, Default)]
pub struct MemoryAdmin {
    databases: RefCell<BTreeSet<String>>,
    ddl: RefCell<Vec<(String, String)>>,
    creates: Cell<u32>,
    drops: Cell<u32>,
    pings: Cell<u32>,
    refuse_creates: Cell<bool>,
}

impl MemoryAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a database as if left over from a prior run
    pub fn seed(&self, name: &str) {
        self.databases.borrow_mut().insert(name.to_string());
    }

    /// Make every subsequent create fail with a server error
    pub fn refuse_creates(&self) {
        self.refuse_creates.set(true);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.databases.borrow().contains(name)
    }

    pub fn creates(&self) -> u32 {
        self.creates.get()
    }

    pub fn drops(&self) -> u32 {
        self.drops.get()
    }

    pub fn pings(&self) -> u32 {
        self.pings.get()
    }

    /// DDL statements executed so far, as `(database, statement)` pairs
    pub fn ddl_log(&self) -> Vec<(String, String)> {
        self.ddl.borrow().clone()
    }
}

impl DatabaseAdmin for MemoryAdmin {
    fn create_database(&self, name: &str) -> Result<(), ServiceError> {
        self.creates.set(self.creates.get() + 1);
        if self.refuse_creates.get() {
            return Err(ServiceError::Status {
                status: 500,
                message: "create refused".to_string(),
            });
        }
        if !self.databases.borrow_mut().insert(name.to_string()) {
            return Err(ServiceError::AlreadyExists(name.to_string()));
        }
        Ok(())
    }

    fn drop_database(&self, name: &str) -> Result<(), ServiceError> {
        self.drops.set(self.drops.get() + 1);
        if !self.databases.borrow_mut().remove(name) {
            return Err(ServiceError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn ping(&self, name: &str) -> Result<(), ServiceError> {
        self.pings.set(self.pings.get() + 1);
        if !self.contains(name) {
            return Err(ServiceError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn execute_ddl(&self, name: &str, statement: &str) -> Result<(), ServiceError> {
        if !self.contains(name) {
            return Err(ServiceError::NotFound(name.to_string()));
        }
        self.ddl
            .borrow_mut()
            .push((name.to_string(), statement.to_string()));
        Ok(())
    }
}
