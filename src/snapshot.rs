//! Initial-state capture for per-test resets
//!
//! The service has no transactional rollback, so test cases cannot be
//! isolated by wrapping them in a transaction. Instead, right after the
//! test database is ready its content is serialized into an opaque blob
//! held on the connection, and replayed wholesale before tests that need a
//! clean slate. The encode/decode capability itself belongs to the query
//! layer; this module only defines the seam and drives it.

use std::cell::{Cell, RefCell};

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::connection::{Connection, ConnectionSettings};
use crate::models::Snapshot;
use crate::service::http_agent;

/// Opaque encode/decode capability supplied by the query layer.
/// Blobs are applied all-or-nothing; a partial replay never happens.
pub trait StateCodec {
    /// Serialize the database's current content into an opaque blob
    fn encode(&self, database: &str) -> Result<String>;

    /// Replay a previously captured blob into the database
    fn decode(&self, database: &str, blob: &str) -> Result<()>;
}

/// Capture the connection's active database content and attach the
/// snapshot to the handle for later consumers.
pub fn capture(codec: &dyn StateCodec, conn: &mut Connection) -> Result<()> {
    let database = conn.active_name().to_string();
    let blob = codec
        .encode(&database)
        .with_context(|| format!("serializing initial state of '{database}'"))?;
    conn.attach_snapshot(Snapshot::new(database, blob));
    Ok(())
}

/// Replay the snapshot held by the connection
pub fn restore(codec: &dyn StateCodec, conn: &Connection) -> Result<()> {
    let snapshot = conn
        .snapshot()
        .context("no snapshot captured for this connection")?;
    codec
        .decode(&snapshot.database, &snapshot.blob)
        .with_context(|| format!("restoring initial state of '{}'", snapshot.database))
}

/// Codec backed by the service's export/import endpoints. The exported
/// row payload is wrapped in base64 so the blob stays a transportable
/// string whatever the payload contains.
pub struct HttpCodec {
    agent: ureq::Agent,
    endpoint: String,
    token: Option<String>,
}

impl HttpCodec {
    pub fn new(settings: &ConnectionSettings) -> Self {
        HttpCodec {
            agent: http_agent(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
        }
    }

    fn url(&self, database: &str, action: &str) -> String {
        format!(
            "{}/v1/databases/{}/{action}",
            self.endpoint,
            urlencoding::encode(database)
        )
    }

    fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }
}

impl StateCodec for HttpCodec {
    fn encode(&self, database: &str) -> Result<String> {
        let mut request = self.agent.get(&self.url(database, "export"));
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        let mut response = request
            .call()
            .with_context(|| format!("exporting contents of '{database}'"))?;
        let rows: serde_json::Value = response
            .body_mut()
            .read_json()
            .context("reading export payload")?;
        Ok(BASE64.encode(rows.to_string()))
    }

    fn decode(&self, database: &str, blob: &str) -> Result<()> {
        let raw = BASE64.decode(blob).context("snapshot blob is not valid base64")?;
        let rows: serde_json::Value =
            serde_json::from_slice(&raw).context("snapshot blob is not valid JSON")?;

        let mut request = self.agent.post(&self.url(database, "import"));
        if let Some(bearer) = self.bearer() {
            request = request.header("authorization", bearer.as_str());
        }
        request
            .send_json(rows)
            .with_context(|| format!("importing contents into '{database}'"))?;
        Ok(())
    }
}

/// Canned codec (for testing): deterministic blobs, call counting
#[derive(Debug, Default)]
pub struct MemoryCodec {
    encodes: Cell<u32>,
    decodes: RefCell<Vec<(String, String)>>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encodes(&self) -> u32 {
        self.encodes.get()
    }

    /// Replayed blobs so far, as `(database, blob)` pairs
    pub fn decoded(&self) -> Vec<(String, String)> {
        self.decodes.borrow().clone()
    }
}

impl StateCodec for MemoryCodec {
    fn encode(&self, database: &str) -> Result<String> {
        self.encodes.set(self.encodes.get() + 1);
        Ok(format!("state:{database}"))
    }

    fn decode(&self, database: &str, blob: &str) -> Result<()> {
        self.decodes
            .borrow_mut()
            .push((database.to_string(), blob.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_attaches_snapshot_to_connection() {
        let codec = MemoryCodec::new();
        let mut conn = Connection::new(ConnectionSettings::default());
        conn.switch_to("test_app");

        capture(&codec, &mut conn).expect("capture");

        let snapshot = conn.snapshot().expect("snapshot attached");
        assert_eq!(snapshot.database, "test_app");
        assert_eq!(snapshot.blob, "state:test_app");
        assert_eq!(codec.encodes(), 1);
    }

    #[test]
    fn test_restore_replays_the_captured_blob() {
        let codec = MemoryCodec::new();
        let mut conn = Connection::new(ConnectionSettings::default());
        conn.switch_to("test_app");

        capture(&codec, &mut conn).expect("capture");
        restore(&codec, &conn).expect("restore");

        assert_eq!(
            codec.decoded(),
            vec![("test_app".to_string(), "state:test_app".to_string())]
        );
    }

    #[test]
    fn test_restore_without_snapshot_is_an_error() {
        let codec = MemoryCodec::new();
        let conn = Connection::new(ConnectionSettings::default());
        assert!(restore(&codec, &conn).is_err());
    }
}
