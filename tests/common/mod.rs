//! Common test utilities

use std::cell::{Cell, RefCell};

use anyhow::{Result, bail};
use scratchdb::{AdminCommand, ClobberConfirm, Connection, ConnectionSettings, MemoryAdmin};

/// Test context wiring a fresh in-memory service admin to a connection
pub struct TestContext {
    pub admin: MemoryAdmin,
    pub conn: Connection,
}

impl TestContext {
    /// Create a new test context for the `app` alias
    pub fn new() -> Self {
        TestContext {
            admin: MemoryAdmin::new(),
            conn: Connection::new(ConnectionSettings::default()),
        }
    }

    /// Same, with the test database already left over from a prior run
    pub fn with_stale_database() -> Self {
        let ctx = Self::new();
        ctx.admin.seed("test_app");
        ctx
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Confirmation provider with a canned answer and an invocation counter
pub struct CannedConfirm {
    answer: bool,
    pub asked: Cell<u32>,
}

impl CannedConfirm {
    pub fn yes() -> Self {
        CannedConfirm {
            answer: true,
            asked: Cell::new(0),
        }
    }

    pub fn no() -> Self {
        CannedConfirm {
            answer: false,
            asked: Cell::new(0),
        }
    }
}

impl ClobberConfirm for CannedConfirm {
    fn confirm(&self, _database: &str) -> Result<bool> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer)
    }
}

/// Admin command that records the databases it ran against
#[derive(Default)]
pub struct RecordingCommand {
    pub ran: RefCell<Vec<String>>,
}

impl AdminCommand for RecordingCommand {
    fn run(&self, database: &str) -> Result<()> {
        self.ran.borrow_mut().push(database.to_string());
        Ok(())
    }
}

/// Admin command that always fails
pub struct FailingCommand;

impl AdminCommand for FailingCommand {
    fn run(&self, database: &str) -> Result<()> {
        bail!("cache table provisioning failed on '{database}'")
    }
}
