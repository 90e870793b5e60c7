use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Options controlling a single `prepare` run; read-only once the run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// 0 = errors only, 1 = action lines, 2 = action lines with resolved names
    pub verbosity: u8,
    /// Destroy and recreate a conflicting test database without asking
    pub autoclobber: bool,
    /// Capture the initial-state snapshot once the database is ready
    pub serialize: bool,
    /// Reuse an existing test database instead of clobbering it
    pub keepdb: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            verbosity: 1,
            autoclobber: false,
            serialize: true,
            keepdb: false,
        }
    }
}

/// A test method known not to work against the target database service
///
/// Parsed from a dotted `{application}.{test_case}.{method}` identifier:
/// the application is the first segment, the method the last, and the test
/// case everything in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipEntry {
    pub application: String,
    pub case: String,
    pub method: String,
}

static SKIP_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*){2,}$")
        .expect("skip entry pattern")
});

impl SkipEntry {
    /// Full dotted identifier
    pub fn id(&self) -> String {
        format!("{}.{}", self.case, self.method)
    }
}

impl fmt::Display for SkipEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SkipEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !SKIP_ENTRY.is_match(s) {
            bail!("invalid skip entry '{s}': expected 'application.test_case.method'");
        }

        let (case, method) = s
            .rsplit_once('.')
            .context("skip entry has no method segment")?;
        let application = s
            .split('.')
            .next()
            .context("skip entry has no application segment")?;

        Ok(SkipEntry {
            application: application.to_string(),
            case: case.to_string(),
            method: method.to_string(),
        })
    }
}

/// Dotted identifiers of tests that cannot pass against the target service.
/// The service has no transactional rollback, no sequences, and no
/// self-referential schema alteration.
const KNOWN_UNSUPPORTED: &[&str] = &[
    "transactions.tests.AtomicTests.test_rollback_on_error",
    "transactions.tests.AtomicTests.test_nested_savepoints",
    "introspection.tests.IntrospectionTests.test_sequence_list",
    "schema.tests.SchemaTests.test_alter_pk_with_self_referential_field",
    "expressions.tests.ExpressionTests.test_update_with_self_select",
];

/// Capabilities of the target service relevant to the test suite
#[derive(Debug, Clone)]
pub struct ServiceFeatures {
    /// Declared skip entries, as dotted identifiers
    pub skip_tests: Vec<String>,
}

impl Default for ServiceFeatures {
    fn default() -> Self {
        ServiceFeatures {
            skip_tests: KNOWN_UNSUPPORTED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ServiceFeatures {
    /// Extend the built-in skip list with configured entries
    pub fn with_extra(mut self, extra: &[String]) -> Self {
        self.skip_tests.extend(extra.iter().cloned());
        self
    }
}

/// Opaque serialized capture of database content, taken right after the
/// test database becomes ready. Replayed all-or-nothing before tests that
/// need a clean slate; never partially applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Database the content was captured from
    pub database: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Opaque blob produced by the encode capability
    pub blob: String,
}

impl Snapshot {
    pub fn new(database: impl Into<String>, blob: impl Into<String>) -> Self {
        Snapshot {
            database: database.into(),
            captured_at: Utc::now(),
            blob: blob.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }
}
