//! Registration of tests known not to work against the target service
//!
//! Instead of rewriting shared test definitions in place, skipped tests are
//! recorded in an explicit registry keyed by their dotted identifier. The
//! test runner consults the registry and reports a registered method as
//! skipped instead of executing it. Inserts are idempotent, so repeated
//! registration across runs cannot double-wrap anything.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::models::{ServiceFeatures, SkipEntry};

/// Environment variable that activates skip registration for a run
pub const ACTIVATION_VAR: &str = "SCRATCHDB_BACKEND_TESTS";

/// Reason attached to every registered skip
pub const SKIP_REASON: &str = "unsupported by the target service";

/// True when the environment requests skip registration for this run.
/// Read once at the start of `prepare`; when unset, no registration work
/// happens.
pub fn skips_enabled() -> bool {
    flag_enabled(std::env::var(ACTIVATION_VAR).ok().as_deref())
}

fn flag_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Registry of test methods to report as skipped instead of executing
#[derive(Debug, Default)]
pub struct SkipRegistry {
    entries: BTreeMap<String, String>,
}

impl SkipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entry` with the given reason. Returns `false` when the
    /// identifier was already registered (the existing reason is kept).
    pub fn register(&mut self, entry: &SkipEntry, reason: impl Into<String>) -> bool {
        let id = entry.id();
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(id, reason.into());
        true
    }

    /// Reason the identified test is skipped, if it is
    pub fn is_skipped(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.entries.iter()
    }

    /// Register every declared entry whose owning application is enabled in
    /// this process. Entries for absent applications are silently ignored:
    /// those tests would never run anyway. Returns the number of newly
    /// registered entries.
    pub fn mark_skips(
        &mut self,
        features: &ServiceFeatures,
        enabled_apps: &BTreeSet<String>,
    ) -> Result<usize> {
        let mut added = 0;
        for raw in &features.skip_tests {
            let entry: SkipEntry = raw
                .parse()
                .with_context(|| format!("in declared skip list: '{raw}'"))?;
            if !enabled_apps.contains(&entry.application) {
                continue;
            }
            if self.register(&entry, SKIP_REASON) {
                added += 1;
            }
        }
        Ok(added)
    }
}
