//! In-memory object store for tests and dry runs.

use std::collections::{HashMap, HashSet};

use anyhow::Result;

use super::ObjectStore;

/// Object store backed by plain maps. Objects are listed in insertion
/// order, which doubles as the backend listing order in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: HashMap<(String, String), Vec<String>>,
    archives: HashMap<String, HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object name under `account`/`container`.
    pub fn add_object(&mut self, account: &str, container: &str, object: &str) {
        self.objects
            .entry((account.to_string(), container.to_string()))
            .or_default()
            .push(object.to_string());
    }

    /// Register a member inside the archive at `archive`.
    pub fn add_archive_member(&mut self, archive: &str, member: &str) {
        self.archives
            .entry(archive.to_string())
            .or_default()
            .insert(member.to_string());
    }
}

impl ObjectStore for MemoryStore {
    fn list_prefix(&self, account: &str, container: &str, prefix: &str) -> Result<Vec<String>> {
        let names = self
            .objects
            .get(&(account.to_string(), container.to_string()))
            .map(|names| {
                names
                    .iter()
                    .filter(|name| name.starts_with(prefix))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(names)
    }

    fn archive_contains(&self, archive: &str, member: &str) -> Result<bool> {
        Ok(self
            .archives
            .get(archive)
            .is_some_and(|members| members.contains(member)))
    }
}
