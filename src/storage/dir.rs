//! Directory-backed object store for local dry runs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{ObjectStore, StoragePath};

/// Object store mapping `swift://account/container/object` onto
/// `<root>/account/container/object` on the local filesystem. Archives are
/// unpacked directories: a member probe checks for a file below the
/// archive directory.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn archive_dir(&self, archive: &str) -> PathBuf {
        match StoragePath::parse(archive) {
            Some(path) => self
                .root
                .join(path.account)
                .join(path.container)
                .join(path.object),
            None => PathBuf::from(archive),
        }
    }
}

fn collect_objects(dir: &Path, base: &Path, out: &mut Vec<String>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_objects(&path, base, out)?;
        } else if let Ok(rel) = path.strip_prefix(base) {
            out.push(rel.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

impl ObjectStore for DirStore {
    fn list_prefix(&self, account: &str, container: &str, prefix: &str) -> Result<Vec<String>> {
        let container_dir = self.root.join(account).join(container);
        if !container_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        collect_objects(&container_dir, &container_dir, &mut names)?;
        names.retain(|name| name.starts_with(prefix));
        // Filesystem iteration order is unspecified; sort for a stable
        // listing order like a real backend would return.
        names.sort();
        Ok(names)
    }

    fn archive_contains(&self, archive: &str, member: &str) -> Result<bool> {
        Ok(self.archive_dir(archive).join(member).is_file())
    }
}
