//! Storage object reference parsing.

use std::fmt;

/// URL scheme marking a path as storage-backed.
pub const STORAGE_SCHEME: &str = "swift";

const SCHEME_PREFIX: &str = "swift://";

/// Parsed storage object reference: `swift://account/container/object`.
/// The object part may itself contain `/` and, before resolution,
/// wildcard characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub account: String,
    pub container: String,
    pub object: String,
}

impl StoragePath {
    /// Parse a storage URL. Returns `None` when the scheme is missing or
    /// any of the three components is empty.
    pub fn parse(s: &str) -> Option<StoragePath> {
        let rest = s.strip_prefix(SCHEME_PREFIX)?;
        let (account, rest) = rest.split_once('/')?;
        let (container, object) = rest.split_once('/')?;
        if account.is_empty() || container.is_empty() || object.is_empty() {
            return None;
        }
        Some(StoragePath {
            account: account.to_string(),
            container: container.to_string(),
            object: object.to_string(),
        })
    }

    /// Whether `s` uses the storage object-reference scheme, parseable or
    /// not.
    pub fn is_storage_url(s: &str) -> bool {
        s.starts_with(SCHEME_PREFIX)
    }

    pub fn url(&self) -> String {
        format!(
            "{SCHEME_PREFIX}{}/{}/{}",
            self.account, self.container, self.object
        )
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
