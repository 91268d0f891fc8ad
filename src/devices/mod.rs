//! Device rule table: name legality, access flags, path policy.
//!
//! The table is static knowledge over the fixed device set plus the
//! externally configured system-image device names. The configuration is
//! threaded in explicitly at compile start; nothing here is global state.

mod rules;

pub use rules::{validate_debug_url, Access, DeviceKind, DeviceRule, PathPolicy};

/// Ordered system-image device configuration: well-known device name to
/// the archive path it is backed by. Declaration order matters — it is the
/// search order for relative executable resolution.
#[derive(Debug, Clone, Default)]
pub struct SysimageConfig {
    entries: Vec<(String, String)>,
}

impl SysimageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.entries.push((name.into(), path.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterate (name, archive path) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a `name=path` pair as given on the command line.
    pub fn parse_pair(s: &str) -> Result<(String, String), String> {
        match s.split_once('=') {
            Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                Ok((name.to_string(), path.to_string()))
            }
            _ => Err(format!("expected 'name=path', got '{s}'")),
        }
    }
}
