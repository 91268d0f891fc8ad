//! Typed compile errors and the accumulated error report.
//!
//! Schema validation collects every structural error across the whole
//! configuration before aborting; every later pipeline stage stops at the
//! first error. Both shapes end up in a [`CompileReport`].

use thiserror::Error;

/// A single compilation error, carrying the offending node and, where it
/// applies, the device name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Missing or malformed field.
    #[error("node '{node}': {detail}")]
    Schema { node: String, detail: String },

    /// Illegal device name or duplicate name.
    #[error("node '{node}': {detail}")]
    Name { node: String, detail: String },

    /// Missing required path, illegal wildcard placement, or malformed
    /// debug URL.
    #[error("node '{node}', device '{device}': {detail}")]
    Path {
        node: String,
        device: String,
        detail: String,
    },

    /// Inconsistent expansion counts among linked wildcarded devices.
    #[error("node '{node}': {detail}")]
    WildcardMismatch { node: String, detail: String },

    /// Reference to an undeclared node in a connect list.
    #[error("node '{node}': unknown connection target '{target}'")]
    Connection { node: String, target: String },

    /// Attach target is neither "default" nor a device on the node.
    #[error("node '{node}': invalid attach target '{target}'")]
    Attach { node: String, target: String },

    /// Replication factor outside the allowed set.
    #[error("node '{node}': replicate must be 1, 2 or 3 (got {value})")]
    Replication { node: String, value: u64 },

    /// Relative executable path not found in any candidate image archive.
    #[error("node '{node}': executable '{path}' not found in any image device")]
    ExecResolution { node: String, path: String },

    /// The object-store collaborator failed a listing or membership query.
    #[error("node '{node}', device '{device}': storage query failed: {detail}")]
    Storage {
        node: String,
        device: String,
        detail: String,
    },
}

impl CompileError {
    /// Name of the node the error belongs to.
    pub fn node(&self) -> &str {
        match self {
            CompileError::Schema { node, .. }
            | CompileError::Name { node, .. }
            | CompileError::Path { node, .. }
            | CompileError::WildcardMismatch { node, .. }
            | CompileError::Connection { node, .. }
            | CompileError::Attach { node, .. }
            | CompileError::Replication { node, .. }
            | CompileError::ExecResolution { node, .. }
            | CompileError::Storage { node, .. } => node,
        }
    }
}

/// Non-empty list of compile errors; the failure side of a compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    errors: Vec<CompileError>,
}

impl CompileReport {
    pub fn new(errors: Vec<CompileError>) -> Self {
        debug_assert!(!errors.is_empty(), "empty compile report");
        Self { errors }
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl From<CompileError> for CompileReport {
    fn from(error: CompileError) -> Self {
        Self::new(vec![error])
    }
}

impl std::fmt::Display for CompileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "compilation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileReport {}
