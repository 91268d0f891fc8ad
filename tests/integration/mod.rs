//! Integration tests for the servlet configuration compiler
//!
//! These tests drive the full pipeline — parse, validate, wildcard
//! resolution, expansion, graph, placement, executable resolution —
//! against in-memory and directory-backed stores.

pub mod compile_flow;
pub mod helpers;
pub mod scenarios;
