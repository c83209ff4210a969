//! Restructuring of converted Markdown documentation.
//!
//! A flat, per-version tree of pre-converted markdown is arranged into
//! ordered, weighted sections according to a declarative policy: files are
//! placed or split at heading boundaries, links are rewritten, front matter
//! is synthesized, and static asset directories are relocated.

pub mod domain;
pub use domain::{ConfigurationError, Document, Policy, Section, Strategy};

/// Filesystem input and output for restructuring runs.
pub mod storage;
pub use storage::{Issue, Layout, Options, Restructurer, RunReport};
