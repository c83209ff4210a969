//! Where things live inside a workspace.

use std::path::{Path, PathBuf};

use crate::domain::InputDir;

/// The directories a run reads from and writes to.
///
/// By default everything hangs off one workspace directory:
///
/// ```text
/// <workspace>/interim/<version>/...        pre-processed markdown (input)
/// <workspace>/source/...                   raw site checkout
/// <workspace>/output/content/en/<version>  arranged content
/// <workspace>/output/static/               relocated static assets
/// <workspace>/output/data/                 data files from special files
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    workspace: PathBuf,
    input: PathBuf,
    source: PathBuf,
    content: PathBuf,
    static_root: PathBuf,
    data: PathBuf,
}

impl Layout {
    /// The default layout rooted at `workspace`.
    #[must_use]
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let output = workspace.join("output");
        Self {
            input: workspace.join("interim"),
            source: workspace.join("source"),
            content: output.join("content").join("en"),
            static_root: output.join("static"),
            data: output.join("data"),
            workspace,
        }
    }

    /// Read pre-processed markdown from `input` instead.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// Read raw site files from `source` instead.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = source.into();
        self
    }

    /// Write arranged content to `content` instead.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<PathBuf>) -> Self {
        self.content = content.into();
        self
    }

    /// Write static assets to `static_root` instead.
    #[must_use]
    pub fn with_static_root(mut self, static_root: impl Into<PathBuf>) -> Self {
        self.static_root = static_root.into();
        self
    }

    /// Write data files to `data` instead.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<PathBuf>) -> Self {
        self.data = data.into();
        self
    }

    /// The workspace root.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Root of the pre-processed markdown tree.
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Root of the arranged content tree.
    #[must_use]
    pub fn content(&self) -> &Path {
        &self.content
    }

    /// Root of the static asset tree.
    #[must_use]
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// Directory data files are written to.
    #[must_use]
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// Pre-processed markdown for one version.
    #[must_use]
    pub fn input_version(&self, version: &str) -> PathBuf {
        self.input.join(version)
    }

    /// Arranged content for one version.
    #[must_use]
    pub fn output_version(&self, version: &str) -> PathBuf {
        self.content.join(version)
    }

    /// One section of one version.
    #[must_use]
    pub fn section_dir(&self, version: &str, section: &str) -> PathBuf {
        self.output_version(version).join(section)
    }

    /// The directory a special file is read from.
    #[must_use]
    pub fn input_dir(&self, dir: &InputDir) -> PathBuf {
        match dir {
            InputDir::Interim => self.input.clone(),
            InputDir::Source => self.source.clone(),
            InputDir::Other(path) => self.workspace.join(path),
        }
    }
}

/// The human readable label of a version identifier.
///
/// Purely numeric identifiers are read digit by digit: `"39"` is `3.9.X`,
/// `"0100"` is `0.10.0.X`. Anything else is returned unchanged.
#[must_use]
pub fn version_label(version: &str) -> String {
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return version.to_string();
    }

    let d: Vec<char> = version.chars().collect();
    match d.as_slice() {
        [a, b, c, e] => format!("{a}.{b}{c}.{e}.X"),
        [a, b, c] => format!("{a}.{b}.{c}.X"),
        [a, b] => format!("{a}.{b}.X"),
        [a] => format!("{a}.X"),
        _ => version.to_string(),
    }
}
