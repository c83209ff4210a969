//! The outcome of a restructuring run.
//!
//! Non-fatal problems are captured at the finest scope they occur in (file
//! entry, section, version, or the run as a whole) and carried up to the
//! [`RunReport`], so one run shows every problem at once.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::storage::{Relocation, SpecialFileError, StaticAssetError};

/// A non-fatal problem recorded during a run.
#[derive(Debug, thiserror::Error)]
pub enum Issue {
    /// A declared source file does not exist.
    #[error("source {} not found for entry '{entry}'", .path.display())]
    MissingSource {
        /// The entry, or the section for split sections.
        entry: String,
        /// The missing path, relative to the version root.
        path: PathBuf,
    },
    /// A split source has no headings at all and was written whole.
    #[error("{} has no headings; written as a single document", .path.display())]
    SplitBoundary {
        /// The source path, relative to the version root.
        path: PathBuf,
    },
    /// A static directory could not be relocated.
    #[error(transparent)]
    StaticAsset(#[from] StaticAssetError),
    /// A special file could not be processed.
    #[error("special file {}: {source}", .path.display())]
    SpecialFile {
        /// The special file, relative to its input directory.
        path: PathBuf,
        /// What went wrong.
        source: SpecialFileError,
    },
    /// A source exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// An output file or directory could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl Issue {
    /// A short machine-readable name for the kind of issue.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingSource { .. } => "missing_source",
            Self::SplitBoundary { .. } => "split_boundary",
            Self::StaticAsset(_) => "static_asset",
            Self::SpecialFile { .. } => "special_file",
            Self::Read { .. } => "read",
            Self::Write { .. } => "write",
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What happened to one section of one version.
#[derive(Debug, Default)]
pub struct SectionReport {
    /// The section name.
    pub name: String,
    /// Files written, relative to the version's output directory, in the
    /// order they were written.
    pub written: Vec<PathBuf>,
    /// Problems recorded while building the section.
    pub issues: Vec<Issue>,
}

impl SectionReport {
    /// An empty report for the named section.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the section was built without problems.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.issues.is_empty()
    }

    pub(crate) fn record(&mut self, version: &str, issue: Issue) {
        tracing::warn!("{version}/{}: {issue}", self.name);
        self.issues.push(issue);
    }
}

/// What happened to one version.
#[derive(Debug, Default)]
pub struct VersionReport {
    /// The version identifier.
    pub version: String,
    /// Per-section results, in declared order.
    pub sections: Vec<SectionReport>,
    /// Static directories copied for this version.
    pub assets: Vec<Relocation>,
    /// Problems not tied to a single section.
    pub issues: Vec<Issue>,
    /// SHA-256 over the version's output tree.
    pub digest: Option<String>,
}

impl VersionReport {
    /// An empty report for `version`.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Number of files written across all sections.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.sections.iter().map(|s| s.written.len()).sum()
    }

    /// Every issue recorded for this version, section issues first.
    pub fn issues(&self) -> impl Iterator<Item = (Option<&str>, &Issue)> {
        self.sections
            .iter()
            .flat_map(|s| s.issues.iter().map(move |i| (Some(s.name.as_str()), i)))
            .chain(self.issues.iter().map(|i| (None, i)))
    }

    pub(crate) fn record(&mut self, issue: Issue) {
        tracing::warn!("{}: {issue}", self.version);
        self.issues.push(issue);
    }
}

/// The outcome of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Per-version results, in policy order.
    pub versions: Vec<VersionReport>,
    /// Static directories shared by all versions.
    pub assets: Vec<Relocation>,
    /// Data files written from special files.
    pub data_files: Vec<PathBuf>,
    /// Problems not tied to a single version.
    pub issues: Vec<Issue>,
    /// Versions not processed because the run was cancelled.
    pub cancelled: Vec<String>,
}

impl RunReport {
    /// Total number of issues recorded anywhere in the run.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.versions.iter().map(|v| v.issues().count()).sum::<usize>() + self.issues.len()
    }

    /// Whether the run completed without any issue.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0 && self.cancelled.is_empty()
    }

    /// Total number of content files written.
    #[must_use]
    pub fn files_written(&self) -> usize {
        self.versions.iter().map(VersionReport::files_written).sum()
    }

    /// Every missing source, as `(version, section, issue)`.
    pub fn missing_sources(&self) -> impl Iterator<Item = (&str, &str, &Issue)> {
        self.versions.iter().flat_map(|v| {
            v.sections.iter().flat_map(move |s| {
                s.issues
                    .iter()
                    .filter(|i| matches!(i, Issue::MissingSource { .. }))
                    .map(move |i| (v.version.as_str(), s.name.as_str(), i))
            })
        })
    }

    pub(crate) fn record(&mut self, issue: Issue) {
        tracing::warn!("{issue}");
        self.issues.push(issue);
    }
}

/// Hash a directory tree: every file's relative path and contents, in sorted
/// path order.
///
/// Two trees with the same digest are byte-identical.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked or a file cannot be read.
pub fn digest_tree(root: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let relative = relative.to_string_lossy();
        hasher.update((relative.len() as u64).to_le_bytes());
        hasher.update(relative.as_bytes());

        let bytes = fs::read(entry.path())?;
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }

    let hash = hasher.finalize();
    Ok(format!("{hash:x}"))
}
