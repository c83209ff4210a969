//! Copying static asset directories out of the markdown tree.
//!
//! Static directories (images, generated HTML, API docs) are not converted.
//! They are copied verbatim into the static tree: a directory found under a
//! version root goes to `static/<version>/<dir>`, a directory found at the
//! top of the input tree goes to `static/<dir>`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::storage::Layout;

/// Which copy of a static directory to relocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// The copy under one version root.
    Version(&'a str),
    /// The copy at the top of the input tree, shared by all versions.
    Global,
}

/// A static directory that was copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    /// Original location, relative to the input root.
    pub from: PathBuf,
    /// New location, relative to the static root.
    pub to: PathBuf,
    /// Number of files copied.
    pub files: usize,
}

/// Copy one static directory into the static tree.
///
/// Any previous copy at the destination is removed first, so files deleted
/// from the source do not linger. Returns `Ok(None)` when the directory does
/// not exist in the given scope.
///
/// # Errors
///
/// Returns an error if copying fails, or if the destination does not end up
/// holding every file of the source.
pub fn relocate(
    layout: &Layout,
    scope: Scope<'_>,
    dir: &str,
) -> Result<Option<Relocation>, StaticAssetError> {
    let relative = match scope {
        Scope::Version(version) => Path::new(version).join(dir),
        Scope::Global => PathBuf::from(dir),
    };
    let source = layout.input().join(&relative);
    if !source.is_dir() {
        return Ok(None);
    }

    let destination = layout.static_root().join(&relative);
    let expected = copy_tree(&source, &destination)?;
    let found = count_files(&destination)?;

    if found != expected || (expected > 0 && found == 0) {
        return Err(StaticAssetError::Mismatch {
            from: relative,
            expected,
            found,
        });
    }

    tracing::debug!(
        "copied {expected} files from {} to {}",
        source.display(),
        destination.display()
    );

    Ok(Some(Relocation {
        to: relative.clone(),
        from: relative,
        files: expected,
    }))
}

/// Whether a global copy of `dir` exists.
#[must_use]
pub fn has_global(layout: &Layout, dir: &str) -> bool {
    layout.input().join(dir).is_dir()
}

/// Replace `destination` with a copy of `source`, returning the number of
/// files copied.
fn copy_tree(source: &Path, destination: &Path) -> Result<usize, StaticAssetError> {
    if destination.exists() {
        fs::remove_dir_all(destination).map_err(|e| StaticAssetError::copy(destination, e))?;
    }
    fs::create_dir_all(destination).map_err(|e| StaticAssetError::copy(destination, e))?;

    let mut files = 0;
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| StaticAssetError::copy(source, e.into()))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| StaticAssetError::copy(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| StaticAssetError::copy(entry.path(), e))?;
            files += 1;
        }
    }

    Ok(files)
}

fn count_files(root: &Path) -> Result<usize, StaticAssetError> {
    let mut files = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| StaticAssetError::copy(root, e.into()))?;
        if !entry.file_type().is_dir() {
            files += 1;
        }
    }
    Ok(files)
}

/// A static directory could not be relocated.
#[derive(Debug, thiserror::Error)]
pub enum StaticAssetError {
    /// The directory exists neither under the version root nor globally.
    #[error("static directory '{dir}' not found for version {version}")]
    Missing {
        /// The directory name.
        dir: String,
        /// The version being processed.
        version: String,
    },
    /// A file or directory could not be copied.
    #[error("failed to copy {}: {source}", .path.display())]
    Copy {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The copy does not match the source.
    #[error("copied {found} of {expected} files from {}", .from.display())]
    Mismatch {
        /// The directory, relative to the input root.
        from: PathBuf,
        /// Files in the source.
        expected: usize,
        /// Files found at the destination.
        found: usize,
    },
}

impl StaticAssetError {
    fn copy(path: &Path, source: io::Error) -> Self {
        Self::Copy {
            path: path.to_path_buf(),
            source,
        }
    }
}
