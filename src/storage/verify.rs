//! Sanity checks over a finished output tree.

use std::{ffi::OsStr, fs, path::Path};

use walkdir::WalkDir;

use crate::{domain::Policy, storage::Layout};

/// What was found in one version's output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    /// The version identifier.
    pub version: String,
    /// Whether the version directory exists.
    pub present: bool,
    /// Number of section directories found.
    pub sections: usize,
    /// Policy sections with no directory.
    pub missing_sections: Vec<String>,
}

impl VersionCheck {
    /// Whether the version exists and has at least one section.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.present && self.sections > 0
    }
}

/// The result of checking an output tree against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Whether the content root exists.
    pub content_exists: bool,
    /// Markdown files anywhere under the content root.
    pub markdown_files: usize,
    /// One check per policy version.
    pub versions: Vec<VersionCheck>,
    /// Files under the static root.
    pub static_files: usize,
    /// JSON files in the data directory.
    pub data_files: usize,
}

impl Verification {
    /// Whether the tree is usable: content exists, contains markdown, and
    /// every version has at least one section.
    ///
    /// Missing individual sections and an empty static tree are reported but
    /// do not fail verification.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.content_exists && self.markdown_files > 0 && self.versions.iter().all(VersionCheck::is_ok)
    }
}

/// Check the output tree described by `layout` against `policy`.
#[must_use]
pub fn verify(policy: &Policy, layout: &Layout) -> Verification {
    let content = layout.content();
    let content_exists = content.is_dir();

    let markdown_files = count(content, |path| path.extension() == Some(OsStr::new("md")));
    let static_files = count(layout.static_root(), |_| true);
    let data_files = count(layout.data(), |path| path.extension() == Some(OsStr::new("json")));

    let versions = policy
        .doc_versions()
        .iter()
        .map(|version| {
            let root = layout.output_version(version);
            let present = root.is_dir();
            let sections = fs::read_dir(&root).map_or(0, |entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.path().is_dir())
                    .count()
            });
            let missing_sections = policy
                .sections()
                .iter()
                .filter(|section| !root.join(&section.name).is_dir())
                .map(|section| section.name.clone())
                .collect();

            VersionCheck {
                version: version.clone(),
                present,
                sections,
                missing_sections,
            }
        })
        .collect();

    let verification = Verification {
        content_exists,
        markdown_files,
        versions,
        static_files,
        data_files,
    };

    if verification.static_files == 0 {
        tracing::warn!("no static files under {}", layout.static_root().display());
    }
    for check in &verification.versions {
        if !check.missing_sections.is_empty() {
            tracing::warn!(
                "version {} is missing sections: {}",
                check.version,
                check.missing_sections.join(", ")
            );
        }
    }

    verification
}

fn count(root: &Path, keep: impl Fn(&Path) -> bool) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_type().is_dir())
        .filter(|entry| keep(entry.path()))
        .count()
}
