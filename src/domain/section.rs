//! Sections, file entries and special file rules.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::domain::{processor::Processor, split::HeadingSplitter};

/// A destination section inside a version tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Directory name of the section, unique within a policy.
    pub name: String,
    /// Title of the section index page.
    pub title: String,
    /// Description of the section index page.
    pub description: String,
    /// Tags applied to the section index page and to every document in it.
    pub tags: Vec<String>,
    /// Search keywords for the section index page.
    pub keywords: Vec<String>,
    /// Site generator content type, `docs` unless configured.
    pub kind: String,
    /// First weight handed out to documents in the section, overriding the
    /// policy-wide base.
    pub weight_base: Option<u32>,
    /// Processors run on every document emitted into the section.
    pub processors: Vec<Processor>,
    /// How the section's documents are produced.
    pub strategy: Strategy,
}

impl Section {
    /// Every source path the section reads, relative to the version root.
    #[must_use]
    pub fn source_paths(&self) -> Vec<&Path> {
        match &self.strategy {
            Strategy::Arrange { files } => files.iter().map(|f| f.src_file.as_path()).collect(),
            Strategy::SplitByHeading { src_file, .. } => vec![src_file.as_path()],
        }
    }
}

/// How a section's documents are produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Place a declared list of files into the section, in order.
    Arrange {
        /// The files, in declared order.
        files: Vec<FileEntry>,
    },
    /// Split one source document at a heading depth.
    SplitByHeading {
        /// The document to split, relative to the version root.
        src_file: PathBuf,
        /// Split depth and preamble handling.
        splitter: HeadingSplitter,
    },
}

impl Strategy {
    /// The strategy's configuration name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Arrange { .. } => "arrange",
            Self::SplitByHeading { .. } => "split_markdown_by_heading",
        }
    }
}

/// One file placed by the [`Strategy::Arrange`] strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Short name of the entry.
    pub name: String,
    /// Page title.
    pub title: String,
    /// Page description.
    pub description: String,
    /// Source path relative to the version root.
    pub src_file: PathBuf,
    /// Destination path relative to the section directory.
    pub dst_file: PathBuf,
    /// Extra tags for this page.
    pub tags: Vec<String>,
    /// Search keywords.
    pub keywords: Vec<String>,
    /// Alternative URLs for the page.
    pub aliases: Vec<String>,
    /// Explicit weight, used only when automatic weighting is off.
    pub weight: Option<u32>,
    /// Processors run on this file only.
    pub processors: Vec<Processor>,
}

impl FileEntry {
    /// Where the entry is written, relative to the section directory.
    /// Converted `.html` names become `.md`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        if self.dst_file.extension().is_some_and(|ext| ext == "html") {
            self.dst_file.with_extension("md")
        } else {
            self.dst_file.clone()
        }
    }
}

/// Post-processing for a file outside the versioned documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialFileRule {
    /// File name relative to the input directory.
    pub file: PathBuf,
    /// What to extract from it.
    pub processor: SpecialProcessor,
    /// Where to find the file.
    pub input_dir: InputDir,
}

/// The extractors available for special files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialProcessor {
    /// Parse the committers table into `committers.json`.
    Committers,
    /// Extract the `poweredByItems` array into `testimonials.json`.
    PoweredBy,
}

impl SpecialProcessor {
    /// Name of the data file this processor writes.
    #[must_use]
    pub const fn output_file(self) -> &'static str {
        match self {
            Self::Committers => "committers.json",
            Self::PoweredBy => "testimonials.json",
        }
    }
}

impl FromStr for SpecialProcessor {
    type Err = UnknownSpecialProcessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "committers" => Ok(Self::Committers),
            "powered-by" | "powered_by" => Ok(Self::PoweredBy),
            other => Err(UnknownSpecialProcessorError(other.to_string())),
        }
    }
}

impl fmt::Display for SpecialProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Committers => "committers",
            Self::PoweredBy => "powered-by",
        })
    }
}

/// A special file processor name that is not recognised.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown special file processor '{0}' (expected committers or powered-by)")]
pub struct UnknownSpecialProcessorError(String);

/// The workspace directory a special file is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InputDir {
    /// The pre-processed markdown tree.
    #[default]
    Interim,
    /// The raw site checkout.
    Source,
    /// Any other directory, relative to the workspace.
    Other(PathBuf),
}

impl From<&str> for InputDir {
    fn from(value: &str) -> Self {
        match value {
            "interim" => Self::Interim,
            "source" => Self::Source,
            other => Self::Other(PathBuf::from(other)),
        }
    }
}
