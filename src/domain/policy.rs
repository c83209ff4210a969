use std::{
    collections::{BTreeMap, HashSet},
    fmt, io,
    path::{Component, Path, PathBuf},
};

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::domain::{
    front_matter::Template,
    link::{LinkAction, LinkRewriter, LinkRule},
    processor::Processor,
    section::{FileEntry, InputDir, Section, SpecialFileRule, SpecialProcessor, Strategy},
    split::{HeadingSplitter, Preamble},
};

/// Product name used in version index titles when none is configured.
pub const DEFAULT_PRODUCT: &str = "AK";

/// Heading depth used by split sections that do not declare one.
const DEFAULT_SPLIT_DEPTH: u8 = 2;

/// The restructuring policy.
///
/// A policy is loaded once, validated as a whole, and never changed
/// afterwards. Everything downstream reads it through the accessors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    origin: String,
    auto_weight: bool,
    weight_base: u32,
    weight_step: u32,
    exclude_dirs: Vec<String>,
    static_dirs: Vec<String>,
    sanitize_list: Vec<String>,
    doc_versions: Vec<String>,
    template: Template,
    default_tags: Vec<String>,
    product: String,
    processors: Vec<Processor>,
    link_rewriter: LinkRewriter,
    sections: Vec<Section>,
    special_files: Vec<SpecialFileRule>,
}

impl Policy {
    /// Load and validate a policy file.
    ///
    /// Files with a `.toml` extension are parsed as TOML, anything else as
    /// YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it
    /// violates any policy rule. Every violation is reported, not just the
    /// first.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawPolicy = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content).map_err(|source| ConfigurationError::Toml {
                origin: origin.clone(),
                source,
            })?
        } else {
            parse_yaml(&content, &origin)?
        };

        let policy = raw.validate(origin)?;
        tracing::debug!(
            "loaded policy {} with {} sections and {} versions",
            policy.origin,
            policy.sections.len(),
            policy.doc_versions.len()
        );
        Ok(policy)
    }

    /// Parse and validate a YAML policy held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or violates any policy
    /// rule.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigurationError> {
        let origin = "<inline>".to_string();
        parse_yaml(content, &origin)?.validate(origin)
    }

    /// Where the policy was loaded from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether arranged documents are weighted by position.
    #[must_use]
    pub const fn auto_weight(&self) -> bool {
        self.auto_weight
    }

    /// Weight of the first document in a section.
    #[must_use]
    pub const fn weight_base(&self) -> u32 {
        self.weight_base
    }

    /// Weight increment between consecutive documents.
    #[must_use]
    pub const fn weight_step(&self) -> u32 {
        self.weight_step
    }

    /// Directory names skipped entirely.
    #[must_use]
    pub fn exclude_dirs(&self) -> &[String] {
        &self.exclude_dirs
    }

    /// Directory names relocated to the static tree.
    #[must_use]
    pub fn static_dirs(&self) -> &[String] {
        &self.static_dirs
    }

    /// File names whose links are never rewritten.
    #[must_use]
    pub fn sanitize_list(&self) -> &[String] {
        &self.sanitize_list
    }

    /// Whether links in the file at `path` are exempt from rewriting.
    #[must_use]
    pub fn is_sanitized(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.sanitize_list.iter().any(|s| s == name))
    }

    /// Version identifiers, in processing order.
    #[must_use]
    pub fn doc_versions(&self) -> &[String] {
        &self.doc_versions
    }

    /// The front matter template.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// Tags applied to every emitted page.
    #[must_use]
    pub fn default_tags(&self) -> &[String] {
        &self.default_tags
    }

    /// Product name used in version index titles.
    #[must_use]
    pub fn product(&self) -> &str {
        &self.product
    }

    /// Processors run on every emitted document before section and file
    /// processors.
    #[must_use]
    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    /// The link rules, in application order.
    #[must_use]
    pub const fn link_rewriter(&self) -> &LinkRewriter {
        &self.link_rewriter
    }

    /// Sections, in declared order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Special file rules, in declared order.
    #[must_use]
    pub fn special_files(&self) -> &[SpecialFileRule] {
        &self.special_files
    }

    /// The automatic weight of the `index`th (zero-based) document in
    /// `section`.
    #[must_use]
    pub fn weight_for(&self, section: &Section, index: usize) -> u32 {
        let base = section.weight_base.unwrap_or(self.weight_base);
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        base.saturating_add(self.weight_step.saturating_mul(index))
    }

    /// The weight of a section index page: its one-based declared position.
    #[must_use]
    pub fn section_weight(index: usize) -> u32 {
        u32::try_from(index).map_or(u32::MAX, |i| i.saturating_add(1))
    }
}

/// The policy could not be loaded.
///
/// Configuration errors are fatal: nothing is written when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The policy file could not be read.
    #[error("failed to read policy {}: {source}", .path.display())]
    Read {
        /// The policy path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The policy is not valid YAML, or does not have the expected shape.
    #[error("failed to parse policy {origin}: {source}")]
    Yaml {
        /// Where the policy came from.
        origin: String,
        /// The underlying error.
        source: serde_yaml::Error,
    },
    /// The policy is not valid TOML, or does not have the expected shape.
    #[error("failed to parse policy {origin}: {source}")]
    Toml {
        /// Where the policy came from.
        origin: String,
        /// The underlying error.
        source: toml::de::Error,
    },
    /// The policy parsed, but breaks one or more rules.
    #[error("invalid policy {origin}: {}", ViolationList(.violations))]
    Invalid {
        /// Where the policy came from.
        origin: String,
        /// Every rule the policy breaks.
        violations: NonEmpty<Violation>,
    },
}

impl ConfigurationError {
    /// The field-level violations, if the policy parsed.
    #[must_use]
    pub fn violations(&self) -> Option<&NonEmpty<Violation>> {
        match self {
            Self::Invalid { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

/// A single broken policy rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path of the offending field, such as `sections[2].files[0].src_file`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

struct ViolationList<'a>(&'a NonEmpty<Violation>);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        let total = self.0.len();
        let shown: Vec<String> = self
            .0
            .iter()
            .take(MAX_DISPLAY)
            .map(ToString::to_string)
            .collect();
        let msg = shown.join("; ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

fn parse_yaml(content: &str, origin: &str) -> Result<RawPolicy, ConfigurationError> {
    // An empty YAML document is a null, not an empty mapping.
    let content = if content.trim().is_empty() { "{}" } else { content };
    serde_yaml::from_str(content).map_err(|source| ConfigurationError::Yaml {
        origin: origin.to_string(),
        source,
    })
}

const fn default_true() -> bool {
    true
}

const fn default_weight() -> u32 {
    10
}

fn default_kind() -> String {
    "docs".to_string()
}

fn default_product() -> String {
    DEFAULT_PRODUCT.to_string()
}

/// The on-disk shape of the policy.
///
/// Unknown keys are ignored so that older binaries accept newer policies.
#[derive(Debug, Deserialize)]
struct RawPolicy {
    #[serde(default = "default_true")]
    auto_weight: bool,
    #[serde(default = "default_weight")]
    weight_base: u32,
    #[serde(default = "default_weight")]
    weight_step: u32,
    #[serde(default)]
    exclude_dirs: Vec<String>,
    #[serde(default)]
    static_dirs: Vec<String>,
    #[serde(default)]
    sanitize_list: Vec<String>,
    #[serde(default, alias = "doc_versions")]
    doc_dirs: Vec<String>,
    #[serde(default)]
    front_matter: RawFrontMatter,
    #[serde(default)]
    processors: Vec<RawProcessor>,
    #[serde(default)]
    link_updates: Vec<RawLinkRule>,
    #[serde(default)]
    sections: Vec<RawSection>,
    #[serde(default)]
    special_files: Vec<RawSpecialFile>,
}

#[derive(Debug, Deserialize)]
struct RawFrontMatter {
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    tags: StringOrList,
    #[serde(default = "default_product")]
    product: String,
}

impl Default for RawFrontMatter {
    fn default() -> Self {
        Self {
            template: None,
            tags: StringOrList::default(),
            product: default_product(),
        }
    }
}

/// A processor written either as a bare name or as a single-key mapping from
/// name to argument (`promote_section: Migration to KRaft`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProcessor {
    Name(String),
    WithArgument(BTreeMap<String, String>),
}

/// Tags and keywords may be written as one string or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl Default for StringOrList {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<StringOrList> for Vec<String> {
    fn from(value: StringOrList) -> Self {
        match value {
            StringOrList::One(s) if s.trim().is_empty() => Self::new(),
            StringOrList::One(s) => vec![s],
            StringOrList::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLinkRule {
    #[serde(default)]
    search_str: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: StringOrList,
    #[serde(default)]
    keywords: StringOrList,
    #[serde(default = "default_kind", rename = "type")]
    kind: String,
    #[serde(default)]
    weight_base: Option<u32>,
    #[serde(default)]
    strategy: String,
    #[serde(default)]
    strategy_params: Vec<i64>,
    #[serde(default)]
    preamble: Option<String>,
    #[serde(default)]
    processors: Vec<RawProcessor>,
    #[serde(default)]
    files: Vec<RawFileEntry>,
    #[serde(default)]
    src_file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFileEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    src_file: String,
    #[serde(default)]
    dst_file: Option<String>,
    #[serde(default)]
    tags: StringOrList,
    #[serde(default)]
    keywords: StringOrList,
    #[serde(default)]
    aliases: StringOrList,
    #[serde(default)]
    weight: Option<u32>,
    #[serde(default)]
    processors: Vec<RawProcessor>,
}

#[derive(Debug, Deserialize)]
struct RawSpecialFile {
    #[serde(default)]
    file: String,
    #[serde(default)]
    processor: String,
    #[serde(default)]
    input_dir: Option<String>,
}

/// Collects violations while a raw policy is converted.
#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn processors(&mut self, field: &str, raw: Vec<RawProcessor>) -> Vec<Processor> {
        let mut processors = Vec::with_capacity(raw.len());
        for (i, processor) in raw.into_iter().enumerate() {
            let parsed = match processor {
                RawProcessor::Name(name) => name.parse(),
                RawProcessor::WithArgument(map) if map.len() == 1 => {
                    let (name, argument) = map.into_iter().next().unwrap_or_default();
                    Processor::from_parts(&name, Some(&argument))
                }
                RawProcessor::WithArgument(_) => {
                    self.push(format!("{field}[{i}]"), "expected a single processor name");
                    continue;
                }
            };
            match parsed {
                Ok(processor) => processors.push(processor),
                Err(e) => self.push(format!("{field}[{i}]"), e.to_string()),
            }
        }
        processors
    }

    fn relative_path(&mut self, field: &str, path: &str) -> PathBuf {
        let candidate = PathBuf::from(path);
        if path.trim().is_empty() {
            self.push(field, "must not be empty");
        } else if candidate.is_absolute() {
            self.push(field, "must be a relative path");
        } else if candidate.components().any(|c| c == Component::ParentDir) {
            self.push(field, "must not contain '..'");
        }
        candidate
    }
}

/// Whether `name` is exactly one normal path component, so joining it onto a
/// directory stays inside that directory.
fn is_directory_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl RawPolicy {
    fn validate(self, origin: String) -> Result<Policy, ConfigurationError> {
        let mut violations = Violations::default();

        let mut versions = HashSet::new();
        for (i, version) in self.doc_dirs.iter().enumerate() {
            let field = format!("doc_dirs[{i}]");
            if version.trim().is_empty() {
                violations.push(field, "must not be empty");
            } else if !is_directory_name(version) {
                violations.push(field, "must be a single directory name");
            } else if !versions.insert(version.as_str()) {
                violations.push(field, format!("duplicate version '{version}'"));
            }
        }

        let processors = violations.processors("processors", self.processors);

        let mut rules = Vec::with_capacity(self.link_updates.len());
        for (i, rule) in self.link_updates.into_iter().enumerate() {
            if rule.search_str.is_empty() {
                violations.push(format!("link_updates[{i}].search_str"), "must not be empty");
            }
            match rule.action.parse::<LinkAction>() {
                Ok(action) => rules.push(LinkRule::new(rule.search_str, action, rule.value)),
                Err(e) => violations.push(format!("link_updates[{i}].action"), e.to_string()),
            }
        }

        let mut names = HashSet::new();
        let mut sections = Vec::with_capacity(self.sections.len());
        for (i, raw) in self.sections.into_iter().enumerate() {
            let field = format!("sections[{i}]");
            if raw.name.trim().is_empty() {
                violations.push(format!("{field}.name"), "must not be empty");
            } else if !is_directory_name(&raw.name) {
                violations.push(format!("{field}.name"), "must be a single directory name");
            } else if !names.insert(raw.name.clone()) {
                violations.push(format!("{field}.name"), format!("duplicate section '{}'", raw.name));
            }
            if let Some(section) = raw.validate(&field, &mut violations) {
                sections.push(section);
            }
        }

        for (field, dirs) in [("static_dirs", &self.static_dirs), ("exclude_dirs", &self.exclude_dirs)] {
            for (k, dir) in dirs.iter().enumerate() {
                for (i, section) in sections.iter().enumerate() {
                    for source in section.source_paths() {
                        if source.components().any(|c| c.as_os_str() == dir.as_str()) {
                            violations.push(
                                format!("{field}[{k}]"),
                                format!(
                                    "'{dir}' overlaps source '{}' of section '{}' (sections[{i}])",
                                    source.display(),
                                    section.name
                                ),
                            );
                        }
                    }
                }
            }
        }

        let mut special_files = Vec::with_capacity(self.special_files.len());
        for (i, raw) in self.special_files.into_iter().enumerate() {
            let field = format!("special_files[{i}]");
            let file = violations.relative_path(&format!("{field}.file"), &raw.file);
            match raw.processor.parse::<SpecialProcessor>() {
                Ok(processor) => special_files.push(SpecialFileRule {
                    file,
                    processor,
                    input_dir: raw.input_dir.as_deref().map(InputDir::from).unwrap_or_default(),
                }),
                Err(e) => violations.push(format!("{field}.processor"), e.to_string()),
            }
        }

        if self.weight_step == 0 && self.auto_weight {
            violations.push("weight_step", "must be positive when auto_weight is set");
        }

        if let Some(violations) = NonEmpty::from_vec(violations.0) {
            return Err(ConfigurationError::Invalid { origin, violations });
        }

        Ok(Policy {
            origin,
            auto_weight: self.auto_weight,
            weight_base: self.weight_base,
            weight_step: self.weight_step,
            exclude_dirs: self.exclude_dirs,
            static_dirs: self.static_dirs,
            sanitize_list: self.sanitize_list,
            doc_versions: self.doc_dirs,
            template: self.front_matter.template.map(Template::new).unwrap_or_default(),
            default_tags: self.front_matter.tags.into(),
            product: self.front_matter.product,
            processors,
            link_rewriter: LinkRewriter::new(rules),
            sections,
            special_files,
        })
    }
}

impl RawSection {
    fn validate(self, field: &str, violations: &mut Violations) -> Option<Section> {
        let processors = violations.processors(&format!("{field}.processors"), self.processors);

        let strategy = match self.strategy.as_str() {
            "arrange" => {
                let mut destinations = HashSet::new();
                let mut files = Vec::with_capacity(self.files.len());
                for (j, raw) in self.files.into_iter().enumerate() {
                    let field = format!("{field}.files[{j}]");
                    let entry = raw.validate(&field, violations);
                    let output = entry.output_path();
                    if !destinations.insert(output.clone()) {
                        violations.push(
                            format!("{field}.dst_file"),
                            format!("duplicate destination '{}'", output.display()),
                        );
                    }
                    files.push(entry);
                }
                Strategy::Arrange { files }
            }
            "split_markdown_by_heading" | "split_by_heading" => {
                let src_file = violations.relative_path(
                    &format!("{field}.src_file"),
                    self.src_file.as_deref().unwrap_or_default(),
                );
                let depth = match self.strategy_params.first() {
                    None => DEFAULT_SPLIT_DEPTH,
                    Some(&depth) => match u8::try_from(depth) {
                        Ok(depth @ 1..=6) => depth,
                        _ => {
                            violations.push(
                                format!("{field}.strategy_params[0]"),
                                format!("heading depth {depth} is outside 1..=6"),
                            );
                            DEFAULT_SPLIT_DEPTH
                        }
                    },
                };
                let preamble = match self.preamble.as_deref().map(str::parse::<Preamble>) {
                    None => Preamble::default(),
                    Some(Ok(preamble)) => preamble,
                    Some(Err(e)) => {
                        violations.push(format!("{field}.preamble"), e.to_string());
                        Preamble::default()
                    }
                };
                Strategy::SplitByHeading {
                    src_file,
                    splitter: HeadingSplitter::new(depth, preamble),
                }
            }
            "" => {
                violations.push(format!("{field}.strategy"), "missing strategy");
                return None;
            }
            other => {
                violations.push(
                    format!("{field}.strategy"),
                    format!(
                        "unknown strategy '{other}' (expected arrange or split_markdown_by_heading)"
                    ),
                );
                return None;
            }
        };

        Some(Section {
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            description: self.description,
            tags: self.tags.into(),
            keywords: self.keywords.into(),
            kind: self.kind,
            weight_base: self.weight_base,
            processors,
            strategy,
        })
    }
}

impl RawFileEntry {
    fn validate(self, field: &str, violations: &mut Violations) -> FileEntry {
        let src_file = violations.relative_path(&format!("{field}.src_file"), &self.src_file);

        let dst_file = match self.dst_file {
            Some(dst) => violations.relative_path(&format!("{field}.dst_file"), &dst),
            None if !self.name.trim().is_empty() => {
                let name = violations.relative_path(&format!("{field}.name"), &self.name);
                if name.extension().is_some_and(|ext| ext == "md") {
                    name
                } else {
                    PathBuf::from(format!("{}.md", self.name))
                }
            }
            None => src_file.with_extension("md"),
        };

        FileEntry {
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            description: self.description,
            src_file,
            dst_file,
            tags: self.tags.into(),
            keywords: self.keywords.into(),
            aliases: self.aliases.into(),
            weight: self.weight,
            processors: violations.processors(&format!("{field}.processors"), self.processors),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_case::test_case;

    use super::*;

    const POLICY: &str = r#"
auto_weight: true
static_dirs: [images, javadoc, generated]
exclude_dirs: [markdown]
sanitize_list: [streams.md]
doc_dirs: ["39", "40"]
front_matter:
  tags: [kafka, docs]
  template: |
    ---
    title: {title}
    weight: {weight}
    ---
processors:
  - strip_html_comments
link_updates:
  - search_str: /documentation/
    action: substitute
    value: /
  - search_str: /javadoc/
    action: prefix
    value: /
sections:
  - name: getting-started
    title: Getting Started
    strategy: arrange
    tags: quickstart
    files:
      - name: introduction
        title: Introduction
        src_file: introduction.md
      - name: uses
        title: Use Cases
        src_file: uses.md
        dst_file: use-cases.md
        processors:
          - promote_section: Migration to KRaft
  - name: operations
    title: Operations
    strategy: split_markdown_by_heading
    strategy_params: [2]
    preamble: intro
    src_file: ops.md
special_files:
  - file: committers.md
    processor: committers
  - file: powered-by.html
    processor: powered-by
    input_dir: source
future_key: ignored
"#;

    fn violation_fields(err: &ConfigurationError) -> Vec<String> {
        err.violations()
            .expect("policy should parse")
            .iter()
            .map(|v| v.field.clone())
            .collect()
    }

    #[test]
    fn parses_full_policy() {
        let policy = Policy::from_yaml_str(POLICY).unwrap();

        assert!(policy.auto_weight());
        assert_eq!(policy.doc_versions(), ["39", "40"]);
        assert_eq!(policy.default_tags(), ["kafka", "docs"]);
        assert_eq!(policy.product(), DEFAULT_PRODUCT);
        assert_eq!(policy.processors(), [Processor::StripHtmlComments]);
        assert_eq!(policy.link_rewriter().rules().len(), 2);
        assert_eq!(policy.sections().len(), 2);
        assert!(policy.template().as_str().starts_with("---\ntitle: {title}\n"));

        let started = policy.section("getting-started").unwrap();
        assert_eq!(started.tags, ["quickstart"]);
        let Strategy::Arrange { files } = &started.strategy else {
            panic!("expected arrange");
        };
        assert_eq!(files[0].dst_file, Path::new("introduction.md"));
        assert_eq!(files[1].dst_file, Path::new("use-cases.md"));
        assert_eq!(
            files[1].processors,
            [Processor::PromoteSection("Migration to KRaft".to_string())]
        );

        let operations = policy.section("operations").unwrap();
        let Strategy::SplitByHeading { src_file, splitter } = &operations.strategy else {
            panic!("expected split");
        };
        assert_eq!(src_file, Path::new("ops.md"));
        assert_eq!(*splitter, HeadingSplitter::new(2, Preamble::Intro));

        assert_eq!(policy.special_files()[1].processor, SpecialProcessor::PoweredBy);
        assert_eq!(policy.special_files()[1].input_dir, InputDir::Source);
        assert!(policy.is_sanitized(Path::new("streams.md")));
    }

    #[test]
    fn sample_policy_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("process.yaml");
        let policy = Policy::load(&path).unwrap();
        assert_eq!(policy.sections().len(), 2);
        assert_eq!(policy.special_files().len(), 2);
    }

    #[test]
    fn weights_step_from_base() {
        let policy = Policy::from_yaml_str(POLICY).unwrap();
        let section = &policy.sections()[0];
        let weights: Vec<u32> = (0..7).map(|i| policy.weight_for(section, i)).collect();
        assert_eq!(weights, [10, 20, 30, 40, 50, 60, 70]);
        assert_eq!(Policy::section_weight(0), 1);
    }

    #[test]
    fn section_weight_base_overrides_policy() {
        let policy = Policy::from_yaml_str(
            "weight_step: 5\nsections:\n  - name: a\n    strategy: arrange\n    weight_base: 100\n",
        )
        .unwrap();
        assert_eq!(policy.weight_for(&policy.sections()[0], 2), 110);
    }

    #[test]
    fn empty_policy_uses_defaults() {
        let policy = Policy::from_yaml_str("").unwrap();
        assert!(policy.auto_weight());
        assert_eq!(policy.weight_base(), 10);
        assert_eq!(policy.weight_step(), 10);
        assert_eq!(policy.template(), &Template::default());
        assert!(policy.sections().is_empty());
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let err =
            Policy::from_yaml_str("sections:\n  - name: a\n    strategy: shuffle\n").unwrap_err();
        assert_eq!(violation_fields(&err), ["sections[0].strategy"]);
        assert!(err.to_string().contains("unknown strategy 'shuffle'"));
    }

    #[test_case("../40"; "parent prefix")]
    #[test_case(".."; "parent")]
    #[test_case("."; "current")]
    #[test_case("/tmp/out"; "absolute")]
    #[test_case("docs/ops"; "nested")]
    fn section_name_must_stay_inside_version(name: &str) {
        let yaml = format!("sections:\n  - name: '{name}'\n    strategy: arrange\n");
        let err = Policy::from_yaml_str(&yaml).unwrap_err();
        assert_eq!(violation_fields(&err), ["sections[0].name"]);
        assert!(err.to_string().contains("single directory name"));
    }

    #[test]
    fn converted_destinations_must_be_unique() {
        let yaml = r"
sections:
  - name: s
    strategy: arrange
    files:
      - { name: first, src_file: a.md, dst_file: upgrade.html }
      - { name: second, src_file: b.md, dst_file: upgrade.md }
";
        let err = Policy::from_yaml_str(yaml).unwrap_err();
        assert_eq!(violation_fields(&err), ["sections[0].files[1].dst_file"]);
        assert!(err.to_string().contains("duplicate destination 'upgrade.md'"));
    }

    #[test]
    fn reports_every_violation_with_its_field() {
        let yaml = r"
link_updates:
  - search_str: x
    action: append
sections:
  - name: a
    strategy: arrange
    files:
      - name: one
        src_file: ''
      - name: two
        src_file: ../escape.md
      - name: one
        src_file: one.md
  - name: a
    strategy: split_by_heading
    strategy_params: [9]
    src_file: big.md
";
        let err = Policy::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            violation_fields(&err),
            [
                "link_updates[0].action",
                "sections[0].files[0].src_file",
                "sections[0].files[1].src_file",
                "sections[0].files[2].dst_file",
                "sections[1].name",
                "sections[1].strategy_params[0]",
            ]
        );
    }

    #[test]
    fn static_dirs_must_not_overlap_sources() {
        let yaml = "static_dirs: [generated]\nsections:\n  - name: a\n    strategy: arrange\n    \
                    files:\n      - name: cfg\n        src_file: generated/config.md\n";
        let err = Policy::from_yaml_str(yaml).unwrap_err();
        assert_eq!(violation_fields(&err), ["static_dirs[0]"]);
    }

    #[test]
    fn unknown_processor_is_rejected() {
        let yaml = "processors: [shout]\n";
        let err = Policy::from_yaml_str(yaml).unwrap_err();
        assert_eq!(violation_fields(&err), ["processors[0]"]);
    }

    #[test]
    fn display_truncates_long_violation_lists() {
        let yaml = "doc_dirs: ['', '', '', '', '', '', '']\n";
        let message = Policy::from_yaml_str(yaml).unwrap_err().to_string();
        assert!(message.ends_with("... (and 2 more)"), "{message}");
    }

    #[test]
    fn load_reads_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            b"doc_dirs = [\"39\"]\n\n[[sections]]\nname = \"a\"\nstrategy = \"arrange\"\n\n[[sections.files]]\nname = \"x\"\nsrc_file = \"x.md\"\n",
        )
        .unwrap();

        let policy = Policy::load(file.path()).unwrap();
        assert_eq!(policy.doc_versions(), ["39"]);
        assert_eq!(policy.sections()[0].source_paths(), [Path::new("x.md")]);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Policy::load(&tmp.path().join("process.yaml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Read { .. }));
    }

    #[test]
    fn load_malformed_yaml_is_parse_error() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"sections: {not: [a list").unwrap();
        let err = Policy::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigurationError::Yaml { .. }));
    }
}
