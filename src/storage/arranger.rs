//! Writing the documents of one section of one version.
//!
//! The [`Arranger`] turns a section's sources into output files: it loads
//! each source, runs the processor pipeline, rewrites links, synthesizes
//! front matter and writes the result. Weights and file names are pure
//! functions of the policy and the input, so re-running produces identical
//! output.

use std::path::{Path, PathBuf};

use crate::{
    domain::{
        front_matter::merge_tags, processor::run_pipeline, slug::INDEX_STEM, Body, Boundaries,
        Document, FileEntry, FrontMatter, HeadingSplitter, Policy, Processor, Section,
    },
    storage::{
        layout::version_label,
        markdown::{self, LoadError},
        Issue, Layout, SectionReport,
    },
};

/// Content type of version index pages.
const VERSION_INDEX_KIND: &str = "docs";

/// Builds the sections of one version.
#[derive(Debug, Clone, Copy)]
pub struct Arranger<'a> {
    policy: &'a Policy,
    layout: &'a Layout,
    version: &'a str,
}

impl<'a> Arranger<'a> {
    /// Create an arranger for `version`.
    #[must_use]
    pub const fn new(policy: &'a Policy, layout: &'a Layout, version: &'a str) -> Self {
        Self {
            policy,
            layout,
            version,
        }
    }

    /// Write the version's `_index.md`.
    ///
    /// # Errors
    ///
    /// Returns an issue if the file cannot be written.
    pub fn write_version_index(&self) -> Result<PathBuf, Issue> {
        let label = version_label(self.version);
        let product = self.policy.product();
        let front_matter = FrontMatter {
            title: format!("{product} {label}"),
            description: format!("Documentation for {product} {label}"),
            tags: self.policy.default_tags().to_vec(),
            kind: VERSION_INDEX_KIND.to_string(),
            ..FrontMatter::default()
        };

        let path = self
            .layout
            .output_version(self.version)
            .join(format!("{INDEX_STEM}.md"));
        markdown::write_front_matter(&path, &front_matter, self.policy.template())
            .map_err(|e| Issue::write(&path, e))?;
        Ok(path)
    }

    /// Remove anything left in the section directory by an earlier run and
    /// write the section's `_index.md`.
    ///
    /// `position` is the section's zero-based position in the policy.
    ///
    /// # Errors
    ///
    /// Returns an issue if the directory cannot be reset or the index cannot
    /// be written.
    pub fn reset_section(&self, position: usize, section: &Section) -> Result<PathBuf, Issue> {
        let dir = self.layout.section_dir(self.version, &section.name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| Issue::write(&dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| Issue::write(&dir, e))?;

        let mut tags = self.policy.default_tags().to_vec();
        merge_tags(&mut tags, &section.tags);
        let front_matter = FrontMatter {
            title: section.title.clone(),
            description: section.description.clone(),
            weight: Some(Policy::section_weight(position)),
            tags,
            aliases: Vec::new(),
            keywords: section.keywords.clone(),
            kind: section.kind.clone(),
        };

        let index = Path::new(&section.name).join(format!("{INDEX_STEM}.md"));
        let path = dir.join(format!("{INDEX_STEM}.md"));
        markdown::write_front_matter(&path, &front_matter, self.policy.template())
            .map_err(|e| Issue::write(&path, e))?;
        Ok(index)
    }

    /// Place every file entry of an [`Arrange`](crate::domain::Strategy::Arrange)
    /// section, in declared order.
    ///
    /// A missing source is recorded and skipped; the remaining entries are
    /// still written, and keep the weights their positions give them.
    pub fn arrange(&self, section: &Section, files: &[FileEntry], report: &mut SectionReport) {
        let input = self.layout.input_version(self.version);
        let dir = self.layout.section_dir(self.version, &section.name);

        for (index, entry) in files.iter().enumerate() {
            let source = input.join(&entry.src_file);
            let mut document = match markdown::read_document(&source, &entry.src_file) {
                Ok(document) => document,
                Err(LoadError::NotFound) => {
                    report.record(
                        self.version,
                        Issue::MissingSource {
                            entry: entry.name.clone(),
                            path: entry.src_file.clone(),
                        },
                    );
                    continue;
                }
                Err(LoadError::Io(e)) => {
                    report.record(self.version, Issue::Read { path: source, source: e });
                    continue;
                }
            };

            let weight = if self.policy.auto_weight() {
                Some(self.policy.weight_for(section, index))
            } else {
                entry.weight
            };

            document.weight = weight;
            document.front_matter = FrontMatter {
                title: entry.title.clone(),
                description: entry.description.clone(),
                weight,
                tags: self.tags(section, &entry.tags),
                aliases: entry.aliases.clone(),
                keywords: entry.keywords.clone(),
                kind: section.kind.clone(),
            };
            document.body = self.finish(section, &entry.processors, document.body, &entry.src_file);

            let destination = entry.output_path();
            tracing::debug!(
                "{}/{}: {} -> {} (weight {weight:?})",
                self.version,
                section.name,
                entry.src_file.display(),
                destination.display()
            );
            self.write(&dir, &section.name, &destination, &document, report);
        }
    }

    /// Split the section's single source into one document per heading.
    pub fn split(
        &self,
        section: &Section,
        src_file: &Path,
        splitter: HeadingSplitter,
        report: &mut SectionReport,
    ) {
        let source = self.layout.input_version(self.version).join(src_file);
        let document = match markdown::read_document(&source, src_file) {
            Ok(document) => document,
            Err(LoadError::NotFound) => {
                report.record(
                    self.version,
                    Issue::MissingSource {
                        entry: section.name.clone(),
                        path: src_file.to_path_buf(),
                    },
                );
                return;
            }
            Err(LoadError::Io(e)) => {
                report.record(self.version, Issue::Read { path: source, source: e });
                return;
            }
        };

        let split = splitter.split(&document.body, &section.title);
        match split.boundaries {
            Boundaries::Found(n) => tracing::debug!(
                "{}/{}: split {} into {n} parts at depth {}",
                self.version,
                section.name,
                src_file.display(),
                splitter.depth()
            ),
            Boundaries::NoneAtDepth => tracing::debug!(
                "{}/{}: {} has no depth {} headings; writing it whole",
                self.version,
                section.name,
                src_file.display(),
                splitter.depth()
            ),
            Boundaries::NoHeadings => report.record(
                self.version,
                Issue::SplitBoundary {
                    path: src_file.to_path_buf(),
                },
            ),
        }

        let dir = self.layout.section_dir(self.version, &section.name);
        for (index, part) in split.parts.into_iter().enumerate() {
            let weight = Some(self.policy.weight_for(section, index));
            let mut sub = Document::new(src_file, Body::default());
            sub.weight = weight;
            sub.front_matter = FrontMatter {
                title: part.title.clone(),
                description: part.title,
                weight,
                tags: self.tags(section, &[]),
                aliases: Vec::new(),
                keywords: Vec::new(),
                kind: section.kind.clone(),
            };
            sub.body = self.finish(section, &[], part.body, src_file);

            self.write(&dir, &section.name, Path::new(&part.slug.file_name()), &sub, report);
        }
    }

    /// Policy tags, then section tags, then `extra`, without duplicates.
    fn tags(&self, section: &Section, extra: &[String]) -> Vec<String> {
        let mut tags = self.policy.default_tags().to_vec();
        merge_tags(&mut tags, &section.tags);
        merge_tags(&mut tags, extra);
        tags
    }

    /// Run the processor pipeline, then rewrite links unless the source is
    /// sanitized.
    fn finish(&self, section: &Section, entry: &[Processor], body: Body, source: &Path) -> Body {
        let pipeline = self
            .policy
            .processors()
            .iter()
            .chain(&section.processors)
            .chain(entry);
        let body = run_pipeline(body, pipeline);

        if self.policy.is_sanitized(source) {
            tracing::debug!("{} is sanitized; links left as-is", source.display());
            body
        } else {
            self.policy.link_rewriter().rewrite_body(body)
        }
    }

    fn write(
        &self,
        dir: &Path,
        section: &str,
        destination: &Path,
        document: &Document,
        report: &mut SectionReport,
    ) {
        let path = dir.join(destination);
        match markdown::write_document(&path, document, self.policy.template()) {
            Ok(()) => report.written.push(Path::new(section).join(destination)),
            Err(e) => report.record(self.version, Issue::write(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::domain::Strategy;

    const POLICY: &str = r#"
doc_dirs: ["39"]
sanitize_list: [raw.md]
front_matter:
  tags: [kafka]
  template: "---\ntitle: {title}\nweight: {weight}\ntags: {tags}\ntype: {type}\n---"
processors: [strip_html_comments]
link_updates:
  - search_str: .html
    action: substitute
    value: /
sections:
  - name: getting-started
    title: Getting Started
    strategy: arrange
    tags: [intro]
    files:
      - name: introduction
        title: Introduction
        src_file: introduction.md
        tags: [intro, basics]
      - name: uses
        title: Use Cases
        src_file: uses.md
      - name: raw
        title: Raw
        src_file: raw.md
        dst_file: raw.html
        processors: [promote_headings]
  - name: operations
    title: Operations
    strategy: split_markdown_by_heading
    strategy_params: [2]
    src_file: ops.md
"#;

    struct Fixture {
        _tmp: TempDir,
        layout: Layout,
        policy: Policy,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let layout = Layout::new(tmp.path());
            let input = layout.input_version("39");
            fs::create_dir_all(&input).unwrap();
            fs::write(
                input.join("introduction.md"),
                "<!-- generated -->\n# Intro\n\nSee [design](design.html).\n",
            )
            .unwrap();
            fs::write(input.join("raw.md"), "## Raw\n\n[keep](x.html)\n").unwrap();
            fs::write(
                input.join("ops.md"),
                "lead\n## Monitoring\nmetrics [m](m.html)\n### JMX\n## Security\ntls\n",
            )
            .unwrap();
            Self {
                _tmp: tmp,
                layout,
                policy: Policy::from_yaml_str(POLICY).unwrap(),
            }
        }

        fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.layout.output_version("39").join(relative)).unwrap()
        }
    }

    #[test]
    fn arranges_entries_and_records_missing_sources() {
        let fixture = Fixture::new();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        let section = &fixture.policy.sections()[0];
        let Strategy::Arrange { files } = &section.strategy else {
            panic!("expected arrange");
        };

        let mut report = SectionReport::new(&section.name);
        arranger.reset_section(0, section).unwrap();
        arranger.arrange(section, files, &mut report);

        assert_eq!(
            report.written,
            [
                Path::new("getting-started/introduction.md"),
                Path::new("getting-started/raw.md"),
            ]
        );
        assert_eq!(report.issues.len(), 1);
        assert!(matches!(&report.issues[0], Issue::MissingSource { entry, .. } if entry == "uses"));

        assert_eq!(
            fixture.read("getting-started/introduction.md"),
            "---\ntitle: \"Introduction\"\nweight: 10\ntags: [\"kafka\", \"intro\", \"basics\"]\ntype: \
             \"docs\"\n---\n\n# Intro\n\nSee [design](design/).\n"
        );
        // The missing entry keeps its slot, so the third entry gets weight 30.
        let raw = fixture.read("getting-started/raw.md");
        assert!(raw.contains("weight: 30\n"), "{raw}");
        assert!(raw.ends_with("# Raw\n\n[keep](x.html)\n"), "{raw}");
    }

    #[test]
    fn explicit_weights_without_auto_weight() {
        let tmp = TempDir::new().unwrap();
        let layout = Layout::new(tmp.path());
        let input = layout.input_version("39");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("a.md"), "# A\n").unwrap();
        fs::write(input.join("b.md"), "# B\n").unwrap();
        let policy = Policy::from_yaml_str(
            r"
auto_weight: false
sections:
  - name: s
    strategy: arrange
    files:
      - { name: a, src_file: a.md, weight: 7 }
      - { name: b, src_file: b.md }
",
        )
        .unwrap();
        let arranger = Arranger::new(&policy, &layout, "39");
        let section = &policy.sections()[0];
        let Strategy::Arrange { files } = &section.strategy else {
            panic!("expected arrange");
        };

        let mut report = SectionReport::new(&section.name);
        arranger.reset_section(0, section).unwrap();
        arranger.arrange(section, files, &mut report);

        assert!(report.is_success(), "{:?}", report.issues);
        let read = |name: &str| fs::read_to_string(layout.section_dir("39", "s").join(name)).unwrap();
        assert!(read("a.md").contains("\nweight: 7\n"));
        assert!(read("b.md").contains("\nweight: \n"));
    }

    #[test]
    fn section_index_carries_position_weight() {
        let fixture = Fixture::new();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        let section = &fixture.policy.sections()[1];

        let index = arranger.reset_section(1, section).unwrap();

        assert_eq!(index, Path::new("operations/_index.md"));
        assert_eq!(
            fixture.read("operations/_index.md"),
            "---\ntitle: \"Operations\"\nweight: 2\ntags: [\"kafka\"]\ntype: \"docs\"\n---\n"
        );
    }

    #[test]
    fn reset_removes_stale_files() {
        let fixture = Fixture::new();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        let section = &fixture.policy.sections()[1];
        let stale = fixture.layout.section_dir("39", "operations").join("stale.md");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        arranger.reset_section(1, section).unwrap();
        assert!(!stale.exists());
    }

    #[test]
    fn splits_into_weighted_parts() {
        let fixture = Fixture::new();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        let section = &fixture.policy.sections()[1];
        let Strategy::SplitByHeading { src_file, splitter } = &section.strategy else {
            panic!("expected split");
        };

        let mut report = SectionReport::new(&section.name);
        arranger.split(section, src_file, *splitter, &mut report);

        assert!(report.is_success());
        assert_eq!(
            report.written,
            [
                Path::new("operations/monitoring.md"),
                Path::new("operations/security.md"),
            ]
        );
        assert_eq!(
            fixture.read("operations/monitoring.md"),
            "---\ntitle: \"Monitoring\"\nweight: 10\ntags: [\"kafka\"]\ntype: \"docs\"\n---\n\n## \
             Monitoring\nmetrics [m](m/)\n### JMX"
        );
        assert!(fixture.read("operations/security.md").contains("weight: 20\n"));
    }

    #[test]
    fn split_without_headings_is_recorded() {
        let fixture = Fixture::new();
        fs::write(fixture.layout.input_version("39").join("ops.md"), "just text\n").unwrap();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        let section = &fixture.policy.sections()[1];
        let Strategy::SplitByHeading { src_file, splitter } = &section.strategy else {
            panic!("expected split");
        };

        let mut report = SectionReport::new(&section.name);
        arranger.split(section, src_file, *splitter, &mut report);

        assert_eq!(report.written, [Path::new("operations/operations.md")]);
        assert!(matches!(report.issues[..], [Issue::SplitBoundary { .. }]));
    }

    #[test]
    fn version_index_title_uses_label() {
        let fixture = Fixture::new();
        let arranger = Arranger::new(&fixture.policy, &fixture.layout, "39");
        arranger.write_version_index().unwrap();
        assert!(fixture.read("_index.md").starts_with("---\ntitle: \"AK 3.9.X\"\n"));
    }
}
