//! Running a policy over every version.
//!
//! The [`Restructurer`] walks versions in policy order and, within a version,
//! sections in declared order. Versions share nothing but the read-only
//! policy and layout, and each writes only inside its own output subtree, so
//! they may be processed in parallel. Problems are recorded in the
//! [`RunReport`] instead of aborting the run.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    domain::{Policy, Strategy},
    storage::{
        Arranger, Issue, Layout, RunReport, SectionReport, StaticAssetError, VersionReport,
        report::digest_tree,
        special_files,
        static_assets::{self, Scope},
    },
};

/// Settings for one run, fixed when the run starts.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Process only these versions. Policy order is kept either way.
    pub versions: Option<Vec<String>>,
    /// Process versions on the rayon thread pool.
    pub parallel: bool,
    /// Compute a digest of each version's output tree.
    pub digest: bool,
    /// Checked before each version starts; once set, no further version is
    /// started. A version already in progress always runs to completion.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Options {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// Applies a policy to a workspace.
#[derive(Debug, Clone)]
pub struct Restructurer {
    policy: Policy,
    layout: Layout,
}

impl Restructurer {
    /// Create a restructurer for an already validated policy.
    #[must_use]
    pub const fn new(policy: Policy, layout: Layout) -> Self {
        Self { policy, layout }
    }

    /// The policy being applied.
    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The workspace layout.
    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The versions a run with `options` would process, in policy order.
    #[must_use]
    pub fn selected_versions(&self, options: &Options) -> Vec<&str> {
        let all = self.policy.doc_versions().iter().map(String::as_str);
        match &options.versions {
            None => all.collect(),
            Some(wanted) => {
                for version in wanted {
                    if !self.policy.doc_versions().contains(version) {
                        tracing::warn!("version {version} is not in the policy; ignoring it");
                    }
                }
                all.filter(|v| wanted.iter().any(|w| w == v)).collect()
            }
        }
    }

    /// Run the policy.
    ///
    /// Every version, then every shared static directory, then every special
    /// file is processed. Nothing here is fatal: problems are recorded in
    /// the returned report.
    #[must_use]
    pub fn run(&self, options: &Options) -> RunReport {
        let versions = self.selected_versions(options);
        tracing::info!(
            "restructuring {} versions from {}",
            versions.len(),
            self.layout.input().display()
        );

        let results: Vec<Result<VersionReport, String>> = if options.parallel {
            versions
                .par_iter()
                .map(|version| self.run_if_live(version, options))
                .collect()
        } else {
            versions
                .iter()
                .map(|version| self.run_if_live(version, options))
                .collect()
        };

        let mut report = RunReport::default();
        for result in results {
            match result {
                Ok(version) => report.versions.push(version),
                Err(version) => report.cancelled.push(version),
            }
        }

        if !report.cancelled.is_empty() {
            tracing::warn!(
                "run cancelled; {} versions not processed",
                report.cancelled.len()
            );
            return report;
        }

        self.relocate_global_assets(&mut report);
        self.process_special_files(&mut report);

        tracing::info!(
            "wrote {} files across {} versions with {} issues",
            report.files_written(),
            report.versions.len(),
            report.issue_count()
        );
        report
    }

    fn run_if_live(&self, version: &str, options: &Options) -> Result<VersionReport, String> {
        if options.is_cancelled() {
            return Err(version.to_string());
        }
        Ok(self.run_version(version, options.digest))
    }

    /// Build every section of one version, then relocate its static
    /// directories.
    #[must_use]
    pub fn run_version(&self, version: &str, digest: bool) -> VersionReport {
        tracing::info!("processing version {version}");
        let mut report = VersionReport::new(version);
        let arranger = Arranger::new(&self.policy, &self.layout, version);

        if !self.layout.input_version(version).is_dir() {
            tracing::warn!(
                "input directory {} does not exist",
                self.layout.input_version(version).display()
            );
        }

        if let Err(issue) = arranger.write_version_index() {
            report.record(issue);
        }

        for (position, section) in self.policy.sections().iter().enumerate() {
            tracing::info!("{version}: section {} ({})", section.name, section.strategy.name());
            let mut section_report = SectionReport::new(&section.name);

            match arranger.reset_section(position, section) {
                Ok(index) => section_report.written.push(index),
                Err(issue) => {
                    section_report.record(version, issue);
                    report.sections.push(section_report);
                    continue;
                }
            }

            match &section.strategy {
                Strategy::Arrange { files } => {
                    arranger.arrange(section, files, &mut section_report);
                }
                Strategy::SplitByHeading { src_file, splitter } => {
                    arranger.split(section, src_file, *splitter, &mut section_report);
                }
            }

            report.sections.push(section_report);
        }

        for dir in self.policy.static_dirs() {
            match static_assets::relocate(&self.layout, Scope::Version(version), dir) {
                Ok(Some(relocation)) => report.assets.push(relocation),
                Ok(None) if static_assets::has_global(&self.layout, dir) => {
                    tracing::debug!("{version}: static directory {dir} is shared");
                }
                Ok(None) => report.record(Issue::StaticAsset(StaticAssetError::Missing {
                    dir: dir.clone(),
                    version: version.to_string(),
                })),
                Err(e) => report.record(e.into()),
            }
        }

        if digest {
            let root = self.layout.output_version(version);
            match digest_tree(&root) {
                Ok(hash) => report.digest = Some(hash),
                Err(source) => report.record(Issue::Read { path: root, source }),
            }
        }

        report
    }

    /// Relocate static directories found at the top of the input tree.
    fn relocate_global_assets(&self, report: &mut RunReport) {
        for dir in self.policy.static_dirs() {
            match static_assets::relocate(&self.layout, Scope::Global, dir) {
                Ok(Some(relocation)) => report.assets.push(relocation),
                Ok(None) => {}
                Err(e) => report.record(e.into()),
            }
        }
    }

    fn process_special_files(&self, report: &mut RunReport) {
        for rule in self.policy.special_files() {
            match special_files::process(rule, &self.layout) {
                Ok(path) => report.data_files.push(path),
                Err(source) => report.record(Issue::SpecialFile {
                    path: rule.file.clone(),
                    source,
                }),
            }
        }
    }
}
