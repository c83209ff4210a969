use std::path::{Path, PathBuf};

mod check;
mod run;
mod sections;
mod terminal;
mod verify;

use check::Check;
use clap::ArgAction;
use mdarrange::{Layout, Policy};
use run::Run;
use sections::Sections;
use tracing::instrument;
use verify::Verify;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The root of the documentation workspace
    #[arg(short, long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// The policy file [default: <WORKSPACE>/process.yaml]
    #[arg(short, long, global = true)]
    policy: Option<PathBuf>,

    #[command(flatten)]
    paths: PathOverrides,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Overrides for the default workspace layout.
#[derive(Debug, Default, clap::Args)]
struct PathOverrides {
    /// Pre-processed markdown [default: <WORKSPACE>/interim]
    #[arg(long, value_name = "DIR", global = true)]
    input: Option<PathBuf>,

    /// Raw site files [default: <WORKSPACE>/source]
    #[arg(long, value_name = "DIR", global = true)]
    source: Option<PathBuf>,

    /// Arranged content [default: <WORKSPACE>/output/content/en]
    #[arg(long, value_name = "DIR", global = true)]
    content: Option<PathBuf>,

    /// Static assets [default: <WORKSPACE>/output/static]
    #[arg(long = "static-dir", value_name = "DIR", global = true)]
    static_root: Option<PathBuf>,

    /// Data files [default: <WORKSPACE>/output/data]
    #[arg(long, value_name = "DIR", global = true)]
    data: Option<PathBuf>,
}

impl PathOverrides {
    fn apply(self, mut layout: Layout) -> Layout {
        if let Some(input) = self.input {
            layout = layout.with_input(input);
        }
        if let Some(source) = self.source {
            layout = layout.with_source(source);
        }
        if let Some(content) = self.content {
            layout = layout.with_content(content);
        }
        if let Some(static_root) = self.static_root {
            layout = layout.with_static_root(static_root);
        }
        if let Some(data) = self.data {
            layout = layout.with_data(data);
        }
        layout
    }
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let policy = self
            .policy
            .unwrap_or_else(|| self.workspace.join("process.yaml"));
        let workspace = Workspace {
            layout: self.paths.apply(Layout::new(self.workspace)),
            policy,
        };

        self.command
            .unwrap_or_else(|| Command::Check(Check::default()))
            .run(&workspace)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// Where a command finds its policy and its files.
#[derive(Debug)]
pub struct Workspace {
    layout: Layout,
    policy: PathBuf,
}

impl Workspace {
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn policy_path(&self) -> &Path {
        &self.policy
    }

    #[instrument(level = "debug", skip(self), fields(policy = %self.policy.display()))]
    pub fn load_policy(&self) -> anyhow::Result<Policy> {
        Ok(Policy::load(&self.policy)?)
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Validate the policy (default)
    Check(Check),

    /// Restructure every version described by the policy
    ///
    /// Section directories are cleared and rewritten, so repeated runs over
    /// the same input produce the same tree.
    Run(Run),

    /// List sections and the files they will produce
    Sections(Sections),

    /// Check a finished output tree
    Verify(Verify),
}

impl Command {
    fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        match self {
            Self::Check(command) => command.run(workspace),
            Self::Run(command) => command.run(workspace),
            Self::Sections(command) => command.run(workspace),
            Self::Verify(command) => command.run(workspace),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
