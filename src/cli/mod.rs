//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - upgrade: Upgrade command arguments
//! - uninstall: Uninstall command arguments
//! - list: List command arguments
//! - show: Show command arguments
//! - search: Search command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod list;
pub mod search;
pub mod show;
pub mod uninstall;
pub mod upgrade;

pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use list::ListArgs;
pub use search::SearchArgs;
pub use show::ShowArgs;
pub use uninstall::UninstallArgs;
pub use upgrade::UpgradeArgs;

/// Extman - extension manager
///
/// Resolve, plan and apply extension installs, upgrades and uninstalls
/// against a repository of published releases.
#[derive(Parser, Debug)]
#[command(
    name = "extman",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Dependency-aware extension manager",
    long_about = "Extman resolves extension dependency trees against a repository, plans the \
                  minimal set of install, upgrade and uninstall actions, and applies them to \
                  a namespace-scoped installed store.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  extman install editor                  \x1b[90m# Install the best matching version\x1b[0m\n   \
                  extman install editor/2.1              \x1b[90m# Install an exact version\x1b[0m\n   \
                  extman install 'editor>=2.0' --dry-run \x1b[90m# Show the plan without applying it\x1b[0m\n   \
                  extman upgrade                         \x1b[90m# Upgrade everything installed directly\x1b[0m\n   \
                  extman uninstall editor --yes          \x1b[90m# Uninstall, confirming cascades up front\x1b[0m\n   \
                  extman list                            \x1b[90m# List installed extensions\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// State directory holding the installed store (defaults to a per-user data directory)
    #[arg(long, short = 's', global = true, env = "EXTMAN_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Repository directory containing index.json and artifacts
    #[arg(long, short = 'r', global = true, env = "EXTMAN_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Namespace the command operates on
    #[arg(long, short = 'n', global = true, env = "EXTMAN_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Enable verbose output (prints the job's progress log)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install extensions and their dependencies
    Install(InstallArgs),

    /// Upgrade installed extensions to the best available versions
    Upgrade(UpgradeArgs),

    /// Remove installed extensions
    Uninstall(UninstallArgs),

    /// List installed extensions
    List(ListArgs),

    /// Show extension information
    Show(ShowArgs),

    /// Search the repository
    Search(SearchArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
