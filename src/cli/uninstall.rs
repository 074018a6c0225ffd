use clap::Parser;

/// Arguments for the uninstall command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Uninstall an extension:\n    extman uninstall editor\n\n\
                   Confirm cascading removals up front:\n    extman uninstall core --yes")]
pub struct UninstallArgs {
    /// Extensions to uninstall, by name
    #[arg(required = true)]
    pub extensions: Vec<String>,

    /// Answer yes to every confirmation question (cascading removals included)
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show the resolved plan without applying it
    #[arg(long)]
    pub dry_run: bool,
}
