use clap::Parser;

/// Arguments for the upgrade command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Upgrade one extension:\n    extman upgrade editor\n\n\
                   Upgrade everything installed directly:\n    extman upgrade")]
pub struct UpgradeArgs {
    /// Extensions to upgrade; when omitted, every directly installed
    /// extension in the namespace is upgraded
    pub extensions: Vec<String>,

    /// Answer yes to every confirmation question
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show the resolved plan without applying it
    #[arg(long)]
    pub dry_run: bool,
}
