use clap::Parser;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install the best matching version:\n    extman install editor\n\n\
                   Install an exact version:\n    extman install editor/2.1\n\n\
                   Install with a minimum version:\n    extman install 'editor>=2.0'\n\n\
                   Preview the plan without applying:\n    extman install editor --dry-run")]
pub struct InstallArgs {
    /// Extensions to install: name, name/version (exact) or name>=version
    #[arg(required = true)]
    pub extensions: Vec<String>,

    /// Answer yes to every confirmation question
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show the resolved plan without applying it
    #[arg(long)]
    pub dry_run: bool,
}
