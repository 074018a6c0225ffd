use clap::Parser;

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show dependency information for each installed extension
    #[arg(long, short = 'd')]
    pub detailed: bool,
}
