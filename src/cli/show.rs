use clap::Parser;

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Extension name, or name/version for a specific release
    pub name: String,

    /// Print the metadata as JSON
    #[arg(long)]
    pub json: bool,
}
