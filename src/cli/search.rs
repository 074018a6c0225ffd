use clap::Parser;

/// Arguments for the search command
#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Substring matched against extension names
    pub query: String,
}
