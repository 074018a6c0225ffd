//! Extman - extension manager
//!
//! A command line tool that resolves extension dependency trees against a
//! repository, plans install/upgrade/uninstall actions per namespace, and
//! applies them as cancellable, question-capable jobs.

use clap::Parser;

mod cli;
mod commands;
mod error;
mod executor;
mod extension;
mod job;
mod plan;
mod progress;
mod repository;
mod resolver;
mod store;
mod version;

use cli::{Cli, Commands};
use commands::helpers::Context;

fn main() {
    let cli = Cli::parse();
    let ctx = Context::from_cli(&cli);

    let result = match cli.command {
        Commands::Install(args) => commands::install::run(&ctx, args),
        Commands::Upgrade(args) => commands::upgrade::run(&ctx, args),
        Commands::Uninstall(args) => commands::uninstall::run(&ctx, args),
        Commands::List(args) => commands::list::run(&ctx, args),
        Commands::Show(args) => commands::show::run(&ctx, args),
        Commands::Search(args) => commands::search::run(&ctx, args),
        Commands::Version => commands::version::run(&ctx),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
