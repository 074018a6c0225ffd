//! Search command implementation

use console::Style;

use crate::cli::SearchArgs;
use crate::commands::helpers::Context;
use crate::error::Result;
use crate::repository::Repository;

/// Run search command
pub fn run(ctx: &Context, args: SearchArgs) -> Result<()> {
    let repository = ctx.open_repository()?;
    let results = repository.search(&args.query)?;

    if results.is_empty() {
        println!("No extensions matching '{}'.", args.query);
        return Ok(());
    }

    println!("Found {} release(s):", results.len());
    for extension in results {
        let deps = extension.dependencies.len();
        let suffix = match deps {
            0 => String::new(),
            1 => " (1 dependency)".to_string(),
            n => format!(" ({n} dependencies)"),
        };
        println!(
            "  {}{}",
            Style::new().bold().apply_to(extension.id.to_string()),
            Style::new().dim().apply_to(suffix)
        );
    }

    Ok(())
}
