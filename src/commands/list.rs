//! List command implementation

use console::Style;

use crate::cli::ListArgs;
use crate::commands::helpers::Context;
use crate::error::Result;
use crate::store::InstalledStore;

/// Run list command
pub fn run(ctx: &Context, args: ListArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let installed = store.installed(&ctx.namespace)?;

    if installed.is_empty() {
        println!("No extensions installed in namespace '{}'.", ctx.namespace);
        return Ok(());
    }

    println!(
        "Installed extensions in '{}' ({}):",
        ctx.namespace,
        installed.len()
    );
    println!();

    for local in installed {
        let marker = if local.direct { "" } else { " (dependency)" };
        println!(
            "  {}{}",
            Style::new().bold().yellow().apply_to(local.id().to_string()),
            Style::new().dim().apply_to(marker)
        );

        if args.detailed {
            if local.extension.dependencies.is_empty() {
                println!("    {} none", Style::new().bold().apply_to("Dependencies:"));
            } else {
                println!("    {}", Style::new().bold().apply_to("Dependencies:"));
                for dep in &local.extension.dependencies {
                    println!("      {dep}");
                }
            }
            println!(
                "    {} {}",
                Style::new().bold().apply_to("Namespaces:"),
                local
                    .namespaces
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!();
        }
    }

    Ok(())
}
