//! Show command implementation
//!
//! Prefers the installed store: a locally installed release is shown with
//! its installation state. Otherwise falls back to the repository.

use console::Style;

use crate::cli::ShowArgs;
use crate::commands::helpers::{Context, parse_target};
use crate::error::{ExtmanError, Result};
use crate::extension::Extension;
use crate::repository::{Repository, best_match};
use crate::resolver::Target;
use crate::store::InstalledStore;

/// Run show command
pub fn run(ctx: &Context, args: ShowArgs) -> Result<()> {
    let store = ctx.open_store()?;
    let target = parse_target(&args.name)?;

    let name = match &target {
        Target::Id(id) => id.name.clone(),
        Target::Named { name, .. } => name.clone(),
    };

    if let Some(local) = store.get(&name, &ctx.namespace)? {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&local)?);
            return Ok(());
        }
        print_extension(&local.extension);
        println!(
            "  {} {}",
            Style::new().bold().apply_to("Installed in:"),
            local
                .namespaces
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  {} {}",
            Style::new().bold().apply_to("Installed as:"),
            if local.direct { "direct" } else { "dependency" }
        );
        return Ok(());
    }

    let repository = ctx.open_repository()?;
    let extension = match target {
        Target::Id(id) => repository.resolve(&id)?,
        Target::Named { name, constraint } => best_match(repository.as_ref(), &name, &constraint)?
            .ok_or(ExtmanError::ExtensionNotFound { id: name })?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&extension)?);
        return Ok(());
    }
    print_extension(&extension);

    Ok(())
}

fn print_extension(extension: &Extension) {
    println!(
        "{}",
        Style::new().bold().yellow().apply_to(extension.id.to_string())
    );
    println!(
        "  {} {}",
        Style::new().bold().apply_to("Kind:"),
        extension.kind
    );

    if extension.dependencies.is_empty() {
        println!("  {} none", Style::new().bold().apply_to("Dependencies:"));
    } else {
        println!("  {}", Style::new().bold().apply_to("Dependencies:"));
        for dep in &extension.dependencies {
            println!("    {dep}");
        }
    }

    if !extension.suggestions.is_empty() {
        println!("  {}", Style::new().bold().apply_to("Suggestions:"));
        for dep in &extension.suggestions {
            println!("    {dep}");
        }
    }
}
