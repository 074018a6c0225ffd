//! Version command implementation
//!
//! Prints the binary version together with the effective configuration:
//! where installed state lives and which registry targets resolve against.

use crate::commands::helpers::Context;
use crate::error::Result;

/// Run version command
pub fn run(ctx: &Context) -> Result<()> {
    println!("extman {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Configuration:");

    match ctx.resolve_state_dir() {
        Ok(dir) => println!("  State dir: {}", dir.display()),
        Err(_) => println!("  State dir: (unavailable; pass --state-dir)"),
    }

    match &ctx.registry {
        Some(path) => println!("  Registry: {}", path.display()),
        None => println!("  Registry: (not configured)"),
    }

    println!("  Namespace: {}", ctx.namespace);

    Ok(())
}
