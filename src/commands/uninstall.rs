//! Uninstall command implementation

use crate::cli::UninstallArgs;
use crate::commands::helpers::{Context, PromptPort, drive_job, print_plan};
use crate::error::Result;
use crate::job::manager::JobManager;
use crate::repository::{MemoryRepository, Repository};
use crate::resolver::{Planner, Request, UninstallRequest};
use std::sync::Arc;

/// Run uninstall command
pub fn run(ctx: &Context, args: UninstallArgs) -> Result<()> {
    let store = ctx.open_store()?;

    // Uninstalls never touch the repository, so none needs to be configured
    let repository: Arc<dyn Repository> = match ctx.open_repository() {
        Ok(repo) => repo,
        Err(_) => Arc::new(MemoryRepository::new()),
    };

    let request = Request::Uninstall(UninstallRequest {
        names: args.extensions.clone(),
        namespace: ctx.namespace.clone(),
        interactive: true,
    });

    let port = PromptPort {
        assume_yes: args.yes,
    };

    if args.dry_run {
        let plan = Planner::new(repository.as_ref(), store.as_ref(), &port).plan(&request)?;
        print_plan(&plan.actions());
        return Ok(());
    }

    let manager = JobManager::new(repository, store);
    let handle = manager.submit(request);
    drive_job(&handle, &port, ctx.verbose)
}
