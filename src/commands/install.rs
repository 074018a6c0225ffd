//! Install command implementation

use crate::cli::InstallArgs;
use crate::commands::helpers::{Context, PromptPort, drive_job, parse_target, print_plan};
use crate::error::Result;
use crate::job::manager::JobManager;
use crate::resolver::{InstallRequest, Planner, Request};

/// Run install command
pub fn run(ctx: &Context, args: InstallArgs) -> Result<()> {
    let repository = ctx.open_repository()?;
    let store = ctx.open_store()?;

    let targets = args
        .extensions
        .iter()
        .map(|s| parse_target(s))
        .collect::<Result<Vec<_>>>()?;

    let request = Request::Install(InstallRequest {
        targets,
        namespace: ctx.namespace.clone(),
        upgrade: false,
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
