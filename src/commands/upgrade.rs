//! Upgrade command implementation

use crate::cli::UpgradeArgs;
use crate::commands::helpers::{Context, PromptPort, drive_job, parse_target, print_plan};
use crate::error::Result;
use crate::job::manager::JobManager;
use crate::resolver::{InstallRequest, Planner, Request, Target};
use crate::store::InstalledStore;
use crate::version::VersionConstraint;

/// Run upgrade command
pub fn run(ctx: &Context, args: UpgradeArgs) -> Result<()> {
    let repository = ctx.open_repository()?;
    let store = ctx.open_store()?;

    let targets = if args.extensions.is_empty() {
        // Upgrade everything installed directly; dependencies follow their
        // dependents' constraints.
        store
            .installed(&ctx.namespace)?
            .into_iter()
            .filter(|local| local.direct)
            .map(|local| Target::Named {
                name: local.id().name.clone(),
                constraint: VersionConstraint::Any,
            })
            .collect()
    } else {
        args.extensions
            .iter()
            .map(|s| parse_target(s))
            .collect::<Result<Vec<_>>>()?
    };

    if targets.is_empty() {
        println!("Nothing installed directly in namespace '{}'.", ctx.namespace);
        return Ok(());
    }

    let request = Request::Install(InstallRequest {
        targets,
        namespace: ctx.namespace.clone(),
        upgrade: true,
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
