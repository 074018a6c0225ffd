//! Shared plumbing for the CLI commands
//!
//! Opens the repository and installed store from the global options, parses
//! target expressions, drives submitted jobs (answering questions through
//! inquire), and renders plans and summaries.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::Style;
use inquire::Confirm;

use crate::cli::Cli;
use crate::error::{ExtmanError, Result};
use crate::extension::ExtensionId;
use crate::job::question::{ConfirmationPort, Question};
use crate::job::{JobHandle, JobState};
use crate::plan::{ActionKind, PlanAction};
use crate::progress::ProgressDisplay;
use crate::repository::{FileRepository, Repository};
use crate::resolver::Target;
use crate::store::{FileStore, InstalledStore};
use crate::version::{Version, VersionConstraint};

/// Global options every command needs, extracted from the parsed CLI before
/// the subcommand match takes ownership of its arguments.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_dir: Option<PathBuf>,
    pub registry: Option<PathBuf>,
    pub namespace: String,
    pub verbose: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Context {
            state_dir: cli.state_dir.clone(),
            registry: cli.registry.clone(),
            namespace: cli.namespace.clone(),
            verbose: cli.verbose,
        }
    }

    /// Effective state directory: the explicit option, or the per-user data
    /// directory.
    pub fn resolve_state_dir(&self) -> Result<PathBuf> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("extman"))
                .ok_or_else(|| ExtmanError::IoError {
                    message: "no per-user data directory available; pass --state-dir".to_string(),
                }),
        }
    }

    pub fn open_store(&self) -> Result<Arc<dyn InstalledStore>> {
        Ok(Arc::new(FileStore::open(self.resolve_state_dir()?)?))
    }

    pub fn open_repository(&self) -> Result<Arc<dyn Repository>> {
        let registry = self
            .registry
            .as_ref()
            .ok_or(ExtmanError::RegistryNotConfigured)?;
        Ok(Arc::new(FileRepository::open(registry)?))
    }
}

/// Parse a target expression: `name`, `name/version` (exact),
/// `name>=version` or `name=version`.
pub fn parse_target(input: &str) -> Result<Target> {
    if let Some((name, version)) = input.split_once('/') {
        return Ok(Target::Id(ExtensionId::new(
            name.trim(),
            Version::new(version.trim()),
        )));
    }

    if let Some(pos) = input.find(['>', '=']) {
        let name = input[..pos].trim().to_string();
        let constraint = VersionConstraint::parse(input[pos..].trim())?;
        return Ok(Target::Named { name, constraint });
    }

    Ok(Target::Named {
        name: input.trim().to_string(),
        constraint: VersionConstraint::Any,
    })
}

/// Confirmation port that prompts on the terminal. Dry runs hand it straight
/// to the planner; live runs hand it to `drive_job`, which relays the job's
/// questions through it.
pub struct PromptPort {
    pub assume_yes: bool,
}

impl ConfirmationPort for PromptPort {
    fn confirm(&self, question: Question) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        Ok(Confirm::new(&question.prompt).with_default(false).prompt()?)
    }
}

/// Drive a submitted job to completion: answer questions through the given
/// port, tick a progress bar off the job's log, and surface the job's error
/// as the command's error. If the port cannot produce an answer the job is
/// cancelled first, so the worker does not stay parked on the answer gate.
pub fn drive_job(handle: &JobHandle, port: &dyn ConfirmationPort, verbose: bool) -> Result<()> {
    let mut progress: Option<ProgressDisplay> = None;
    let mut seen_log = 0;

    loop {
        let state = handle.state();

        if progress.is_none() {
            if let Some(actions) = handle.actions() {
                let total = actions.iter().filter(|a| a.kind != ActionKind::None).count();
                if total > 0 && !verbose {
                    progress = Some(ProgressDisplay::new(total as u64));
                }
            }
        }

        for line in handle.log().iter().skip(seen_log) {
            seen_log += 1;
            if verbose {
                eprintln!("{line}");
            } else if let Some(pb) = &progress {
                if line.starts_with("Applying ") {
                    pb.update_action(line.trim_start_matches("Applying "));
                    pb.inc_action();
                }
            }
        }

        match state {
            JobState::WaitingForAnswer => {
                if let Some(question) = handle.question() {
                    match port.confirm(question) {
                        Ok(answer) => handle.answer(answer)?,
                        Err(error) => {
                            handle.cancel();
                            handle.wait();
                            if let Some(pb) = &progress {
                                pb.abandon();
                            }
                            return Err(error);
                        }
                    }
                }
            }
            s if s.is_terminal() => break,
            _ => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    let terminal = handle.state();

    if let Some(error) = handle.take_error() {
        if let Some(pb) = &progress {
            pb.abandon();
        }
        return Err(error);
    }

    if let Some(pb) = &progress {
        pb.finish();
    }

    if terminal == JobState::Cancelled {
        println!("Cancelled; already applied actions were kept.");
        return Ok(());
    }

    if let Some(actions) = handle.actions() {
        print_summary(&actions);
    }

    Ok(())
}

fn kind_style(kind: ActionKind) -> Style {
    match kind {
        ActionKind::None => Style::new().dim(),
        ActionKind::Install => Style::new().green(),
        ActionKind::Upgrade => Style::new().yellow(),
        ActionKind::Uninstall => Style::new().red(),
    }
}

/// Print the flattened plan, dependency actions indented.
pub fn print_plan(actions: &[PlanAction]) {
    if actions.is_empty() {
        println!("Nothing to do.");
        return;
    }

    println!("Plan ({} action(s)):", actions.len());
    for action in actions {
        let indent = if action.dependency { "    " } else { "  " };
        let kind = kind_style(action.kind).apply_to(action.kind.to_string());
        match (&action.previous, action.kind) {
            (Some(previous), ActionKind::Upgrade) => println!(
                "{indent}{kind} {} ({} -> {}) on {}",
                action.extension.id.name,
                previous.id().version,
                action.extension.id.version,
                action.namespace
            ),
            _ => println!(
                "{indent}{kind} {} on {}",
                action.extension.id, action.namespace
            ),
        }
    }
}

fn print_summary(actions: &[PlanAction]) {
    let applied: Vec<&PlanAction> = actions
        .iter()
        .filter(|a| a.kind != ActionKind::None)
        .collect();

    if applied.is_empty() {
        println!("Nothing to do; everything is already satisfied.");
        return;
    }

    for action in applied {
        let kind = kind_style(action.kind).apply_to(action.kind.to_string());
        println!("{kind} {} on {}", action.extension.id, action.namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_bare_name() {
        match parse_target("editor").unwrap() {
            Target::Named { name, constraint } => {
                assert_eq!(name, "editor");
                assert_eq!(constraint, VersionConstraint::Any);
            }
            Target::Id(_) => panic!("expected named target"),
        }
    }

    #[test]
    fn test_parse_target_exact_release() {
        match parse_target("editor/2.1").unwrap() {
            Target::Id(id) => {
                assert_eq!(id.name, "editor");
                assert_eq!(id.version, Version::new("2.1"));
            }
            Target::Named { .. } => panic!("expected exact release"),
        }
    }

    #[test]
    fn test_parse_target_with_constraint() {
        match parse_target("editor>=2.0").unwrap() {
            Target::Named { name, constraint } => {
                assert_eq!(name, "editor");
                assert_eq!(constraint, VersionConstraint::AtLeast(Version::new("2.0")));
            }
            Target::Id(_) => panic!("expected named target"),
        }

        match parse_target("editor=2.0").unwrap() {
            Target::Named { constraint, .. } => {
                assert_eq!(constraint, VersionConstraint::Exact(Version::new("2.0")));
            }
            Target::Id(_) => panic!("expected named target"),
        }
    }

    #[test]
    fn test_parse_target_rejects_bad_constraint() {
        assert!(parse_target("editor>=").is_err());
    }

    #[test]
    fn test_prompt_port_assume_yes() {
        let port = PromptPort { assume_yes: true };
        let question = Question::cascade_removal("core", "main", vec![]);
        assert!(port.confirm(question).unwrap());
    }

    struct FailingPort;

    impl ConfirmationPort for FailingPort {
        fn confirm(&self, _question: Question) -> Result<bool> {
            Err(ExtmanError::IoError {
                message: "prompt unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_drive_job_cancels_worker_when_confirmation_fails() {
        use crate::extension::{Extension, ExtensionDependency, LocalExtension};
        use crate::job::manager::JobManager;
        use crate::repository::MemoryRepository;
        use crate::resolver::{Request, UninstallRequest};
        use crate::store::MemoryStore;

        let store = Arc::new(MemoryStore::new());
        store
            .register(
                &LocalExtension::new(
                    Extension::new(ExtensionId::new("core", Version::new("1.0"))),
                    "main",
                    true,
                ),
                None,
            )
            .unwrap();
        let mut editor = Extension::new(ExtensionId::new("editor", Version::new("1.0")));
        editor.dependencies = vec![ExtensionDependency::new("core", VersionConstraint::Any)];
        store
            .register(&LocalExtension::new(editor, "main", true), None)
            .unwrap();

        let manager = JobManager::new(
            Arc::new(MemoryRepository::new()),
            Arc::clone(&store) as Arc<dyn InstalledStore>,
        );
        let handle = manager.submit(Request::Uninstall(UninstallRequest {
            names: vec!["core".to_string()],
            namespace: "main".to_string(),
            interactive: true,
        }));

        // The port fails instead of answering; the worker must not stay
        // parked on the gate
        let result = drive_job(&handle, &FailingPort, false);
        assert!(result.is_err());
        assert_eq!(handle.state(), JobState::Cancelled);
        assert!(store.get("core", "main").unwrap().is_some());
    }

    #[test]
    fn test_context_requires_registry() {
        let ctx = Context {
            state_dir: None,
            registry: None,
            namespace: "default".to_string(),
            verbose: false,
        };
        assert!(matches!(
            ctx.open_repository(),
            Err(ExtmanError::RegistryNotConfigured)
        ));
    }
}
