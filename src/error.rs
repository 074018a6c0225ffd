//! Error types and handling for extman
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! The taxonomy mirrors how errors are consumed:
//! - resolution errors are fatal and surfaced to the caller without retry
//! - conflict errors become hard failures or interactive questions
//! - repository I/O errors are eligible for a bounded retry during fetch
//! - execution errors halt the remaining plan, applied actions stand
//! - job protocol errors (confirmation, timeout, cancellation) are attached
//!   to the job status

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for extman operations
#[derive(Error, Diagnostic, Debug)]
pub enum ExtmanError {
    // Resolution errors
    #[error("No version of '{name}' satisfies constraint '{constraint}'")]
    #[diagnostic(
        code(extman::resolve::failed),
        help("Check the extension name and loosen the version constraint if possible")
    )]
    ResolutionFailed { name: String, constraint: String },

    #[error("Extension '{id}' not found in repository")]
    #[diagnostic(code(extman::repository::not_found))]
    ExtensionNotFound { id: String },

    // Conflict errors
    #[error("Conflicting constraints for '{name}': '{existing}' cannot be merged with '{requested}'")]
    #[diagnostic(
        code(extman::resolve::constraint_conflict),
        help("Two dependents require incompatible versions of the same extension")
    )]
    ConstraintConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("Cyclic dependency detected: {chain}")]
    #[diagnostic(
        code(extman::resolve::cyclic),
        help("Remove the dependency cycle from the extension metadata")
    )]
    CyclicDependency { chain: String },

    #[error("Cannot uninstall '{name}' from namespace '{namespace}': still required by {dependents}")]
    #[diagnostic(
        code(extman::resolve::uninstall_blocked),
        help("Uninstall the dependents first, or run interactively to confirm a cascading removal")
    )]
    UninstallBlocked {
        name: String,
        namespace: String,
        dependents: String,
    },

    #[error("A more recent version of '{name}' is already installed ({installed} > {requested})")]
    #[diagnostic(code(extman::resolve::newer_installed))]
    NewerVersionInstalled {
        name: String,
        installed: String,
        requested: String,
    },

    #[error("Extension '{name}' is not installed in namespace '{namespace}'")]
    #[diagnostic(code(extman::store::not_installed))]
    NotInstalled { name: String, namespace: String },

    // Repository I/O errors (transient, retry-eligible during fetch)
    #[error("Repository I/O failure: {message}")]
    #[diagnostic(
        code(extman::repository::io),
        help("Transient storage or transport failure; the executor retries fetches a bounded number of times")
    )]
    RepositoryIo { message: String },

    // Execution errors
    #[error("Failed to apply {kind} of '{id}' on namespace '{namespace}': {reason}")]
    #[diagnostic(
        code(extman::execute::failed),
        help("Actions already applied are not rolled back; re-run to resume the remaining plan")
    )]
    ExecutionFailed {
        kind: String,
        id: String,
        namespace: String,
        reason: String,
    },

    // Job protocol errors
    #[error("Destructive step requires confirmation: {prompt}")]
    #[diagnostic(
        code(extman::job::confirmation_required),
        help("Run the job interactively, or pass --yes to confirm destructive steps up front")
    )]
    ConfirmationRequired { prompt: String },

    #[error("Timed out waiting for an answer to: {prompt}")]
    #[diagnostic(code(extman::job::answer_timeout))]
    AnswerTimeout { prompt: String },

    #[error("Job was cancelled")]
    #[diagnostic(code(extman::job::cancelled))]
    Cancelled,

    // Version errors
    #[error("Invalid version constraint: {input}")]
    #[diagnostic(
        code(extman::version::invalid_constraint),
        help("Valid forms: '*', '1.2', '>=1.2', '=1.2'")
    )]
    InvalidVersionConstraint { input: String },

    // Configuration / file system errors (CLI surface)
    #[error("No extension repository configured")]
    #[diagnostic(
        code(extman::config::no_registry),
        help("Pass --registry <DIR> or set EXTMAN_REGISTRY to a directory containing index.json")
    )]
    RegistryNotConfigured,

    #[error("Failed to read {path}: {reason}")]
    #[diagnostic(code(extman::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    #[diagnostic(code(extman::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(extman::fs::io_error))]
    IoError { message: String },
}

impl ExtmanError {
    /// Whether the error is a transient repository failure worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtmanError::RepositoryIo { .. })
    }
}

impl From<std::io::Error> for ExtmanError {
    fn from(err: std::io::Error) -> Self {
        ExtmanError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExtmanError {
    fn from(err: serde_json::Error) -> Self {
        ExtmanError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for ExtmanError {
    fn from(err: inquire::InquireError) -> Self {
        ExtmanError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ExtmanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtmanError::ExtensionNotFound {
            id: "macro-vim/1.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Extension 'macro-vim/1.0' not found in repository"
        );
    }

    #[test]
    fn test_error_code() {
        let err = ExtmanError::CyclicDependency {
            chain: "a -> b -> a".to_string(),
        };
        assert_eq!(
            err.code().map(|c| c.to_string()),
            Some("extman::resolve::cyclic".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExtmanError = io_err.into();
        assert!(matches!(err, ExtmanError::IoError { .. }));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("not json");
        let err: ExtmanError = parse_result.unwrap_err().into();
        assert!(matches!(err, ExtmanError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_transient_classification() {
        assert!(
            ExtmanError::RepositoryIo {
                message: "connection reset".to_string()
            }
            .is_transient()
        );
        assert!(
            !ExtmanError::ResolutionFailed {
                name: "x".to_string(),
                constraint: "*".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_conflict_message_names_both_constraints() {
        let err = ExtmanError::ConstraintConflict {
            name: "office".to_string(),
            existing: "=1.0".to_string(),
            requested: ">=2.0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("=1.0"));
        assert!(msg.contains(">=2.0"));
        assert!(msg.contains("office"));
    }
}
