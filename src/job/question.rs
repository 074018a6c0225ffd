//! Interactive question protocol
//!
//! Destructive steps ask for confirmation through a `ConfirmationPort`
//! before proceeding. An interactive job routes the question through its
//! answer gate to whoever drives the job; a non-interactive job fails the
//! step outright instead of blocking forever.

use crate::error::{ExtmanError, Result};
use crate::extension::ExtensionId;

/// A typed question raised before a destructive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Human-readable prompt.
    pub prompt: String,

    /// Extension releases affected if the answer is yes.
    pub affected: Vec<ExtensionId>,
}

impl Question {
    /// Question raised when uninstalling an extension that other installed
    /// extensions still depend on.
    pub fn cascade_removal(name: &str, namespace: &str, affected: Vec<ExtensionId>) -> Self {
        let listed: Vec<String> = affected.iter().map(ToString::to_string).collect();
        Question {
            prompt: format!(
                "{} installed extension(s) depend on '{}' in namespace '{}' ({}); uninstall them as well?",
                affected.len(),
                name,
                namespace,
                listed.join(", ")
            ),
            affected,
        }
    }
}

/// How a planner gets destructive steps confirmed.
pub trait ConfirmationPort {
    /// Ask for confirmation. `Ok(false)` is an explicit refusal; an error
    /// means the question could not be asked (non-interactive run,
    /// cancellation, timeout).
    fn confirm(&self, question: Question) -> Result<bool>;
}

/// Port for jobs not run interactively: destructive confirmations fail
/// outright, reported rather than silently skipped.
pub struct NonInteractive;

impl ConfirmationPort for NonInteractive {
    fn confirm(&self, question: Question) -> Result<bool> {
        Err(ExtmanError::ConfirmationRequired {
            prompt: question.prompt,
        })
    }
}

/// Port that answers every question with a fixed value, for callers that
/// pre-confirm destructive steps.
pub struct FixedAnswer(pub bool);

impl ConfirmationPort for FixedAnswer {
    fn confirm(&self, _question: Question) -> Result<bool> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    #[test]
    fn test_cascade_prompt_lists_affected() {
        let q = Question::cascade_removal(
            "core",
            "main",
            vec![ExtensionId::new("editor", Version::new("1.0"))],
        );
        assert!(q.prompt.contains("core"));
        assert!(q.prompt.contains("editor/1.0"));
        assert_eq!(q.affected.len(), 1);
    }

    #[test]
    fn test_non_interactive_port_reports() {
        let q = Question::cascade_removal("core", "main", vec![]);
        assert!(matches!(
            NonInteractive.confirm(q),
            Err(ExtmanError::ConfirmationRequired { .. })
        ));
    }

    #[test]
    fn test_fixed_answer_port() {
        let q = Question::cascade_removal("core", "main", vec![]);
        assert_eq!(FixedAnswer(true).confirm(q.clone()).unwrap(), true);
        assert_eq!(FixedAnswer(false).confirm(q).unwrap(), false);
    }
}
