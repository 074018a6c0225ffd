//! Progress bar display for plan execution

use indicatif::{ProgressBar, ProgressStyle};

/// Progress display over a job's planned actions
pub struct ProgressDisplay {
    action_pb: ProgressBar,
}

impl ProgressDisplay {
    /// Create a new progress display with total action count
    pub fn new(total_actions: u64) -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let action_pb = ProgressBar::new(total_actions);
        action_pb.set_style(style);

        Self { action_pb }
    }

    /// Update to show the action currently being applied
    pub fn update_action(&self, description: &str) {
        self.action_pb.set_message(description.to_string());
    }

    /// Increment action progress
    pub fn inc_action(&self) {
        self.action_pb.inc(1);
    }

    /// Finish all progress
    pub fn finish(&self) {
        self.action_pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.action_pb.abandon();
    }
}
