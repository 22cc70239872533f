//! Final run statistics.

use crate::models::{RunState, WalletSession};
use std::fmt;

const RULE_WIDTH: usize = 50;

/// Aggregate result of a completed run, ready to print.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    /// Percentage, `None` when no attempt was made.
    pub success_rate: Option<f64>,
    pub explorer_link: String,
}

impl Summary {
    pub fn new(state: &RunState, wallet: &WalletSession, explorer_url: &str) -> Self {
        Self {
            total: state.attempts_completed,
            successful: state.success_count,
            failed: state.failure_count,
            success_rate: state.success_rate(),
            explorer_link: wallet.explorer_link(explorer_url),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "AUTO SWAP COMPLETED")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total Swaps: {}", self.total)?;
        writeln!(f, "Successful: {}", self.successful)?;
        writeln!(f, "Failed: {}", self.failed)?;
        match self.success_rate {
            Some(rate) => writeln!(f, "Success Rate: {rate:.2}%")?,
            None => writeln!(f, "Success Rate: n/a")?,
        }
        writeln!(f, "Explorer: {}", self.explorer_link)?;
        write!(f, "{rule}")
    }
}
