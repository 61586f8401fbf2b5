//! Final exploration summary.

use std::fmt;

use serde::Serialize;

use crate::tree::DecisionTree;

/// Why exploration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The cumulative tree has no unresolved branches left.
    Converged,
    /// The configured call cap was reached with branches still unresolved.
    CallBudgetExhausted,
    PlacementFailed,
    RetrievalFailed,
    /// Shutdown requested before convergence.
    Interrupted,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Converged => "tree complete",
            Self::CallBudgetExhausted => "call budget exhausted",
            Self::PlacementFailed => "call placement failed",
            Self::RetrievalFailed => "recording retrieval failed",
            Self::Interrupted => "interrupted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplorationSummary {
    pub reason: TerminationReason,
    pub calls_placed: usize,
    /// Recording references, in processing order.
    pub recordings: Vec<String>,
    /// Correlation ids of the stored call artifacts, in processing order.
    pub artifacts: Vec<String>,
    /// Frontier paths left in the final tree, rendered `A -> B`.
    pub unresolved: Vec<String>,
    pub final_tree: DecisionTree,
}

impl fmt::Display for ExplorationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Exploration Summary ===")?;
        writeln!(f, "Stopped: {} ({} calls placed)", self.reason, self.calls_placed)?;
        writeln!(f, "Call Recording URLs:")?;
        for (i, url) in self.recordings.iter().enumerate() {
            writeln!(f, "Call {}: {}", i + 1, url)?;
        }
        if !self.unresolved.is_empty() {
            writeln!(f, "Unresolved branches:")?;
            for path in &self.unresolved {
                writeln!(f, "  {path}")?;
            }
        }
        writeln!(f, "\nFinal Decision Tree:")?;
        writeln!(f, "{}", self.final_tree.to_pretty_json())?;
        write!(f, "=== End of Summary ===")
    }
}
