//! Call attempts and the registry keyed by external call id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle of a placed call.
///
/// `Placed → Completed → Processed`, or `Placed/Completed → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Placed,
    Completed,
    Processed,
    Failed,
}

impl CallStatus {
    pub fn can_transition_to(self, target: CallStatus) -> bool {
        use CallStatus::{Completed, Failed, Placed, Processed};
        matches!(
            (self, target),
            (Placed, Completed) | (Completed, Processed) | (Placed, Failed) | (Completed, Failed)
        )
    }

    /// Still waiting on the telephony service or the pipeline.
    pub fn is_in_flight(self) -> bool {
        matches!(self, CallStatus::Placed | CallStatus::Completed)
    }
}

/// One test call placed by the explorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAttempt {
    /// Generated locally before the call is placed.
    pub correlation_id: String,
    /// Assigned by the telephony service.
    pub call_id: String,
    pub script: String,
    pub status: CallStatus,
    pub placed_at: DateTime<Utc>,
}

impl CallAttempt {
    pub fn new(correlation_id: String, call_id: String, script: String) -> Self {
        Self {
            correlation_id,
            call_id,
            script,
            status: CallStatus::Placed,
            placed_at: Utc::now(),
        }
    }

    /// Move to `target` if the lifecycle allows it. Returns false otherwise.
    pub fn transition(&mut self, target: CallStatus) -> bool {
        if !self.status.can_transition_to(target) {
            warn!(
                call_id = %self.call_id,
                from = ?self.status,
                to = ?target,
                "Rejected call status transition"
            );
            return false;
        }
        self.status = target;
        true
    }
}

/// Attempts indexed by external call id, remembering placement order.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: HashMap<String, CallAttempt>,
    order: Vec<String>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attempt: CallAttempt) {
        let call_id = attempt.call_id.clone();
        if self.calls.insert(call_id.clone(), attempt).is_none() {
            self.order.push(call_id);
        }
    }

    pub fn get(&self, call_id: &str) -> Option<&CallAttempt> {
        self.calls.get(call_id)
    }

    pub fn get_mut(&mut self, call_id: &str) -> Option<&mut CallAttempt> {
        self.calls.get_mut(call_id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.calls
            .values()
            .filter(|c| c.status.is_in_flight())
            .count()
    }

    /// Attempts in the order they were placed.
    pub fn iter(&self) -> impl Iterator<Item = &CallAttempt> {
        self.order.iter().filter_map(|id| self.calls.get(id))
    }
}
