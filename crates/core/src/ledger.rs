//! Append-only execution ledger for one calculation run.
//!
//! Every source fetch pushes exactly one step and finalizes it once to a
//! terminal status. The ledger is handed to the pipeline by `&mut`, so a
//! single ledger cannot be mutated by two fetches at the same time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a ledger step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Skipped)
    }
}

/// One diagnostic record in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// 1-based position within the run.
    pub step: usize,
    pub action: String,
    pub status: StepStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Time of the last mutation.
    pub timestamp: DateTime<Utc>,
}

/// Position of a step inside an [`ExecutionLedger`].
pub type StepIndex = usize;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLedger {
    steps: Vec<ExecutionStep>,
}

impl ExecutionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `running` step and return its index.
    pub fn push(
        &mut self,
        action: impl Into<String>,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> StepIndex {
        self.append(StepStatus::Running, action.into(), message.into(), details)
    }

    /// Append a `pending` step and return its index.
    pub fn push_pending(
        &mut self,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> StepIndex {
        self.append(StepStatus::Pending, action.into(), message.into(), None)
    }

    fn append(
        &mut self,
        status: StepStatus,
        action: String,
        message: String,
        details: Option<Value>,
    ) -> StepIndex {
        let index = self.steps.len();
        self.steps.push(ExecutionStep {
            step: index + 1,
            action,
            status,
            message,
            details,
            timestamp: Utc::now(),
        });
        index
    }

    /// Move a step to a terminal status in place.
    ///
    /// Returns `false` (and leaves the step untouched) when the index is
    /// unknown, the step is already terminal, or `status` is not terminal.
    /// `details: None` keeps whatever details the step already carried.
    pub fn finalize(
        &mut self,
        index: StepIndex,
        status: StepStatus,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> bool {
        let Some(step) = self.steps.get_mut(index) else {
            tracing::warn!(index, "finalize on unknown ledger step");
            return false;
        };
        if step.status.is_terminal() || !status.is_terminal() {
            tracing::warn!(
                step = step.step,
                current = ?step.status,
                requested = ?status,
                "refusing ledger step transition"
            );
            return false;
        }
        step.status = status;
        step.message = message.into();
        if details.is_some() {
            step.details = details;
        }
        step.timestamp = Utc::now();
        true
    }

    pub fn get(&self, index: StepIndex) -> Option<&ExecutionStep> {
        self.steps.get(index)
    }

    pub fn is_terminal(&self, index: StepIndex) -> bool {
        self.get(index).is_some_and(|s| s.status.is_terminal())
    }

    pub fn last(&self) -> Option<&ExecutionStep> {
        self.steps.last()
    }

    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<ExecutionStep> {
        self.steps
    }
}
