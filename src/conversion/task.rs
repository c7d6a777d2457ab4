//! Conversion task record and its state machine.

use chrono::{DateTime, Utc};
use mediaforge_common::{MediaKind, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Lifecycle state of a conversion task.
///
/// Tasks move strictly along `preparing -> processing -> (ready | error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Preparing,
    Processing,
    Ready,
    Error,
}

impl TaskState {
    /// `true` for `ready` and `error`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Ready | TaskState::Error)
    }

    /// Whether `self -> next` is an adjacent forward step.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Preparing, TaskState::Processing)
                | (TaskState::Processing, TaskState::Ready)
                | (TaskState::Processing, TaskState::Error)
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => write!(f, "preparing"),
            Self::Processing => write!(f, "processing"),
            Self::Ready => write!(f, "ready"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A refused state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal task transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: TaskState,
    pub to: TaskState,
}

/// One requested media transformation.
///
/// `output_path` is set iff the state is `ready`; `error_detail` is set iff
/// the state is `error`. The transition methods are the only mutators and
/// keep both pairings intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionTask {
    pub id: TaskId,
    pub kind: MediaKind,
    pub source_filename: String,
    pub target_format: String,
    state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversionTask {
    pub fn new(kind: MediaKind, source_filename: String, target_format: String) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            kind,
            source_filename,
            target_format,
            state: TaskState::Preparing,
            output_path: None,
            error_detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    fn advance(&mut self, next: TaskState) -> Result<(), IllegalTransition> {
        if !self.state.can_transition_to(next) {
            return Err(IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn begin_processing(&mut self) -> Result<(), IllegalTransition> {
        self.advance(TaskState::Processing)
    }

    pub fn complete(&mut self, output_path: PathBuf) -> Result<(), IllegalTransition> {
        self.advance(TaskState::Ready)?;
        self.output_path = Some(output_path);
        Ok(())
    }

    pub fn fail(&mut self, detail: impl Into<String>) -> Result<(), IllegalTransition> {
        self.advance(TaskState::Error)?;
        self.error_detail = Some(detail.into());
        Ok(())
    }
}

/// Published by the manager every time a task state is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub state: TaskState,
}
