//! Operation execution records.
//!
//! # State Machine
//!
//! ```text
//!              complete(out, inout)
//!   Running ────────────────────────► Completed
//!      │
//!      │       fail(message)
//!      └────────────────────────────► Failed
//! ```
//!
//! A record is created `Running` together with its handle and moves to a
//! terminal state exactly once. Transition methods refuse to touch a
//! terminal record, so late or duplicate completions are no-ops.

mod executor;

pub(crate) use executor::{invoke_async, invoke_sync};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use twin_model::OperationVariable;
use twin_types::{ErrorCode, HandleId, RequestId};

/// Execution state of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    Running,
    Completed,
    Failed,
}

impl ExecutionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Handle returned to the caller of an asynchronous invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle {
    pub handle_id: HandleId,
    pub request_id: RequestId,
}

/// What an asset operation provider returns on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationOutput {
    pub output: Vec<OperationVariable>,
    pub inoutput: Vec<OperationVariable>,
}

/// Stored state of one operation execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub request_id: RequestId,
    pub execution_state: ExecutionState,
    pub input_arguments: Vec<OperationVariable>,
    pub output_arguments: Vec<OperationVariable>,
    pub inoutput_arguments: Vec<OperationVariable>,
    /// Failure reason, set when the execution failed.
    pub message: Option<String>,
}

impl OperationResult {
    /// A fresh `Running` record holding the caller's arguments.
    #[must_use]
    pub fn running(
        request_id: RequestId,
        input_arguments: Vec<OperationVariable>,
        inoutput_arguments: Vec<OperationVariable>,
    ) -> Self {
        Self {
            request_id,
            execution_state: ExecutionState::Running,
            input_arguments,
            output_arguments: Vec::new(),
            inoutput_arguments,
            message: None,
        }
    }

    /// Moves a running record to `Completed`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::AlreadyTerminal`] and leaves the record
    /// untouched if it is no longer running.
    pub fn complete(
        &mut self,
        output_arguments: Vec<OperationVariable>,
        inoutput_arguments: Vec<OperationVariable>,
    ) -> Result<(), OperationError> {
        self.ensure_running()?;
        self.execution_state = ExecutionState::Completed;
        self.output_arguments = output_arguments;
        self.inoutput_arguments = inoutput_arguments;
        Ok(())
    }

    /// Moves a running record to `Failed`.
    ///
    /// Outputs stay empty and the in-out arguments keep the values the
    /// caller passed in.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::AlreadyTerminal`] and leaves the record
    /// untouched if it is no longer running.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), OperationError> {
        self.ensure_running()?;
        self.execution_state = ExecutionState::Failed;
        self.output_arguments.clear();
        self.message = Some(message.into());
        Ok(())
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.execution_state.is_terminal()
    }

    fn ensure_running(&self) -> Result<(), OperationError> {
        if self.is_terminal() {
            return Err(OperationError::AlreadyTerminal(self.execution_state));
        }
        Ok(())
    }
}

/// Invalid operation state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation already finished with state {0:?}")]
    AlreadyTerminal(ExecutionState),
}

impl ErrorCode for OperationError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyTerminal(_) => "OPERATION_ALREADY_TERMINAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
