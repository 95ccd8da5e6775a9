//! Structured error handling and exit codes.

use serde::Serialize;

use crate::actions::ExecuteError;
use crate::dedupe::ValidationError;
use crate::scanner::IndexError;

/// Exit codes for the dupetree application.
///
/// - 0: Success (completed normally)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates (nothing scheduled for deletion)
/// - 3: Partial success (some files could not be moved or hashed)
/// - 4: Validation failed (the plan was refused, nothing was touched)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: nothing is scheduled for deletion.
    NoDuplicates = 2,
    /// Partial success: completed, but some files failed.
    PartialSuccess = 3,
    /// Validation failed: the deletion plan was refused.
    ValidationFailed = 4,
    /// Interrupted: the run was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DT000",
            Self::GeneralError => "DT001",
            Self::NoDuplicates => "DT002",
            Self::PartialSuccess => "DT003",
            Self::ValidationFailed => "DT004",
            Self::Interrupted => "DT130",
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<IndexError>() {
            if matches!(e, IndexError::Interrupted { .. }) {
                return Self::Interrupted;
            }
        }
        if err.downcast_ref::<ValidationError>().is_some() {
            return Self::ValidationFailed;
        }
        if let Some(ExecuteError::Validation(_)) = err.downcast_ref::<ExecuteError>() {
            return Self::ValidationFailed;
        }
        Self::GeneralError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DT001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
