//! Error types used by the decorator layer and by wrapped task bodies.
//!
//! This module defines a single enum, [`TaskError`]:
//!
//! - [`TaskError::AlreadyWrapped`] and [`TaskError::CaptureReleased`] are
//!   **usage errors**: integration bugs, fatal to the failing call, never
//!   retried internally.
//! - [`TaskError::Fail`] is the error channel for the wrapped body itself;
//!   the decorator propagates it untouched.
//!
//! Participant failures inside the CRR protocol are *not* represented here:
//! they are caught and logged at the [`TransmitSet`](crate::TransmitSet)
//! boundary and never reach the caller.
//!
//! The type provides helper methods (`as_label`, `as_message`) for
//! logging/metrics and [`TaskError::is_usage`] to distinguish integration
//! bugs from body failures.

use thiserror::Error;

/// # Errors produced by wrapping and running transmitting tasks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The task handed to `wrap` is already a transmitting decorator and the
    /// idempotent flag was not set.
    #[error("task is already wrapped by a transmitting decorator")]
    AlreadyWrapped,

    /// The decorator's capture was already consumed by a previous run
    /// (`release_after_run`); the wrapped body was not invoked.
    #[error("capture was already released by a previous run")]
    CaptureReleased,

    /// The wrapped body failed; carries the body's own error message.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use ctxflow::TaskError;
    ///
    /// assert_eq!(TaskError::AlreadyWrapped.as_label(), "already_wrapped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::AlreadyWrapped => "already_wrapped",
            TaskError::CaptureReleased => "capture_released",
            TaskError::Fail { .. } => "task_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::AlreadyWrapped => "already wrapped".to_string(),
            TaskError::CaptureReleased => "capture released".to_string(),
            TaskError::Fail { error } => format!("error: {error}"),
        }
    }

    /// Indicates whether the error is an integration bug (misuse of the
    /// decorator API) rather than a failure of the wrapped body.
    ///
    /// # Example
    /// ```
    /// use ctxflow::TaskError;
    ///
    /// assert!(TaskError::CaptureReleased.is_usage());
    /// assert!(!TaskError::Fail { error: "boom".into() }.is_usage());
    /// ```
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            TaskError::AlreadyWrapped | TaskError::CaptureReleased
        )
    }
}
