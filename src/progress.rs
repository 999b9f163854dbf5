//! Progress reporting for batch cleaning.
//!
//! The session never prints to the console itself; callers install a
//! [`ProgressReporter`] and receive one update per column during a batch.

use serde::{Deserialize, Serialize};

/// Progress of a batch cleaning pass, emitted once per column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Column currently being processed.
    pub column: String,
    /// 1-based position of this column in the batch.
    pub current: usize,
    /// Number of columns in the batch.
    pub total: usize,
    /// Human-readable message describing current activity.
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(column: impl Into<String>, current: usize, total: usize) -> Self {
        let column = column.into();
        let message = format!("Cleaning column '{}' ({}/{})", column, current, total);
        Self {
            column,
            current,
            total,
            message,
        }
    }

    /// Completed fraction of the batch (0.0 - 1.0).
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f32 / self.total as f32).clamp(0.0, 1.0)
        }
    }
}

/// Trait for receiving progress updates during a batch clean.
///
/// Implementations must be `Send + Sync` so a session can be driven from a
/// background thread while the updates are forwarded to a UI.
pub trait ProgressReporter: Send + Sync {
    /// Called once per column during `clean_columns`.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
