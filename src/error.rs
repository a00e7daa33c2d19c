//! Error types for the monitor, queue, stage, and pipeline layers.
//!
//! Each layer gets its own enum rather than one crate-wide error, so a caller
//! matching on a [`QueueError`] never has to reason about stage- or
//! pipeline-level variants that could never reach them.

use thiserror::Error;

/// Errors raised by [`crate::monitor::Monitor`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The associated mutex was poisoned by a panicking holder.
    #[error("monitor's associated mutex was poisoned")]
    Poisoned,
}

/// Errors raised by [`crate::queue::BoundedQueue`].
#[derive(Debug, Error)]
pub enum QueueError {
    /// `capacity` was zero, or a name/argument was empty where one was required.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An operation was attempted on a queue that was never initialized.
    #[error("queue is not initialized")]
    Uninitialized,
    /// The queue's internal condition variable reported a fatal error.
    #[error("monitor failure: {0}")]
    Monitor(#[from] MonitorError),
}

/// Errors raised by [`crate::stage::Stage`].
#[derive(Debug, Error)]
pub enum StageError {
    /// Stage construction failed (bad name, missing transform, bad capacity).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The stage's worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    ResourceExhaustion(String),
    /// The stage's inbox reported an error.
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Errors raised by [`crate::pipeline::Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No stage names were supplied.
    #[error("a pipeline needs at least one stage")]
    Empty,
    /// A named transform is not in the registry.
    #[error("unknown transform: {0}")]
    UnknownTransform(String),
    /// A stage failed during build/init/attach/feed/await/finalize.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        /// Name of the failing stage.
        stage: String,
        /// Underlying stage error.
        #[source]
        source: StageError,
    },
    /// Reading a line from the feeder failed.
    #[error("feeder I/O error: {0}")]
    Feed(#[from] std::io::Error),
}
