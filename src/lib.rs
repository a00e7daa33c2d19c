//! strandpipe — a condition-variable-based bounded pipeline
//!
//! A chain of independently scheduled worker threads ("stages"), each
//! draining a bounded, blocking queue fed by its predecessor, applying a
//! pure string transformation, and forwarding the result downstream. The
//! terminal stage emits its output to a sink. A sentinel value (`<END>`)
//! propagates stage-by-stage to shut the whole chain down in order.
//!
//! The hard engineering lives in two pieces: [`monitor::Monitor`] (a
//! condition variable bound to an externally held mutex) and
//! [`queue::BoundedQueue`] (the single-producer/single-consumer ring buffer
//! built on it). [`stage::Stage`] wraps a queue and a worker thread into a
//! five-phase lifecycle (init → attach → run → drain → finalize), and
//! [`pipeline::Pipeline`] wires a chain of them together.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use strandpipe::Pipeline;
//!
//! let pipeline = Pipeline::build(&[("uppercase", "uppercase")], 10).unwrap();
//! pipeline.feed(Cursor::new(b"hello\n<END>\n".to_vec())).unwrap();
//! pipeline.await_completion().unwrap();
//! pipeline.finalize().unwrap();
//! ```

mod error;
mod feeder;
mod invariants;
mod item;
mod monitor;
mod pipeline;
mod queue;
mod registry;
mod sink;
mod stage;

pub use error::{MonitorError, PipelineError, QueueError, StageError};
pub use feeder::{Feeder, MAX_LINE_LEN};
pub use item::{Item, SENTINEL};
pub use monitor::Monitor;
pub use pipeline::Pipeline;
pub use queue::BoundedQueue;
pub use registry::{lookup as lookup_transform, Transform, REGISTERED_NAMES};
pub use sink::{Sink, StdoutSink};
pub use stage::Stage;
