//! Per-stage lifecycle: `init` (construct queue, spawn worker) → `attach`
//! (record forward handle) → the worker's run loop drains the inbox,
//! transforms, and forwards or sinks → `fini` (drain, join, release).

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::StageError;
use crate::item::Item;
use crate::queue::BoundedQueue;
use crate::registry::Transform;
use crate::sink::Sink;

type ForwardSlot = Arc<Mutex<Option<Arc<BoundedQueue>>>>;

/// One step of the pipeline: an inbox queue and a single dedicated worker
/// thread that drains it.
pub struct Stage {
    name: String,
    inbox: Arc<BoundedQueue>,
    forward: ForwardSlot,
    worker: JoinHandle<()>,
}

impl Stage {
    /// `Created → Initialized`: builds the inbox queue and spawns the
    /// worker thread. The worker immediately starts draining the (empty)
    /// inbox and blocks on `take()` until either `attach` has recorded a
    /// forward handle or the first item arrives — the pipeline assembler
    /// guarantees `attach` happens first.
    pub fn init(
        name: impl Into<String>,
        transform: Box<dyn Transform + Send>,
        capacity: usize,
        sink: Arc<dyn Sink + Send + Sync>,
    ) -> Result<Self, StageError> {
        let name = name.into();
        if name.is_empty() {
            return Err(StageError::InvalidArgument("stage name is empty".into()));
        }

        let inbox = Arc::new(BoundedQueue::new(capacity).map_err(|e| {
            StageError::InvalidArgument(format!("queue capacity {capacity} invalid: {e}"))
        })?);
        let forward: ForwardSlot = Arc::new(Mutex::new(None));

        let worker = {
            let name = name.clone();
            let inbox = Arc::clone(&inbox);
            let forward = Arc::clone(&forward);
            thread::Builder::new()
                .name(format!("stage-{name}"))
                .spawn(move || run(name, inbox, forward, transform, sink))
                .map_err(|e| StageError::ResourceExhaustion(e.to_string()))?
        };

        Ok(Self {
            name,
            inbox,
            forward,
            worker,
        })
    }

    /// `Initialized → Attached`: records the optional forward handle (the
    /// next stage's inbox). Must be called before any non-sentinel item
    /// reaches this stage; the pipeline assembler guarantees that ordering.
    pub fn attach(&self, forward: Option<Arc<BoundedQueue>>) {
        *self.forward.lock().expect("forward slot poisoned") = forward;
    }

    /// Enqueues `item` into this stage's inbox, blocking if it is full.
    pub fn place_work(&self, item: Item) -> Result<(), StageError> {
        self.inbox.insert(item).map_err(StageError::from)
    }

    /// Blocks until this stage's worker has observed the shutdown marker and
    /// marked its inbox finished.
    pub fn wait_finished(&self) -> Result<(), StageError> {
        self.inbox.wait_finished().map_err(StageError::from)
    }

    /// `Drained → Finalized`: forces the shutdown marker into this stage's
    /// own inbox if the worker hasn't already observed one, then joins the
    /// worker thread. Consumes the stage — there is nothing left to operate
    /// on afterward.
    pub fn fini(self) -> Result<(), StageError> {
        if !self.inbox.is_finished() {
            self.inbox.insert(Item::Done)?;
        }
        self.worker
            .join()
            .map_err(|_| StageError::ResourceExhaustion(format!("worker for '{}' panicked", self.name)))
    }

    /// A clone of this stage's inbox handle, used by the pipeline assembler
    /// to attach this stage as its predecessor's forward target.
    pub fn inbox_handle(&self) -> Arc<BoundedQueue> {
        Arc::clone(&self.inbox)
    }

    /// This stage's constant name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The worker's run loop: take → (sentinel? forward-and-stop : transform,
/// then forward-or-sink) → repeat.
fn run(
    name: String,
    inbox: Arc<BoundedQueue>,
    forward: ForwardSlot,
    transform: Box<dyn Transform + Send>,
    sink: Arc<dyn Sink + Send + Sync>,
) {
    loop {
        let item = match inbox.take() {
            Ok(Some(item)) => item,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("[ERROR][{name}] inbox take failed: {e}");
                break;
            }
        };

        match item {
            Item::Done => {
                forward_done(&name, &forward);
                if let Err(e) = inbox.mark_finished() {
                    tracing::error!("[ERROR][{name}] failed to mark inbox finished: {e}");
                }
                break;
            }
            Item::Payload(payload) => match transform.apply(Some(payload)) {
                None => {
                    tracing::error!(
                        "[ERROR][{name}] transform returned no output for a non-empty input"
                    );
                    forward_done(&name, &forward);
                    let _ = inbox.mark_finished();
                    break;
                }
                Some(output) => {
                    let next = forward.lock().ok().and_then(|guard| guard.clone());
                    match next {
                        Some(next) => {
                            if let Err(e) = next.insert(Item::Payload(output)) {
                                tracing::error!("[ERROR][{name}] failed to forward item: {e}");
                            }
                        }
                        None => sink.emit(&name, &output, transform.suppresses_sink_prefix()),
                    }
                }
            },
        }
    }
}

fn forward_done(name: &str, forward: &ForwardSlot) {
    let next = forward.lock().ok().and_then(|guard| guard.clone());
    if let Some(next) = next {
        if let Err(e) = next.insert(Item::Done) {
            tracing::error!("[ERROR][{name}] failed to forward shutdown marker: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Uppercase;
    use crate::sink::StdoutSink;

    #[test]
    fn forwards_sentinel_to_next_stage() {
        let sink: Arc<dyn Sink + Send + Sync> = Arc::new(StdoutSink::new());
        let upstream = Stage::init("first", Box::new(Uppercase), 4, Arc::clone(&sink)).unwrap();
        let downstream = Stage::init("second", Box::new(Uppercase), 4, sink).unwrap();

        upstream.attach(Some(downstream.inbox_handle()));
        downstream.attach(None);

        upstream.place_work(Item::Payload("hi".into())).unwrap();
        upstream.place_work(Item::Done).unwrap();

        upstream.wait_finished().unwrap();
        downstream.wait_finished().unwrap();

        upstream.fini().unwrap();
        downstream.fini().unwrap();
    }

    #[test]
    fn terminal_stage_without_sentinel_still_finalizes() {
        let sink: Arc<dyn Sink + Send + Sync> = Arc::new(StdoutSink::new());
        let stage = Stage::init("only", Box::new(Uppercase), 4, sink).unwrap();
        stage.attach(None);
        stage.place_work(Item::Payload("hi".into())).unwrap();
        // No <END> ever arrives; fini() must force one in.
        stage.fini().unwrap();
    }

    #[test]
    fn rejects_empty_name() {
        let sink: Arc<dyn Sink + Send + Sync> = Arc::new(StdoutSink::new());
        let err = Stage::init("", Box::new(Uppercase), 4, sink).unwrap_err();
        assert!(matches!(err, StageError::InvalidArgument(_)));
    }
}
