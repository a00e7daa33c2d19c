//! The single-threaded orchestrator: build, wire, feed, await, and tear down
//! a linear chain of stages.

use std::io::BufRead;
use std::sync::Arc;

use crate::error::PipelineError;
use crate::feeder::Feeder;
use crate::item::Item;
use crate::registry;
use crate::sink::{Sink, StdoutSink};
use crate::stage::Stage;

/// A fixed-length, linearly wired chain of [`Stage`]s.
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Builds a pipeline from an ordered list of `(stage_name, transform_name)`
    /// pairs and a shared queue capacity, looking each transform up in the
    /// registry. On the first stage whose transform is unknown or whose
    /// `init` fails, every previously initialized stage is finalized in
    /// reverse order before the error is returned — nothing is left running.
    pub fn build(
        stage_specs: &[(&str, &str)],
        capacity: usize,
    ) -> Result<Self, PipelineError> {
        Self::build_with_sink(stage_specs, capacity, Arc::new(StdoutSink::new()))
    }

    /// Same as [`Pipeline::build`], but with an explicit sink for the
    /// terminal stage. Exposed for tests that need to observe terminal
    /// output without going through stdout.
    pub fn build_with_sink(
        stage_specs: &[(&str, &str)],
        capacity: usize,
        sink: Arc<dyn Sink + Send + Sync>,
    ) -> Result<Self, PipelineError> {
        if stage_specs.is_empty() {
            return Err(PipelineError::Empty);
        }

        let mut stages: Vec<Stage> = Vec::with_capacity(stage_specs.len());

        for (stage_name, transform_name) in stage_specs {
            let transform = match registry::lookup(transform_name) {
                Some(transform) => transform,
                None => {
                    unwind(stages);
                    return Err(PipelineError::UnknownTransform((*transform_name).to_string()));
                }
            };

            match Stage::init(*stage_name, transform, capacity, Arc::clone(&sink)) {
                Ok(stage) => stages.push(stage),
                Err(source) => {
                    let failed_name = (*stage_name).to_string();
                    unwind(stages);
                    return Err(PipelineError::Stage {
                        stage: failed_name,
                        source,
                    });
                }
            }
        }

        // Attach-all: stage i forwards to stage i+1's inbox; the last stage
        // has no forward handle and falls through to the sink.
        let forwards: Vec<_> = stages
            .iter()
            .skip(1)
            .map(Stage::inbox_handle)
            .map(Some)
            .chain(std::iter::once(None))
            .collect();
        for (stage, forward) in stages.iter().zip(forwards) {
            stage.attach(forward);
        }

        Ok(Self { stages })
    }

    /// Reads lines from `reader` via a [`Feeder`] and places each into the
    /// first stage's inbox, stopping after the sentinel line or at EOF.
    pub fn feed<R: BufRead>(&self, reader: R) -> Result<(), PipelineError> {
        let head = self
            .stages
            .first()
            .expect("Pipeline::build rejects empty stage lists");
        let mut feeder = Feeder::new(reader);

        loop {
            match feeder.next_item()? {
                None => break,
                Some(item) => {
                    let is_done = item.is_done();
                    head.place_work(item).map_err(|source| PipelineError::Stage {
                        stage: head.name().to_string(),
                        source,
                    })?;
                    if is_done {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Blocks on `wait_finished` for every stage in order. Each stage's own
    /// sentinel-forwarding guarantees the next stage also observes `<END>`.
    pub fn await_completion(&self) -> Result<(), PipelineError> {
        for stage in &self.stages {
            stage
                .wait_finished()
                .map_err(|source| PipelineError::Stage {
                    stage: stage.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Finalizes every stage (forcing a shutdown marker into any that
    /// haven't seen one, then joining), releasing all owned resources.
    pub fn finalize(self) -> Result<(), PipelineError> {
        for stage in self.stages {
            let name = stage.name().to_string();
            stage
                .fini()
                .map_err(|source| PipelineError::Stage { stage: name, source })?;
        }
        Ok(())
    }

    /// Convenience entry point for `feed` immediately followed by `place_work`
    /// of the sentinel if the feeder never produced one (e.g. an empty
    /// input stream), so a caller can always rely on `await_completion`
    /// eventually returning.
    pub fn feed_line(&self, line: &str) -> Result<(), PipelineError> {
        let head = self
            .stages
            .first()
            .expect("Pipeline::build rejects empty stage lists");
        let item = if crate::feeder::is_sentinel(line) {
            Item::Done
        } else {
            Item::Payload(line.to_string())
        };
        head.place_work(item).map_err(|source| PipelineError::Stage {
            stage: head.name().to_string(),
            source,
        })
    }
}

fn unwind(stages: Vec<Stage>) {
    for stage in stages.into_iter().rev() {
        let name = stage.name().to_string();
        if let Err(e) = stage.fini() {
            tracing::error!("[ERROR][{name}] failed to finalize during unwind: {e}");
        }
    }
}
