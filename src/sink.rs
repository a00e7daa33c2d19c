//! The terminal sink: where the last stage's output goes.

use std::io::Write;
use std::sync::Mutex;

/// Something a terminal stage can emit its output to.
pub trait Sink {
    /// Emits one line of output for `stage_name`. Implementations that write
    /// to a shared destination (stdout) must serialize so concurrent
    /// terminal stages never interleave partial lines.
    fn emit(&self, stage_name: &str, output: &str, suppress_prefix: bool);
}

/// Writes `[<stage-name>] <output>\n` to stdout and flushes, unless
/// `suppress_prefix` is set (the `typewriter` transform already wrote its
/// own output as a side effect). A mutex serializes writes so that if more
/// than one terminal stage exists, lines are never interleaved mid-write.
#[derive(Default)]
pub struct StdoutSink {
    lock: Mutex<()>,
}

impl StdoutSink {
    /// Creates a sink writing to stdout.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for StdoutSink {
    fn emit(&self, stage_name: &str, output: &str, suppress_prefix: bool) {
        let _guard = self.lock.lock().expect("sink mutex poisoned");
        if suppress_prefix {
            return;
        }
        let mut stdout = std::io::stdout();
        let _ = writeln!(stdout, "[{stage_name}] {output}");
        let _ = stdout.flush();
    }
}
