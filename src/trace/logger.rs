//! The trace controller.
//!
//! `TraceLogger` is shared between the emulation thread, which reports
//! every executed instruction, and the debugger UI, which changes options
//! and pulls the recent history. All mutable state lives behind a single
//! mutex; every public method takes the lock once and releases it on
//! return.
//!
//! # Session states
//!
//! ```text
//!            start_session
//!   Idle  ------------------>  Recording
//!         <------------------
//!        stop_session / drop
//! ```
//!
//! The in-memory history records in both states. Only file output
//! depends on a session being active.
//!
//! # Pending instructions
//!
//! When the condition rejects an opcode fetch, the instruction's state is
//! kept as the pending row. Each later side-channel event
//! (`record_pending`) re-evaluates the condition against that same
//! instruction, and the first match records it. The pending row is only
//! replaced by the next rejected opcode fetch or cleared by the next
//! recorded row, so a match may come from an event of a later
//! instruction.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::Config;

use super::condition::{self, Verdict};
use super::error::TraceError;
use super::format::RowFormatter;
use super::hooks::{
    ConditionProgram, CycleCounter, Disassembly, EmulationControl, ExpressionEvaluator,
    LabelResolver, MemoryView,
};
use super::options::TraceOptions;
use super::ring::{RingStore, TraceRow, DEFAULT_CAPACITY};
use super::sink::{BoxedWriter, FileSink};
use super::state::{DebugState, OperationInfo};

/// Collaborators the logger calls into.
#[derive(Clone)]
pub struct TraceHooks {
    pub evaluator: Arc<dyn ExpressionEvaluator>,
    pub memory: Arc<dyn MemoryView>,
    pub labels: Option<Arc<dyn LabelResolver>>,
    pub control: Arc<dyn EmulationControl>,
    pub cycles: Arc<dyn CycleCounter>,
}

/// Opcode fetch kept for re-evaluation against later events.
struct PendingInstruction {
    state: DebugState,
    disassembly: Arc<dyn Disassembly>,
}

/// Everything guarded by the logger's lock.
struct TraceState {
    options: TraceOptions,
    condition: ConditionProgram,
    ring: RingStore,
    pending: Option<PendingInstruction>,
    session: Option<FileSink>,
}

/// Execution trace logger.
pub struct TraceLogger {
    hooks: TraceHooks,
    state: Mutex<TraceState>,
}

/// Resumes emulation when dropped.
struct PauseGuard<'a> {
    control: &'a dyn EmulationControl,
}

impl<'a> PauseGuard<'a> {
    fn new(control: &'a dyn EmulationControl) -> Self {
        control.pause();
        Self { control }
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.control.resume();
    }
}

impl TraceLogger {
    /// Create a logger with the default history size.
    pub fn new(hooks: TraceHooks) -> Self {
        Self::with_capacity(hooks, DEFAULT_CAPACITY)
    }

    /// Create a logger keeping the last `capacity` rows in memory.
    pub fn with_capacity(hooks: TraceHooks, capacity: usize) -> Self {
        Self {
            hooks,
            state: Mutex::new(TraceState {
                options: TraceOptions::default(),
                condition: ConditionProgram::always(),
                ring: RingStore::new(capacity),
                pending: None,
                session: None,
            }),
        }
    }

    /// Create a logger sized and configured from `config`.
    pub fn from_config(hooks: TraceHooks, config: &Config) -> Self {
        let logger = Self::with_capacity(hooks, config.ring_capacity());
        logger.set_options(config.trace_options());
        logger
    }

    /// Lock the shared state, ignoring poisoning.
    fn lock(&self) -> MutexGuard<'_, TraceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the options and recompile the condition.
    pub fn set_options(&self, options: TraceOptions) {
        let program = condition::compile(self.hooks.evaluator.as_ref(), &options.condition);
        log::debug!(
            "Trace options updated (condition: {:?}, {} tokens)",
            options.condition,
            program.tokens().len()
        );

        let mut state = self.lock();
        state.options = options;
        state.condition = program;
    }

    /// Current options.
    pub fn options(&self) -> TraceOptions {
        self.lock().options.clone()
    }

    /// Number of rows kept in memory.
    pub fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    /// Whether a trace file session is active.
    pub fn is_logging(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Start writing rows to `path`, truncating it.
    ///
    /// A running session is replaced and finished. If the file cannot be
    /// created the current state is kept; in-memory recording is
    /// unaffected either way.
    pub fn start_session(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        let sink = FileSink::create(path.as_ref())?;
        self.install_session(sink);
        Ok(())
    }

    /// Start a session writing to `writer` instead of a file.
    ///
    /// `name` identifies the output in logs and errors.
    pub fn start_session_with_writer<W>(&self, name: impl AsRef<Path>, writer: W)
    where
        W: Write + Send + 'static,
    {
        let writer: BoxedWriter = Box::new(writer);
        self.install_session(FileSink::from_writer(name.as_ref(), writer));
    }

    /// Start a session writing to the configured trace file.
    pub fn start_session_from_config(&self, config: &Config) -> Result<(), TraceError> {
        self.start_session(config.trace_file())
    }

    /// Swap `sink` in as the active session and finish the one it replaces.
    fn install_session(&self, sink: FileSink) {
        log::debug!("Trace logging started: {}", sink.path().display());
        let previous = std::mem::replace(&mut self.lock().session, Some(sink));

        if let Some(previous) = previous {
            let _pause = PauseGuard::new(self.hooks.control.as_ref());
            log::debug!("Trace logging stopped: {}", previous.path().display());
            if let Err(e) = previous.finish() {
                log::warn!("Previous trace session ended with an error: {}", e);
            }
        }
    }

    /// Flush and close the trace file.
    ///
    /// Emulation is paused while the file is torn down. Does nothing when
    /// no session is active. Returns the first write error of the session.
    pub fn stop_session(&self) -> Result<(), TraceError> {
        if !self.is_logging() {
            return Ok(());
        }

        let _pause = PauseGuard::new(self.hooks.control.as_ref());
        let sink = self.lock().session.take();
        match sink {
            Some(sink) => {
                log::debug!("Trace logging stopped: {}", sink.path().display());
                sink.finish()
            }
            None => Ok(()),
        }
    }

    /// Record an executed instruction.
    ///
    /// Events without a disassembly are ignored.
    pub fn record(
        &self,
        state: &DebugState,
        disassembly: Option<Arc<dyn Disassembly>>,
        operation: &OperationInfo,
    ) {
        let Some(disassembly) = disassembly else {
            return;
        };

        let mut guard = self.lock();
        let trace = &mut *guard;
        match condition::gate(
            self.hooks.evaluator.as_ref(),
            &trace.condition,
            state,
            operation,
        ) {
            Verdict::Matched => self.add_row(trace, disassembly, *state),
            Verdict::Deferred => {
                trace.pending = Some(PendingInstruction {
                    state: *state,
                    disassembly,
                });
            }
            Verdict::Rejected => {}
        }
    }

    /// Re-check the pending instruction against a side-channel event
    /// (a data read or write made by the instruction).
    pub fn record_pending(&self, operation: &OperationInfo) {
        let mut guard = self.lock();
        let trace = &mut *guard;
        let Some(pending) = trace.pending.as_ref() else {
            return;
        };

        let verdict = condition::gate(
            self.hooks.evaluator.as_ref(),
            &trace.condition,
            &pending.state,
            operation,
        );
        if verdict == Verdict::Matched {
            if let Some(pending) = trace.pending.take() {
                self.add_row(trace, pending.disassembly, pending.state);
            }
        }
    }

    /// Append ` - [label - Cycle: N]` to the trace file.
    ///
    /// Only effective while a session is active, extra info is enabled
    /// and at least one row has been written in the session. Buffered
    /// rows are written before the annotation.
    pub fn annotate(&self, label: &str) {
        let mut guard = self.lock();
        let trace = &mut *guard;
        if !trace.options.show_extra_info {
            return;
        }
        if let Some(sink) = trace.session.as_mut() {
            sink.annotate(label, self.hooks.cycles.cycle_count());
        }
    }

    /// Handle for annotating from code that does not own the logger.
    pub fn annotator(self: &Arc<Self>) -> Annotator {
        Annotator {
            logger: Arc::downgrade(self),
        }
    }

    /// The last `line_count` recorded rows, oldest first, joined by `\n`.
    ///
    /// Returns fewer lines if fewer rows have been recorded.
    pub fn recent_trace(&self, line_count: usize) -> String {
        let trace = self.lock();
        let formatter = self.formatter(&trace.options);
        trace.ring.read_window(line_count, &formatter)
    }

    fn formatter<'a>(&'a self, options: &'a TraceOptions) -> RowFormatter<'a> {
        RowFormatter::new(options, self.hooks.memory.as_ref(), self.hooks.labels.as_deref())
    }

    fn add_row(&self, trace: &mut TraceState, disassembly: Arc<dyn Disassembly>, state: DebugState) {
        trace.pending = None;

        if let Some(sink) = trace.session.as_mut() {
            let formatter = self.formatter(&trace.options);
            let row = TraceRow {
                disassembly: Arc::clone(&disassembly),
                state,
            };
            sink.push_row(&formatter, &row);
        }

        trace.ring.write(disassembly, state);
    }
}

impl Drop for TraceLogger {
    fn drop(&mut self) {
        if let Err(e) = self.stop_session() {
            log::error!("Failed to finish trace file: {}", e);
        }
    }
}

/// Weak handle used to annotate the trace from code that only knows a
/// logger may exist, such as interrupt or mapper hooks.
#[derive(Clone)]
pub struct Annotator {
    logger: Weak<TraceLogger>,
}

impl Annotator {
    /// Annotate the trace if the logger is still alive.
    pub fn annotate(&self, label: &str) {
        if let Some(logger) = self.logger.upgrade() {
            logger.annotate(label);
        }
    }

    /// Whether the logger still exists.
    pub fn is_attached(&self) -> bool {
        self.logger.strong_count() > 0
    }
}
