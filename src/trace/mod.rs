//! Execution trace logging for the debugger.
//!
//! The emulation loop reports every executed instruction to a
//! `TraceLogger`. The logger:
//! - Filters events through an optional condition
//! - Keeps the most recent rows in a fixed-size ring for the debugger UI
//! - Streams formatted rows to a trace file while a session is active
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nes_tracer::testing::{self, StaticDisassembly};
//! use nes_tracer::trace::{DebugState, OperationInfo, TraceLogger, TraceOptions};
//!
//! let logger = TraceLogger::with_capacity(testing::hooks(), 1024);
//! logger.set_options(TraceOptions::minimal());
//!
//! for pc in [0xC000u16, 0xC002] {
//!     let mut state = DebugState::default();
//!     state.cpu.pc = pc;
//!     let lda = Arc::new(StaticDisassembly::new(&[0xA9, 0x00], "LDA #$00"));
//!     logger.record(&state, Some(lda), &OperationInfo::opcode_fetch(pc, 0xA9));
//! }
//!
//! let trace = logger.recent_trace(10);
//! assert_eq!(trace.lines().count(), 2);
//! assert!(trace.lines().last().unwrap().starts_with("C002  LDA #$00"));
//! ```

pub mod condition;
pub mod error;
pub mod format;
pub mod hooks;
pub mod logger;
pub mod options;
pub mod ring;
pub mod sink;
pub mod state;

pub use error::TraceError;
pub use format::RowFormatter;
pub use hooks::{
    ConditionProgram, CycleCounter, Disassembly, EmulationControl, ExpressionEvaluator,
    LabelResolver, MemoryView,
};
pub use logger::{Annotator, TraceHooks, TraceLogger};
pub use options::{StatusFlagFormat, TraceOptions};
pub use ring::{RingStore, TraceRow, DEFAULT_CAPACITY};
pub use sink::{BoxedWriter, FileSink, FLUSH_THRESHOLD};
pub use state::{CpuState, DebugState, MemoryOperationType, OperationInfo, PpuState};
