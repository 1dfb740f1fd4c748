//! Fixed-capacity history of the most recently recorded rows.
//!
//! The store is an arena of slots indexed by a wrapping cursor. Writes
//! never block or fail: the oldest row is overwritten, which drops its
//! disassembly handle.

use std::fmt;
use std::sync::Arc;

use super::format::RowFormatter;
use super::hooks::Disassembly;
use super::state::DebugState;

/// Default number of rows kept in memory.
pub const DEFAULT_CAPACITY: usize = 30_000;

/// One recorded row: the instruction plus the state it executed in.
#[derive(Clone)]
pub struct TraceRow {
    pub disassembly: Arc<dyn Disassembly>,
    pub state: DebugState,
}

impl fmt::Debug for TraceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceRow")
            .field("byte_code", &self.disassembly.byte_code())
            .field("state", &self.state)
            .finish()
    }
}

/// Circular store of trace rows.
#[derive(Debug)]
pub struct RingStore {
    slots: Vec<Option<TraceRow>>,
    cursor: usize,
}

impl RingStore {
    /// Create a store holding `capacity` rows (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store a row at the cursor and advance it.
    pub fn write(&mut self, disassembly: Arc<dyn Disassembly>, state: DebugState) {
        self.slots[self.cursor] = Some(TraceRow { disassembly, state });
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// The last `count` slots, oldest first, skipping empty ones.
    ///
    /// `count` is clamped to the capacity.
    pub fn window(&self, count: usize) -> impl Iterator<Item = &TraceRow> + '_ {
        let capacity = self.slots.len();
        let count = count.min(capacity);
        let start = (self.cursor + capacity - count) % capacity;

        (0..count).filter_map(move |i| self.slots[(start + i) % capacity].as_ref())
    }

    /// Render the last `count` rows, newline-separated, oldest first.
    pub fn read_window(&self, count: usize, formatter: &RowFormatter<'_>) -> String {
        let mut out = String::new();
        let mut first_line = true;
        for row in self.window(count) {
            formatter.write_row(&mut out, &row.state, row.disassembly.as_ref(), first_line);
            first_line = false;
        }
        out
    }
}
