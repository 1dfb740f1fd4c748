//! Reference collaborators for exercising the tracer without an emulator.
//!
//! These stand in for the debugger's expression evaluator, decode cache,
//! memory view, label database and emulation core. They are deliberately
//! simple and record how they were called so tests can assert on it.
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use nes_tracer::testing::{self, StaticDisassembly};
//! use nes_tracer::trace::{DebugState, OperationInfo, TraceLogger};
//!
//! let logger = TraceLogger::new(testing::hooks());
//! let lda = Arc::new(StaticDisassembly::new(&[0xA9, 0x01], "LDA #$01"));
//!
//! let mut state = DebugState::default();
//! state.cpu.pc = 0xC000;
//! logger.record(&state, Some(lda), &OperationInfo::opcode_fetch(0xC000, 0xA9));
//!
//! assert!(logger.recent_trace(1).starts_with("C000  A9 01"));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::trace::hooks::{
    ConditionProgram, CycleCounter, Disassembly, EmulationControl, ExpressionEvaluator,
    LabelResolver, MemoryView,
};
use crate::trace::state::{CpuState, DebugState, OperationInfo};
use crate::trace::TraceHooks;

/// Hooks with an always-true evaluator, zeroed memory and no labels.
pub fn hooks() -> TraceHooks {
    hooks_with(ClosureEvaluator::new(|_, _| true))
}

/// Hooks using the given evaluator.
pub fn hooks_with(evaluator: ClosureEvaluator) -> TraceHooks {
    TraceHooks {
        evaluator: Arc::new(evaluator),
        memory: Arc::new(FlatMemory::new()),
        labels: None,
        control: Arc::new(PauseCounter::default()),
        cycles: Arc::new(ManualCycles::default()),
    }
}

type Predicate = dyn Fn(&DebugState, &OperationInfo) -> bool + Send + Sync;

/// Evaluator backed by a closure.
///
/// Any non-blank expression compiles to a program holding the
/// expression's bytes; evaluation ignores the program and asks the
/// closure.
pub struct ClosureEvaluator {
    predicate: Box<Predicate>,
    reject_all: bool,
    compilations: AtomicUsize,
    evaluations: AtomicUsize,
}

impl ClosureEvaluator {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&DebugState, &OperationInfo) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            reject_all: false,
            compilations: AtomicUsize::new(0),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Make every `compile` call fail, as for a syntax error.
    pub fn rejecting_all(mut self) -> Self {
        self.reject_all = true;
        self
    }

    /// Number of `compile` calls so far.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// Number of `evaluate` calls so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl ExpressionEvaluator for ClosureEvaluator {
    fn compile(&self, expression: &str) -> Option<ConditionProgram> {
        self.compilations.fetch_add(1, Ordering::Relaxed);
        if self.reject_all {
            return None;
        }
        let tokens = expression.bytes().map(i32::from).collect();
        Some(ConditionProgram::from_tokens(tokens))
    }

    fn evaluate(
        &self,
        _program: &ConditionProgram,
        state: &DebugState,
        operation: &OperationInfo,
    ) -> bool {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        (self.predicate)(state, operation)
    }
}

/// Pre-rendered instruction.
#[derive(Debug, Clone)]
pub struct StaticDisassembly {
    bytes: Vec<u8>,
    mnemonic: String,
    operand: Option<u16>,
    effective_address: String,
}

impl StaticDisassembly {
    /// Instruction with fixed mnemonic text, e.g. `"LDA #$01"`.
    pub fn new(bytes: &[u8], mnemonic: impl Into<String>) -> Self {
        Self {
            bytes: bytes.to_vec(),
            mnemonic: mnemonic.into(),
            operand: None,
            effective_address: String::new(),
        }
    }

    /// Instruction `op` with an absolute operand; the operand is printed
    /// as a label when one resolves, `$XXXX` otherwise.
    pub fn absolute(bytes: &[u8], op: &str, operand: u16) -> Self {
        Self {
            operand: Some(operand),
            ..Self::new(bytes, op)
        }
    }

    /// Set the effective-address annotation.
    pub fn with_effective_address(mut self, text: impl Into<String>) -> Self {
        self.effective_address = text.into();
        self
    }
}

impl Disassembly for StaticDisassembly {
    fn byte_code(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn mnemonic(&self, _pc: u16, _memory: &dyn MemoryView, labels: Option<&dyn LabelResolver>) -> String {
        match self.operand {
            Some(addr) => {
                let name = labels
                    .and_then(|l| l.label(addr))
                    .unwrap_or_else(|| format!("${:04X}", addr));
                format!("{} {}", self.mnemonic, name)
            }
            None => self.mnemonic.clone(),
        }
    }

    fn effective_address(
        &self,
        _cpu: &CpuState,
        _memory: &dyn MemoryView,
        _labels: Option<&dyn LabelResolver>,
    ) -> String {
        self.effective_address.clone()
    }
}

/// 64 KiB of plain RAM.
pub struct FlatMemory {
    bytes: Vec<u8>,
}

impl FlatMemory {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; 0x10000],
        }
    }

    /// Copy `data` to `addr`, wrapping at the end of the address space.
    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &b) in data.iter().enumerate() {
            let target = addr.wrapping_add(i as u16) as usize;
            self.bytes[target] = b;
        }
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryView for FlatMemory {
    fn peek(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }
}

/// Label table.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    labels: HashMap<u16, String>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, addr: u16, name: impl Into<String>) {
        self.labels.insert(addr, name.into());
    }
}

impl LabelResolver for LabelMap {
    fn label(&self, addr: u16) -> Option<String> {
        self.labels.get(&addr).cloned()
    }
}

/// Emulation control that counts pause/resume pairs.
#[derive(Debug, Default)]
pub struct PauseCounter {
    pauses: AtomicUsize,
    resumes: AtomicUsize,
    paused: AtomicBool,
}

impl PauseCounter {
    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl EmulationControl for PauseCounter {
    fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
    }
}

/// Cycle counter set by the test.
#[derive(Debug, Default)]
pub struct ManualCycles(AtomicU64);

impl ManualCycles {
    pub fn set(&self, cycles: u64) {
        self.0.store(cycles, Ordering::Relaxed);
    }
}

impl CycleCounter for ManualCycles {
    fn cycle_count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_disassembly_byte_code() {
        let dis = StaticDisassembly::new(&[0x8D, 0x00, 0x03], "STA");
        assert_eq!(dis.byte_code(), "8D 00 03");
    }

    #[test]
    fn test_absolute_operand_uses_label() {
        let memory = FlatMemory::new();
        let mut labels = LabelMap::new();
        labels.insert(0x2000, "PPUCTRL");
        let dis = StaticDisassembly::absolute(&[0x8D, 0x00, 0x20], "STA", 0x2000);

        assert_eq!(dis.mnemonic(0xC000, &memory, None), "STA $2000");
        assert_eq!(dis.mnemonic(0xC000, &memory, Some(&labels)), "STA PPUCTRL");
    }

    #[test]
    fn test_flat_memory_load_wraps() {
        let mut memory = FlatMemory::new();
        memory.load(0xFFFF, &[0x11, 0x22]);
        assert_eq!(memory.peek(0xFFFF), 0x11);
        assert_eq!(memory.peek(0x0000), 0x22);
    }

    #[test]
    fn test_pause_counter_tracks_state() {
        let control = PauseCounter::default();
        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());
        assert_eq!((control.pauses(), control.resumes()), (1, 1));
    }
}
