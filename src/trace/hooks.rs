//! Contracts for the collaborators the tracer consumes.
//!
//! The tracer never decodes instructions, parses conditions or owns
//! emulator state. These traits are the narrow seams through which it
//! reaches the rest of the debugger:
//!
//! - `ExpressionEvaluator`: compiles and evaluates break/trace conditions
//! - `Disassembly`: renders one decoded instruction from the decode cache
//! - `MemoryView`: side-effect-free reads used while rendering operands
//! - `LabelResolver`: optional address to symbol lookup
//! - `EmulationControl`: pauses the emulation core around file teardown
//! - `CycleCounter`: elapsed CPU cycles for annotations

use super::state::{CpuState, DebugState, OperationInfo};

/// A compiled condition, as produced by an `ExpressionEvaluator`.
///
/// The token layout is private to the evaluator. An empty program
/// matches every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionProgram {
    tokens: Vec<i32>,
}

impl ConditionProgram {
    /// Wrap an evaluator's token sequence.
    pub fn from_tokens(tokens: Vec<i32>) -> Self {
        Self { tokens }
    }

    /// The program that matches everything.
    pub fn always() -> Self {
        Self::default()
    }

    /// Token sequence in evaluation order.
    pub fn tokens(&self) -> &[i32] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Compiles and evaluates trace conditions.
pub trait ExpressionEvaluator: Send + Sync {
    /// Compile `expression` into a program.
    ///
    /// Returns `None` if the expression cannot be parsed.
    fn compile(&self, expression: &str) -> Option<ConditionProgram>;

    /// Evaluate `program` against a state snapshot and the memory
    /// operation that triggered the event.
    fn evaluate(
        &self,
        program: &ConditionProgram,
        state: &DebugState,
        operation: &OperationInfo,
    ) -> bool;
}

/// Debugger view of CPU address space.
pub trait MemoryView: Send + Sync {
    /// Read a byte without triggering side effects (no register reads,
    /// no open-bus updates).
    fn peek(&self, addr: u16) -> u8;
}

/// Address to symbolic name lookup.
pub trait LabelResolver: Send + Sync {
    fn label(&self, addr: u16) -> Option<String>;
}

/// One decoded instruction owned by the debugger's decode cache.
///
/// The tracer holds these behind `Arc` and only ever renders them.
pub trait Disassembly: Send + Sync {
    /// Encoded bytes as text, e.g. `"$A9 $01"`.
    fn byte_code(&self) -> String;

    /// Mnemonic and operand text for the instruction located at `pc`.
    ///
    /// # Arguments
    ///
    /// * `pc` - Address the instruction was fetched from
    /// * `memory` - Debug view used to render operands
    /// * `labels` - Resolver for symbolic operands, `None` to print raw addresses
    fn mnemonic(&self, pc: u16, memory: &dyn MemoryView, labels: Option<&dyn LabelResolver>) -> String;

    /// Effective address annotation appended after the mnemonic, e.g.
    /// `" @ $0300 = $7F"`. Empty for implied or immediate operands.
    fn effective_address(
        &self,
        cpu: &CpuState,
        memory: &dyn MemoryView,
        labels: Option<&dyn LabelResolver>,
    ) -> String;
}

/// Pause/resume coordination of the emulation core.
pub trait EmulationControl: Send + Sync {
    fn pause(&self);
    fn resume(&self);
}

/// Source of elapsed CPU cycles.
pub trait CycleCounter: Send + Sync {
    fn cycle_count(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program_is_empty() {
        assert!(ConditionProgram::always().is_empty());
        assert!(ConditionProgram::default().tokens().is_empty());
    }

    #[test]
    fn test_program_keeps_token_order() {
        let program = ConditionProgram::from_tokens(vec![3, 1, 2]);
        assert!(!program.is_empty());
        assert_eq!(program.tokens(), &[3, 1, 2]);
    }
}
