//! Condition gate deciding whether a trace event is recorded.
//!
//! A failed opcode fetch is not simply dropped: the condition may depend
//! on something the instruction only does later (a write in its last
//! cycle, say), so the caller keeps that instruction as a pending row and
//! re-checks it against each following side-channel event.

use super::hooks::{ConditionProgram, ExpressionEvaluator};
use super::state::{DebugState, OperationInfo};

/// Outcome of gating one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Record the row.
    Matched,
    /// Opcode fetch did not match; keep it pending for later events of
    /// the same instruction.
    Deferred,
    /// Drop the event.
    Rejected,
}

/// Compile a condition, falling back to the empty program.
///
/// An unparsable condition disables filtering instead of failing.
pub fn compile(evaluator: &dyn ExpressionEvaluator, condition: &str) -> ConditionProgram {
    let condition = condition.trim();
    if condition.is_empty() {
        return ConditionProgram::always();
    }

    match evaluator.compile(condition) {
        Some(program) => program,
        None => {
            log::warn!("Invalid trace condition {:?}, tracing unfiltered", condition);
            ConditionProgram::always()
        }
    }
}

/// Evaluate `program` for one event. The empty program always matches
/// and never reaches the evaluator.
pub fn matches(
    evaluator: &dyn ExpressionEvaluator,
    program: &ConditionProgram,
    state: &DebugState,
    operation: &OperationInfo,
) -> bool {
    program.is_empty() || evaluator.evaluate(program, state, operation)
}

/// Gate one event and classify a failure.
pub fn gate(
    evaluator: &dyn ExpressionEvaluator,
    program: &ConditionProgram,
    state: &DebugState,
    operation: &OperationInfo,
) -> Verdict {
    if matches(evaluator, program, state, operation) {
        Verdict::Matched
    } else if operation.is_opcode_fetch() {
        Verdict::Deferred
    } else {
        Verdict::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ClosureEvaluator;
    use crate::trace::state::MemoryOperationType;

    fn write_op() -> OperationInfo {
        OperationInfo::new(0x0300, 0x7F, MemoryOperationType::Write)
    }

    #[test]
    fn test_empty_program_skips_evaluator() {
        let evaluator = ClosureEvaluator::new(|_, _| false);
        let verdict = gate(
            &evaluator,
            &ConditionProgram::always(),
            &DebugState::default(),
            &write_op(),
        );
        assert_eq!(verdict, Verdict::Matched);
        assert_eq!(evaluator.evaluations(), 0);
    }

    #[test]
    fn test_failed_opcode_fetch_is_deferred() {
        let evaluator = ClosureEvaluator::new(|_, _| false);
        let program = compile(&evaluator, "a == $10");
        let op = OperationInfo::opcode_fetch(0xC000, 0xA9);

        assert_eq!(gate(&evaluator, &program, &DebugState::default(), &op), Verdict::Deferred);
        assert_eq!(evaluator.evaluations(), 1);
    }

    #[test]
    fn test_failed_side_channel_is_rejected() {
        let evaluator = ClosureEvaluator::new(|_, _| false);
        let program = compile(&evaluator, "a == $10");

        assert_eq!(
            gate(&evaluator, &program, &DebugState::default(), &write_op()),
            Verdict::Rejected
        );
    }

    #[test]
    fn test_verdict_follows_evaluator() {
        let evaluator = ClosureEvaluator::new(|state, op| {
            state.cpu.a == 0x10 && op.operation_type == MemoryOperationType::Write
        });
        let program = compile(&evaluator, "a == $10 && write");
        let mut state = DebugState::default();

        assert!(!matches(&evaluator, &program, &state, &write_op()));
        state.cpu.a = 0x10;
        assert!(matches(&evaluator, &program, &state, &write_op()));
    }

    #[test]
    fn test_uncompilable_condition_falls_back() {
        let evaluator = ClosureEvaluator::new(|_, _| false).rejecting_all();
        let program = compile(&evaluator, "((");
        assert!(program.is_empty());
    }

    #[test]
    fn test_blank_condition_is_not_compiled() {
        let evaluator = ClosureEvaluator::new(|_, _| false).rejecting_all();
        assert!(compile(&evaluator, "   ").is_empty());
        assert_eq!(evaluator.compilations(), 0);
    }
}
