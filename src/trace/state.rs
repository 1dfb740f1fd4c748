//! Value snapshots of processor and video state.
//!
//! Everything here is `Copy`: the tracer captures state by value at event
//! time and never aliases the live emulator.

/// Status flag bits of the 6502 `P` register.
pub mod flags {
    pub const CARRY: u8 = 0x01;
    pub const ZERO: u8 = 0x02;
    pub const INTERRUPT: u8 = 0x04;
    pub const DECIMAL: u8 = 0x08;
    pub const BREAK: u8 = 0x10;
    pub const RESERVED: u8 = 0x20;
    pub const OVERFLOW: u8 = 0x40;
    pub const NEGATIVE: u8 = 0x80;
}

/// CPU register snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuState {
    /// Address of the instruction being traced.
    pub pc: u16,
    /// Stack pointer (offset into page 1).
    pub sp: u8,
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Processor status byte.
    pub ps: u8,
    /// Cumulative CPU cycle count.
    pub cycle_count: u64,
}

/// PPU timing snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpuState {
    /// Dot within the current scanline (0-340).
    pub cycle: u32,
    /// Scanline index; the pre-render line is -1.
    pub scanline: i32,
    /// Frames rendered since power-on.
    pub frame_count: u32,
}

/// Full debugger state handed to the tracer for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugState {
    pub cpu: CpuState,
    pub ppu: PpuState,
}

/// Kind of bus access that triggered a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperationType {
    Read,
    Write,
    /// Opcode fetch: the first cycle of a new instruction.
    ExecOpCode,
    /// Operand fetch belonging to the current instruction.
    ExecOperand,
    PpuRenderingRead,
    DummyRead,
}

/// Metadata of the memory operation being traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationInfo {
    pub address: u16,
    pub value: u8,
    pub operation_type: MemoryOperationType,
}

impl OperationInfo {
    /// Create operation metadata.
    pub fn new(address: u16, value: u8, operation_type: MemoryOperationType) -> Self {
        Self {
            address,
            value,
            operation_type,
        }
    }

    /// Opcode fetch of `opcode` at `address`.
    pub fn opcode_fetch(address: u16, opcode: u8) -> Self {
        Self::new(address, opcode, MemoryOperationType::ExecOpCode)
    }

    /// Whether this operation marks the start of an instruction.
    #[inline]
    pub fn is_opcode_fetch(&self) -> bool {
        self.operation_type == MemoryOperationType::ExecOpCode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_fetch_detection() {
        let op = OperationInfo::opcode_fetch(0xC000, 0xA9);
        assert!(op.is_opcode_fetch());
        assert_eq!(op.value, 0xA9);

        let op = OperationInfo::new(0x0200, 0x42, MemoryOperationType::Write);
        assert!(!op.is_opcode_fetch());
    }

    #[test]
    fn test_flag_bits_cover_status_byte() {
        let all = flags::CARRY
            | flags::ZERO
            | flags::INTERRUPT
            | flags::DECIMAL
            | flags::BREAK
            | flags::RESERVED
            | flags::OVERFLOW
            | flags::NEGATIVE;
        assert_eq!(all, 0xFF);
    }
}
