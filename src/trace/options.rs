//! Trace row layout and filtering options.

use serde::{Deserialize, Serialize};

/// How the `P` register is rendered in a trace row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFlagFormat {
    /// Raw status byte as two hex digits.
    #[default]
    Hexadecimal,
    /// One letter per bit: uppercase when set, lowercase when clear.
    Text,
    /// Only the set bits, padded to a fixed width.
    Abbreviated,
}

/// Options controlling which fields a trace row contains and which
/// events get recorded.
///
/// Replaced as a whole through `TraceLogger::set_options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Show the instruction's encoded bytes.
    pub show_byte_code: bool,
    /// Indent the mnemonic by stack depth (`0xFF - SP` spaces).
    pub indent_code: bool,
    /// Show A, X, Y, P and SP.
    pub show_registers: bool,
    /// Show the PPU dot within the scanline.
    pub show_ppu_cycles: bool,
    /// Show the PPU scanline.
    pub show_ppu_scanline: bool,
    /// Show the PPU frame counter.
    pub show_ppu_frames: bool,
    /// Show the cumulative CPU cycle count.
    pub show_cpu_cycles: bool,
    pub status_format: StatusFlagFormat,
    /// Substitute labels for addresses in operands.
    pub use_labels: bool,
    /// Allow out-of-band annotations in the trace file.
    pub show_extra_info: bool,
    /// Condition expression; empty records every instruction.
    pub condition: String,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            show_byte_code: true,
            indent_code: false,
            show_registers: true,
            show_ppu_cycles: true,
            show_ppu_scanline: true,
            show_ppu_frames: false,
            show_cpu_cycles: false,
            status_format: StatusFlagFormat::Hexadecimal,
            use_labels: false,
            show_extra_info: false,
            condition: String::new(),
        }
    }
}

impl TraceOptions {
    /// Options with every optional column disabled.
    pub fn minimal() -> Self {
        Self {
            show_byte_code: false,
            show_registers: false,
            show_ppu_cycles: false,
            show_ppu_scanline: false,
            ..Self::default()
        }
    }

    /// Replace the condition expression.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }
}
