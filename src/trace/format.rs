//! Trace row formatting.
//!
//! A row looks like this with every column enabled and text flags:
//!
//! ```text
//! C000  A9 01        LDA #$01                         A:00 X:00 Y:00 P:nvb-dIzc SP:FD CYC: 21 SL:241 FC:3 CPU Cycle:7
//! ```
//!
//! Columns are fixed-width up to the register block so rows line up in a
//! plain text viewer.

use std::fmt::Write;

use super::hooks::{Disassembly, LabelResolver, MemoryView};
use super::options::{StatusFlagFormat, TraceOptions};
use super::state::{flags, DebugState};

/// Width of the byte-code column.
pub const BYTE_CODE_WIDTH: usize = 13;
/// Minimum width of the mnemonic column.
pub const CODE_WIDTH: usize = 32;
/// Width of the abbreviated status flag field.
pub const ABBREVIATED_FLAGS_WIDTH: usize = 6;

/// Status bits from most to least significant, with their set/clear letters.
const STATUS_LETTERS: [(u8, char, char); 8] = [
    (flags::NEGATIVE, 'N', 'n'),
    (flags::OVERFLOW, 'V', 'v'),
    (flags::BREAK, 'B', 'b'),
    (flags::RESERVED, '-', '-'),
    (flags::DECIMAL, 'D', 'd'),
    (flags::INTERRUPT, 'I', 'i'),
    (flags::ZERO, 'Z', 'z'),
    (flags::CARRY, 'C', 'c'),
];

/// Renders trace rows for one set of options.
///
/// Holds no state between rows; the caller tracks whether a row is the
/// first of its output.
pub struct RowFormatter<'a> {
    options: &'a TraceOptions,
    memory: &'a dyn MemoryView,
    labels: Option<&'a dyn LabelResolver>,
}

impl<'a> RowFormatter<'a> {
    /// Create a formatter. `labels` is ignored unless label use is enabled.
    pub fn new(
        options: &'a TraceOptions,
        memory: &'a dyn MemoryView,
        labels: Option<&'a dyn LabelResolver>,
    ) -> Self {
        let labels = if options.use_labels { labels } else { None };
        Self {
            options,
            memory,
            labels,
        }
    }

    /// Append one row to `out`, preceded by a newline unless `first_line`.
    pub fn write_row(
        &self,
        out: &mut String,
        state: &DebugState,
        disassembly: &dyn Disassembly,
        first_line: bool,
    ) {
        let cpu = &state.cpu;
        let ppu = &state.ppu;
        let options = self.options;

        if !first_line {
            out.push('\n');
        }

        let _ = write!(out, "{:04X}  ", cpu.pc);

        if options.show_byte_code {
            let byte_code = disassembly.byte_code();
            let _ = write!(
                out,
                "{:<width$.width$}",
                byte_code,
                width = BYTE_CODE_WIDTH
            );
        }

        if options.indent_code {
            let depth = (0xFF - cpu.sp) as usize;
            out.extend(std::iter::repeat(' ').take(depth));
        }

        let mut code = disassembly.mnemonic(cpu.pc, self.memory, self.labels);
        code.push_str(&disassembly.effective_address(cpu, self.memory, self.labels));
        let _ = write!(out, "{:<width$}", code, width = CODE_WIDTH);

        if options.show_registers {
            let _ = write!(out, " A:{:02X} X:{:02X} Y:{:02X}", cpu.a, cpu.x, cpu.y);
            out.push_str(" P:");
            write_status_flags(out, cpu.ps, options.status_format);
            let _ = write!(out, " SP:{:02X}", cpu.sp);
        }

        if options.show_ppu_cycles {
            let _ = write!(out, " CYC:{:>3}", ppu.cycle);
        }

        if options.show_ppu_scanline {
            let _ = write!(out, " SL:{:>3}", ppu.scanline);
        }

        if options.show_ppu_frames {
            let _ = write!(out, " FC:{}", ppu.frame_count);
        }

        if options.show_cpu_cycles {
            let _ = write!(out, " CPU Cycle:{}", cpu.cycle_count);
        }
    }
}

/// Append the status byte `ps` in the requested format.
pub fn write_status_flags(out: &mut String, ps: u8, format: StatusFlagFormat) {
    if format == StatusFlagFormat::Hexadecimal {
        let _ = write!(out, "{:02X}", ps);
        return;
    }

    let mut padding = ABBREVIATED_FLAGS_WIDTH;
    for &(mask, active, inactive) in STATUS_LETTERS.iter() {
        if ps & mask != 0 {
            out.push(active);
        } else if format == StatusFlagFormat::Text {
            out.push(inactive);
        } else {
            continue;
        }
        padding = padding.saturating_sub(1);
    }
    out.extend(std::iter::repeat(' ').take(padding));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FlatMemory, LabelMap, StaticDisassembly};
    use crate::trace::state::{flags, CpuState, PpuState};

    fn status(ps: u8, format: StatusFlagFormat) -> String {
        let mut out = String::new();
        write_status_flags(&mut out, ps, format);
        out
    }

    fn state() -> DebugState {
        DebugState {
            cpu: CpuState {
                pc: 0xC000,
                sp: 0xFD,
                a: 0x01,
                x: 0x02,
                y: 0x03,
                ps: 0x24,
                cycle_count: 7,
            },
            ppu: PpuState {
                cycle: 21,
                scanline: 241,
                frame_count: 3,
            },
        }
    }

    fn render(options: &TraceOptions, dis: &StaticDisassembly, first_line: bool) -> String {
        let memory = FlatMemory::new();
        let formatter = RowFormatter::new(options, &memory, None);
        let mut out = String::new();
        formatter.write_row(&mut out, &state(), dis, first_line);
        out
    }

    #[test]
    fn test_status_flags_hex() {
        assert_eq!(status(0x24, StatusFlagFormat::Hexadecimal), "24");
        assert_eq!(status(0x00, StatusFlagFormat::Hexadecimal), "00");
    }

    #[test]
    fn test_status_flags_text() {
        assert_eq!(status(0b1001_0001, StatusFlagFormat::Text), "Nvb-dizC");
        assert_eq!(status(0xFF, StatusFlagFormat::Text), "NVB-DIZC");
        assert_eq!(status(0x00, StatusFlagFormat::Text), "nvb-dizc");
    }

    #[test]
    fn test_status_flags_abbreviated() {
        assert_eq!(status(0b1001_0001, StatusFlagFormat::Abbreviated), "N-C   ");
        assert_eq!(status(0x00, StatusFlagFormat::Abbreviated), "      ");
        // More than six set bits: no padding left, field grows.
        assert_eq!(status(0xFF, StatusFlagFormat::Abbreviated), "NVB-DIZC");
    }

    #[test]
    fn test_each_flag_bit_has_its_letter() {
        let cases = [
            (flags::NEGATIVE, "N     "),
            (flags::OVERFLOW, "V     "),
            (flags::BREAK, "B     "),
            (flags::RESERVED, "-     "),
            (flags::DECIMAL, "D     "),
            (flags::INTERRUPT, "I     "),
            (flags::ZERO, "Z     "),
            (flags::CARRY, "C     "),
        ];
        for (bit, expected) in cases {
            assert_eq!(status(bit, StatusFlagFormat::Abbreviated), expected);
        }
        assert_eq!(status(flags::ZERO | flags::CARRY, StatusFlagFormat::Text), "nvb-diZC");
    }

    #[test]
    fn test_full_row() {
        let options = TraceOptions {
            show_ppu_frames: true,
            show_cpu_cycles: true,
            status_format: StatusFlagFormat::Text,
            ..TraceOptions::default()
        };
        let dis = StaticDisassembly::new(&[0xA9, 0x01], "LDA #$01");

        let row = render(&options, &dis, true);
        let expected = format!(
            "C000  {:<13}{:<32} A:01 X:02 Y:03 P:nvb-dIzc SP:FD CYC: 21 SL:241 FC:3 CPU Cycle:7",
            "A9 01", "LDA #$01"
        );
        assert_eq!(row, expected);
    }

    #[test]
    fn test_newline_separator_unless_first() {
        let options = TraceOptions::minimal();
        let dis = StaticDisassembly::new(&[0xEA], "NOP");

        assert!(!render(&options, &dis, true).starts_with('\n'));
        assert!(render(&options, &dis, false).starts_with("\nC000  NOP"));
    }

    #[test]
    fn test_byte_code_column_is_fixed_width() {
        let options = TraceOptions {
            show_byte_code: true,
            ..TraceOptions::minimal()
        };
        let prefix = "C000  ".len();

        for bytes in [&[0xEA][..], &[0xA9, 0x01][..], &[0x8D, 0x00, 0x03][..]] {
            let dis = StaticDisassembly::new(bytes, "X");
            let row = render(&options, &dis, true);
            assert_eq!(&row[prefix + BYTE_CODE_WIDTH..prefix + BYTE_CODE_WIDTH + 1], "X");
        }

        let long = StaticDisassembly::new(&[0; 8], "X");
        let row = render(&options, &long, true);
        assert_eq!(row.len(), prefix + BYTE_CODE_WIDTH + CODE_WIDTH);
    }

    #[test]
    fn test_indent_by_stack_depth() {
        let options = TraceOptions {
            indent_code: true,
            ..TraceOptions::minimal()
        };
        let dis = StaticDisassembly::new(&[0x60], "RTS");
        // SP 0xFD: two bytes pushed, two spaces.
        assert!(render(&options, &dis, true).starts_with("C000    RTS"));
    }

    #[test]
    fn test_long_mnemonic_is_not_truncated() {
        let options = TraceOptions::minimal();
        let text = "JMP ($0200) = $C5F5 @ a_very_long_label_name_here";
        let dis = StaticDisassembly::new(&[0x6C, 0x00, 0x02], text);
        assert_eq!(render(&options, &dis, true), format!("C000  {}", text));
    }

    #[test]
    fn test_effective_address_appended() {
        let options = TraceOptions::minimal();
        let dis = StaticDisassembly::absolute(&[0xAD, 0x00, 0x03], "LDA", 0x0300)
            .with_effective_address(" = $7F");
        assert_eq!(render(&options, &dis, true), format!("C000  {:<32}", "LDA $0300 = $7F"));
    }

    #[test]
    fn test_labels_only_when_enabled() {
        let memory = FlatMemory::new();
        let mut labels = LabelMap::new();
        labels.insert(0x2002, "PPUSTATUS");
        let dis = StaticDisassembly::absolute(&[0xAD, 0x02, 0x20], "LDA", 0x2002);

        let disabled = TraceOptions::minimal();
        let mut out = String::new();
        RowFormatter::new(&disabled, &memory, Some(&labels)).write_row(&mut out, &state(), &dis, true);
        assert!(out.contains("LDA $2002"));

        let enabled = TraceOptions {
            use_labels: true,
            ..TraceOptions::minimal()
        };
        let mut out = String::new();
        RowFormatter::new(&enabled, &memory, Some(&labels)).write_row(&mut out, &state(), &dis, true);
        assert!(out.contains("LDA PPUSTATUS"));
    }

    #[test]
    fn test_pre_render_scanline() {
        let options = TraceOptions {
            show_ppu_scanline: true,
            ..TraceOptions::minimal()
        };
        let memory = FlatMemory::new();
        let dis = StaticDisassembly::new(&[0xEA], "NOP");
        let mut state = state();
        state.ppu.scanline = -1;

        let mut out = String::new();
        RowFormatter::new(&options, &memory, None).write_row(&mut out, &state, &dis, true);
        assert!(out.ends_with(" SL: -1"));
    }
}
