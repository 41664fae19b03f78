/*!
table.rs - Table-driven opcode metadata for the 6502 documented set.

Purpose
=======
One static, read-only table mapping every opcode byte to its metadata:
mnemonic, addressing mode, encoded size, base cycle count, page-cross
penalty flag, and semantic category. The table covers the 151 documented
opcodes; the remaining 105 entries are marked invalid with `size = 1` so
a sweeping decoder can skip one byte and keep going.

Design Notes
============
- The table is a `static` built in a const block from `const fn`
  constructors, so lookups are a plain array index with no lazy init and
  no global mutable state.
- Instruction size is derived from the addressing mode (opcode byte plus
  0-2 operand bytes), which keeps the size/operand-count invariant true
  by construction.
- `base_cycles` and `page_cross_penalty` are carried for fidelity; the
  analysis pipeline itself never consumes them.
*/

use crate::cpu::addressing::AddressingMode;

/// Semantic grouping used by the tracer and the C emitter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InstructionCategory {
    Load,
    Store,
    Transfer,
    Stack,
    Arithmetic,
    Increment,
    Decrement,
    Shift,
    Logic,
    Compare,
    Branch,
    Jump,
    Return,
    SetFlag,
    ClearFlag,
    Interrupt,
    Other,
}

/// Static metadata for one opcode byte.
#[derive(Copy, Clone, Debug)]
pub struct InstructionInfo {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub mode: AddressingMode,
    /// Encoded size in bytes (opcode + operands), 1..=3.
    pub size: u8,
    pub base_cycles: u8,
    pub page_cross_penalty: bool,
    pub category: InstructionCategory,
    pub is_valid: bool,
}

impl InstructionInfo {
    const fn new(
        opcode: u8,
        mnemonic: &'static str,
        mode: AddressingMode,
        base_cycles: u8,
        page_cross_penalty: bool,
        category: InstructionCategory,
    ) -> Self {
        Self {
            opcode,
            mnemonic,
            mode,
            size: 1 + mode.operand_len() as u8,
            base_cycles,
            page_cross_penalty,
            category,
            is_valid: true,
        }
    }

    /// Placeholder for an undocumented opcode: one byte, skippable.
    const fn invalid(opcode: u8) -> Self {
        Self {
            opcode,
            mnemonic: "???",
            mode: AddressingMode::Implied,
            size: 1,
            base_cycles: 2,
            page_cross_penalty: false,
            category: InstructionCategory::Other,
            is_valid: false,
        }
    }

    /// Conditional branch (BCC/BCS/BEQ/BMI/BNE/BPL/BVC/BVS).
    #[inline]
    pub fn is_branch(&self) -> bool {
        matches!(self.category, InstructionCategory::Branch)
    }

    /// Unconditional transfer of control (JMP or JSR).
    #[inline]
    pub fn is_jump(&self) -> bool {
        matches!(self.mnemonic, "JMP" | "JSR")
    }

    /// Returns control to a caller or interrupted context (RTS or RTI).
    #[inline]
    pub fn is_function_exit(&self) -> bool {
        matches!(self.mnemonic, "RTS" | "RTI")
    }
}

/// Look up the metadata for an opcode byte.
#[inline]
pub fn opcode_info(opcode: u8) -> &'static InstructionInfo {
    &OPCODE_TABLE[opcode as usize]
}

pub static OPCODE_TABLE: [InstructionInfo; 256] = {
    use AddressingMode::*;
    use InstructionCategory::*;

    let mut t = [InstructionInfo::invalid(0); 256];
    // Stamp each invalid placeholder with its own opcode byte.
    let mut i = 0;
    while i < 256 {
        t[i] = InstructionInfo::invalid(i as u8);
        i += 1;
    }

    // ADC
    t[0x69] = InstructionInfo::new(0x69, "ADC", Immediate, 2, false, Arithmetic);
    t[0x65] = InstructionInfo::new(0x65, "ADC", ZeroPage, 3, false, Arithmetic);
    t[0x75] = InstructionInfo::new(0x75, "ADC", ZeroPageX, 4, false, Arithmetic);
    t[0x6D] = InstructionInfo::new(0x6D, "ADC", Absolute, 4, false, Arithmetic);
    t[0x7D] = InstructionInfo::new(0x7D, "ADC", AbsoluteX, 4, true, Arithmetic);
    t[0x79] = InstructionInfo::new(0x79, "ADC", AbsoluteY, 4, true, Arithmetic);
    t[0x61] = InstructionInfo::new(0x61, "ADC", IndexedIndirect, 6, false, Arithmetic);
    t[0x71] = InstructionInfo::new(0x71, "ADC", IndirectIndexed, 5, true, Arithmetic);

    // AND
    t[0x29] = InstructionInfo::new(0x29, "AND", Immediate, 2, false, Logic);
    t[0x25] = InstructionInfo::new(0x25, "AND", ZeroPage, 3, false, Logic);
    t[0x35] = InstructionInfo::new(0x35, "AND", ZeroPageX, 4, false, Logic);
    t[0x2D] = InstructionInfo::new(0x2D, "AND", Absolute, 4, false, Logic);
    t[0x3D] = InstructionInfo::new(0x3D, "AND", AbsoluteX, 4, true, Logic);
    t[0x39] = InstructionInfo::new(0x39, "AND", AbsoluteY, 4, true, Logic);
    t[0x21] = InstructionInfo::new(0x21, "AND", IndexedIndirect, 6, false, Logic);
    t[0x31] = InstructionInfo::new(0x31, "AND", IndirectIndexed, 5, true, Logic);

    // ASL
    t[0x0A] = InstructionInfo::new(0x0A, "ASL", Accumulator, 2, false, Shift);
    t[0x06] = InstructionInfo::new(0x06, "ASL", ZeroPage, 5, false, Shift);
    t[0x16] = InstructionInfo::new(0x16, "ASL", ZeroPageX, 6, false, Shift);
    t[0x0E] = InstructionInfo::new(0x0E, "ASL", Absolute, 6, false, Shift);
    t[0x1E] = InstructionInfo::new(0x1E, "ASL", AbsoluteX, 7, false, Shift);

    // Branches
    t[0x90] = InstructionInfo::new(0x90, "BCC", Relative, 2, false, Branch);
    t[0xB0] = InstructionInfo::new(0xB0, "BCS", Relative, 2, false, Branch);
    t[0xF0] = InstructionInfo::new(0xF0, "BEQ", Relative, 2, false, Branch);
    t[0x30] = InstructionInfo::new(0x30, "BMI", Relative, 2, false, Branch);
    t[0xD0] = InstructionInfo::new(0xD0, "BNE", Relative, 2, false, Branch);
    t[0x10] = InstructionInfo::new(0x10, "BPL", Relative, 2, false, Branch);
    t[0x50] = InstructionInfo::new(0x50, "BVC", Relative, 2, false, Branch);
    t[0x70] = InstructionInfo::new(0x70, "BVS", Relative, 2, false, Branch);

    // BIT
    t[0x24] = InstructionInfo::new(0x24, "BIT", ZeroPage, 3, false, Logic);
    t[0x2C] = InstructionInfo::new(0x2C, "BIT", Absolute, 4, false, Logic);

    // BRK
    t[0x00] = InstructionInfo::new(0x00, "BRK", Implied, 7, false, Interrupt);

    // Flag clears
    t[0x18] = InstructionInfo::new(0x18, "CLC", Implied, 2, false, ClearFlag);
    t[0xD8] = InstructionInfo::new(0xD8, "CLD", Implied, 2, false, ClearFlag);
    t[0x58] = InstructionInfo::new(0x58, "CLI", Implied, 2, false, ClearFlag);
    t[0xB8] = InstructionInfo::new(0xB8, "CLV", Implied, 2, false, ClearFlag);

    // CMP
    t[0xC9] = InstructionInfo::new(0xC9, "CMP", Immediate, 2, false, Compare);
    t[0xC5] = InstructionInfo::new(0xC5, "CMP", ZeroPage, 3, false, Compare);
    t[0xD5] = InstructionInfo::new(0xD5, "CMP", ZeroPageX, 4, false, Compare);
    t[0xCD] = InstructionInfo::new(0xCD, "CMP", Absolute, 4, false, Compare);
    t[0xDD] = InstructionInfo::new(0xDD, "CMP", AbsoluteX, 4, true, Compare);
    t[0xD9] = InstructionInfo::new(0xD9, "CMP", AbsoluteY, 4, true, Compare);
    t[0xC1] = InstructionInfo::new(0xC1, "CMP", IndexedIndirect, 6, false, Compare);
    t[0xD1] = InstructionInfo::new(0xD1, "CMP", IndirectIndexed, 5, true, Compare);

    // CPX / CPY
    t[0xE0] = InstructionInfo::new(0xE0, "CPX", Immediate, 2, false, Compare);
    t[0xE4] = InstructionInfo::new(0xE4, "CPX", ZeroPage, 3, false, Compare);
    t[0xEC] = InstructionInfo::new(0xEC, "CPX", Absolute, 4, false, Compare);
    t[0xC0] = InstructionInfo::new(0xC0, "CPY", Immediate, 2, false, Compare);
    t[0xC4] = InstructionInfo::new(0xC4, "CPY", ZeroPage, 3, false, Compare);
    t[0xCC] = InstructionInfo::new(0xCC, "CPY", Absolute, 4, false, Compare);

    // DEC / DEX / DEY
    t[0xC6] = InstructionInfo::new(0xC6, "DEC", ZeroPage, 5, false, Decrement);
    t[0xD6] = InstructionInfo::new(0xD6, "DEC", ZeroPageX, 6, false, Decrement);
    t[0xCE] = InstructionInfo::new(0xCE, "DEC", Absolute, 6, false, Decrement);
    t[0xDE] = InstructionInfo::new(0xDE, "DEC", AbsoluteX, 7, false, Decrement);
    t[0xCA] = InstructionInfo::new(0xCA, "DEX", Implied, 2, false, Decrement);
    t[0x88] = InstructionInfo::new(0x88, "DEY", Implied, 2, false, Decrement);

    // EOR
    t[0x49] = InstructionInfo::new(0x49, "EOR", Immediate, 2, false, Logic);
    t[0x45] = InstructionInfo::new(0x45, "EOR", ZeroPage, 3, false, Logic);
    t[0x55] = InstructionInfo::new(0x55, "EOR", ZeroPageX, 4, false, Logic);
    t[0x4D] = InstructionInfo::new(0x4D, "EOR", Absolute, 4, false, Logic);
    t[0x5D] = InstructionInfo::new(0x5D, "EOR", AbsoluteX, 4, true, Logic);
    t[0x59] = InstructionInfo::new(0x59, "EOR", AbsoluteY, 4, true, Logic);
    t[0x41] = InstructionInfo::new(0x41, "EOR", IndexedIndirect, 6, false, Logic);
    t[0x51] = InstructionInfo::new(0x51, "EOR", IndirectIndexed, 5, true, Logic);

    // INC / INX / INY
    t[0xE6] = InstructionInfo::new(0xE6, "INC", ZeroPage, 5, false, Increment);
    t[0xF6] = InstructionInfo::new(0xF6, "INC", ZeroPageX, 6, false, Increment);
    t[0xEE] = InstructionInfo::new(0xEE, "INC", Absolute, 6, false, Increment);
    t[0xFE] = InstructionInfo::new(0xFE, "INC", AbsoluteX, 7, false, Increment);
    t[0xE8] = InstructionInfo::new(0xE8, "INX", Implied, 2, false, Increment);
    t[0xC8] = InstructionInfo::new(0xC8, "INY", Implied, 2, false, Increment);

    // JMP / JSR
    t[0x4C] = InstructionInfo::new(0x4C, "JMP", Absolute, 3, false, Jump);
    t[0x6C] = InstructionInfo::new(0x6C, "JMP", Indirect, 5, false, Jump);
    t[0x20] = InstructionInfo::new(0x20, "JSR", Absolute, 6, false, Jump);

    // LDA
    t[0xA9] = InstructionInfo::new(0xA9, "LDA", Immediate, 2, false, Load);
    t[0xA5] = InstructionInfo::new(0xA5, "LDA", ZeroPage, 3, false, Load);
    t[0xB5] = InstructionInfo::new(0xB5, "LDA", ZeroPageX, 4, false, Load);
    t[0xAD] = InstructionInfo::new(0xAD, "LDA", Absolute, 4, false, Load);
    t[0xBD] = InstructionInfo::new(0xBD, "LDA", AbsoluteX, 4, true, Load);
    t[0xB9] = InstructionInfo::new(0xB9, "LDA", AbsoluteY, 4, true, Load);
    t[0xA1] = InstructionInfo::new(0xA1, "LDA", IndexedIndirect, 6, false, Load);
    t[0xB1] = InstructionInfo::new(0xB1, "LDA", IndirectIndexed, 5, true, Load);

    // LDX
    t[0xA2] = InstructionInfo::new(0xA2, "LDX", Immediate, 2, false, Load);
    t[0xA6] = InstructionInfo::new(0xA6, "LDX", ZeroPage, 3, false, Load);
    t[0xB6] = InstructionInfo::new(0xB6, "LDX", ZeroPageY, 4, false, Load);
    t[0xAE] = InstructionInfo::new(0xAE, "LDX", Absolute, 4, false, Load);
    t[0xBE] = InstructionInfo::new(0xBE, "LDX", AbsoluteY, 4, true, Load);

    // LDY
    t[0xA0] = InstructionInfo::new(0xA0, "LDY", Immediate, 2, false, Load);
    t[0xA4] = InstructionInfo::new(0xA4, "LDY", ZeroPage, 3, false, Load);
    t[0xB4] = InstructionInfo::new(0xB4, "LDY", ZeroPageX, 4, false, Load);
    t[0xAC] = InstructionInfo::new(0xAC, "LDY", Absolute, 4, false, Load);
    t[0xBC] = InstructionInfo::new(0xBC, "LDY", AbsoluteX, 4, true, Load);

    // LSR
    t[0x4A] = InstructionInfo::new(0x4A, "LSR", Accumulator, 2, false, Shift);
    t[0x46] = InstructionInfo::new(0x46, "LSR", ZeroPage, 5, false, Shift);
    t[0x56] = InstructionInfo::new(0x56, "LSR", ZeroPageX, 6, false, Shift);
    t[0x4E] = InstructionInfo::new(0x4E, "LSR", Absolute, 6, false, Shift);
    t[0x5E] = InstructionInfo::new(0x5E, "LSR", AbsoluteX, 7, false, Shift);

    // NOP
    t[0xEA] = InstructionInfo::new(0xEA, "NOP", Implied, 2, false, Other);

    // ORA
    t[0x09] = InstructionInfo::new(0x09, "ORA", Immediate, 2, false, Logic);
    t[0x05] = InstructionInfo::new(0x05, "ORA", ZeroPage, 3, false, Logic);
    t[0x15] = InstructionInfo::new(0x15, "ORA", ZeroPageX, 4, false, Logic);
    t[0x0D] = InstructionInfo::new(0x0D, "ORA", Absolute, 4, false, Logic);
    t[0x1D] = InstructionInfo::new(0x1D, "ORA", AbsoluteX, 4, true, Logic);
    t[0x19] = InstructionInfo::new(0x19, "ORA", AbsoluteY, 4, true, Logic);
    t[0x01] = InstructionInfo::new(0x01, "ORA", IndexedIndirect, 6, false, Logic);
    t[0x11] = InstructionInfo::new(0x11, "ORA", IndirectIndexed, 5, true, Logic);

    // Stack
    t[0x48] = InstructionInfo::new(0x48, "PHA", Implied, 3, false, Stack);
    t[0x08] = InstructionInfo::new(0x08, "PHP", Implied, 3, false, Stack);
    t[0x68] = InstructionInfo::new(0x68, "PLA", Implied, 4, false, Stack);
    t[0x28] = InstructionInfo::new(0x28, "PLP", Implied, 4, false, Stack);

    // ROL
    t[0x2A] = InstructionInfo::new(0x2A, "ROL", Accumulator, 2, false, Shift);
    t[0x26] = InstructionInfo::new(0x26, "ROL", ZeroPage, 5, false, Shift);
    t[0x36] = InstructionInfo::new(0x36, "ROL", ZeroPageX, 6, false, Shift);
    t[0x2E] = InstructionInfo::new(0x2E, "ROL", Absolute, 6, false, Shift);
    t[0x3E] = InstructionInfo::new(0x3E, "ROL", AbsoluteX, 7, false, Shift);

    // ROR
    t[0x6A] = InstructionInfo::new(0x6A, "ROR", Accumulator, 2, false, Shift);
    t[0x66] = InstructionInfo::new(0x66, "ROR", ZeroPage, 5, false, Shift);
    t[0x76] = InstructionInfo::new(0x76, "ROR", ZeroPageX, 6, false, Shift);
    t[0x6E] = InstructionInfo::new(0x6E, "ROR", Absolute, 6, false, Shift);
    t[0x7E] = InstructionInfo::new(0x7E, "ROR", AbsoluteX, 7, false, Shift);

    // Returns
    t[0x40] = InstructionInfo::new(0x40, "RTI", Implied, 6, false, Return);
    t[0x60] = InstructionInfo::new(0x60, "RTS", Implied, 6, false, Return);

    // SBC
    t[0xE9] = InstructionInfo::new(0xE9, "SBC", Immediate, 2, false, Arithmetic);
    t[0xE5] = InstructionInfo::new(0xE5, "SBC", ZeroPage, 3, false, Arithmetic);
    t[0xF5] = InstructionInfo::new(0xF5, "SBC", ZeroPageX, 4, false, Arithmetic);
    t[0xED] = InstructionInfo::new(0xED, "SBC", Absolute, 4, false, Arithmetic);
    t[0xFD] = InstructionInfo::new(0xFD, "SBC", AbsoluteX, 4, true, Arithmetic);
    t[0xF9] = InstructionInfo::new(0xF9, "SBC", AbsoluteY, 4, true, Arithmetic);
    t[0xE1] = InstructionInfo::new(0xE1, "SBC", IndexedIndirect, 6, false, Arithmetic);
    t[0xF1] = InstructionInfo::new(0xF1, "SBC", IndirectIndexed, 5, true, Arithmetic);

    // Flag sets
    t[0x38] = InstructionInfo::new(0x38, "SEC", Implied, 2, false, SetFlag);
    t[0xF8] = InstructionInfo::new(0xF8, "SED", Implied, 2, false, SetFlag);
    t[0x78] = InstructionInfo::new(0x78, "SEI", Implied, 2, false, SetFlag);

    // STA
    t[0x85] = InstructionInfo::new(0x85, "STA", ZeroPage, 3, false, Store);
    t[0x95] = InstructionInfo::new(0x95, "STA", ZeroPageX, 4, false, Store);
    t[0x8D] = InstructionInfo::new(0x8D, "STA", Absolute, 4, false, Store);
    t[0x9D] = InstructionInfo::new(0x9D, "STA", AbsoluteX, 5, false, Store);
    t[0x99] = InstructionInfo::new(0x99, "STA", AbsoluteY, 5, false, Store);
    t[0x81] = InstructionInfo::new(0x81, "STA", IndexedIndirect, 6, false, Store);
    t[0x91] = InstructionInfo::new(0x91, "STA", IndirectIndexed, 6, false, Store);

    // STX / STY
    t[0x86] = InstructionInfo::new(0x86, "STX", ZeroPage, 3, false, Store);
    t[0x96] = InstructionInfo::new(0x96, "STX", ZeroPageY, 4, false, Store);
    t[0x8E] = InstructionInfo::new(0x8E, "STX", Absolute, 4, false, Store);
    t[0x84] = InstructionInfo::new(0x84, "STY", ZeroPage, 3, false, Store);
    t[0x94] = InstructionInfo::new(0x94, "STY", ZeroPageX, 4, false, Store);
    t[0x8C] = InstructionInfo::new(0x8C, "STY", Absolute, 4, false, Store);

    // Transfers
    t[0xAA] = InstructionInfo::new(0xAA, "TAX", Implied, 2, false, Transfer);
    t[0xA8] = InstructionInfo::new(0xA8, "TAY", Implied, 2, false, Transfer);
    t[0xBA] = InstructionInfo::new(0xBA, "TSX", Implied, 2, false, Transfer);
    t[0x8A] = InstructionInfo::new(0x8A, "TXA", Implied, 2, false, Transfer);
    t[0x9A] = InstructionInfo::new(0x9A, "TXS", Implied, 2, false, Transfer);
    t[0x98] = InstructionInfo::new(0x98, "TYA", Implied, 2, false, Transfer);

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcode_count_is_151() {
        let valid = OPCODE_TABLE.iter().filter(|i| i.is_valid).count();
        assert_eq!(valid, 151);
    }

    #[test]
    fn every_entry_knows_its_own_opcode() {
        for (i, info) in OPCODE_TABLE.iter().enumerate() {
            assert_eq!(info.opcode as usize, i);
        }
    }

    #[test]
    fn sizes_follow_addressing_mode() {
        for info in OPCODE_TABLE.iter().filter(|i| i.is_valid) {
            assert_eq!(info.size as usize, 1 + info.mode.operand_len());
            assert!(info.size >= 1 && info.size <= 3);
        }
    }

    #[test]
    fn invalid_entries_are_single_byte() {
        for info in OPCODE_TABLE.iter().filter(|i| !i.is_valid) {
            assert_eq!(info.size, 1);
        }
    }

    #[test]
    fn spot_check_metadata() {
        let lda = opcode_info(0xA9);
        assert_eq!(lda.mnemonic, "LDA");
        assert_eq!(lda.mode, AddressingMode::Immediate);
        assert_eq!(lda.size, 2);
        assert_eq!(lda.base_cycles, 2);

        let jmp_ind = opcode_info(0x6C);
        assert_eq!(jmp_ind.mnemonic, "JMP");
        assert_eq!(jmp_ind.mode, AddressingMode::Indirect);
        assert!(jmp_ind.is_jump());

        let sta = opcode_info(0x8D);
        assert_eq!(sta.category, InstructionCategory::Store);
        assert_eq!(sta.base_cycles, 4);

        let bd = opcode_info(0xBD);
        assert!(bd.page_cross_penalty);

        assert!(opcode_info(0x60).is_function_exit());
        assert!(opcode_info(0x40).is_function_exit());
        assert!(opcode_info(0xD0).is_branch());
    }

    #[test]
    fn undocumented_bytes_are_invalid() {
        for op in [0x02u8, 0x3F, 0x80, 0xFF] {
            assert!(!opcode_info(op).is_valid);
        }
    }
}
