/*!
disasm.rs - Whole-PRG 6502 disassembler.

Overview
========
Produces a `cpu_address -> DisassembledInstruction` map for the PRG bank
plus the auxiliary sets downstream phases consume (entry points,
referenced addresses, labels). Four phases:

  A. Linear sweep: decode from $8000 forward, skipping undocumented
     opcode bytes one at a time (they may be data, not code).
  B. Trace: worklist over entry points following branches, jumps, and
     subroutine calls. JSR targets become new entry points.
  C. Label assignment: `sub_XXXX` for entry points, `loc_XXXX` for other
     referenced addresses; `-> <label>` comments on resolved transfers.
  D. Fixed-point re-sweep: targets that land inside previously skipped
     byte runs trigger fresh sweeps; iterate to a fixed point.

A hard iteration cap bounds phase D against pathological self-referential
jump tables; hitting it is recorded as `saturated` rather than an error.

Mapping
=======
The PRG bank sits at $8000. A single 16 KiB bank mirrors into
$C000-$FFFF (NROM-128), so reset vectors above $C000 resolve through the
mirror. Bytes beyond the first 32 KiB are unreachable (fixed bank; bank
switching is out of scope).
*/

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::cpu::addressing::{relative_target, word, AddressingMode};
use crate::cpu::table::{opcode_info, InstructionInfo};
use crate::rom::{RomImage, PRG_BASE};

/// Phase D re-sweep cap.
const MAX_RESWEEP_ITERATIONS: usize = 100;

const PRG_BANK: usize = 16 * 1024;

/// One decoded instruction at a CPU address.
#[derive(Debug, Clone)]
pub struct DisassembledInstruction {
    /// Address as seen by the 6502 (PRG mapped at $8000).
    pub cpu_address: u16,
    /// Offset into PRG data.
    pub rom_offset: u16,
    pub info: &'static InstructionInfo,
    /// Opcode byte plus operand bytes (always `info.size` long).
    pub bytes: Vec<u8>,
    /// Resolved branch/jump target, when statically known.
    pub target_address: Option<u16>,
    pub label: Option<String>,
    pub comment: Option<String>,
    /// Tie-breaker for synthetic records sharing a CPU address: real
    /// instructions are 0, loopback-repair pseudo-JMPs positive,
    /// virtual variants negative.
    pub sub_address_order: i32,
}

impl DisassembledInstruction {
    #[inline]
    pub fn is_branch(&self) -> bool {
        self.info.is_branch()
    }

    #[inline]
    pub fn is_jump(&self) -> bool {
        self.info.is_jump()
    }

    #[inline]
    pub fn is_function_exit(&self) -> bool {
        self.info.is_function_exit()
    }

    /// Operand column text for listings.
    pub fn operand_text(&self) -> String {
        self.info
            .mode
            .format_operand(&self.bytes[1..], self.target_address)
    }

    /// Raw bytes rendered as `A9 01`.
    pub fn bytes_text(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Decode one instruction out of `bytes[offset..]`.
///
/// Returns `None` when the opcode is undocumented or the operand bytes
/// run past the end of the slice; callers decide whether that skips a
/// byte (sweep) or ends a path (trace).
pub(crate) fn decode_one(
    bytes: &[u8],
    offset: usize,
    cpu_address: u16,
) -> Option<DisassembledInstruction> {
    let info = opcode_info(bytes[offset]);
    if !info.is_valid {
        return None;
    }
    let size = info.size as usize;
    if offset + size > bytes.len() {
        return None;
    }
    // Decoding never wraps the address space; only target resolution may.
    if cpu_address as u32 + size as u32 > 0x1_0000 {
        return None;
    }
    let encoded = bytes[offset..offset + size].to_vec();
    let target_address = resolve_target(info, cpu_address, &encoded[1..]);
    Some(DisassembledInstruction {
        cpu_address,
        rom_offset: offset as u16,
        info,
        bytes: encoded,
        target_address,
        label: None,
        comment: None,
        sub_address_order: 0,
    })
}

/// Static target resolution: relative branches always resolve; absolute
/// and indirect jumps resolve to the operand word (for `JMP (a)` that is
/// the indirection base, not the runtime target).
pub(crate) fn resolve_target(
    info: &InstructionInfo,
    cpu_address: u16,
    operands: &[u8],
) -> Option<u16> {
    match info.mode {
        AddressingMode::Relative => Some(relative_target(cpu_address, info.size, operands[0])),
        AddressingMode::Absolute | AddressingMode::Indirect if info.is_jump() => {
            Some(word(operands))
        }
        _ => None,
    }
}

/// Whole-PRG disassembly result.
#[derive(Debug)]
pub struct DisassemblyReport {
    pub instructions: BTreeMap<u16, DisassembledInstruction>,
    pub labels: BTreeMap<u16, String>,
    pub entry_points: BTreeSet<u16>,
    pub referenced_addresses: BTreeSet<u16>,
    /// True when phase D hit its iteration cap before converging.
    pub saturated: bool,
}

/// Disassemble the PRG bank of `rom`.
pub fn disassemble(rom: &RomImage) -> DisassemblyReport {
    Disassembler::new(rom.prg_slice(), rom.entry_points().clone()).run()
}

struct Disassembler<'a> {
    prg: &'a [u8],
    instructions: BTreeMap<u16, DisassembledInstruction>,
    entry_points: BTreeSet<u16>,
    referenced: BTreeSet<u16>,
    saturated: bool,
}

impl<'a> Disassembler<'a> {
    fn new(prg: &'a [u8], entry_points: BTreeSet<u16>) -> Self {
        Self {
            prg,
            instructions: BTreeMap::new(),
            entry_points,
            referenced: BTreeSet::new(),
            saturated: false,
        }
    }

    /// Map a CPU address onto a PRG offset, honoring the NROM-128 mirror.
    fn cpu_to_offset(&self, addr: u16) -> Option<usize> {
        if addr < PRG_BASE {
            return None;
        }
        let off = (addr - PRG_BASE) as usize;
        if off < self.prg.len() {
            Some(off)
        } else if self.prg.len() == PRG_BANK {
            Some(off % PRG_BANK)
        } else {
            None
        }
    }

    /// Phase A: linear sweep from `start` until an already-decoded
    /// address or the end of the window. Undocumented opcodes advance
    /// one byte; their bytes may be data.
    ///
    /// A sweep never crosses from the primary window into the NROM-128
    /// mirror; mirror addresses are swept only when a vector or target
    /// starts there.
    fn sweep(&mut self, start: u16) {
        let window_end: u32 = if self.prg.len() == PRG_BANK && start >= 0xC000 {
            0x1_0000
        } else {
            PRG_BASE as u32 + self.prg.len().min(0x8000) as u32
        };
        let mut addr = start;
        loop {
            if (addr as u32) >= window_end {
                break;
            }
            if self.instructions.contains_key(&addr) {
                break;
            }
            let Some(off) = self.cpu_to_offset(addr) else {
                break;
            };
            let step = match decode_one(self.prg, off, addr) {
                Some(instr) => {
                    let size = instr.info.size as u16;
                    self.instructions.insert(addr, instr);
                    size
                }
                None => 1,
            };
            match addr.checked_add(step) {
                Some(next) => addr = next,
                None => break,
            }
        }
    }

    /// Phase B: recursive trace over the entry-point worklist.
    fn trace(&mut self) {
        let mut work: VecDeque<u16> = self.entry_points.iter().copied().collect();
        let mut traced: BTreeSet<u16> = BTreeSet::new();

        while let Some(addr) = work.pop_front() {
            if !traced.insert(addr) {
                continue;
            }
            let Some(instr) = self.instructions.get(&addr) else {
                continue;
            };
            let info = instr.info;
            let target = instr.target_address;
            let next = addr.wrapping_add(info.size as u16);

            if info.mnemonic == "JSR" {
                if let Some(t) = target {
                    self.entry_points.insert(t);
                    self.referenced.insert(t);
                    work.push_back(t);
                }
                work.push_back(next);
            } else if info.mnemonic == "JMP" {
                // The runtime target of JMP (a) is statically unknown;
                // the path ends there.
                if info.mode == AddressingMode::Absolute {
                    if let Some(t) = target {
                        self.referenced.insert(t);
                        work.push_back(t);
                    }
                }
            } else if info.is_branch() {
                if let Some(t) = target {
                    self.referenced.insert(t);
                    work.push_back(t);
                }
                work.push_back(next);
            } else if info.is_function_exit() {
                // RTS/RTI: stop this path.
            } else {
                work.push_back(next);
            }
        }
    }

    /// Phase C: label entry points and referenced addresses, then stamp
    /// labels and `-> <label>` comments onto the decoded instructions.
    fn assign_labels(&mut self) -> BTreeMap<u16, String> {
        let mut labels = BTreeMap::new();
        for &e in &self.entry_points {
            labels.insert(e, format!("sub_{:04X}", e));
        }
        for &r in &self.referenced {
            labels
                .entry(r)
                .or_insert_with(|| format!("loc_{:04X}", r));
        }

        for (addr, instr) in self.instructions.iter_mut() {
            if let Some(label) = labels.get(addr) {
                instr.label = Some(label.clone());
            }
            if let Some(t) = instr.target_address {
                if let Some(label) = labels.get(&t) {
                    instr.comment = Some(format!("-> {}", label));
                }
            }
        }
        labels
    }

    /// Phases A-D to a fixed point.
    fn run(mut self) -> DisassemblyReport {
        self.sweep(PRG_BASE);
        // Entry points may sit above the initial sweep window (mirror
        // addresses); give each its own sweep before tracing.
        for e in self.entry_points.clone() {
            self.sweep(e);
        }

        let mut iterations = 0;
        loop {
            self.trace();

            // Phase D: targets inside previously skipped byte runs.
            let missing: Vec<u16> = self
                .referenced
                .iter()
                .chain(self.entry_points.iter())
                .copied()
                .filter(|a| *a >= PRG_BASE && !self.instructions.contains_key(a))
                .filter(|a| self.cpu_to_offset(*a).is_some())
                .collect();
            if missing.is_empty() {
                break;
            }
            iterations += 1;
            if iterations > MAX_RESWEEP_ITERATIONS {
                self.saturated = true;
                break;
            }
            for m in missing {
                self.sweep(m);
            }
        }

        let labels = self.assign_labels();
        DisassemblyReport {
            instructions: self.instructions,
            labels,
            entry_points: self.entry_points,
            referenced_addresses: self.referenced,
            saturated: self.saturated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rom::RomImage;
    use crate::test_utils::build_prg_rom;

    fn disassemble_prg(program: &[u8], reset: u16) -> DisassemblyReport {
        let bytes = build_prg_rom(program, (reset, 0x8000, 0x8000));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        disassemble(&rom)
    }

    #[test]
    fn sweep_decodes_contiguous_code() {
        // LDA #$01; STA $2000; RTS
        let report = disassemble_prg(&[0xA9, 0x01, 0x8D, 0x00, 0x20, 0x60], 0x8000);
        assert_eq!(report.instructions[&0x8000].info.mnemonic, "LDA");
        assert_eq!(report.instructions[&0x8002].info.mnemonic, "STA");
        assert_eq!(report.instructions[&0x8005].info.mnemonic, "RTS");
    }

    #[test]
    fn branch_target_labeled_and_commented() {
        // LDA #$01; BNE +2; LDA #$02; BRK  (branch skips to the BRK)
        let report = disassemble_prg(&[0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00], 0x8000);
        let bne = &report.instructions[&0x8002];
        assert_eq!(bne.target_address, Some(0x8006));
        assert_eq!(bne.comment.as_deref(), Some("-> loc_8006"));
        assert_eq!(report.labels[&0x8006], "loc_8006");
        assert_eq!(report.labels[&0x8000], "sub_8000");
        // Both LDAs decoded; branch fall-through is real code here.
        assert_eq!(report.instructions[&0x8004].info.mnemonic, "LDA");
    }

    #[test]
    fn jsr_target_becomes_entry_point() {
        // JSR $8010; BRK; pad; LDA #$AA; RTS at $8010
        let mut prg = vec![0x20, 0x10, 0x80, 0x00];
        prg.resize(0x10, 0xEA);
        prg.extend_from_slice(&[0xA9, 0xAA, 0x60]);
        let report = disassemble_prg(&prg, 0x8000);
        assert!(report.entry_points.contains(&0x8010));
        assert_eq!(report.labels[&0x8010], "sub_8010");
        assert_eq!(report.instructions[&0x8010].info.mnemonic, "LDA");
    }

    #[test]
    fn invalid_bytes_skipped_silently() {
        // 0x02 is undocumented; sweep should step over it and decode the rest.
        let report = disassemble_prg(&[0x02, 0xA9, 0x01, 0x60], 0x8000);
        assert!(!report.instructions.contains_key(&0x8000));
        assert_eq!(report.instructions[&0x8001].info.mnemonic, "LDA");
    }

    #[test]
    fn indirect_jump_target_not_labeled() {
        // JMP ($8010): base resolves but must not grow the label map.
        let report = disassemble_prg(&[0x6C, 0x10, 0x80], 0x8000);
        let jmp = &report.instructions[&0x8000];
        assert_eq!(jmp.target_address, Some(0x8010));
        assert!(!report.labels.contains_key(&0x8010));
        assert!(!report.referenced_addresses.contains(&0x8010));
    }

    #[test]
    fn resweep_reaches_target_hidden_by_misalignment() {
        // The 0xAD run decodes as 3-byte LDA absolutes, so the first
        // sweep strides over $8007. The JMP reference forces phase D to
        // sweep again from $8007 and recover LDA #$05.
        let prg = [0x4C, 0x07, 0x80, 0xAD, 0xAD, 0xAD, 0xAD, 0xA9, 0x05, 0x60];
        let report = disassemble_prg(&prg, 0x8000);
        assert_eq!(report.instructions[&0x8007].info.mnemonic, "LDA");
        assert_eq!(report.instructions[&0x8007].bytes, vec![0xA9, 0x05]);
        assert_eq!(report.labels[&0x8007], "loc_8007");
        assert!(!report.saturated);
    }

    #[test]
    fn round_trip_bytes_match_prg() {
        let prg = [0xA9, 0x01, 0x8D, 0x00, 0x20, 0x4C, 0x00, 0x80];
        let bytes = build_prg_rom(&prg, (0x8000, 0x8000, 0x8000));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        let report = disassemble(&rom);
        let prg_slice = rom.prg_slice();
        for instr in report.instructions.values() {
            let off = instr.rom_offset as usize;
            assert_eq!(&prg_slice[off..off + instr.bytes.len()], &instr.bytes[..]);
            assert_eq!(instr.bytes.len(), instr.info.size as usize);
        }
    }

    #[test]
    fn decode_never_wraps_address_space() {
        let report = disassemble_prg(&[0xEA; 64], 0x8000);
        for instr in report.instructions.values() {
            assert!(instr.cpu_address as u32 + instr.info.size as u32 <= 0x1_0000);
        }
    }
}
