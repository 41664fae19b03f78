/*!
decompile.rs - Single-function tracer.

Given one entry address and a set of code regions, traces the
instructions reachable inside that function and produces an ordered
listing suitable for emission.

Termination is deliberately conservative: `JSR`, `BRK`, `RTS`, `RTI`,
and `JMP (indirect)` all end a path. A subroutine call may never return
to the expected fall-through once the callee touches the stack, and the
runtime target of an indirect jump is statically unknown.

Loopback repair
===============
When tracing re-reaches the entry address (the function body loops back
to its start), a pseudo `JMP entry` (opcode $4C) is synthesized at
`entry - 1` with `sub_address_order = 1` so the loop edge survives in
the linear listing. An entry at $0000 cannot host the repair and is
rejected.

Output ordering
===============
1. The entry instruction.
2. Addresses above the entry, by `(cpu_address, sub_address_order)`.
3. Addresses below the entry (loop-backward body), same ordering.
4. Synthetic records at the entry address with negative order, last, so
   a re-executed listing cannot have the loopback stack-saved by a
   spurious IRQ.
*/

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::cpu::addressing::AddressingMode;
use crate::disasm::{decode_one, DisassembledInstruction};
use crate::AnalysisError;

/// A window of PRG bytes mapped contiguously from `base_address` in CPU
/// space. Several regions may coexist (bank mirrors today, switchable
/// banks later).
#[derive(Debug, Clone, Copy)]
pub struct CodeRegion<'a> {
    base_address: u16,
    bytes: &'a [u8],
}

impl<'a> CodeRegion<'a> {
    pub fn new(base_address: u16, bytes: &'a [u8]) -> Self {
        Self {
            base_address,
            bytes,
        }
    }

    pub fn base_address(&self) -> u16 {
        self.base_address
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Whether `addr` falls inside this window.
    pub fn contains(&self, addr: u16) -> bool {
        addr >= self.base_address
            && (addr as usize) < self.base_address as usize + self.bytes.len()
    }

    fn offset_of(&self, addr: u16) -> usize {
        (addr - self.base_address) as usize
    }
}

/// An ordered, labeled listing of one function.
#[derive(Debug)]
pub struct DecompiledFunction {
    pub entry_address: u16,
    pub ordered_instructions: Vec<DisassembledInstruction>,
    /// Jump-target labels, keyed by CPU address; only real
    /// (`sub_address_order == 0`) instructions are listed.
    pub jump_targets: BTreeMap<u16, String>,
}

/// Trace the function at `entry` across `regions`.
pub fn decompile_function(
    entry: u16,
    regions: &[CodeRegion<'_>],
) -> Result<DecompiledFunction, AnalysisError> {
    let mut instructions: Vec<DisassembledInstruction> = Vec::new();
    let mut decoded: BTreeSet<u16> = BTreeSet::new();
    let mut targets: BTreeSet<u16> = BTreeSet::new();
    let mut loopback_done = false;

    // Worklist carries the source address so a re-arrival at the entry
    // can be told apart from the initial seed.
    let mut work: VecDeque<(u16, Option<u16>)> = VecDeque::new();
    work.push_back((entry, None));

    while let Some((addr, from)) = work.pop_front() {
        if decoded.contains(&addr) {
            if addr == entry && from.is_some() && !loopback_done {
                if entry == 0x0000 {
                    return Err(AnalysisError::LoopbackToZero);
                }
                instructions.push(synthesize_loopback(entry));
                targets.insert(entry);
                loopback_done = true;
            }
            continue;
        }

        let region = regions
            .iter()
            .find(|r| r.contains(addr))
            .ok_or(AnalysisError::RegionMissing(addr))?;
        let offset = region.offset_of(addr);

        let opcode = region.bytes()[offset];
        if !crate::cpu::table::opcode_info(opcode).is_valid {
            // The function ends at the first unknown byte on this path.
            continue;
        }
        let Some(mut instr) = decode_one(region.bytes(), offset, addr) else {
            // Valid opcode but operand bytes run out: fatal here, unlike
            // the whole-PRG sweep which just skips.
            return Err(AnalysisError::OutOfBounds(addr));
        };

        if addr == entry {
            instr.label = Some(format!("sub_{:04X}", entry));
            targets.insert(entry);
        }

        let info = instr.info;
        let target = instr.target_address;
        let size = info.size as u16;
        decoded.insert(addr);
        instructions.push(instr);

        // End-of-function set: calls, interrupts, returns, and
        // statically opaque indirect jumps.
        if matches!(info.mnemonic, "JSR" | "BRK" | "RTI" | "RTS")
            || info.mode == AddressingMode::Indirect
        {
            continue;
        }

        if let Some(t) = target {
            targets.insert(t);
            work.push_back((t, Some(addr)));
        }
        if info.mnemonic != "JMP" {
            work.push_back((addr.wrapping_add(size), Some(addr)));
        }
    }

    order_instructions(entry, &mut instructions);
    stamp_labels(entry, &targets, &mut instructions);

    let jump_targets = instructions
        .iter()
        .filter(|i| i.sub_address_order == 0 && targets.contains(&i.cpu_address))
        .map(|i| (i.cpu_address, label_for(entry, i.cpu_address)))
        .collect();

    Ok(DecompiledFunction {
        entry_address: entry,
        ordered_instructions: instructions,
        jump_targets,
    })
}

/// Pseudo `JMP entry` recorded one byte below the entry.
fn synthesize_loopback(entry: u16) -> DisassembledInstruction {
    let info = crate::cpu::table::opcode_info(0x4C);
    DisassembledInstruction {
        cpu_address: entry - 1,
        rom_offset: 0,
        info,
        bytes: vec![0x4C, (entry & 0xFF) as u8, (entry >> 8) as u8],
        target_address: Some(entry),
        label: None,
        comment: Some(format!("-> sub_{:04X}", entry)),
        sub_address_order: 1,
    }
}

fn label_for(entry: u16, addr: u16) -> String {
    if addr == entry {
        format!("sub_{:04X}", addr)
    } else {
        format!("loc_{:04X}", addr)
    }
}

/// Apply the four-group output ordering described in the module docs.
fn order_instructions(entry: u16, instructions: &mut [DisassembledInstruction]) {
    instructions.sort_by_key(|i| {
        let group = if i.cpu_address == entry && i.sub_address_order >= 0 {
            0u8
        } else if i.cpu_address > entry {
            1
        } else if i.cpu_address < entry {
            2
        } else {
            3
        };
        (group, i.cpu_address, i.sub_address_order)
    });
}

/// Attach labels to the real instruction at every jump target.
fn stamp_labels(entry: u16, targets: &BTreeSet<u16>, instructions: &mut [DisassembledInstruction]) {
    for instr in instructions.iter_mut() {
        if instr.sub_address_order == 0 && targets.contains(&instr.cpu_address) {
            instr.label = Some(label_for(entry, instr.cpu_address));
        }
        if let Some(t) = instr.target_address {
            if targets.contains(&t) && instr.info.mode != AddressingMode::Indirect {
                instr.comment = Some(format!("-> {}", label_for(entry, t)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(base: u16, bytes: &[u8]) -> CodeRegion<'_> {
        CodeRegion::new(base, bytes)
    }

    #[test]
    fn straight_line_ends_at_rts() {
        // LDA #$01; STA $10; RTS
        let bytes = [0xA9, 0x01, 0x85, 0x10, 0x60];
        let f = decompile_function(0x8000, &[region(0x8000, &bytes)]).expect("trace");
        assert_eq!(f.entry_address, 0x8000);
        let mnemonics: Vec<_> = f
            .ordered_instructions
            .iter()
            .map(|i| i.info.mnemonic)
            .collect();
        assert_eq!(mnemonics, ["LDA", "STA", "RTS"]);
        assert_eq!(f.ordered_instructions[0].cpu_address, 0x8000);
        assert!(f.ordered_instructions[0].sub_address_order >= 0);
        assert_eq!(f.jump_targets[&0x8000], "sub_8000");
    }

    #[test]
    fn jsr_terminates_the_trace() {
        // JSR $9000; LDA #$01; RTS -- the call ends the function, so the
        // LDA after it must not appear.
        let bytes = [0x20, 0x00, 0x90, 0xA9, 0x01, 0x60];
        let f = decompile_function(0x8000, &[region(0x8000, &bytes)]).expect("trace");
        assert_eq!(f.ordered_instructions.len(), 1);
        assert_eq!(f.ordered_instructions[0].info.mnemonic, "JSR");
    }

    #[test]
    fn branch_explores_both_edges() {
        // BNE +1; RTS; RTS (target)
        let bytes = [0xD0, 0x01, 0x60, 0x60];
        let f = decompile_function(0x8000, &[region(0x8000, &bytes)]).expect("trace");
        assert_eq!(f.ordered_instructions.len(), 3);
        assert_eq!(f.jump_targets[&0x8003], "loc_8003");
        let bne = &f.ordered_instructions[0];
        assert_eq!(bne.comment.as_deref(), Some("-> loc_8003"));
    }

    #[test]
    fn indirect_jump_is_end_of_function() {
        let bytes = [0x6C, 0x00, 0x90];
        let f = decompile_function(0x8000, &[region(0x8000, &bytes)]).expect("trace");
        assert_eq!(f.ordered_instructions.len(), 1);
        // The indirection base never becomes a jump target.
        assert!(!f.jump_targets.contains_key(&0x9000));
    }

    #[test]
    fn missing_region_is_fatal() {
        let bytes = [0x4C, 0x00, 0x90]; // JMP $9000, nothing mapped there
        let err = decompile_function(0x8000, &[region(0x8000, &bytes)]).unwrap_err();
        assert_eq!(err, AnalysisError::RegionMissing(0x9000));
    }

    #[test]
    fn unknown_byte_ends_the_path() {
        // LDA #$01 then an undocumented byte: trace stops, no error.
        let bytes = [0xA9, 0x01, 0x02];
        let f = decompile_function(0x8000, &[region(0x8000, &bytes)]).expect("trace");
        assert_eq!(f.ordered_instructions.len(), 1);
    }

    #[test]
    fn truncated_operand_is_fatal() {
        let bytes = [0xA9]; // LDA #imm with no operand byte
        let err = decompile_function(0x8000, &[region(0x8000, &bytes)]).unwrap_err();
        assert_eq!(err, AnalysisError::OutOfBounds(0x8000));
    }

    #[test]
    fn loopback_repair_synthesizes_pseudo_jmp() {
        // Layout (entry $8020, body jumps back to $8018):
        //   $8018: LDA #$01        ; backward body
        //   $801A: INX
        //   $801B..$801F: NOP
        //   $8020: LDX #$00        ; entry
        //   $8022: JMP $8018
        let mut bytes = vec![0u8; 0x28];
        bytes[0x18] = 0xA9;
        bytes[0x19] = 0x01;
        bytes[0x1A] = 0xE8;
        for b in bytes.iter_mut().take(0x20).skip(0x1B) {
            *b = 0xEA;
        }
        bytes[0x20] = 0xA2;
        bytes[0x21] = 0x00;
        bytes[0x22] = 0x4C;
        bytes[0x23] = 0x18;
        bytes[0x24] = 0x80;
        let f = decompile_function(0x8020, &[region(0x8000, &bytes)]).expect("trace");

        let first = &f.ordered_instructions[0];
        assert_eq!(first.cpu_address, 0x8020);
        assert!(first.sub_address_order >= 0);

        // Entry body first, then addresses above, then the backward body,
        // then the synthesized JMP back to the entry.
        let addrs: Vec<(u16, i32)> = f
            .ordered_instructions
            .iter()
            .map(|i| (i.cpu_address, i.sub_address_order))
            .collect();
        let last = addrs.last().copied().unwrap();
        assert_eq!(last, (0x801F, 1));
        let synth = f.ordered_instructions.last().unwrap();
        assert_eq!(synth.info.mnemonic, "JMP");
        assert_eq!(synth.target_address, Some(0x8020));
        assert_eq!(synth.bytes, vec![0x4C, 0x20, 0x80]);

        // Backward body sits between the high addresses and the repair.
        let pos_8018 = addrs.iter().position(|&(a, _)| a == 0x8018).unwrap();
        let pos_8022 = addrs.iter().position(|&(a, _)| a == 0x8022).unwrap();
        assert!(pos_8022 < pos_8018);

        // The loop edge is recorded exactly once.
        let repairs = f
            .ordered_instructions
            .iter()
            .filter(|i| i.sub_address_order == 1)
            .count();
        assert_eq!(repairs, 1);
    }

    #[test]
    fn loopback_to_zero_rejected() {
        // Entry at $0000 whose body branches back to itself.
        let bytes = [0xE8, 0x4C, 0x00, 0x00]; // INX; JMP $0000
        let err = decompile_function(0x0000, &[region(0x0000, &bytes)]).unwrap_err();
        assert_eq!(err, AnalysisError::LoopbackToZero);
    }

    #[test]
    fn region_spanning_mirror_resolves_high_entry() {
        // The same bytes mapped at $8000 and $C000; entry through the
        // mirror window must trace cleanly.
        let bytes = [0xA9, 0x01, 0x60];
        let regions = [region(0x8000, &bytes), region(0xC000, &bytes)];
        let f = decompile_function(0xC000, &regions).expect("trace");
        assert_eq!(f.ordered_instructions[0].cpu_address, 0xC000);
        assert_eq!(f.jump_targets[&0xC000], "sub_C000");
    }
}
