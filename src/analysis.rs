/*!
analysis.rs - Whole-program variable classification and function
partitioning.

Walks every decoded instruction once to build the variable table, then
partitions the instruction map into functions seeded from the interrupt
vectors and every `JSR` target.

Variable naming prefers the canonical hardware mnemonic when the address
hits a PPU/APU/controller register; otherwise the name encodes the
memory class (`zp_`, `ram_`, `rom_`, `var_`).

Unlike the single-function tracer, the partition here treats `JSR` as a
call: the callee is recorded and tracing continues at the return site.
Callees are their own seeds, so bodies are never merged into callers.
*/

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::cpu::addressing::{word, AddressingMode};
use crate::cpu::table::InstructionCategory;
use crate::disasm::{DisassembledInstruction, DisassemblyReport};
use crate::rom::RomImage;

/// Inferred storage class of a referenced data address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    Byte,
    Word,
    Array,
    Pointer,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub address: u16,
    pub name: String,
    pub var_type: VarType,
    pub size: usize,
    pub is_read: bool,
    pub is_written: bool,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub entry_address: u16,
    pub name: String,
    pub instruction_addresses: BTreeSet<u16>,
    pub variables_accessed: BTreeSet<u16>,
    pub called_functions: BTreeSet<u16>,
}

/// Analyzer output: the global variable table plus the function
/// partition, both keyed by address for deterministic iteration.
#[derive(Debug)]
pub struct Analysis {
    pub variables: BTreeMap<u16, Variable>,
    pub functions: BTreeMap<u16, Function>,
}

/// Canonical mnemonic for memory-mapped PPU/APU/controller registers.
pub fn hardware_register_name(addr: u16) -> Option<&'static str> {
    match addr {
        0x2000 => Some("PPUCTRL"),
        0x2001 => Some("PPUMASK"),
        0x2002 => Some("PPUSTATUS"),
        0x2003 => Some("OAMADDR"),
        0x2004 => Some("OAMDATA"),
        0x2005 => Some("PPUSCROLL"),
        0x2006 => Some("PPUADDR"),
        0x2007 => Some("PPUDATA"),
        0x4000 => Some("SQ1_VOL"),
        0x4001 => Some("SQ1_SWEEP"),
        0x4002 => Some("SQ1_LO"),
        0x4003 => Some("SQ1_HI"),
        0x4004 => Some("SQ2_VOL"),
        0x4005 => Some("SQ2_SWEEP"),
        0x4006 => Some("SQ2_LO"),
        0x4007 => Some("SQ2_HI"),
        0x4008 => Some("TRI_LINEAR"),
        0x4009 => Some("APU_UNUSED1"),
        0x400A => Some("TRI_LO"),
        0x400B => Some("TRI_HI"),
        0x400C => Some("NOISE_VOL"),
        0x400D => Some("APU_UNUSED2"),
        0x400E => Some("NOISE_LO"),
        0x400F => Some("NOISE_HI"),
        0x4010 => Some("DMC_FREQ"),
        0x4011 => Some("DMC_RAW"),
        0x4012 => Some("DMC_START"),
        0x4013 => Some("DMC_LEN"),
        0x4014 => Some("OAMDMA"),
        0x4015 => Some("SND_CHN"),
        0x4016 => Some("JOY1"),
        0x4017 => Some("JOY2"),
        _ => None,
    }
}

/// Default variable name by memory class.
fn variable_name(addr: u16) -> String {
    if let Some(hw) = hardware_register_name(addr) {
        return hw.to_string();
    }
    if addr < 0x0100 {
        format!("zp_{:02X}", addr)
    } else if addr < 0x0800 {
        format!("ram_{:04X}", addr)
    } else if addr >= 0x8000 {
        format!("rom_{:04X}", addr)
    } else {
        format!("var_{:04X}", addr)
    }
}

/// Static effective-address base of a memory operand. Index registers
/// are not applied; indirect zero-page modes yield the pointer location.
pub(crate) fn operand_base(instr: &DisassembledInstruction) -> Option<u16> {
    let mode = instr.info.mode;
    if !mode.has_memory_operand() {
        return None;
    }
    let operands = &instr.bytes[1..];
    Some(match mode {
        AddressingMode::Absolute
        | AddressingMode::AbsoluteX
        | AddressingMode::AbsoluteY
        | AddressingMode::Indirect => word(operands),
        _ => operands[0] as u16,
    })
}

/// Run the analyzer over a finished disassembly.
pub fn analyze_program(rom: &RomImage, disasm: &DisassemblyReport) -> Analysis {
    let mut variables = BTreeMap::new();
    for instr in disasm.instructions.values() {
        classify_access(&mut variables, instr);
    }

    let mut seeds: BTreeSet<u16> = BTreeSet::new();
    seeds.insert(rom.reset_vector());
    for v in [rom.nmi_vector(), rom.irq_vector()] {
        // NMI/IRQ seed handlers only when they point at decoded code.
        if disasm.instructions.contains_key(&v) {
            seeds.insert(v);
        }
    }
    for instr in disasm.instructions.values() {
        if instr.info.mnemonic == "JSR" {
            if let Some(t) = instr.target_address {
                seeds.insert(t);
            }
        }
    }

    let functions = seeds
        .iter()
        .map(|&entry| (entry, trace_function(entry, disasm)))
        .collect();

    Analysis {
        variables,
        functions,
    }
}

/// Update (or create) the variable touched by one instruction.
fn classify_access(variables: &mut BTreeMap<u16, Variable>, instr: &DisassembledInstruction) {
    let Some(addr) = operand_base(instr) else {
        return;
    };
    let mode = instr.info.mode;

    let var = variables.entry(addr).or_insert_with(|| Variable {
        address: addr,
        name: variable_name(addr),
        var_type: if mode == AddressingMode::Indirect {
            // A JMP (a) base holds a 16-bit target.
            VarType::Word
        } else {
            VarType::Byte
        },
        size: if mode == AddressingMode::Indirect { 2 } else { 1 },
        is_read: false,
        is_written: false,
    });

    // Pointer wins over Array; Array wins over plain Byte.
    if mode.is_indirect_zp() {
        var.var_type = VarType::Pointer;
        var.size = 2;
    } else if mode.is_indexed() && var.var_type != VarType::Pointer {
        var.var_type = VarType::Array;
        var.size = 256;
    }

    if instr.info.category == InstructionCategory::Store {
        var.is_written = true;
    } else {
        var.is_read = true;
    }
}

/// Local reachability over the decoded instruction map, with `JSR`
/// treated as a call that continues at the return site.
fn trace_function(entry: u16, disasm: &DisassemblyReport) -> Function {
    let mut f = Function {
        entry_address: entry,
        name: format!("sub_{:04X}", entry),
        instruction_addresses: BTreeSet::new(),
        variables_accessed: BTreeSet::new(),
        called_functions: BTreeSet::new(),
    };

    let mut work: VecDeque<u16> = VecDeque::new();
    let mut seen: BTreeSet<u16> = BTreeSet::new();
    work.push_back(entry);

    while let Some(addr) = work.pop_front() {
        if !seen.insert(addr) {
            continue;
        }
        let Some(instr) = disasm.instructions.get(&addr) else {
            continue;
        };
        f.instruction_addresses.insert(addr);
        if let Some(base) = operand_base(instr) {
            f.variables_accessed.insert(base);
        }

        let info = instr.info;
        let next = addr.wrapping_add(info.size as u16);
        match info.mnemonic {
            "JSR" => {
                if let Some(t) = instr.target_address {
                    f.called_functions.insert(t);
                }
                work.push_back(next);
            }
            "JMP" => {
                if info.mode == AddressingMode::Absolute {
                    if let Some(t) = instr.target_address {
                        work.push_back(t);
                    }
                }
                // JMP (a): statically opaque, path ends.
            }
            "RTS" | "RTI" | "BRK" => {}
            _ if info.is_branch() => {
                if let Some(t) = instr.target_address {
                    work.push_back(t);
                }
                work.push_back(next);
            }
            _ => work.push_back(next),
        }
    }

    f
}
