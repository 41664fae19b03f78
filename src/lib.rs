#![doc = r#"
Nesdec library crate.

Static analysis core for iNES (v1) cartridge images: parses the container,
disassembles the PRG bank with control-flow tracing, partitions the code
into functions with variable classification, and lowers the result into a
labeled assembly listing plus a best-effort C translation.

Modules:
- rom: iNES v1 loader producing a `RomImage` (PRG/CHR slices, vectors)
- cpu: 6502 instruction-set layer (addressing modes, opcode table)
- disasm: whole-PRG disassembler (sweep + trace + labels)
- decompile: single-function tracer producing ordered listings
- analysis: variable classification and function partitioning
- report: `analyze` pipeline tying the phases together
- emit: assembly and C emitters over a line sink
- workspace: persisted workspace document for UI collaborators

The pipeline is strictly downstream: Loader -> Disassembler ->
(Decompiler, Analyzer) -> Emitters. Each analysis owns its own state;
nothing global survives across ROMs.

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod analysis;
pub mod cpu;
pub mod decompile;
pub mod disasm;
pub mod emit;
pub mod report;
pub mod rom;
pub mod workspace;

// Re-export commonly used types at the crate root for convenience.
pub use analysis::{Analysis, Function, VarType, Variable};
pub use cpu::addressing::AddressingMode;
pub use cpu::table::{opcode_info, InstructionCategory, InstructionInfo};
pub use decompile::{decompile_function, CodeRegion, DecompiledFunction};
pub use disasm::{disassemble, DisassembledInstruction, DisassemblyReport};
pub use emit::{asm::emit_asm, c::emit_c, COutput};
pub use report::{analyze, FullReport};
pub use rom::{load_rom, Mirroring, RomImage};

/// Errors surfaced by the analysis pipeline.
///
/// Unknown opcodes are deliberately absent: the linear sweep skips them and
/// the function tracer stops at them, so they never escape a phase. A
/// non-converging re-sweep is not an error either; it is reported as the
/// `saturated` flag on `DisassemblyReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Header magic mismatch or declared sizes exceeding the buffer.
    InvalidFormat(String),
    /// Operand bytes run past the end of the region being decoded.
    OutOfBounds(u16),
    /// The function decompiler was pointed at an address no region covers.
    RegionMissing(u16),
    /// A loopback repair would have to wrap below CPU address $0000.
    LoopbackToZero,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InvalidFormat(msg) => write!(f, "invalid iNES image: {}", msg),
            AnalysisError::OutOfBounds(addr) => {
                write!(f, "operand bytes unavailable at ${:04X}", addr)
            }
            AnalysisError::RegionMissing(addr) => {
                write!(f, "no code region covers ${:04X}", addr)
            }
            AnalysisError::LoopbackToZero => {
                write!(f, "loopback repair would wrap below $0000")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
