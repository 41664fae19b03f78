/*!
c.rs - Best-effort C translation of the analyzed program.

Emits one translation unit plus a matching header. The translation keeps
linear instruction semantics: every 6502 instruction becomes a C
statement (or block) operating on global register mirrors, a 64 KiB
memory array, and the classified variables, with full status-flag
updates. Control flow inside a function uses the GNU "labels as values"
pattern the listing below shows; no loop or conditional recovery is
attempted.

```text
void sub_8000(void) {
    static void* loc_8006 = &&loc_8006_impl;

    /* $8000: A9 01     LDA #$01 */
    a = 0x01;
    ...
loc_8006_impl:
    ...
}
```

Control transfers whose target lies outside the emitting function
degrade: a jump to another function's entry becomes a call plus return,
anything else becomes a comment.
*/

use std::collections::BTreeSet;

use crate::analysis::{hardware_register_name, VarType};
use crate::cpu::addressing::AddressingMode;
use crate::disasm::DisassembledInstruction;
use crate::emit::{COutput, LineSink, StringSink};
use crate::report::FullReport;

/// Emit the C source and header for a finished analysis.
pub fn emit_c(report: &FullReport) -> COutput {
    let mut c_sink = StringSink::new();
    let mut h_sink = StringSink::new();
    emit_source(report, &mut c_sink);
    emit_header(report, &mut h_sink);
    COutput {
        c_source: c_sink.into_string(),
        header: h_sink.into_string(),
    }
}

const FLAG_DEFINES: [(&str, u8); 8] = [
    ("CARRY_FLAG", 0x01),
    ("ZERO_FLAG", 0x02),
    ("INTERRUPT_FLAG", 0x04),
    ("DECIMAL_FLAG", 0x08),
    ("BREAK_FLAG", 0x10),
    ("UNUSED_FLAG", 0x20),
    ("OVERFLOW_FLAG", 0x40),
    ("NEGATIVE_FLAG", 0x80),
];

fn emit_source(report: &FullReport, sink: &mut dyn LineSink) {
    // 1. Banner (deterministic: no timestamps).
    sink.line("/*");
    sink.line(" * nesdec translation");
    sink.line(&format!(
        " * mapper {}, PRG {} bytes, CHR {} bytes",
        report.rom.mapper_id(),
        report.rom.prg_size(),
        report.rom.chr_size()
    ));
    sink.line(&format!(
        " * vectors: reset ${:04X}, NMI ${:04X}, IRQ ${:04X}",
        report.rom.reset_vector(),
        report.rom.nmi_vector(),
        report.rom.irq_vector()
    ));
    sink.line(" */");
    sink.blank();

    // 2. Includes.
    sink.line("#include <stdint.h>");
    sink.line("#include <stdbool.h>");
    sink.line("#include <stdlib.h>");
    sink.line("#include <string.h>");
    sink.blank();

    // 3. Status-flag bit constants.
    for (name, bit) in FLAG_DEFINES {
        sink.line(&format!("#define {:<14} 0x{:02X}", name, bit));
    }
    sink.blank();

    // 4. CPU register mirrors, memory, stack mirror.
    sink.line("uint8_t a, x, y;");
    sink.line("uint8_t status;");
    sink.line("uint16_t pc;");
    sink.line("uint8_t sp;");
    sink.line("uint8_t memory[0x10000];");
    sink.line("uint8_t stack[0x100];");
    sink.blank();

    // 5. Hardware-register macros.
    emit_hardware_macros(report, sink);

    // 6. Variable declarations.
    let mut any_var = false;
    for var in report.variables.values() {
        if !is_declared(var.address) {
            continue;
        }
        any_var = true;
        match var.var_type {
            VarType::Array => sink.line(&format!(
                "static uint8_t {}[{}];",
                var.name, var.size
            )),
            VarType::Word | VarType::Pointer => {
                sink.line(&format!("static uint16_t {};", var.name))
            }
            VarType::Byte | VarType::Unknown => {
                sink.line(&format!("static uint8_t {};", var.name))
            }
        }
    }
    if any_var {
        sink.blank();
    }

    // 7. Prototypes.
    for f in report.functions.values() {
        sink.line(&format!("void {}(void);", f.name));
    }
    sink.blank();

    // 8. Bodies, then main().
    for f in report.functions.values() {
        emit_function(report, f.entry_address, sink);
        sink.blank();
    }
    emit_main(report, sink);
}

fn emit_hardware_macros(report: &FullReport, sink: &mut dyn LineSink) {
    let mut any = false;
    for var in report.variables.values() {
        if let Some(name) = hardware_register_name(var.address) {
            sink.line(&format!(
                "#define {:<11} (*(volatile uint8_t*)0x{:04X}U)",
                name, var.address
            ));
            any = true;
        }
    }
    if any {
        sink.blank();
    }
}

fn emit_header(report: &FullReport, sink: &mut dyn LineSink) {
    sink.line("#ifndef NESDEC_OUTPUT_H");
    sink.line("#define NESDEC_OUTPUT_H");
    sink.blank();
    sink.line("#include <stdint.h>");
    sink.blank();
    emit_hardware_macros(report, sink);
    sink.line("extern uint8_t a, x, y;");
    sink.line("extern uint8_t status;");
    sink.line("extern uint16_t pc;");
    sink.line("extern uint8_t sp;");
    sink.line("extern uint8_t memory[0x10000];");
    sink.line("extern uint8_t stack[0x100];");
    sink.blank();
    for var in report.variables.values() {
        if !is_declared(var.address) {
            continue;
        }
        match var.var_type {
            VarType::Array => sink.line(&format!(
                "extern uint8_t {}[{}];",
                var.name, var.size
            )),
            VarType::Word | VarType::Pointer => {
                sink.line(&format!("extern uint16_t {};", var.name))
            }
            VarType::Byte | VarType::Unknown => {
                sink.line(&format!("extern uint8_t {};", var.name))
            }
        }
    }
    sink.blank();
    for f in report.functions.values() {
        sink.line(&format!("void {}(void);", f.name));
    }
    sink.blank();
    sink.line("#endif /* NESDEC_OUTPUT_H */");
}

/// Analysis variables below the PPU window or inside ROM get real C
/// declarations; everything else lives in the memory array or behind a
/// hardware macro.
fn is_declared(addr: u16) -> bool {
    (addr < 0x2000 || addr >= 0x8000) && hardware_register_name(addr).is_none()
}

// ---------------------------------------------------------------------------
// Operand expressions
// ---------------------------------------------------------------------------

/// C lvalue/rvalue for a directly addressed byte.
fn direct_expr(report: &FullReport, addr: u16) -> String {
    if let Some(hw) = hardware_register_name(addr) {
        return hw.to_string();
    }
    if let Some(var) = report.variables.get(&addr) {
        if is_declared(addr) {
            return match var.var_type {
                VarType::Array => format!("{}[0]", var.name),
                _ => var.name.clone(),
            };
        }
    }
    format!("memory[0x{:04X}]", addr)
}

/// C expression for an indexed access (`$XXXX,X` and friends).
fn indexed_expr(report: &FullReport, addr: u16, index: &str) -> String {
    if let Some(var) = report.variables.get(&addr) {
        if is_declared(addr) && var.var_type == VarType::Array {
            return format!("{}[{}]", var.name, index);
        }
    }
    format!("memory[(uint16_t)(0x{:04X} + {})]", addr, index)
}

/// C expression for the value an instruction operates on.
fn value_expr(report: &FullReport, instr: &DisassembledInstruction) -> String {
    let operands = &instr.bytes[1..];
    match instr.info.mode {
        AddressingMode::Accumulator => "a".to_string(),
        AddressingMode::Immediate => format!("0x{:02X}", operands[0]),
        AddressingMode::ZeroPage => direct_expr(report, operands[0] as u16),
        AddressingMode::Absolute => direct_expr(report, crate::cpu::addressing::word(operands)),
        AddressingMode::ZeroPageX => indexed_expr(report, operands[0] as u16, "x"),
        AddressingMode::AbsoluteX => {
            indexed_expr(report, crate::cpu::addressing::word(operands), "x")
        }
        AddressingMode::ZeroPageY => indexed_expr(report, operands[0] as u16, "y"),
        AddressingMode::AbsoluteY => {
            indexed_expr(report, crate::cpu::addressing::word(operands), "y")
        }
        AddressingMode::IndexedIndirect => {
            let zp = operands[0];
            format!(
                "memory[(uint16_t)(memory[(uint8_t)(0x{:02X} + x)] | (memory[(uint8_t)(0x{:02X} + x + 1)] << 8))]",
                zp, zp
            )
        }
        AddressingMode::IndirectIndexed => {
            let zp = operands[0] as u16;
            if let Some(var) = report.variables.get(&zp) {
                if var.var_type == VarType::Pointer && is_declared(zp) {
                    return format!("memory[(uint16_t)({} + y)]", var.name);
                }
            }
            format!(
                "memory[(uint16_t)((memory[0x{:02X}] | (memory[(uint8_t)(0x{:02X} + 1)] << 8)) + y)]",
                zp, zp
            )
        }
        // Implied/Relative/Indirect never feed a value expression.
        _ => String::new(),
    }
}

/// `Z := (v == 0)`, `N := (v & 0x80)`; `reg` must be a single-eval name.
fn zn_update(reg: &str) -> String {
    format!(
        "status = (uint8_t)((status & ~(ZERO_FLAG | NEGATIVE_FLAG)) | (({r} == 0) ? ZERO_FLAG : 0) | (({r} & 0x80) ? NEGATIVE_FLAG : 0));",
        r = reg
    )
}

// ---------------------------------------------------------------------------
// Function bodies
// ---------------------------------------------------------------------------

fn label_name(report: &FullReport, addr: u16) -> String {
    report
        .disassembly
        .labels
        .get(&addr)
        .cloned()
        .unwrap_or_else(|| format!("loc_{:04X}", addr))
}

fn emit_function(report: &FullReport, entry: u16, sink: &mut dyn LineSink) {
    let f = &report.functions[&entry];
    sink.line(&format!("void {}(void)", f.name));
    sink.line("{");

    // Body order matches the function tracer's listing: the entry
    // instruction first, then addresses above it ascending, then the
    // loop-backward body below it. C execution starts at the top of the
    // emitted body, so the entry instruction must come first.
    let mut body: Vec<u16> = f.instruction_addresses.iter().copied().collect();
    body.sort_by_key(|&a| (a != entry, a < entry, a));

    // Internal jump targets: transfers within this body only.
    let mut internal_targets: BTreeSet<u16> = BTreeSet::new();
    for &addr in &body {
        let Some(instr) = report.disassembly.instructions.get(&addr) else {
            continue;
        };
        if instr.info.mode == AddressingMode::Indirect {
            continue;
        }
        if instr.is_branch() || instr.info.mnemonic == "JMP" {
            if let Some(t) = instr.target_address {
                if f.instruction_addresses.contains(&t) {
                    internal_targets.insert(t);
                }
            }
        }
    }

    // Computed-goto prologue: forward-declare every referenced label.
    for &t in &internal_targets {
        let label = label_name(report, t);
        sink.line(&format!("    static void* {l} = &&{l}_impl;", l = label));
    }
    if !internal_targets.is_empty() {
        sink.blank();
    }

    if body.is_empty() {
        sink.line("    /* no instructions decoded for this function */");
    }

    for &addr in &body {
        let Some(instr) = report.disassembly.instructions.get(&addr) else {
            continue;
        };
        if internal_targets.contains(&addr) {
            sink.line(&format!("{}_impl:", label_name(report, addr)));
        }
        sink.line(&format!(
            "    /* ${:04X}: {:<9} {} {} */",
            addr,
            instr.bytes_text(),
            instr.info.mnemonic,
            instr.operand_text()
        ));
        emit_instruction(report, f.entry_address, &internal_targets, instr, sink);
    }

    sink.line("}");
}

/// Emit the C statement(s) for one instruction.
fn emit_instruction(
    report: &FullReport,
    entry: u16,
    internal_targets: &BTreeSet<u16>,
    instr: &DisassembledInstruction,
    sink: &mut dyn LineSink,
) {
    let m = instr.info.mnemonic;
    let expr = value_expr(report, instr);

    match m {
        // Loads
        "LDA" | "LDX" | "LDY" => {
            let reg = register_of(m);
            sink.line(&format!("    {} = {};", reg, expr));
            sink.line(&format!("    {}", zn_update(reg)));
        }

        // Stores (no flag effects)
        "STA" | "STX" | "STY" => {
            sink.line(&format!("    {} = {};", expr, register_of(m)));
        }

        // Transfers
        "TAX" => transfer(sink, "x", "a", true),
        "TAY" => transfer(sink, "y", "a", true),
        "TXA" => transfer(sink, "a", "x", true),
        "TYA" => transfer(sink, "a", "y", true),
        "TSX" => transfer(sink, "x", "sp", true),
        "TXS" => transfer(sink, "sp", "x", false),

        // Stack
        "PHA" => sink.line("    stack[sp--] = a;"),
        "PHP" => sink.line("    stack[sp--] = (uint8_t)(status | BREAK_FLAG | UNUSED_FLAG);"),
        "PLA" => {
            sink.line("    a = stack[++sp];");
            sink.line(&format!("    {}", zn_update("a")));
        }
        "PLP" => sink.line("    status = (uint8_t)((stack[++sp] | UNUSED_FLAG) & ~BREAK_FLAG);"),

        // Arithmetic
        "ADC" => {
            sink.line("    {");
            sink.line(&format!("        uint8_t m = {};", expr));
            sink.line(
                "        uint16_t sum = (uint16_t)(a + m + ((status & CARRY_FLAG) ? 1 : 0));",
            );
            sink.line("        status = (uint8_t)((status & ~(CARRY_FLAG | OVERFLOW_FLAG)) | ((sum > 0xFF) ? CARRY_FLAG : 0) | ((~(a ^ m) & (a ^ sum) & 0x80) ? OVERFLOW_FLAG : 0));");
            sink.line("        a = (uint8_t)sum;");
            sink.line(&format!("        {}", zn_update("a")));
            sink.line("    }");
        }
        "SBC" => {
            sink.line("    {");
            sink.line(&format!("        uint8_t m = {};", expr));
            sink.line(
                "        uint16_t diff = (uint16_t)(a - m - ((status & CARRY_FLAG) ? 0 : 1));",
            );
            sink.line("        status = (uint8_t)((status & ~(CARRY_FLAG | OVERFLOW_FLAG)) | ((diff < 0x100) ? CARRY_FLAG : 0) | (((a ^ m) & (a ^ diff) & 0x80) ? OVERFLOW_FLAG : 0));");
            sink.line("        a = (uint8_t)diff;");
            sink.line(&format!("        {}", zn_update("a")));
            sink.line("    }");
        }

        // Increment / decrement
        "INC" | "DEC" => {
            let op = if m == "INC" { "+" } else { "-" };
            sink.line("    {");
            sink.line(&format!("        uint8_t m = (uint8_t)({} {} 1);", expr, op));
            sink.line(&format!("        {} = m;", expr));
            sink.line(&format!("        {}", zn_update("m")));
            sink.line("    }");
        }
        "INX" | "INY" | "DEX" | "DEY" => {
            let reg = if m.ends_with('X') { "x" } else { "y" };
            let op = if m.starts_with("IN") { "+" } else { "-" };
            sink.line(&format!("    {r} = (uint8_t)({r} {} 1);", op, r = reg));
            sink.line(&format!("    {}", zn_update(reg)));
        }

        // Shifts / rotates
        "ASL" | "LSR" | "ROL" | "ROR" => emit_shift(report, instr, m, sink),

        // Logic
        "AND" | "ORA" | "EOR" => {
            let op = match m {
                "AND" => "&",
                "ORA" => "|",
                _ => "^",
            };
            sink.line(&format!("    a = (uint8_t)(a {} {});", op, expr));
            sink.line(&format!("    {}", zn_update("a")));
        }
        "BIT" => {
            sink.line("    {");
            sink.line(&format!("        uint8_t m = {};", expr));
            sink.line("        status = (uint8_t)((status & ~(ZERO_FLAG | OVERFLOW_FLAG | NEGATIVE_FLAG)) | (((a & m) == 0) ? ZERO_FLAG : 0) | ((m & 0x40) ? OVERFLOW_FLAG : 0) | ((m & 0x80) ? NEGATIVE_FLAG : 0));");
            sink.line("    }");
        }

        // Compares
        "CMP" | "CPX" | "CPY" => {
            let reg = register_of(m);
            sink.line("    {");
            sink.line(&format!("        uint8_t m = {};", expr));
            sink.line(&format!("        uint8_t d = (uint8_t)({} - m);", reg));
            sink.line(&format!("        status = (uint8_t)((status & ~(CARRY_FLAG | ZERO_FLAG | NEGATIVE_FLAG)) | (({} >= m) ? CARRY_FLAG : 0) | ((d == 0) ? ZERO_FLAG : 0) | ((d & 0x80) ? NEGATIVE_FLAG : 0));", reg));
            sink.line("    }");
        }

        // Branches
        "BCC" | "BCS" | "BEQ" | "BNE" | "BMI" | "BPL" | "BVC" | "BVS" => {
            let cond = branch_condition(m);
            match instr.target_address {
                Some(t) if internal_targets.contains(&t) => {
                    sink.line(&format!(
                        "    if ({}) goto *{};",
                        cond,
                        label_name(report, t)
                    ));
                }
                Some(t) if report.functions.contains_key(&t) && t != entry => {
                    sink.line(&format!(
                        "    if ({}) {{ {}(); return; }}",
                        cond,
                        report.functions[&t].name
                    ));
                }
                Some(t) => sink.line(&format!(
                    "    /* branch to ${:04X} outside this function */",
                    t
                )),
                None => sink.line("    /* unresolved branch */"),
            }
        }

        // Jumps
        "JMP" => {
            if instr.info.mode == AddressingMode::Indirect {
                let base = crate::cpu::addressing::word(&instr.bytes[1..]);
                sink.line(&format!(
                    "    pc = (uint16_t)(memory[0x{:04X}] | (memory[0x{:04X}] << 8)); /* indirect jump, runtime target */",
                    base,
                    base.wrapping_add(1)
                ));
                sink.line("    return;");
            } else {
                match instr.target_address {
                    Some(t) if internal_targets.contains(&t) => {
                        sink.line(&format!("    goto *{};", label_name(report, t)));
                    }
                    Some(t) if report.functions.contains_key(&t) => {
                        sink.line(&format!("    {}();", report.functions[&t].name));
                        sink.line("    return;");
                    }
                    Some(t) => sink.line(&format!(
                        "    /* jump to ${:04X} outside this function */",
                        t
                    )),
                    None => sink.line("    /* unresolved jump */"),
                }
            }
        }
        "JSR" => match instr.target_address {
            Some(t) if report.functions.contains_key(&t) => {
                sink.line(&format!("    {}();", report.functions[&t].name));
            }
            Some(t) => sink.line(&format!("    /* call to undecoded ${:04X} */", t)),
            None => sink.line("    /* unresolved call */"),
        },

        // Returns
        "RTS" | "RTI" => sink.line("    return;"),

        // Flag set/clear
        "SEC" => sink.line("    status |= CARRY_FLAG;"),
        "SED" => sink.line("    status |= DECIMAL_FLAG;"),
        "SEI" => sink.line("    status |= INTERRUPT_FLAG;"),
        "CLC" => sink.line("    status &= (uint8_t)~CARRY_FLAG;"),
        "CLD" => sink.line("    status &= (uint8_t)~DECIMAL_FLAG;"),
        "CLI" => sink.line("    status &= (uint8_t)~INTERRUPT_FLAG;"),
        "CLV" => sink.line("    status &= (uint8_t)~OVERFLOW_FLAG;"),

        // Interrupt entry
        "BRK" => {
            sink.line("    stack[sp--] = (uint8_t)((pc + 2) >> 8);");
            sink.line("    stack[sp--] = (uint8_t)(pc + 2);");
            sink.line("    stack[sp--] = (uint8_t)(status | BREAK_FLAG);");
            sink.line("    status |= INTERRUPT_FLAG;");
            sink.line("    pc = (uint16_t)(memory[0xFFFE] | (memory[0xFFFF] << 8));");
        }

        "NOP" => sink.line("    /* nop */"),

        _ => sink.line(&format!("    /* {} not translated */", m)),
    }
}

fn transfer(sink: &mut dyn LineSink, dst: &str, src: &str, flags: bool) {
    sink.line(&format!("    {} = {};", dst, src));
    if flags {
        sink.line(&format!("    {}", zn_update(dst)));
    }
}

fn emit_shift(
    report: &FullReport,
    instr: &DisassembledInstruction,
    m: &str,
    sink: &mut dyn LineSink,
) {
    let expr = value_expr(report, instr);
    sink.line("    {");
    sink.line(&format!("        uint8_t m = {};", expr));
    match m {
        "ASL" => {
            sink.line("        status = (uint8_t)((status & ~CARRY_FLAG) | ((m & 0x80) ? CARRY_FLAG : 0));");
            sink.line("        m = (uint8_t)(m << 1);");
        }
        "LSR" => {
            sink.line("        status = (uint8_t)((status & ~CARRY_FLAG) | ((m & 0x01) ? CARRY_FLAG : 0));");
            sink.line("        m = (uint8_t)(m >> 1);");
        }
        "ROL" => {
            sink.line("        uint8_t c = (status & CARRY_FLAG) ? 1 : 0;");
            sink.line("        status = (uint8_t)((status & ~CARRY_FLAG) | ((m & 0x80) ? CARRY_FLAG : 0));");
            sink.line("        m = (uint8_t)((m << 1) | c);");
        }
        _ => {
            sink.line("        uint8_t c = (status & CARRY_FLAG) ? 0x80 : 0;");
            sink.line("        status = (uint8_t)((status & ~CARRY_FLAG) | ((m & 0x01) ? CARRY_FLAG : 0));");
            sink.line("        m = (uint8_t)((m >> 1) | c);");
        }
    }
    sink.line(&format!("        {} = m;", expr));
    sink.line(&format!("        {}", zn_update("m")));
    sink.line("    }");
}

fn register_of(mnemonic: &str) -> &'static str {
    match mnemonic {
        "LDA" | "STA" | "CMP" => "a",
        "LDX" | "STX" | "CPX" => "x",
        _ => "y",
    }
}

fn branch_condition(mnemonic: &str) -> &'static str {
    match mnemonic {
        "BCC" => "!(status & CARRY_FLAG)",
        "BCS" => "(status & CARRY_FLAG)",
        "BNE" => "!(status & ZERO_FLAG)",
        "BEQ" => "(status & ZERO_FLAG)",
        "BPL" => "!(status & NEGATIVE_FLAG)",
        "BMI" => "(status & NEGATIVE_FLAG)",
        "BVC" => "!(status & OVERFLOW_FLAG)",
        _ => "(status & OVERFLOW_FLAG)",
    }
}

fn emit_main(report: &FullReport, sink: &mut dyn LineSink) {
    sink.line("int main(void)");
    sink.line("{");
    sink.line("    sp = 0xFF;");
    sink.line("    status = UNUSED_FLAG;");
    sink.line("    pc = 0x8000;");
    sink.line("    memset(memory, 0, sizeof(memory));");
    let reset = report.rom.reset_vector();
    if let Some(f) = report.functions.get(&reset) {
        sink.line(&format!("    {}();", f.name));
    } else {
        sink.line(&format!(
            "    /* reset vector ${:04X} has no decoded function */",
            reset
        ));
    }
    sink.line("    for (;;) {");
    sink.line("        /* event loop */");
    sink.line("    }");
    sink.line("    return 0;");
    sink.line("}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::analyze;
    use crate::rom::RomImage;
    use crate::test_utils::build_prg_rom;

    fn translate(program: &[u8]) -> COutput {
        let bytes = build_prg_rom(program, (0x8000, 0, 0));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        emit_c(&analyze(rom))
    }

    #[test]
    fn hardware_store_uses_macro() {
        // LDA #$08; STA $2000; RTS
        let out = translate(&[0xA9, 0x08, 0x8D, 0x00, 0x20, 0x60]);
        assert!(out
            .c_source
            .contains("#define PPUCTRL     (*(volatile uint8_t*)0x2000U)"));
        assert!(out.c_source.contains("PPUCTRL = a;"));
        assert!(out.header.contains("PPUCTRL"));
    }

    #[test]
    fn flag_constants_present() {
        let out = translate(&[0x60]);
        for name in [
            "CARRY_FLAG",
            "ZERO_FLAG",
            "INTERRUPT_FLAG",
            "DECIMAL_FLAG",
            "BREAK_FLAG",
            "UNUSED_FLAG",
            "OVERFLOW_FLAG",
            "NEGATIVE_FLAG",
        ] {
            assert!(out.c_source.contains(name), "missing {}", name);
        }
        assert!(out.c_source.contains("#define NEGATIVE_FLAG  0x80"));
    }

    #[test]
    fn indexed_array_declared_and_accessed() {
        // LDA $0300,X; RTS
        let out = translate(&[0xBD, 0x00, 0x03, 0x60]);
        assert!(out.c_source.contains("static uint8_t ram_0300[256];"));
        assert!(out.c_source.contains("a = ram_0300[x];"));
        assert!(out.header.contains("extern uint8_t ram_0300[256];"));
    }

    #[test]
    fn branch_emits_computed_goto() {
        // LDA #$01; BNE +2; LDA #$02; BRK
        let out = translate(&[0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00]);
        assert!(out
            .c_source
            .contains("static void* loc_8006 = &&loc_8006_impl;"));
        assert!(out
            .c_source
            .contains("if (!(status & ZERO_FLAG)) goto *loc_8006;"));
        assert!(out.c_source.contains("loc_8006_impl:"));
    }

    #[test]
    fn jsr_becomes_call() {
        let mut prg = vec![0x20, 0x10, 0x80, 0x60]; // JSR $8010; RTS
        prg.resize(0x10, 0xEA);
        prg.extend_from_slice(&[0xA9, 0xAA, 0x60]);
        let out = translate(&prg);
        assert!(out.c_source.contains("void sub_8010(void);"));
        assert!(out.c_source.contains("    sub_8010();"));
    }

    #[test]
    fn returns_and_main_shape() {
        let out = translate(&[0x60]);
        assert!(out.c_source.contains("    return;"));
        assert!(out.c_source.contains("int main(void)"));
        assert!(out.c_source.contains("    sub_8000();"));
        assert!(out.c_source.contains("memset(memory, 0, sizeof(memory));"));
        assert!(out.header.starts_with("#ifndef NESDEC_OUTPUT_H"));
        assert!(out.header.contains("void sub_8000(void);"));
    }

    #[test]
    fn adc_updates_carry_and_overflow() {
        // CLC; ADC #$10; RTS
        let out = translate(&[0x18, 0x69, 0x10, 0x60]);
        assert!(out.c_source.contains("status &= (uint8_t)~CARRY_FLAG;"));
        assert!(out.c_source.contains("uint16_t sum = (uint16_t)(a + m"));
        assert!(out.c_source.contains("OVERFLOW_FLAG"));
    }

    #[test]
    fn asm_comment_precedes_each_statement() {
        let out = translate(&[0xA9, 0x01, 0x60]);
        let comment = out.c_source.find("/* $8000: A9 01").expect("comment");
        let stmt = out.c_source.find("a = 0x01;").expect("statement");
        assert!(comment < stmt);
    }

    #[test]
    fn backward_body_emitted_after_entry() {
        // $8000: LDA #$01; $8002: RTS    (loop-backward body)
        // $8006: JMP $8000               (entry, reset vector)
        let mut prg = vec![0xA9, 0x01, 0x60];
        prg.resize(0x06, 0xEA);
        prg.extend_from_slice(&[0x4C, 0x00, 0x80]);
        let bytes = build_prg_rom(&prg, (0x8006, 0, 0));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        let out = emit_c(&analyze(rom));

        // The entry instruction opens the body; the pre-entry code
        // follows it, reachable only through the emitted goto.
        let entry = out.c_source.find("/* $8006:").expect("entry comment");
        let below = out.c_source.find("/* $8000:").expect("backward comment");
        assert!(entry < below);
        assert!(out.c_source.contains("goto *loc_8000;"));
        assert!(out.c_source.contains("loc_8000_impl:"));
    }

    #[test]
    fn indirect_jump_loads_pc_and_returns() {
        let out = translate(&[0x6C, 0x34, 0x12]);
        assert!(out
            .c_source
            .contains("pc = (uint16_t)(memory[0x1234] | (memory[0x1235] << 8));"));
    }
}
