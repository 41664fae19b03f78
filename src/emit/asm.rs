/*!
asm.rs - Labeled 6502 assembly listing.

Renders a whole-PRG disassembly as a conventional listing: label lines
flush left, instructions indented with address and raw-byte columns,
resolved-transfer comments on the right.

```text
sub_8000:
    $8000: A9 01     LDA #$01
    $8002: D0 02     BNE $8006        ; -> loc_8006
```
*/

use crate::disasm::DisassemblyReport;
use crate::emit::{LineSink, StringSink};

/// Render the listing into a string.
pub fn emit_asm(report: &DisassemblyReport) -> String {
    let mut sink = StringSink::new();
    emit_asm_into(report, &mut sink);
    sink.into_string()
}

/// Render the listing into any sink.
pub fn emit_asm_into(report: &DisassemblyReport, sink: &mut dyn LineSink) {
    sink.line("; nesdec disassembly");
    sink.line(&format!(
        "; {} instructions, {} entry points",
        report.instructions.len(),
        report.entry_points.len()
    ));
    if report.saturated {
        sink.line("; warning: re-sweep cap reached; listing may be incomplete");
    }
    sink.blank();

    for (addr, instr) in &report.instructions {
        if let Some(label) = report.labels.get(addr) {
            sink.line(&format!("{}:", label));
        }
        let body = format!(
            "    ${:04X}: {:<9} {:<4} {}",
            addr,
            instr.bytes_text(),
            instr.info.mnemonic,
            instr.operand_text()
        );
        match &instr.comment {
            Some(c) => sink.line(&format!("{:<44} ; {}", body.trim_end(), c)),
            None => sink.line(body.trim_end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disasm::disassemble;
    use crate::rom::RomImage;
    use crate::test_utils::build_prg_rom;

    fn listing(program: &[u8]) -> String {
        let bytes = build_prg_rom(program, (0x8000, 0, 0));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        emit_asm(&disassemble(&rom))
    }

    #[test]
    fn labels_precede_their_instructions() {
        let out = listing(&[0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00]);
        let sub = out.find("sub_8000:").expect("entry label");
        let lda = out.find("LDA  #$01").expect("first instruction");
        assert!(sub < lda);
        assert!(out.contains("loc_8006:"));
    }

    #[test]
    fn resolved_branches_carry_arrow_comments() {
        let out = listing(&[0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00]);
        assert!(out.contains("BNE  $8006"));
        assert!(out.contains("; -> loc_8006"));
    }

    #[test]
    fn listing_shows_raw_bytes() {
        let out = listing(&[0x8D, 0x00, 0x20, 0x60]);
        assert!(out.contains("8D 00 20"));
        assert!(out.contains("STA  $2000"));
    }
}
