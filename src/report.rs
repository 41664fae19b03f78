/*!
report.rs - Top-level analysis pipeline.

`analyze` runs the phases in their only legal order (loader output is
taken as input, then disassembly, then the analyzer) and bundles the
results into a `FullReport` owned by the caller. Nothing outlives the
report; analyzing two ROMs never shares state.
*/

use std::collections::BTreeMap;

use crate::analysis::{analyze_program, Function, Variable};
use crate::disasm::{disassemble, DisassemblyReport};
use crate::rom::RomImage;

/// Everything the emitters (and embedders) need, produced by one run.
#[derive(Debug)]
pub struct FullReport {
    pub rom: RomImage,
    pub disassembly: DisassemblyReport,
    pub variables: BTreeMap<u16, Variable>,
    pub functions: BTreeMap<u16, Function>,
}

/// Run the whole-program pipeline over a loaded image.
pub fn analyze(rom: RomImage) -> FullReport {
    let disassembly = disassemble(&rom);
    let analysis = analyze_program(&rom, &disassembly);
    FullReport {
        rom,
        disassembly,
        variables: analysis.variables,
        functions: analysis.functions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::c::emit_c;
    use crate::rom::RomImage;
    use crate::test_utils::{build_prg_rom, build_prg_rom_filled};

    #[test]
    fn minimal_reset_rom_is_one_big_function() {
        // 16 KiB of NOPs, reset at $8000. The six vector bytes at the
        // bank tail are data, so the NOP count is 16384 minus those.
        let bytes = build_prg_rom_filled(0xEA, &[], (0x8000, 0x8000, 0x8000));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        let report = analyze(rom);

        let nops = report
            .disassembly
            .instructions
            .values()
            .filter(|i| i.info.mnemonic == "NOP")
            .count();
        assert_eq!(nops, 16384 - 6);

        assert_eq!(report.functions.len(), 1);
        let f = &report.functions[&0x8000];
        assert_eq!(f.name, "sub_8000");
        assert!(f.instruction_addresses.len() >= nops);
        assert!(report.variables.is_empty());
    }

    #[test]
    fn forward_branch_scenario() {
        // LDA #$01; BNE +2; LDA #$02; BRK
        let bytes = build_prg_rom(&[0xA9, 0x01, 0xD0, 0x02, 0xA9, 0x02, 0x00], (0x8000, 0, 0));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        let report = analyze(rom);

        assert_eq!(report.disassembly.labels[&0x8006], "loc_8006");
        let bne = &report.disassembly.instructions[&0x8002];
        assert_eq!(bne.target_address, Some(0x8006));

        let f = &report.functions[&0x8000];
        assert!(f.instruction_addresses.contains(&0x8000));
        assert!(f.instruction_addresses.contains(&0x8004));
        assert!(f.instruction_addresses.contains(&0x8006)); // ends at BRK
        assert!(!f.instruction_addresses.contains(&0x8007));
    }

    #[test]
    fn jsr_rts_scenario() {
        let mut prg = vec![0x20, 0x10, 0x80, 0x00]; // JSR $8010; BRK
        prg.resize(0x10, 0xEA);
        prg.extend_from_slice(&[0xA9, 0xAA, 0x60]); // LDA #$AA; RTS
        let bytes = build_prg_rom(&prg, (0x8000, 0, 0));
        let rom = RomImage::from_ines_bytes(&bytes).expect("parse");
        let report = analyze(rom);

        assert!(report.functions.contains_key(&0x8000));
        assert!(report.functions.contains_key(&0x8010));
        assert_eq!(
            report.functions[&0x8000]
                .called_functions
                .iter()
                .copied()
                .collect::<Vec<_>>(),
            vec![0x8010]
        );
        // Fall-through after the call is reached.
        assert!(report.functions[&0x8000]
            .instruction_addresses
            .contains(&0x8003));
        // Entry labels take the sub_ form.
        for e in &report.disassembly.entry_points {
            assert!(report.disassembly.labels[e].starts_with("sub_"));
        }
    }

    #[test]
    fn analyze_is_deterministic() {
        let mut prg = vec![
            0xA9, 0x01, // LDA #$01
            0x8D, 0x00, 0x20, // STA $2000
            0xBD, 0x00, 0x03, // LDA $0300,X
            0x20, 0x10, 0x80, // JSR $8010
            0x00, // BRK
        ];
        prg.resize(0x10, 0xEA);
        prg.extend_from_slice(&[0xE6, 0x10, 0x60]); // INC $10; RTS
        let bytes = build_prg_rom(&prg, (0x8000, 0, 0));

        let first = emit_c(&analyze(RomImage::from_ines_bytes(&bytes).unwrap()));
        let second = emit_c(&analyze(RomImage::from_ines_bytes(&bytes).unwrap()));
        assert_eq!(first.c_source, second.c_source);
        assert_eq!(first.header, second.header);
    }
}
