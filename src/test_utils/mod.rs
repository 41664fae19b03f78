//! Shared test utilities for building minimal iNES (v1) images.
//!
//! These helpers de-duplicate iNES construction across the ROM, disasm,
//! analysis, and emitter tests. They support just what the suite needs:
//! a single fixed PRG bank, optional CHR, optional trainer.
//!
//! Header fields used here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units
//! - byte 6 = Flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - byte 7 = Flags 7 (NES 2.0 indicator, mapper high nibble)
//! - bytes 8..15 = padding/reserved
//!
//! Vectors for a 16 KiB PRG bank sit at PRG offsets 0x3FFA..=0x3FFF
//! (NMI, RESET, IRQ as little-endian words).

#![allow(dead_code)]

const PRG_BANK: usize = 16 * 1024;

/// Build a minimal iNES (v1) image with pattern-filled banks
/// (PRG = 0xAA, CHR = 0xCC).
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        16 + trainer.map(|_| 512).unwrap_or(0) + prg_16k * PRG_BANK + chr_8k * 8 * 1024,
    );

    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.extend_from_slice(&[0u8; 8]);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }

    bytes.extend(std::iter::repeat(0xAA).take(prg_16k * PRG_BANK));
    bytes.extend(std::iter::repeat(0xCC).take(chr_8k * 8 * 1024));

    bytes
}

/// Build a one-bank NROM image whose PRG starts with `program` and whose
/// remaining bytes are `fill`; vectors are patched into the bank tail.
pub fn build_prg_rom_filled(fill: u8, program: &[u8], vectors: (u16, u16, u16)) -> Vec<u8> {
    assert!(
        program.len() <= PRG_BANK,
        "program must fit within a 16 KiB PRG bank"
    );
    let (reset, nmi, irq) = vectors;

    let mut bytes = Vec::with_capacity(16 + PRG_BANK);
    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(1); // one PRG bank
    bytes.push(0); // no CHR
    bytes.extend_from_slice(&[0u8; 10]);

    let prg_start = bytes.len();
    bytes.extend(std::iter::repeat(fill).take(PRG_BANK));
    bytes[prg_start..prg_start + program.len()].copy_from_slice(program);

    let tail = prg_start + 0x3FFA;
    write_le_u16(&mut bytes, tail, nmi);
    write_le_u16(&mut bytes, tail + 2, reset);
    write_le_u16(&mut bytes, tail + 4, irq);

    bytes
}

/// `build_prg_rom_filled` with zero fill; the common case.
pub fn build_prg_rom(program: &[u8], vectors: (u16, u16, u16)) -> Vec<u8> {
    build_prg_rom_filled(0x00, program, vectors)
}

#[inline]
fn write_le_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset] = (value & 0x00FF) as u8;
    buf[offset + 1] = (value >> 8) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_ines() {
        let rom = build_ines(2, 1, 0x01, 0x00, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom[6], 0x01);
        assert_eq!(rom.len(), 16 + 2 * PRG_BANK + 8 * 1024);
    }

    #[test]
    fn patches_vectors_into_bank_tail() {
        let rom = build_prg_rom(&[0xEA], (0x8123, 0x8456, 0x8ABC));
        let prg = 16;
        assert_eq!(rom[prg + 0x3FFA], 0x56);
        assert_eq!(rom[prg + 0x3FFB], 0x84);
        assert_eq!(rom[prg + 0x3FFC], 0x23);
        assert_eq!(rom[prg + 0x3FFD], 0x81);
        assert_eq!(rom[prg + 0x3FFE], 0xBC);
        assert_eq!(rom[prg + 0x3FFF], 0x8A);
    }

    #[test]
    fn program_lands_at_prg_start() {
        let rom = build_prg_rom_filled(0xEA, &[0xA9, 0x01], (0x8000, 0, 0));
        assert_eq!(&rom[16..19], &[0xA9, 0x01, 0xEA]);
    }
}
