/*!
rom.rs - iNES (v1) loader for static analysis.

Features:
- Parse the 16-byte iNES header from bytes or a file path
- Expose PRG and CHR banks as read-only slices (no copies handed out)
- Determine mirroring, battery flag, trainer presence, mapper ID
- Read the RESET/NMI/IRQ vectors from the tail of the PRG bank
- Seed the analysis entry-point set with the reset vector

Notes:
- NES 2.0 images are detected but parsed as iNES v1; the extended fields
  (high mapper nibble in byte 8, exponent sizes) are not consulted.
- The PRG bank is mapped at $8000 in CPU space. A single 16 KiB bank
  mirrors into $C000-$FFFF (NROM-128), which `code_regions` reflects.
- Vector offsets are relative to the end of PRG data: $FFFC lands at
  `prg_size - 4` regardless of bank count because the last bank always
  occupies the top of the address space.
*/

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::decompile::CodeRegion;
use crate::AnalysisError;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 8 * 1024;

/// CPU address the PRG bank is mapped at.
pub const PRG_BASE: u16 = 0x8000;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// A parsed iNES image plus the derived fields the analysis needs.
pub struct RomImage {
    data: Vec<u8>,

    // Metadata
    mapper_id: u8,
    mirroring: Mirroring,
    has_battery: bool,
    has_trainer: bool,
    is_nes_2_0: bool,

    // Layout
    prg_offset: usize,
    prg_size: usize,
    chr_offset: usize,
    chr_size: usize,

    // Vectors
    reset_vector: u16,
    nmi_vector: u16,
    irq_vector: u16,

    entry_points: BTreeSet<u16>,
}

impl std::fmt::Debug for RomImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RomImage")
            .field("mapper_id", &self.mapper_id)
            .field("mirroring", &self.mirroring)
            .field("has_battery", &self.has_battery)
            .field("has_trainer", &self.has_trainer)
            .field("prg_size", &self.prg_size)
            .field("chr_size", &self.chr_size)
            .field("reset_vector", &format_args!("${:04X}", self.reset_vector))
            .finish()
    }
}

/// Parse an iNES image from raw bytes. Convenience alias for embedders.
pub fn load_rom(bytes: &[u8]) -> Result<RomImage, AnalysisError> {
    RomImage::from_ines_bytes(bytes)
}

impl RomImage {
    /// Load an image from raw iNES bytes.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, AnalysisError> {
        if data.len() < HEADER_LEN {
            return Err(AnalysisError::InvalidFormat(
                "data too small for iNES header".into(),
            ));
        }

        // Header: 16 bytes
        // 0-3: 'N', 'E', 'S', 0x1A
        if &data[0..4] != b"NES\x1A" {
            return Err(AnalysisError::InvalidFormat(
                "invalid iNES header magic (expected NES<1A>)".into(),
            ));
        }

        let prg_size = data[4] as usize * PRG_BANK;
        let chr_size = data[5] as usize * CHR_BANK;
        let flags6 = data[6];
        let flags7 = data[7];

        // NES 2.0 if (flags7 & 0x0C) == 0x08. Extensions are ignored; the
        // header is still read as iNES v1.
        let is_nes_2_0 = (flags7 & 0x0C) == 0x08;

        // Mapper ID: high nibble from flags7 and low nibble from flags6
        let mapper_id = (flags7 & 0xF0) | (flags6 >> 4);

        let mirroring = if flags6 & 0b0000_1000 != 0 {
            Mirroring::FourScreen
        } else if flags6 & 0b0000_0001 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let has_battery = flags6 & 0b0000_0010 != 0;
        let has_trainer = flags6 & 0b0000_0100 != 0;

        let prg_offset = HEADER_LEN + if has_trainer { TRAINER_LEN } else { 0 };
        let chr_offset = prg_offset + prg_size;

        if prg_size == 0 {
            return Err(AnalysisError::InvalidFormat("image has no PRG bank".into()));
        }
        if data.len() < chr_offset + chr_size {
            return Err(AnalysisError::InvalidFormat(
                "data too small for declared PRG/CHR sizes".into(),
            ));
        }

        // Vectors live in the last 6 bytes of PRG data ($FFFA..$FFFF).
        let nmi_vector = read_le_u16(data, prg_offset + prg_size - 6);
        let reset_vector = read_le_u16(data, prg_offset + prg_size - 4);
        let irq_vector = read_le_u16(data, prg_offset + prg_size - 2);

        let mut entry_points = BTreeSet::new();
        entry_points.insert(reset_vector);

        Ok(Self {
            data: data.to_vec(),
            mapper_id,
            mirroring,
            has_battery,
            has_trainer,
            is_nes_2_0,
            prg_offset,
            prg_size,
            chr_offset,
            chr_size,
            reset_vector,
            nmi_vector,
            irq_vector,
            entry_points,
        })
    }

    /// Load an image from an iNES file (.nes).
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let bytes = fs::read(path)
            .map_err(|e| AnalysisError::InvalidFormat(format!("failed to read iNES file: {e}")))?;
        Self::from_ines_bytes(&bytes)
    }

    // -------------- Bank access --------------

    /// The PRG bank as a read-only slice.
    pub fn prg_slice(&self) -> &[u8] {
        &self.data[self.prg_offset..self.prg_offset + self.prg_size]
    }

    /// The CHR bank as a read-only slice (empty when the image carries none).
    pub fn chr_slice(&self) -> &[u8] {
        &self.data[self.chr_offset..self.chr_offset + self.chr_size]
    }

    /// CPU-space code windows over the PRG bank. A single 16 KiB bank is
    /// exposed twice (NROM-128 mirror at $C000); larger banks map once.
    pub fn code_regions(&self) -> Vec<CodeRegion<'_>> {
        let prg = self.prg_slice();
        if prg.len() == PRG_BANK {
            vec![
                CodeRegion::new(PRG_BASE, prg),
                CodeRegion::new(0xC000, prg),
            ]
        } else {
            vec![CodeRegion::new(PRG_BASE, prg)]
        }
    }

    // -------------- Accessors --------------

    pub fn mapper_id(&self) -> u8 {
        self.mapper_id
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub fn has_trainer(&self) -> bool {
        self.has_trainer
    }

    pub fn is_nes_2_0(&self) -> bool {
        self.is_nes_2_0
    }

    pub fn prg_size(&self) -> usize {
        self.prg_size
    }

    pub fn chr_size(&self) -> usize {
        self.chr_size
    }

    pub fn reset_vector(&self) -> u16 {
        self.reset_vector
    }

    pub fn nmi_vector(&self) -> u16 {
        self.nmi_vector
    }

    pub fn irq_vector(&self) -> u16 {
        self.irq_vector
    }

    pub fn entry_points(&self) -> &BTreeSet<u16> {
        &self.entry_points
    }
}

#[inline]
fn read_le_u16(buf: &[u8], offset: usize) -> u16 {
    buf[offset] as u16 | ((buf[offset + 1] as u16) << 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_ines, build_prg_rom};

    #[test]
    fn parse_simple_image() {
        // mapper 0, vertical mirroring, no trainer, battery off
        let data = build_ines(2, 1, 0b0000_0001, 0, None);
        let rom = RomImage::from_ines_bytes(&data).expect("parse");

        assert_eq!(rom.mapper_id(), 0);
        assert_eq!(rom.mirroring(), Mirroring::Vertical);
        assert!(!rom.has_battery());
        assert_eq!(rom.prg_size(), 32 * 1024);
        assert_eq!(rom.chr_size(), 8 * 1024);
        assert_eq!(rom.prg_slice().len(), 32 * 1024);
        assert_eq!(rom.chr_slice().len(), 8 * 1024);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_ines(1, 0, 0, 0, None);
        data[0] = b'X';
        let err = RomImage::from_ines_bytes(&data).unwrap_err();
        assert!(matches!(err, crate::AnalysisError::InvalidFormat(_)));
    }

    #[test]
    fn rejects_truncated_prg() {
        let mut data = build_ines(1, 0, 0, 0, None);
        data.truncate(16 + 1024);
        let err = RomImage::from_ines_bytes(&data).unwrap_err();
        assert!(matches!(err, crate::AnalysisError::InvalidFormat(_)));
    }

    #[test]
    fn mapper_nibbles_combine() {
        // flags6 high nibble 0x2, flags7 high nibble 0x40 -> mapper 0x42
        let data = build_ines(1, 0, 0x20, 0x40, None);
        let rom = RomImage::from_ines_bytes(&data).expect("parse");
        assert_eq!(rom.mapper_id(), 0x42);
    }

    #[test]
    fn trainer_moves_prg_offset() {
        let trainer = [0u8; 512];
        let data = build_ines(1, 0, 0b0000_0100, 0, Some(&trainer));
        let rom = RomImage::from_ines_bytes(&data).expect("parse");
        assert!(rom.has_trainer());
        // PRG payload starts after the trainer; builder fills PRG with 0xAA.
        assert_eq!(rom.prg_slice()[0], 0xAA);
    }

    #[test]
    fn vectors_read_from_prg_tail() {
        let rom_bytes = build_prg_rom(&[0xEA], (0x8000, 0x8100, 0x8200));
        let rom = RomImage::from_ines_bytes(&rom_bytes).expect("parse");
        assert_eq!(rom.reset_vector(), 0x8000);
        assert_eq!(rom.nmi_vector(), 0x8100);
        assert_eq!(rom.irq_vector(), 0x8200);
        assert!(rom.entry_points().contains(&0x8000));
        assert_eq!(rom.entry_points().len(), 1);
    }

    #[test]
    fn single_bank_exposes_mirror_region() {
        let rom_bytes = build_prg_rom(&[0xEA], (0x8000, 0x8000, 0x8000));
        let rom = RomImage::from_ines_bytes(&rom_bytes).expect("parse");
        let regions = rom.code_regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].base_address(), 0x8000);
        assert_eq!(regions[1].base_address(), 0xC000);
    }
}
