//! FAT chain walking.
//!
//! Each FAT entry is 4 bytes on disk; the accessor historically consumes
//! only the low 16 bits, which caps the addressable chain. `FatWidth`
//! keeps that the default while exposing full 28-bit entries as a knob.

use std::io;

use crate::{ImageDev, config::FatWidth, geometry::VolumeGeometry};

/// End-of-chain threshold for 28-bit FAT32 entries.
pub const FAT32_EOC: u32 = 0x0FFF_FFF8;

/// Next cluster in the chain after `cluster`.
///
/// Seeks into FAT #1 and reads the entry. No bounds check against the
/// FAT extent is performed: an out-of-range cluster yields whatever
/// bytes the offset arithmetic lands on.
pub fn next_cluster<D: ImageDev>(
    dev: &mut D,
    geom: &VolumeGeometry,
    cluster: u32,
    width: FatWidth,
) -> io::Result<u32> {
    let off = geom.fat_entry_offset(cluster);
    match width {
        FatWidth::Narrow16 => {
            let mut buf = [0u8; 2];
            dev.read_at(off, &mut buf)?;
            Ok(u16::from_le_bytes(buf) as u32)
        }
        FatWidth::Wide28 => {
            let mut buf = [0u8; 4];
            dev.read_at(off, &mut buf)?;
            Ok(u32::from_le_bytes(buf) & 0x0FFF_FFFF)
        }
    }
}

/// Whether a FAT entry value marks the end of a chain.
///
/// The content reader bounds its loops by declared file size rather than
/// relying on this, which keeps a corrupt FAT from driving runaway
/// whole-file reads.
pub fn is_end_of_chain(value: u32, width: FatWidth) -> bool {
    match width {
        FatWidth::Narrow16 => value >= 0xFFF8,
        FatWidth::Wide28 => value >= FAT32_EOC,
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ImageBuilder;

    #[test]
    fn narrow_width_reads_low_half_only() {
        let mut img = ImageBuilder::new().set_fat(2, 0x0011_0003).build();
        let geom = crate::geometry::VolumeGeometry::parse(&mut img).unwrap();
        let next = next_cluster(&mut img, &geom, 2, FatWidth::Narrow16).unwrap();
        assert_eq!(next, 3);
    }

    #[test]
    fn wide_width_masks_to_28_bits() {
        let mut img = ImageBuilder::new().set_fat(2, 0xF011_0003).build();
        let geom = crate::geometry::VolumeGeometry::parse(&mut img).unwrap();
        let next = next_cluster(&mut img, &geom, 2, FatWidth::Wide28).unwrap();
        assert_eq!(next, 0x0011_0003);
    }

    #[test]
    fn walks_a_linked_chain() {
        let mut img = ImageBuilder::new().set_fat(3, 4).set_fat(4, 0x0FFF_FFFF).build();
        let geom = crate::geometry::VolumeGeometry::parse(&mut img).unwrap();
        assert_eq!(next_cluster(&mut img, &geom, 3, FatWidth::Narrow16).unwrap(), 4);
        let end = next_cluster(&mut img, &geom, 4, FatWidth::Narrow16).unwrap();
        assert!(is_end_of_chain(end, FatWidth::Narrow16));
    }

    #[test]
    fn end_of_chain_thresholds() {
        assert!(is_end_of_chain(0xFFF8, FatWidth::Narrow16));
        assert!(is_end_of_chain(0xFFFF, FatWidth::Narrow16));
        assert!(!is_end_of_chain(0xFFF7, FatWidth::Narrow16));
        assert!(is_end_of_chain(0x0FFF_FFF8, FatWidth::Wide28));
        assert!(!is_end_of_chain(0x0FFF_FFF7, FatWidth::Wide28));
    }

    #[test]
    fn out_of_range_cluster_reads_silently() {
        // Entry offset lands past the end of the image: no error, zeroes.
        let mut img = ImageBuilder::new().build();
        let geom = crate::geometry::VolumeGeometry::parse(&mut img).unwrap();
        let next = next_cluster(&mut img, &geom, 0x00FF_FFFF, FatWidth::Narrow16).unwrap();
        assert_eq!(next, 0);
    }
}
