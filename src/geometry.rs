//! Volume geometry: boot-sector fields and the offset arithmetic built
//! on them.

use std::io;

use crate::ImageDev;

// Boot-sector byte offsets consumed from the image.
const BS_OEM_NAME: usize = 3;
const BPB_BYTES_PER_SECTOR: usize = 11;
const BPB_SECTORS_PER_CLUSTER: usize = 13;
const BPB_RESERVED_SECTORS: usize = 14;
const BPB_NUM_FATS: usize = 16;
const BPB_ROOT_ENTRY_COUNT: usize = 17;
const BPB_FAT_SIZE_32: usize = 36;
const BPB_ROOT_CLUSTER: usize = 44;
const BS_VOLUME_LABEL: usize = 71;

const BOOT_SECTOR_LEN: usize = 512;

/// Volume layout parsed once at mount time; immutable afterwards.
#[derive(Clone, Copy, Debug)]
pub struct VolumeGeometry {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entry_count: u16,
    pub fat_size_32: u32,
    pub root_cluster: u32,
    pub volume_label: [u8; 11],
}

fn le16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn le32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

impl VolumeGeometry {
    /// Parse the boot sector.
    ///
    /// Deliberately permissive: the only failure mode is the read
    /// itself. A non-FAT32 image yields garbage geometry, not a
    /// detected error.
    pub fn parse<D: ImageDev>(dev: &mut D) -> io::Result<Self> {
        let mut sec = [0u8; BOOT_SECTOR_LEN];
        dev.read_at(0, &mut sec)?;

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&sec[BS_OEM_NAME..BS_OEM_NAME + 8]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&sec[BS_VOLUME_LABEL..BS_VOLUME_LABEL + 11]);

        let geom = VolumeGeometry {
            oem_name,
            bytes_per_sector: le16(&sec, BPB_BYTES_PER_SECTOR),
            sectors_per_cluster: sec[BPB_SECTORS_PER_CLUSTER],
            reserved_sectors: le16(&sec, BPB_RESERVED_SECTORS),
            num_fats: sec[BPB_NUM_FATS],
            root_entry_count: le16(&sec, BPB_ROOT_ENTRY_COUNT),
            fat_size_32: le32(&sec, BPB_FAT_SIZE_32),
            root_cluster: le32(&sec, BPB_ROOT_CLUSTER),
            volume_label,
        };

        log::debug!(
            "BPB: {} bytes/sector, {} sectors/cluster, {} reserved, {} FATs of {} sectors, root cluster {}",
            geom.bytes_per_sector,
            geom.sectors_per_cluster,
            geom.reserved_sectors,
            geom.num_fats,
            geom.fat_size_32,
            geom.root_cluster,
        );

        Ok(geom)
    }

    /// Byte offset of a data cluster inside the image.
    ///
    /// Cluster 2 is the first data cluster; 0 and 1 are never passed in
    /// during normal chain walking. Wrapping arithmetic keeps an
    /// out-of-range cluster silent rather than panicking — the read at
    /// the resulting offset just comes back empty.
    pub fn cluster_to_offset(&self, cluster: u32) -> u64 {
        let bps = self.bytes_per_sector as u64;
        let data_base =
            bps * self.reserved_sectors as u64 + self.num_fats as u64 * self.fat_size_32 as u64 * bps;
        (cluster as u64).wrapping_sub(2).wrapping_mul(bps).wrapping_add(data_base)
    }

    /// Byte offset of a cluster's 4-byte entry in FAT #1.
    pub fn fat_entry_offset(&self, cluster: u32) -> u64 {
        self.bytes_per_sector as u64 * self.reserved_sectors as u64 + cluster as u64 * 4
    }

    /// Allocation-unit stride used for directory tables and data copies.
    pub fn cluster_bytes(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::ImageBuilder;

    fn sample_geom() -> VolumeGeometry {
        VolumeGeometry {
            oem_name: *b"MSDOS5.0",
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 32,
            num_fats: 2,
            root_entry_count: 16,
            fat_size_32: 1017,
            root_cluster: 2,
            volume_label: *b"TESTVOL    ",
        }
    }

    #[test]
    fn parse_reads_fields_at_documented_offsets() {
        let mut img = ImageBuilder::new().build();
        let geom = VolumeGeometry::parse(&mut img).unwrap();
        assert_eq!(geom.bytes_per_sector, 512);
        assert_eq!(geom.sectors_per_cluster, 1);
        assert_eq!(geom.reserved_sectors, ImageBuilder::RESERVED);
        assert_eq!(geom.num_fats, 2);
        assert_eq!(geom.root_entry_count, 16);
        assert_eq!(geom.fat_size_32, ImageBuilder::FAT_SIZE);
        assert_eq!(geom.root_cluster, 2);
        assert_eq!(&geom.oem_name, b"MSDOS5.0");
        assert_eq!(&geom.volume_label, b"TESTVOL    ");
    }

    #[test]
    fn parse_is_permissive_on_short_images() {
        // Garbage in, garbage geometry out — but never an error.
        let mut img = std::io::Cursor::new(vec![0u8; 64]);
        let geom = VolumeGeometry::parse(&mut img).unwrap();
        assert_eq!(geom.bytes_per_sector, 0);
    }

    #[test]
    fn cluster_two_is_first_data_cluster() {
        let g = sample_geom();
        let data_base = 512 * 32 + 2 * 1017 * 512;
        assert_eq!(g.cluster_to_offset(2), data_base);
    }

    #[test]
    fn cluster_to_offset_reference_scenario() {
        // bps=512, reserved=32, 2 FATs of 1017 sectors.
        let g = sample_geom();
        assert_eq!(g.cluster_to_offset(2), 1_057_792);
        assert_eq!(g.cluster_to_offset(3), 1_057_792 + 512);
    }

    #[test]
    fn fat_entry_offset_is_four_bytes_per_cluster() {
        let g = sample_geom();
        assert_eq!(g.fat_entry_offset(0), 512 * 32);
        assert_eq!(g.fat_entry_offset(7), 512 * 32 + 28);
    }

    #[test]
    fn cluster_bytes_scales_with_sectors_per_cluster() {
        let mut g = sample_geom();
        assert_eq!(g.cluster_bytes(), 512);
        g.sectors_per_cluster = 8;
        assert_eq!(g.cluster_bytes(), 4096);
    }
}
