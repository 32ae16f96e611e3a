//! Hand-built FAT32 images for format-level tests.
//!
//! The fatfs harness (see the session tests) exercises the accessor
//! against real volumes; this builder is for cases that need exact
//! control of boot-sector fields, FAT entries and directory bytes.

use std::io::Cursor;

pub struct ImageBuilder {
    data: Vec<u8>,
}

impl ImageBuilder {
    pub const BPS: u16 = 512;
    pub const RESERVED: u16 = 32;
    pub const NUM_FATS: u8 = 2;
    pub const FAT_SIZE: u32 = 4;
    pub const ROOT_CLUSTER: u32 = 2;
    const DATA_CLUSTERS: usize = 16;

    pub fn new() -> Self {
        let total = (Self::RESERVED as usize
            + Self::NUM_FATS as usize * Self::FAT_SIZE as usize
            + Self::DATA_CLUSTERS)
            * Self::BPS as usize;
        let mut data = vec![0u8; total];

        data[3..11].copy_from_slice(b"MSDOS5.0");
        data[11..13].copy_from_slice(&Self::BPS.to_le_bytes());
        data[13] = 1; // sectors per cluster
        data[14..16].copy_from_slice(&Self::RESERVED.to_le_bytes());
        data[16] = Self::NUM_FATS;
        data[17..19].copy_from_slice(&16u16.to_le_bytes());
        data[36..40].copy_from_slice(&Self::FAT_SIZE.to_le_bytes());
        data[44..48].copy_from_slice(&Self::ROOT_CLUSTER.to_le_bytes());
        data[71..82].copy_from_slice(b"TESTVOL    ");

        ImageBuilder { data }
    }

    pub fn cluster_offset(cluster: u32) -> usize {
        (cluster as usize - 2 + Self::RESERVED as usize
            + Self::NUM_FATS as usize * Self::FAT_SIZE as usize)
            * Self::BPS as usize
    }

    /// Set the FAT #1 entry for `cluster`.
    pub fn set_fat(mut self, cluster: u32, next: u32) -> Self {
        let off = Self::RESERVED as usize * Self::BPS as usize + cluster as usize * 4;
        self.data[off..off + 4].copy_from_slice(&next.to_le_bytes());
        self
    }

    /// Write `bytes` at the start of a data cluster.
    pub fn fill_cluster(mut self, cluster: u32, bytes: &[u8]) -> Self {
        let off = Self::cluster_offset(cluster);
        self.data[off..off + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Place a 32-byte directory record at `index` inside `cluster`.
    pub fn dir_entry(
        mut self,
        cluster: u32,
        index: usize,
        name: &[u8; 11],
        attr: u8,
        first_cluster: u32,
        size: u32,
    ) -> Self {
        let off = Self::cluster_offset(cluster) + index * 32;
        self.data[off..off + 11].copy_from_slice(name);
        self.data[off + 11] = attr;
        self.data[off + 20..off + 22].copy_from_slice(&((first_cluster >> 16) as u16).to_le_bytes());
        self.data[off + 26..off + 28].copy_from_slice(&(first_cluster as u16).to_le_bytes());
        self.data[off + 28..off + 32].copy_from_slice(&size.to_le_bytes());
        self
    }

    pub fn build(self) -> Cursor<Vec<u8>> {
        Cursor::new(self.data)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
