//! 8.3 directory entries: on-disk layout, name normalization and
//! matching, the tombstone bit, and the working-directory table.

use std::io;

use bitflags::bitflags;

use crate::{ImageDev, config::FatWidth, geometry::VolumeGeometry};

/// One on-disk directory record is 32 bytes.
pub const DIR_ENTRY_SIZE: usize = 32;

/// First name byte of a deleted entry.
pub const TOMBSTONE: u8 = 0xE5;

bitflags! {
    /// Directory-entry attribute byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct EntryAttr: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
    }
}

// ─── Directory entry ───────────────────────────────────────────────────────────

/// A parsed 32-byte directory record.
///
/// The high first-cluster half is stored but not followed under the
/// default narrow FAT width; only the low half addresses data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; 11],
    pub attr: u8,
    pub first_cluster_hi: u16,
    pub first_cluster_lo: u16,
    pub size: u32,
}

impl DirEntry {
    /// Parse one record from its on-disk form. `raw` must hold at least
    /// [`DIR_ENTRY_SIZE`] bytes.
    pub fn parse(raw: &[u8]) -> Self {
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[0..11]);
        DirEntry {
            name,
            attr: raw[11],
            first_cluster_hi: u16::from_le_bytes([raw[20], raw[21]]),
            first_cluster_lo: u16::from_le_bytes([raw[26], raw[27]]),
            size: u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]),
        }
    }

    pub fn first_cluster(&self, width: FatWidth) -> u32 {
        match width {
            FatWidth::Narrow16 => self.first_cluster_lo as u32,
            FatWidth::Wide28 => {
                ((self.first_cluster_hi as u32) << 16) | self.first_cluster_lo as u32
            }
        }
    }

    pub fn attributes(&self) -> EntryAttr {
        EntryAttr::from_bits_truncate(self.attr)
    }

    pub fn is_dir(&self) -> bool {
        self.attributes().contains(EntryAttr::DIRECTORY)
    }

    pub fn is_tombstoned(&self) -> bool {
        self.name[0] == TOMBSTONE
    }

    /// Listable entries carry exactly one of the read-only, directory or
    /// archive attributes. Compound bytes (volume labels, hidden+system
    /// combinations, LFN fragments) are not listed.
    pub fn is_visible(&self) -> bool {
        self.attr == EntryAttr::READ_ONLY.bits()
            || self.attr == EntryAttr::DIRECTORY.bits()
            || self.attr == EntryAttr::ARCHIVE.bits()
    }

    /// Returns the padded short name as `BASE.EXT`, e.g. `"FOO     TXT"`
    /// → `"FOO.TXT"`. Dot entries come out as `.` and `..`.
    pub fn display_name(&self) -> String {
        let base_end = self.name[..8].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        let ext_end = self.name[8..].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
        let mut out = String::with_capacity(12);
        out.extend(self.name[..base_end].iter().map(|&b| b as char));
        if ext_end > 0 {
            out.push('.');
            out.extend(self.name[8..8 + ext_end].iter().map(|&b| b as char));
        }
        out
    }
}

// ─── Name normalization and matching ───────────────────────────────────────────

/// Expand user input into the fixed 11-byte short-name layout: split on
/// the first `.` into base/extension, pad both with spaces to 8 and 3
/// characters, ASCII-uppercase everything.
pub fn normalize_83(input: &str) -> [u8; 11] {
    let mut out = [b' '; 11];
    let (base, ext) = match input.find('.') {
        Some(i) => (&input[..i], &input[i + 1..]),
        None => (input, ""),
    };
    for (i, b) in base.bytes().take(8).enumerate() {
        out[i] = b.to_ascii_uppercase();
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        out[8 + i] = b.to_ascii_uppercase();
    }
    out
}

/// Exact 11-byte comparison of the normalized input against an on-disk
/// name. Input beginning with `..` instead matches any entry whose name
/// begins with `..`, whatever the padding — this is what makes parent
/// navigation work.
pub fn match_name(input: &str, raw_name: &[u8; 11]) -> bool {
    if input.starts_with("..") {
        return raw_name.starts_with(b"..");
    }
    normalize_83(input) == *raw_name
}

// ─── Working-directory table ───────────────────────────────────────────────────

/// The working-directory view: one cluster's worth of records plus the
/// raw block they were parsed from.
///
/// Replaced wholesale on every successful navigation, never merged; the
/// raw block is kept so tombstone/restore can bulk-rewrite it to the
/// image byte-for-byte.
#[derive(Clone, Debug)]
pub struct DirTable {
    raw: Vec<u8>,
    entries: Vec<DirEntry>,
    loaded_cluster: u32,
}

impl DirTable {
    /// Read one cluster of records starting at `cluster`. The table
    /// capacity is the cluster byte count divided by the record size —
    /// 16 entries for the 512-byte configurations this crate targets.
    pub fn load<D: ImageDev>(
        dev: &mut D,
        geom: &VolumeGeometry,
        cluster: u32,
    ) -> io::Result<Self> {
        let mut raw = vec![0u8; geom.cluster_bytes()];
        dev.read_at(geom.cluster_to_offset(cluster), &mut raw)?;
        let entries = raw.chunks_exact(DIR_ENTRY_SIZE).map(DirEntry::parse).collect();
        Ok(DirTable { raw, entries, loaded_cluster: cluster })
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Cluster this view was loaded from.
    pub fn loaded_cluster(&self) -> u32 {
        self.loaded_cluster
    }

    /// The backing block, as it would be written back to the image.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Index of the first record matching `input`. Scans every record;
    /// attribute bits are not consulted here.
    pub fn find(&self, input: &str) -> Option<usize> {
        self.entries.iter().position(|e| match_name(input, &e.name))
    }

    /// Visible names in on-disk order: tombstoned entries and entries
    /// with attribute bytes outside {read-only, directory, archive} are
    /// skipped.
    pub fn visible_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.is_visible() && !e.is_tombstoned())
            .map(|e| e.display_name())
            .collect()
    }

    /// Overwrite the entry's first name byte, in both the parsed view
    /// and the raw block. Tombstoning writes [`TOMBSTONE`]; restore
    /// writes the byte cached before deletion.
    pub fn set_first_name_byte(&mut self, index: usize, byte: u8) {
        self.entries[index].name[0] = byte;
        self.raw[index * DIR_ENTRY_SIZE] = byte;
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
