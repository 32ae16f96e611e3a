//! Read-mostly accessor for FAT32 volumes stored as flat binary images.
//!
//! Parses boot-sector geometry, follows cluster chains through the FAT,
//! walks 8.3 short-name directory entries and extracts byte ranges that
//! may span clusters. The interactive shell driving it is a separate
//! collaborator; this crate only exposes the session API (`Session`,
//! `Volume`) it calls with already-parsed names, offsets and lengths.

pub mod config;
pub mod dir;
pub mod error;
pub mod fat;
pub mod file;
pub mod geometry;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

use std::io::{self, Read, Seek, SeekFrom, Write};

pub use config::{FatWidth, MutationTarget, ReadPolicy, VolumeConfig};
pub use dir::{DIR_ENTRY_SIZE, DirEntry, DirTable, EntryAttr, TOMBSTONE};
pub use error::FsError;
pub use geometry::VolumeGeometry;
pub use session::{Session, Volume};

// ─── Image backend abstraction ─────────────────────────────────────────────────

/// Byte-addressed image backend.
///
/// Every operation in the accessor is a seek+read or seek+write pair
/// against one open image, so the backend is byte-ranged rather than
/// sector-ranged. The blanket impl covers `std::fs::File` in production
/// and `Cursor<Vec<u8>>` in tests.
pub trait ImageDev {
    /// Best-effort read: returns the number of bytes actually read.
    /// Reading past end-of-image is not an error; the tail of `buf` is
    /// left untouched.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Exact write of `buf` at `offset`.
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;
}

impl<T: Read + Write + Seek> ImageDev for T {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.seek(SeekFrom::Start(offset))?;
        let mut read = 0;
        while read < buf.len() {
            match self.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(read)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buf)
    }
}
