//! Session state and mutation ops.
//!
//! `Volume` is one open image: geometry, the working-directory view and
//! the name snapshot that undelete relies on. `Session` wraps it with
//! the open/close discipline the CLI collaborator expects.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use crate::{
    ImageDev,
    config::{MutationTarget, VolumeConfig},
    dir::{DirEntry, DirTable, TOMBSTONE, match_name},
    error::FsError,
    file,
    geometry::VolumeGeometry,
};

// ─── Volume ────────────────────────────────────────────────────────────────────

/// An open FAT32 image.
pub struct Volume<D> {
    dev: D,
    geom: VolumeGeometry,
    table: DirTable,
    /// Root-table names as they were at mount time, captured before any
    /// tombstoning. A tombstone destroys an entry's first name byte on
    /// disk; this snapshot is how restore recovers it.
    original_names: Vec<[u8; 11]>,
    config: VolumeConfig,
}

impl<D: ImageDev> Volume<D> {
    /// Parse geometry, load the root directory and snapshot its names.
    pub fn mount(mut dev: D, config: VolumeConfig) -> io::Result<Self> {
        let geom = VolumeGeometry::parse(&mut dev)?;
        let table = DirTable::load(&mut dev, &geom, geom.root_cluster)?;
        let original_names = table.entries().iter().map(|e| e.name).collect();
        Ok(Volume { dev, geom, table, original_names, config })
    }

    pub fn volume_info(&self) -> &VolumeGeometry {
        &self.geom
    }

    /// Visible names of the working directory, in on-disk order.
    pub fn list_visible(&self) -> Vec<String> {
        self.table.visible_names()
    }

    /// Locate an entry in the working directory by user input.
    pub fn find_entry(&self, name: &str) -> Result<DirEntry, FsError> {
        self.table
            .find(name)
            .map(|i| self.table.entries()[i])
            .ok_or(FsError::EntryNotFound)
    }

    /// Byte-for-byte copy of the named file's content.
    pub fn read_whole(&mut self, name: &str) -> Result<Vec<u8>, FsError> {
        let entry = self.find_entry(name)?;
        Ok(file::read_whole(&mut self.dev, &self.geom, &entry, self.config.fat_width)?)
    }

    /// `length` bytes of the named file starting at byte `position`.
    pub fn read_range(
        &mut self,
        name: &str,
        position: u64,
        length: usize,
    ) -> Result<Vec<u8>, FsError> {
        let entry = self.find_entry(name)?;
        Ok(file::read_range(
            &mut self.dev,
            &self.geom,
            &entry,
            position,
            length,
            self.config.read_policy,
            self.config.fat_width,
        )?)
    }

    /// Replace the working directory with the one `name` points at.
    ///
    /// A stored first-cluster of zero redirects to the root, which is
    /// how `..` in a first-level directory gets back up.
    pub fn change_directory(&mut self, name: &str) -> Result<(), FsError> {
        let entry = self.find_entry(name)?;
        if !entry.is_dir() {
            return Err(FsError::NotADirectory);
        }
        let mut cluster = entry.first_cluster(self.config.fat_width);
        if cluster == 0 {
            cluster = self.geom.root_cluster;
        }
        log::debug!("cd {name}: loading directory cluster {cluster}");
        self.table = DirTable::load(&mut self.dev, &self.geom, cluster)?;
        Ok(())
    }

    /// Mark the matched entry deleted and persist the table block. The
    /// entry's size and cluster fields stay intact, which is what makes
    /// restore possible without re-reading the FAT.
    pub fn tombstone(&mut self, name: &str) -> Result<(), FsError> {
        let index = self.table.find(name).ok_or(FsError::EntryNotFound)?;
        self.table.set_first_name_byte(index, TOMBSTONE);
        self.persist_table()
    }

    /// Undo tombstones: every visible-attribute entry whose mount-time
    /// name matches gets its original first byte back, with the block
    /// persisted per match.
    pub fn restore(&mut self, name: &str) -> Result<(), FsError> {
        let mut matched = false;
        for index in 0..self.table.entries().len() {
            if !self.table.entries()[index].is_visible() {
                continue;
            }
            let Some(original) = self.original_names.get(index).copied() else {
                continue;
            };
            if match_name(name, &original) {
                matched = true;
                self.table.set_first_name_byte(index, original[0]);
                self.persist_table()?;
            }
        }
        if matched { Ok(()) } else { Err(FsError::EntryNotFound) }
    }

    /// Bulk-rewrite the working table to the image.
    ///
    /// The default target is the root directory's block whatever cluster
    /// the table was loaded from, reproducing the historical behavior;
    /// `LoadedCluster` writes back where the view was actually read.
    fn persist_table(&mut self) -> Result<(), FsError> {
        let cluster = match self.config.mutation_target {
            MutationTarget::RootDirectory => self.geom.root_cluster,
            MutationTarget::LoadedCluster => self.table.loaded_cluster(),
        };
        self.dev.write_at(self.geom.cluster_to_offset(cluster), self.table.raw())?;
        Ok(())
    }
}

// ─── Session ───────────────────────────────────────────────────────────────────

/// At most one open image per session: `open` while open is rejected,
/// everything but `open` while closed is rejected. Single-threaded,
/// synchronous, blocking — there is exactly one logical thread of
/// control and one image handle.
pub struct Session<D = std::fs::File> {
    volume: Option<Volume<D>>,
    config: VolumeConfig,
}

impl<D> Session<D> {
    pub fn new(config: VolumeConfig) -> Self {
        Session { volume: None, config }
    }

    pub fn is_open(&self) -> bool {
        self.volume.is_some()
    }
}

impl<D> Default for Session<D> {
    fn default() -> Self {
        Self::new(VolumeConfig::default())
    }
}

impl Session<std::fs::File> {
    /// Open an image file read-write (mutation ops write back in place).
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<(), FsError> {
        if self.volume.is_some() {
            return Err(FsError::AlreadyOpen);
        }
        let image = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(FsError::ImageUnreadable)?;
        self.volume = Some(Volume::mount(image, self.config)?);
        Ok(())
    }
}

impl<D: ImageDev> Session<D> {
    /// Attach an already-opened backend (in-memory images, mostly).
    pub fn open_device(&mut self, dev: D) -> Result<(), FsError> {
        if self.volume.is_some() {
            return Err(FsError::AlreadyOpen);
        }
        self.volume = Some(Volume::mount(dev, self.config)?);
        Ok(())
    }

    /// Release the image handle.
    pub fn close(&mut self) -> Result<(), FsError> {
        self.volume.take().map(drop).ok_or(FsError::NotOpen)
    }

    fn volume(&self) -> Result<&Volume<D>, FsError> {
        self.volume.as_ref().ok_or(FsError::NotOpen)
    }

    fn volume_mut(&mut self) -> Result<&mut Volume<D>, FsError> {
        self.volume.as_mut().ok_or(FsError::NotOpen)
    }

    pub fn volume_info(&self) -> Result<&VolumeGeometry, FsError> {
        Ok(self.volume()?.volume_info())
    }

    pub fn list_visible(&self) -> Result<Vec<String>, FsError> {
        Ok(self.volume()?.list_visible())
    }

    pub fn find_entry(&self, name: &str) -> Result<DirEntry, FsError> {
        self.volume()?.find_entry(name)
    }

    pub fn read_whole(&mut self, name: &str) -> Result<Vec<u8>, FsError> {
        self.volume_mut()?.read_whole(name)
    }

    pub fn read_range(
        &mut self,
        name: &str,
        position: u64,
        length: usize,
    ) -> Result<Vec<u8>, FsError> {
        self.volume_mut()?.read_range(name, position, length)
    }

    pub fn change_directory(&mut self, name: &str) -> Result<(), FsError> {
        self.volume_mut()?.change_directory(name)
    }

    pub fn tombstone(&mut self, name: &str) -> Result<(), FsError> {
        self.volume_mut()?.tombstone(name)
    }

    pub fn restore(&mut self, name: &str) -> Result<(), FsError> {
        self.volume_mut()?.restore(name)
    }
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
