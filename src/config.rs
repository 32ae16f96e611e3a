//! Behavior knobs.
//!
//! The defaults reproduce the literal behavior of the accessor this
//! crate descends from; the alternatives make its known hazards explicit
//! instead of hardwiring one policy.

/// Bounding policy for positioned range reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Follow the chain until the caller's length is exhausted, even
    /// past the entry's declared size.
    #[default]
    Permissive,
    /// Clamp range reads to the declared file size.
    Strict,
}

/// Where tombstone/restore write the directory block back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MutationTarget {
    /// Always rewrite the root directory's block, whatever cluster the
    /// working view was loaded from. Matches the historical behavior.
    #[default]
    RootDirectory,
    /// Rewrite the cluster the working view was actually loaded from.
    LoadedCluster,
}

/// How much of a 4-byte FAT entry (and of the first-cluster fields) is
/// consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FatWidth {
    /// Low 16 bits only. Caps addressable chains but matches the
    /// historical on-disk consumption.
    #[default]
    Narrow16,
    /// Full 28-bit FAT32 entries.
    Wide28,
}

/// Per-volume configuration, fixed at open time.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeConfig {
    pub read_policy: ReadPolicy,
    pub mutation_target: MutationTarget,
    pub fat_width: FatWidth,
}
