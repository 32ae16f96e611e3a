//! Content reader: cross-cluster byte-range extraction.

use std::io;

use crate::{
    ImageDev,
    config::{FatWidth, ReadPolicy},
    dir::DirEntry,
    fat,
    geometry::VolumeGeometry,
};

/// Copy the entire file content, cluster by cluster.
///
/// The entry's declared size is ground truth: whole clusters are copied
/// while more than one cluster remains, then exactly the remainder, so
/// cluster padding never leaks into the result and a corrupt FAT cannot
/// drive a runaway read.
pub fn read_whole<D: ImageDev>(
    dev: &mut D,
    geom: &VolumeGeometry,
    entry: &DirEntry,
    width: FatWidth,
) -> io::Result<Vec<u8>> {
    let cluster_size = geom.cluster_bytes();
    let mut out = vec![0u8; entry.size as usize];
    let mut cluster = entry.first_cluster(width);
    let mut copied = 0usize;
    let mut remaining = entry.size as usize;

    while remaining > cluster_size {
        dev.read_at(geom.cluster_to_offset(cluster), &mut out[copied..copied + cluster_size])?;
        copied += cluster_size;
        remaining -= cluster_size;
        cluster = fat::next_cluster(dev, geom, cluster, width)?;
    }
    dev.read_at(geom.cluster_to_offset(cluster), &mut out[copied..copied + remaining])?;
    Ok(out)
}

/// Positioned partial read.
///
/// Hops whole clusters through the FAT to find the one containing
/// `position`, then streams from there, crossing into the next cluster
/// whenever the within-cluster offset reaches the cluster size.
///
/// Under [`ReadPolicy::Permissive`] no bound against the declared size
/// is applied: a `length` past end-of-file keeps following whatever the
/// chain yields. [`ReadPolicy::Strict`] clamps the read to the declared
/// size instead.
pub fn read_range<D: ImageDev>(
    dev: &mut D,
    geom: &VolumeGeometry,
    entry: &DirEntry,
    position: u64,
    length: usize,
    policy: ReadPolicy,
    width: FatWidth,
) -> io::Result<Vec<u8>> {
    let cluster_size = geom.cluster_bytes();

    let length = match policy {
        ReadPolicy::Permissive => {
            if position + length as u64 > entry.size as u64 {
                log::warn!(
                    "range read [{position}, +{length}) extends past declared size {}",
                    entry.size
                );
            }
            length
        }
        ReadPolicy::Strict => {
            (entry.size as u64).saturating_sub(position).min(length as u64) as usize
        }
    };

    let mut cluster = entry.first_cluster(width);
    let mut position = position;
    while position >= cluster_size as u64 {
        position -= cluster_size as u64;
        cluster = fat::next_cluster(dev, geom, cluster, width)?;
    }
    let mut within = position as usize;

    let mut out = vec![0u8; length];
    let mut copied = 0usize;
    while copied < length {
        let chunk = (length - copied).min(cluster_size - within);
        dev.read_at(
            geom.cluster_to_offset(cluster).wrapping_add(within as u64),
            &mut out[copied..copied + chunk],
        )?;
        copied += chunk;
        within += chunk;
        if within == cluster_size && copied < length {
            cluster = fat::next_cluster(dev, geom, cluster, width)?;
            within = 0;
        }
    }
    Ok(out)
}

// ─── Unit tests ────────────────────────────────────────────────────────────────
