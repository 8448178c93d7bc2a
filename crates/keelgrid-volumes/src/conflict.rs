//! Pairwise volume conflict detection.
//!
//! Two pods conflict when they would mount the same underlying storage
//! and at least one side mounts it writable (by-id block storage is
//! stricter: any id collision is forbidden). Comparisons only happen
//! within a backend kind; the read-only exception is a property of each
//! kind's rule, not a blanket rule above them.

use std::collections::HashSet;

use keelgrid_state::{NodeInfo, Pod, Volume, VolumeSource};

/// True if the volume is one of the backend kinds that participate in
/// conflict checks. All other kinds are inert to this filter.
pub(crate) fn needs_conflict_check(volume: &Volume) -> bool {
    matches!(
        volume.source,
        VolumeSource::BlockDisk { .. }
            | VolumeSource::BlockById { .. }
            | VolumeSource::NetworkTarget { .. }
            | VolumeSource::ReplicatedImage { .. }
    )
}

/// True if the two monitor lists share at least one endpoint.
///
/// The probe set is built from the shorter list so the check stays
/// near-linear for asymmetric inputs.
fn have_overlap(a: &[String], b: &[String]) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let probe: HashSet<&str> = short.iter().map(String::as_str).collect();
    long.iter().any(|endpoint| probe.contains(endpoint.as_str()))
}

/// Check one candidate volume against every volume of an existing pod.
fn is_volume_conflict(volume: &Volume, existing_pod: &Pod) -> bool {
    for existing in &existing_pod.spec.volumes {
        let conflict = match (&volume.source, &existing.source) {
            // Same block disk mounted by multiple pods conflicts unless
            // every mount is read-only.
            (
                VolumeSource::BlockDisk {
                    disk_name,
                    read_only,
                },
                VolumeSource::BlockDisk {
                    disk_name: existing_disk,
                    read_only: existing_ro,
                },
            ) => disk_name == existing_disk && !(*read_only && *existing_ro),

            // By-id block storage admits a single attachment; any id
            // collision is forbidden regardless of read-only.
            (
                VolumeSource::BlockById { volume_id },
                VolumeSource::BlockById {
                    volume_id: existing_id,
                },
            ) => volume_id == existing_id,

            // Two network targets are the same target if they share an
            // IQN; only one writable mount is permitted.
            (
                VolumeSource::NetworkTarget { iqn, read_only },
                VolumeSource::NetworkTarget {
                    iqn: existing_iqn,
                    read_only: existing_ro,
                },
            ) => iqn == existing_iqn && !(*read_only && *existing_ro),

            // Two replicated images are the same image if they share a
            // monitor, pool, and image name; only one writable mount is
            // permitted.
            (
                VolumeSource::ReplicatedImage {
                    monitors,
                    pool,
                    image,
                    read_only,
                },
                VolumeSource::ReplicatedImage {
                    monitors: existing_monitors,
                    pool: existing_pool,
                    image: existing_image,
                    read_only: existing_ro,
                },
            ) => {
                have_overlap(monitors, existing_monitors)
                    && pool == existing_pool
                    && image == existing_image
                    && !(*read_only && *existing_ro)
            }

            _ => false,
        };

        if conflict {
            return true;
        }
    }

    false
}

/// True if the pod can land on the node without conflicting with any
/// volume of any resident pod. Rejects on the first conflict found.
pub fn satisfies_volume_conflicts(pod: &Pod, node: &NodeInfo) -> bool {
    for volume in &pod.spec.volumes {
        if !needs_conflict_check(volume) {
            continue;
        }
        for resident in &node.pods {
            if is_volume_conflict(volume, resident) {
                return false;
            }
        }
    }
    true
}
