//! Grid cells a track piece physically covers.
//!
//! A track's footprint is approximated by walking its path and marking the
//! cells a little to either side of the centre line, so multi-block and curved
//! pieces claim every block they pass over without storing voxel geometry.

use std::collections::HashSet;

use bevy::math::{DVec3, IVec3};

use crate::config::{SLAVE_SAMPLES_PER_BLOCK, SLAVE_SIDE_OFFSET};
use crate::path::TrackPath;

/// Offsets for a piece that never leaves its own block.
pub fn single_block_slaves() -> HashSet<IVec3> {
    HashSet::from([IVec3::ZERO])
}

/// Grid cell containing a world-space point.
pub fn cell_of(point: DVec3) -> IVec3 {
    point.floor().as_ivec3()
}

/// Sample `path` and return the cells it covers, relative to `origin`.
///
/// Takes `5 * ceil(length)` samples at the centres of equal parameter steps
/// and marks the cells `SLAVE_SIDE_OFFSET` to each side of every sample. The
/// origin offset is always present.
pub fn slave_offsets(path: &TrackPath, origin: IVec3) -> HashSet<IVec3> {
    let mut slaves = single_block_slaves();
    let samples = SLAVE_SAMPLES_PER_BLOCK * (path.length().ceil() as usize).max(1);
    for i in 0..samples {
        let t = (i as f64 + 0.5) / samples as f64;
        let pos = path.interpolate(t);
        let side = path.direction(t).cross(DVec3::Y).normalize_or_zero();

        slaves.insert(cell_of(pos + side * SLAVE_SIDE_OFFSET) - origin);
        slaves.insert(cell_of(pos - side * SLAVE_SIDE_OFFSET) - origin);
    }
    slaves
}

/// Union of the footprints of several legs sharing an origin.
pub fn slave_offsets_union<'a>(
    paths: impl IntoIterator<Item = &'a TrackPath>,
    origin: IVec3,
) -> HashSet<IVec3> {
    let mut slaves = single_block_slaves();
    for path in paths {
        slaves.extend(slave_offsets(path, origin));
    }
    slaves
}
