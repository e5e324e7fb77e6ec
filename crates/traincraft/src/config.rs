/// Height of the rail surface above the floor of its block.
pub const TRACK_HEIGHT: f64 = 0.125;

/// Slave-offset samples taken per (rounded up) block of path length.
pub const SLAVE_SAMPLES_PER_BLOCK: usize = 5;

/// Distance either side of the path centre line that a track physically covers.
pub const SLAVE_SIDE_OFFSET: f64 = 0.2;

/// Maximum gap between one path's end and the next path's start for the two to
/// count as joined.
pub const PATH_JOIN_TOLERANCE: f64 = 1e-3;

/// How far past a path's end (along its terminal tangent) to probe for the
/// next track piece.
pub const NEXT_PROBE_DISTANCE: f64 = 0.5;

/// Chebyshev radius, in blocks, searched when re-acquiring a path for a
/// follower that has none.
pub const CLOSEST_SEARCH_RADIUS: i32 = 3;

/// Minimum |cos| between a path tangent and the requested travel vector for a
/// path to count as compatible with that travel direction.
pub const MIN_HEADING_ALIGNMENT: f64 = 0.1;

/// Polyline steps used to measure Bezier arc length.
pub const BEZIER_LENGTH_STEPS: usize = 64;

/// Samples per block of length used by nearest-point searches.
pub const CLOSEST_SAMPLES_PER_BLOCK: usize = 16;

/// Upper bound on pieces a single route search may expand.
pub const ROUTE_MAX_EXPANSIONS: usize = 4096;

/// Upper bound on path hops a follower may chain through in one tick.
pub const MAX_HOPS_PER_TICK: usize = 16;
