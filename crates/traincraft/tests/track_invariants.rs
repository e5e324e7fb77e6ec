//! Seeded randomized checks of the track invariants every behaviour and the
//! movement manager must uphold:
//! - paths start and end where `interpolate(0)` and `interpolate(1)` say
//! - direction vectors are unit length everywhere
//! - overlap compatibility is symmetric
//! - slave offsets are stable and always include the origin
//! - `next` continues exactly where the previous path ended
//!
//! Run: cargo test -p traincraft --test track_invariants

use bevy::math::{DVec3, IVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use traincraft::behaviour::{NativeTrack, PointsState, StraightTrackState, TrackBehaviour};
use traincraft::movement::{GridMovementManager, MovementManager};
use traincraft::orientation::{Axis, Facing, Turn};
use traincraft::path::TrackPath;
use traincraft::world::{TrackAccess, TrackMap};

const SEED: u64 = 0x7261_696c;
const CASES: usize = 500;

fn random_facing(rng: &mut ChaCha8Rng) -> Facing {
    Facing::ALL[rng.gen_range(0..4)]
}

fn random_turn(rng: &mut ChaCha8Rng) -> Turn {
    if rng.gen_bool(0.5) {
        Turn::Left
    } else {
        Turn::Right
    }
}

fn random_axis(rng: &mut ChaCha8Rng) -> Axis {
    if rng.gen_bool(0.5) {
        Axis::X
    } else {
        Axis::Z
    }
}

fn random_origin(rng: &mut ChaCha8Rng) -> IVec3 {
    IVec3::new(
        rng.gen_range(-64..64),
        rng.gen_range(-8..8),
        rng.gen_range(-64..64),
    )
}

fn random_native(rng: &mut ChaCha8Rng) -> NativeTrack {
    match rng.gen_range(0..4) {
        0 => NativeTrack::Straight {
            axis: random_axis(rng),
        },
        1 => NativeTrack::Ascending {
            facing: random_facing(rng),
            length: rng.gen_range(1..5),
        },
        2 => NativeTrack::Curve {
            facing: random_facing(rng),
            turn: random_turn(rng),
            radius: rng.gen_range(1..6),
        },
        _ => NativeTrack::SBend {
            facing: random_facing(rng),
            shift: random_turn(rng),
            length: rng.gen_range(2..6),
        },
    }
}

fn random_behaviour(rng: &mut ChaCha8Rng, origin: IVec3) -> TrackBehaviour {
    match rng.gen_range(0..3) {
        0 => random_native(rng).into(),
        1 => TrackBehaviour::stateful(StraightTrackState::new(origin, random_axis(rng))),
        _ => TrackBehaviour::stateful(PointsState::new(
            origin,
            random_facing(rng),
            random_turn(rng),
            rng.gen_range(1..4),
        )),
    }
}

fn assert_path_invariants(path: &TrackPath, rng: &mut ChaCha8Rng) {
    assert!(path.interpolate(0.0).distance(path.start()) < 1e-6);
    assert!(path.interpolate(1.0).distance(path.end()) < 1e-6);
    assert!(path.length() > 0.0);
    for _ in 0..8 {
        let t: f64 = rng.gen_range(0.0..=1.0);
        let dir = path.direction(t);
        assert!(
            (dir.length() - 1.0).abs() < 1e-6,
            "direction({t}) of {path:?} has length {}",
            dir.length()
        );
    }

    let reversed = path.reverse();
    assert!(reversed.start().distance(path.end()) < 1e-6);
    assert!(reversed.end().distance(path.start()) < 1e-6);
    assert!(reversed.direction(0.5).distance(-path.direction(0.5)) < 1e-6);
}

// ---------------------------------------------------------------------------
// 1. Path geometry
// ---------------------------------------------------------------------------

#[test]
fn test_random_paths_hold_endpoint_and_direction_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    for _ in 0..CASES {
        let origin = random_origin(&mut rng);
        let behaviour = random_behaviour(&mut rng, origin);
        for path in behaviour.alternative_paths(origin) {
            assert_path_invariants(&path, &mut rng);
        }
    }
}

#[test]
fn test_random_free_paths_hold_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 1);
    let point = |rng: &mut ChaCha8Rng| {
        DVec3::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(-10.0..10.0),
        )
    };
    for _ in 0..CASES {
        let a = point(&mut rng);
        let b = a + DVec3::new(rng.gen_range(0.5..4.0), 0.0, rng.gen_range(0.5..4.0));
        assert_path_invariants(&TrackPath::straight(a, b), &mut rng);

        let bezier = TrackPath::bezier([a, point(&mut rng), point(&mut rng), b]);
        assert_path_invariants(&bezier, &mut rng);

        let arc = TrackPath::quarter_turn(
            a,
            random_facing(&mut rng),
            random_turn(&mut rng),
            rng.gen_range(0.5..6.0),
            rng.gen_range(-1.0..1.0),
        );
        assert_path_invariants(&arc, &mut rng);
    }
}

// ---------------------------------------------------------------------------
// 2. Behaviours
// ---------------------------------------------------------------------------

#[test]
fn test_random_overlap_pairs_are_symmetric() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 2);
    for _ in 0..CASES {
        let origin = random_origin(&mut rng);
        let a = random_behaviour(&mut rng, origin);
        let b = random_behaviour(&mut rng, origin);
        assert_eq!(a.can_overlap(&b), b.can_overlap(&a), "{a:?} vs {b:?}");
    }
}

#[test]
fn test_random_slave_offsets_are_stable() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 3);
    for _ in 0..CASES {
        let origin = random_origin(&mut rng);
        let behaviour = random_behaviour(&mut rng, origin);
        let first = behaviour.slave_offsets(origin);
        assert!(first.contains(&IVec3::ZERO));
        assert_eq!(first, behaviour.slave_offsets(origin));
    }
}

// ---------------------------------------------------------------------------
// 3. Chaining
// ---------------------------------------------------------------------------

/// Lay a random walk of straights and quarter curves and check that `next`
/// always continues onto the piece laid after the current one.
#[test]
fn test_random_walks_chain_end_to_start() {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED ^ 4);
    let manager = GridMovementManager::default();

    for _ in 0..50 {
        let mut map = TrackMap::default();
        let mut cell = IVec3::ZERO;
        let mut facing = random_facing(&mut rng);
        let mut laid = Vec::new();

        for _ in 0..30 {
            let piece = if rng.gen_bool(0.3) {
                NativeTrack::Curve {
                    facing,
                    turn: random_turn(&mut rng),
                    radius: 1,
                }
            } else {
                NativeTrack::Straight {
                    axis: facing.axis(),
                }
            };
            // Walks that run into themselves just stop early.
            let Ok(key) = map.place(cell, piece) else {
                break;
            };
            // Straights are always built west to east or north to south.
            let mut path = map.piece(key).map(|p| p.path()).unwrap();
            if path.direction(0.5).dot(facing.vector()) < 0.0 {
                path = path.reverse();
            }
            laid.push(path);

            if let NativeTrack::Curve { turn, .. } = piece {
                facing = facing.turned(turn);
            }
            cell += facing.offset();
        }

        for pair in laid.windows(2) {
            let next = manager.next(&map, &pair[0]).unwrap_or_else(|| {
                panic!("no continuation after {:?}", pair[0]);
            });
            assert!(next.start().distance(pair[0].end()) < 1e-3);
            assert!(next.same_endpoints(&pair[1], 1e-3));
        }
    }
}
