// ---------------------------------------------------------------------------
// TrackError: failures surfaced to the host world / persistence layer
// ---------------------------------------------------------------------------

use std::fmt;

use bevy::math::IVec3;

use crate::world::TrackKey;

/// Errors from host-facing track operations.
///
/// Expected misses (no track at a cell, paths that do not join) are `None`
/// rather than errors; this enum only covers requests the caller got wrong or
/// data that could not be decoded.
#[derive(Debug)]
pub enum TrackError {
    /// A cell the new piece needs is held by a piece it cannot overlap.
    Occupied { cell: IVec3, by: TrackKey },
    /// No piece with this key is placed.
    NotFound(TrackKey),
    /// No stateful factory is registered under this identifier.
    UnknownFactory(String),
    /// A factory identifier was registered twice, or after the registry was sealed.
    RegistryRejected(String),
    /// Tag-compound data did not describe a valid configuration.
    InvalidTag(String),
    /// Wire encoding failed.
    Encode(String),
    /// Wire decoding failed (truncated or corrupt stream).
    Decode(String),
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::Occupied { cell, by } => {
                write!(f, "Cell {cell} is already occupied by track {}", by.0)
            }
            TrackError::NotFound(key) => write!(f, "No track placed with key {}", key.0),
            TrackError::UnknownFactory(id) => write!(f, "Unknown stateful track factory: {id}"),
            TrackError::RegistryRejected(id) => {
                write!(f, "Stateful track factory registration rejected: {id}")
            }
            TrackError::InvalidTag(msg) => write!(f, "Invalid track tag: {msg}"),
            TrackError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            TrackError::Decode(msg) => write!(f, "Decoding error: {msg}"),
        }
    }
}

impl std::error::Error for TrackError {}

impl From<bitcode::Error> for TrackError {
    fn from(e: bitcode::Error) -> Self {
        TrackError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(e: serde_json::Error) -> Self {
        TrackError::InvalidTag(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_error_display_occupied() {
        let err = TrackError::Occupied {
            cell: IVec3::new(1, 2, 3),
            by: TrackKey(7),
        };
        let msg = format!("{err}");
        assert!(msg.contains("occupied"), "got: {msg}");
        assert!(msg.contains('7'), "got: {msg}");
    }

    #[test]
    fn test_track_error_display_unknown_factory() {
        let err = TrackError::UnknownFactory("traincraft:missing".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("traincraft:missing"), "got: {msg}");
    }

    #[test]
    fn test_track_error_from_serde_json() {
        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: TrackError = json_err.into();
        assert!(matches!(err, TrackError::InvalidTag(_)));
    }

    #[test]
    fn test_track_error_from_bitcode() {
        let bitcode_err = bitcode::decode::<u64>(&[]).unwrap_err();
        let err: TrackError = bitcode_err.into();
        assert!(matches!(err, TrackError::Decode(_)));
    }

    #[test]
    fn test_track_error_is_error_trait() {
        let err = TrackError::NotFound(TrackKey(3));
        assert!(std::error::Error::source(&err).is_none());
    }
}
