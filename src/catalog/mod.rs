use crate::{
    domain::track::{Track, TrackId},
    resolve::error::ResolveError,
};

pub mod error;
pub mod spotify;

use error::CatalogError;

/// Capability to look tracks up in the metadata catalog
pub trait CatalogClient {
    /// Parses a catalog reference (URL, URI or bare id) into a track id.
    fn parse_reference(&self, reference: &str) -> Result<TrackId, CatalogError>;

    /// Fetches track metadata. Genres are left empty, see [`CatalogClient::artist_genres`].
    fn track(&self, id: &TrackId) -> Result<Track, CatalogError>;

    /// Genres of an artist, in catalog order
    fn artist_genres(&self, artist_id: &str) -> Result<Vec<String>, CatalogError>;

    /// Best single match for free text, if any
    fn search_track(&self, query: &str) -> Result<Option<TrackId>, CatalogError>;
}

/// Source of the reference duration every search candidate is compared against
pub trait DurationOracle {
    fn reference_duration(&self, track: &Track) -> Result<i64, ResolveError>;
}

/// Trusts the duration the catalog reported for the track
pub struct CatalogDuration;

impl DurationOracle for CatalogDuration {
    fn reference_duration(&self, track: &Track) -> Result<i64, ResolveError> {
        if track.duration_seconds <= 0 {
            return Err(ResolveError::InvalidInput(format!(
                "track {} has non-positive duration {}",
                track.id, track.duration_seconds
            )));
        }
        Ok(track.duration_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::TrackMetadata;

    fn track_with_duration(duration_seconds: i64) -> Track {
        Track {
            id: TrackId("t".to_string()),
            artist_id: "a".to_string(),
            metadata: TrackMetadata::default(),
            duration_seconds,
        }
    }

    #[test]
    fn catalog_duration_passes_positive_values() {
        assert_eq!(
            CatalogDuration
                .reference_duration(&track_with_duration(210))
                .unwrap(),
            210
        );
    }

    #[test]
    fn catalog_duration_rejects_non_positive() {
        for d in [0, -5] {
            assert!(matches!(
                CatalogDuration.reference_duration(&track_with_duration(d)),
                Err(ResolveError::InvalidInput(_))
            ));
        }
    }
}
