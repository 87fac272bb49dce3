use std::fmt::Display;

/// Catalog identifier of a track.
///
/// Always the bare id (e.g. `4uLU6hMCjMI75M1A2tKUQC`), never the URL or URI form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represent a catalog track, fetched once per job
#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub artist_id: String,
    pub metadata: TrackMetadata,
    /// authoritative duration reported by the catalog, may be non-positive on bad data
    pub duration_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
    pub album: String,
    /// 4-digit release year
    pub year: String,
    /// artist genres in catalog order, may be empty
    pub genres: Vec<String>,
    pub artwork: Option<ArtworkRef>,
}

impl TrackMetadata {
    /// value written to the genre tag: comma-joined, empty when there are no genres
    pub fn genre_tag(&self) -> String {
        self.genres.join(", ")
    }

    /// free text used to look the track up on the video host
    pub fn search_query(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkRef(pub String);

/// Extracts a 4-digit year from a catalog release date (`2019`, `2019-05`, `2019-05-31`)
pub fn release_year(release_date: &str) -> Option<String> {
    let year = release_date.get(..4)?;
    year.chars()
        .all(|c| c.is_ascii_digit())
        .then(|| year.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(genres: &[&str]) -> TrackMetadata {
        TrackMetadata {
            artist: "Daft Punk".to_string(),
            title: "Veridis Quo".to_string(),
            album: "Discovery".to_string(),
            year: "2001".to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            artwork: None,
        }
    }

    #[test]
    fn genre_tag_joins_with_comma() {
        assert_eq!(
            metadata(&["french house", "electro"]).genre_tag(),
            "french house, electro"
        );
    }

    #[test]
    fn genre_tag_is_empty_without_genres() {
        assert_eq!(metadata(&[]).genre_tag(), "");
    }

    #[test]
    fn search_query_is_artist_dash_title() {
        assert_eq!(metadata(&[]).search_query(), "Daft Punk - Veridis Quo");
    }

    #[test]
    fn release_year_accepts_all_precisions() {
        assert_eq!(release_year("2001"), Some("2001".to_string()));
        assert_eq!(release_year("2001-03"), Some("2001".to_string()));
        assert_eq!(release_year("2001-03-12"), Some("2001".to_string()));
    }

    #[test]
    fn release_year_rejects_garbage() {
        assert_eq!(release_year(""), None);
        assert_eq!(release_year("20"), None);
        assert_eq!(release_year("0000-00-00").as_deref(), Some("0000"));
        assert_eq!(release_year("abcd-01-01"), None);
    }
}
