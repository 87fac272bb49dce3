//! Spotify Web API client, client-credentials flow

use std::{
    cell::RefCell,
    time::{Duration, Instant},
};

use log::debug;
use serde::Deserialize;

use crate::{
    catalog::{CatalogClient, error::CatalogError},
    domain::track::{ArtworkRef, Track, TrackId, TrackMetadata, release_year},
};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_URL: &str = "https://api.spotify.com/v1";
const ID_LEN: usize = 22;
/// refresh the token this long before the catalog says it expires
const TOKEN_SLACK: Duration = Duration::from_secs(30);

pub struct SpotifyClient {
    agent: ureq::Agent,
    client_id: String,
    client_secret: String,
    token: RefCell<Option<AccessToken>>,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    id: String,
    name: String,
    duration_ms: i64,
    artists: Vec<ArtistRef>,
    album: AlbumResponse,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumResponse {
    name: String,
    release_date: String,
    #[serde(default)]
    images: Vec<ImageResponse>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    url: String,
    width: Option<u32>,
}

#[derive(Deserialize)]
struct ArtistResponse {
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Deserialize)]
struct SearchPage {
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: String,
}

impl TrackResponse {
    fn into_track(self) -> Result<Track, CatalogError> {
        let missing = |field| CatalogError::MissingField {
            track: self.id.clone(),
            field,
        };

        let artist = self.artists.first().ok_or_else(|| missing("artist"))?;
        let year = release_year(&self.album.release_date).ok_or_else(|| missing("release year"))?;
        let artwork = self
            .album
            .images
            .iter()
            .max_by_key(|image| image.width.unwrap_or(0))
            .map(|image| ArtworkRef(image.url.clone()));

        Ok(Track {
            id: TrackId(self.id.clone()),
            artist_id: artist.id.clone(),
            metadata: TrackMetadata {
                artist: artist.name.clone(),
                title: self.name.clone(),
                album: self.album.name.clone(),
                year,
                genres: Vec::new(),
                artwork,
            },
            duration_seconds: (self.duration_ms + 500) / 1000,
        })
    }
}

/// Accepts `https://open.spotify.com/track/<id>`, `spotify:track:<id>` or a bare id
pub fn parse_track_reference(reference: &str) -> Option<TrackId> {
    let reference = reference.trim();
    let id = if let Some(rest) = reference.strip_prefix("spotify:track:") {
        rest
    } else if reference.contains("open.spotify.com/") {
        let (_, rest) = reference.split_once("/track/")?;
        rest.split(['?', '#', '/']).next()?
    } else {
        reference
    };

    (id.len() == ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| TrackId(id.to_string()))
}

impl SpotifyClient {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Result<Self, CatalogError> {
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Ok(Self {
                    agent: ureq::AgentBuilder::new().build(),
                    client_id,
                    client_secret,
                    token: RefCell::new(None),
                })
            }
            _ => Err(CatalogError::MissingCredentials),
        }
    }

    fn access_token(&self) -> Result<String, CatalogError> {
        if let Some(token) = self.token.borrow().as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        debug!("requesting catalog access token");
        let response: TokenResponse = self
            .agent
            .post(TOKEN_URL)
            .send_form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])?
            .into_json()?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_SLACK);
        let value = response.access_token;
        *self.token.borrow_mut() = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    fn get(&self, path: &str) -> ureq::Request {
        self.agent.get(&format!("{API_URL}{path}"))
    }

    fn authorized(&self, request: ureq::Request) -> Result<ureq::Response, CatalogError> {
        let token = self.access_token()?;
        Ok(request
            .set("Authorization", &format!("Bearer {token}"))
            .call()?)
    }
}

impl CatalogClient for SpotifyClient {
    fn parse_reference(&self, reference: &str) -> Result<TrackId, CatalogError> {
        parse_track_reference(reference)
            .ok_or_else(|| CatalogError::InvalidReference(reference.to_string()))
    }

    fn track(&self, id: &TrackId) -> Result<Track, CatalogError> {
        debug!("fetching catalog track {id}");
        let response = match self.authorized(self.get(&format!("/tracks/{id}"))) {
            Ok(response) => response,
            Err(CatalogError::Http(err)) if matches!(*err, ureq::Error::Status(404, _)) => {
                return Err(CatalogError::TrackNotFound(id.to_string()));
            }
            Err(e) => return Err(e),
        };
        response.into_json::<TrackResponse>()?.into_track()
    }

    fn artist_genres(&self, artist_id: &str) -> Result<Vec<String>, CatalogError> {
        debug!("fetching genres of artist {artist_id}");
        let artist: ArtistResponse = self
            .authorized(self.get(&format!("/artists/{artist_id}")))?
            .into_json()?;
        Ok(artist.genres)
    }

    fn search_track(&self, query: &str) -> Result<Option<TrackId>, CatalogError> {
        debug!("searching catalog for '{query}'");
        let request = self
            .get("/search")
            .query("q", query)
            .query("type", "track")
            .query("limit", "1");
        let page: SearchResponse = self.authorized(request)?.into_json()?;
        Ok(page
            .tracks
            .items
            .into_iter()
            .next()
            .map(|item| TrackId(item.id)))
    }
}
