//! Cover image download

use std::io::Read;

use log::debug;

use crate::audio::error::FetchError;

/// covers larger than this are rejected
const MAX_BODY: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedImage {
    /// file extension matching the content type, `jpg` when unknown
    pub fn extension(&self) -> &'static str {
        let extensions = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .and_then(|mime| mime_guess::get_mime_extensions_str(mime.trim()))
            .unwrap_or(&[]);

        if extensions.contains(&"jpg") {
            "jpg"
        } else {
            extensions.first().copied().unwrap_or("jpg")
        }
    }
}

/// Plain binary GET
pub trait HttpFetch {
    fn get(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

pub struct UreqFetch {
    agent: ureq::Agent,
}

impl UreqFetch {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for UreqFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch for UreqFetch {
    fn get(&self, url: &str) -> Result<FetchedImage, FetchError> {
        debug!("GET {url}");
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            other => FetchError::Transport {
                url: url.to_string(),
                source: Box::new(other),
            },
        })?;

        if !(200..300).contains(&response.status()) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let content_type = response.header("Content-Type").map(str::to_string);
        let bytes = read_body(response.into_reader(), url, MAX_BODY)?;

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// Reads at most `limit` bytes; a longer body is an error, never a truncated image
fn read_body(reader: impl Read, url: &str, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }
    Ok(bytes)
}
