use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FfmpegError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("cannot analyze {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("analysis produced no loudness report")]
    MissingReport,

    #[error("malformed loudness report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("loudness report field {field} has unusable value '{value}'")]
    Value { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("normalization wrote no audio to {0}")]
    EmptyOutput(PathBuf),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("GET {url} returned more than {limit} bytes")]
    TooLarge { url: String, limit: u64 },
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("track has no cover image")]
    MissingArtwork,

    #[error("cover fetch failed: {0}")]
    CoverFetch(#[from] FetchError),

    #[error("cover image at {0} is empty")]
    EmptyCover(String),

    #[error("filesystem error while tagging: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),
}
