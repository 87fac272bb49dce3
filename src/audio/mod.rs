//! ffmpeg-backed audio stages: loudness analysis, loudness correction, tagging

pub mod analyze;
pub mod cover;
pub mod embed;
pub mod error;
pub mod ffmpeg;
pub mod inspect;
pub mod normalize;
