//! Tagging: writes catalog metadata and the cover image into the final container

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    audio::{cover::HttpFetch, error::EmbedError, ffmpeg::Ffmpeg},
    domain::track::TrackMetadata,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedOutcome {
    Written(PathBuf),
    /// the output already existed and overwriting is disabled; nothing was touched
    Skipped(PathBuf),
}

impl EmbedOutcome {
    pub fn path(&self) -> &Path {
        match self {
            EmbedOutcome::Written(path) | EmbedOutcome::Skipped(path) => path,
        }
    }
}

pub struct Embedder<'a> {
    ffmpeg: &'a Ffmpeg,
    fetch: &'a dyn HttpFetch,
    /// where the cover and the unfinished mux are written; the caller removes it.
    /// Must be on the same filesystem as the output.
    scratch_dir: PathBuf,
    overwrite: bool,
}

fn metadata_arg(key: &str, value: &str) -> [OsString; 2] {
    ["-metadata".into(), format!("{key}={value}").into()]
}

/// `-metadata` pairs for the text tags.
///
/// ffmpeg drops a tag whose value is empty, so an empty genre list writes no
/// genre tag at all.
fn tag_args(metadata: &TrackMetadata) -> Vec<OsString> {
    let mut args = Vec::new();
    args.extend(metadata_arg("title", &metadata.title));
    args.extend(metadata_arg("artist", &metadata.artist));
    args.extend(metadata_arg("album", &metadata.album));
    args.extend(metadata_arg("date", &metadata.year));
    let genre = metadata.genre_tag();
    if !genre.is_empty() {
        args.extend(metadata_arg("genre", &genre));
    }
    args
}

impl<'a> Embedder<'a> {
    pub fn new(
        ffmpeg: &'a Ffmpeg,
        fetch: &'a dyn HttpFetch,
        scratch_dir: impl Into<PathBuf>,
        overwrite: bool,
    ) -> Self {
        Self {
            ffmpeg,
            fetch,
            scratch_dir: scratch_dir.into(),
            overwrite,
        }
    }

    /// Downloads the cover into the scratch dir and returns its path
    fn fetch_cover(&self, metadata: &TrackMetadata) -> Result<PathBuf, EmbedError> {
        let artwork = metadata.artwork.as_ref().ok_or(EmbedError::MissingArtwork)?;
        let image = self.fetch.get(&artwork.0)?;
        if image.bytes.is_empty() {
            return Err(EmbedError::EmptyCover(artwork.0.clone()));
        }

        let path = self.scratch_dir.join(format!("cover.{}", image.extension()));
        std::fs::write(&path, &image.bytes)?;
        Ok(path)
    }

    /// Muxes `audio` and the track's cover into `output` as FLAC with tags.
    pub fn embed(
        &self,
        audio: &Path,
        metadata: &TrackMetadata,
        output: &Path,
    ) -> Result<EmbedOutcome, EmbedError> {
        if output.exists() && !self.overwrite {
            info!(
                "{} already exists, leaving it untouched",
                output.to_string_lossy()
            );
            return Ok(EmbedOutcome::Skipped(output.to_path_buf()));
        }

        let cover = self.fetch_cover(metadata)?;
        info!("tagging {}", output.to_string_lossy());

        // muxed next to the cover first, so a failed run never leaves a file at `output`
        let staged = self.scratch_dir.join("tagged.flac");
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-i".into(),
            audio.into(),
            "-i".into(),
            cover.into(),
            "-map".into(),
            "0:a".into(),
            "-map".into(),
            "1:v".into(),
            "-c:a".into(),
            "flac".into(),
            "-c:v".into(),
            "copy".into(),
        ];
        args.extend(tag_args(metadata));
        args.extend([
            OsStr::new("-metadata:s:v").into(),
            OsStr::new("title=Album cover").into(),
            OsStr::new("-metadata:s:v").into(),
            OsStr::new("comment=Cover (front)").into(),
            OsStr::new("-disposition:v").into(),
            OsStr::new("attached_pic").into(),
            OsStr::new("-f").into(),
            OsStr::new("flac").into(),
            staged.as_os_str().to_os_string(),
        ]);

        self.ffmpeg.run(args)?;
        std::fs::rename(&staged, output)?;
        Ok(EmbedOutcome::Written(output.to_path_buf()))
    }
}
