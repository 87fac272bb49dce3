//! Second loudness pass: linear correction from measured statistics

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use log::info;

use crate::{
    audio::{error::NormalizationError, ffmpeg::Ffmpeg},
    domain::loudness::{LoudnessMeasurement, LoudnessTarget},
};

pub struct Normalizer<'a> {
    ffmpeg: &'a Ffmpeg,
    target: LoudnessTarget,
    sample_rate: u32,
}

/// `loudnorm` filter for the correction pass, linear mode
pub fn correction_filter(target: &LoudnessTarget, measurement: &LoudnessMeasurement) -> String {
    format!(
        "loudnorm={}:{}:linear=true:print_format=summary",
        target.filter_args(),
        measurement.filter_args()
    )
}

/// `<dir>/<stem>.normalized.wav` next to the input
pub fn output_path(audio: &Path) -> PathBuf {
    let stem = audio
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "audio".to_string());
    audio.with_file_name(format!("{stem}.normalized.wav"))
}

impl<'a> Normalizer<'a> {
    pub fn new(ffmpeg: &'a Ffmpeg, target: LoudnessTarget, sample_rate: u32) -> Self {
        Self {
            ffmpeg,
            target,
            sample_rate,
        }
    }

    /// Writes the corrected audio to [`output_path`] and returns that path.
    ///
    /// Consumes the measurement: each analysis drives exactly one correction.
    pub fn normalize(
        &self,
        audio: &Path,
        measurement: LoudnessMeasurement,
    ) -> Result<PathBuf, NormalizationError> {
        let output = output_path(audio);
        self.normalize_to(audio, measurement, &output)?;
        Ok(output)
    }

    /// Like [`Normalizer::normalize`], to an explicit 24-bit PCM WAV path.
    pub fn normalize_to(
        &self,
        audio: &Path,
        measurement: LoudnessMeasurement,
        output: &Path,
    ) -> Result<(), NormalizationError> {
        info!(
            "normalizing {} (measured {measurement})",
            audio.to_string_lossy()
        );
        let filter = correction_filter(&self.target, &measurement);
        let sample_rate = self.sample_rate.to_string();

        self.ffmpeg.run([
            OsStr::new("-y"),
            OsStr::new("-i"),
            audio.as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-af"),
            OsStr::new(&filter),
            OsStr::new("-ar"),
            OsStr::new(&sample_rate),
            OsStr::new("-c:a"),
            OsStr::new("pcm_s24le"),
            output.as_os_str(),
        ])?;

        let len = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(NormalizationError::EmptyOutput(output.to_path_buf()));
        }
        Ok(())
    }
}
