//! First loudness pass: measure without writing audio

use std::{ffi::OsStr, path::Path};

use log::{debug, info};
use serde::Deserialize;

use crate::{
    audio::{error::AnalysisError, ffmpeg::Ffmpeg},
    domain::loudness::{LoudnessMeasurement, LoudnessTarget},
};

pub struct Analyzer<'a> {
    ffmpeg: &'a Ffmpeg,
    target: LoudnessTarget,
}

/// `loudnorm` prints its figures as JSON strings, some builds as numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReportValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
struct LoudnormReport {
    input_i: ReportValue,
    input_tp: ReportValue,
    input_lra: ReportValue,
    input_thresh: ReportValue,
    target_offset: ReportValue,
}

impl ReportValue {
    fn finite(self, field: &'static str) -> Result<f64, AnalysisError> {
        let value = match self {
            ReportValue::Number(n) => n,
            ReportValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
                AnalysisError::Value {
                    field,
                    value: text.clone(),
                }
            })?,
        };
        if !value.is_finite() {
            return Err(AnalysisError::Value {
                field,
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}

/// log prefix of the line that precedes the report
const REPORT_MARKER: &str = "[Parsed_loudnorm_";

/// The report block: from the last line opening with `{` to the final `}`.
///
/// Scanning starts after the last loudnorm marker when there is one, so braces
/// in the input's metadata (printed earlier) are never picked up.
fn report_block(stderr: &str) -> Option<&str> {
    let tail = stderr
        .rfind(REPORT_MARKER)
        .map_or(stderr, |marker| &stderr[marker..]);

    let start = std::iter::once(0)
        .chain(tail.match_indices('\n').map(|(i, _)| i + 1))
        .filter_map(|line_start| {
            let line = &tail[line_start..];
            let indented = line.trim_start_matches([' ', '\t']);
            indented
                .starts_with('{')
                .then(|| line_start + line.len() - indented.len())
        })
        .max()?;
    let end = tail.rfind('}')?;
    (end > start).then(|| &tail[start..=end])
}

/// Extracts the loudness report from ffmpeg's log stream.
///
/// `loudnorm` has no dedicated output channel: the report is printed to stderr
/// among other log lines, see [`report_block`].
pub(crate) fn parse_report(stderr: &str) -> Result<LoudnessMeasurement, AnalysisError> {
    let block = report_block(stderr).ok_or(AnalysisError::MissingReport)?;
    let report: LoudnormReport = serde_json::from_str(block)?;
    Ok(LoudnessMeasurement {
        input_i: report.input_i.finite("input_i")?,
        input_tp: report.input_tp.finite("input_tp")?,
        input_lra: report.input_lra.finite("input_lra")?,
        input_thresh: report.input_thresh.finite("input_thresh")?,
        target_offset: report.target_offset.finite("target_offset")?,
    })
}

impl<'a> Analyzer<'a> {
    pub fn new(ffmpeg: &'a Ffmpeg, target: LoudnessTarget) -> Self {
        Self { ffmpeg, target }
    }

    pub fn analyze(&self, audio: &Path) -> Result<LoudnessMeasurement, AnalysisError> {
        let input_error = |reason: String| AnalysisError::Input {
            path: audio.to_path_buf(),
            reason,
        };
        let meta = std::fs::metadata(audio).map_err(|e| input_error(e.to_string()))?;
        if !meta.is_file() {
            return Err(input_error("not a regular file".to_string()));
        }
        if meta.len() == 0 {
            return Err(input_error("file is empty".to_string()));
        }

        info!("measuring loudness of {}", audio.to_string_lossy());
        let filter = format!("loudnorm={}:print_format=json", self.target.filter_args());
        let output = self.ffmpeg.run([
            OsStr::new("-i"),
            audio.as_os_str(),
            OsStr::new("-af"),
            OsStr::new(&filter),
            OsStr::new("-f"),
            OsStr::new("null"),
            OsStr::new("-"),
        ])?;

        let measurement = parse_report(&String::from_utf8_lossy(&output.stderr))?;
        debug!("measured {measurement}");
        Ok(measurement)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::audio::testing::{ffmpeg_or_skip, write_sine};

    const STDERR: &str = r#"Input #0, wav, from 'in.wav':
  Duration: 00:00:10.00, bitrate: 768 kb/s
  Stream #0:0: Audio: pcm_s16le ([1][0][0][0] / 0x0001), 48000 Hz, mono, s16, 768 kb/s
Stream mapping:
  Stream #0:0 -> #0:0 (pcm_s16le (native) -> pcm_s16le (native))
Output #0, null, to 'pipe:':
[Parsed_loudnorm_0 @ 0x55d5c8a0e1c0]
{
	"input_i" : "-9.03",
	"input_tp" : "-6.02",
	"input_lra" : "0.00",
	"input_thresh" : "-19.03",
	"output_i" : "-14.01",
	"output_tp" : "-11.03",
	"output_lra" : "0.00",
	"output_thresh" : "-24.01",
	"normalization_type" : "linear",
	"target_offset" : "0.01"
}
[out#0/null @ 0x55d5c8a11e40] video:0KiB audio:938KiB subtitle:0KiB
"#;

    #[test]
    fn parses_report_surrounded_by_log_noise() {
        let m = parse_report(STDERR).unwrap();
        assert_eq!(
            m,
            LoudnessMeasurement {
                input_i: -9.03,
                input_tp: -6.02,
                input_lra: 0.0,
                input_thresh: -19.03,
                target_offset: 0.01,
            }
        );
    }

    #[test]
    fn braces_in_input_metadata_are_ignored() {
        let stderr = STDERR.replace(
            "  Duration: 00:00:10.00",
            "  Metadata:\n    title           : Song {Live}\n    comment         : {\n  Duration: 00:00:10.00",
        );
        assert_eq!(parse_report(&stderr).unwrap().input_i, -9.03);
    }

    #[test]
    fn braces_in_metadata_without_marker_are_ignored() {
        let stderr = STDERR
            .replace("[Parsed_loudnorm_0 @ 0x55d5c8a0e1c0]\n", "")
            .replace(
                "  Duration: 00:00:10.00",
                "  Metadata:\n    title           : {Untitled} {Demo}\n  Duration: 00:00:10.00",
            );
        assert_eq!(parse_report(&stderr).unwrap().target_offset, 0.01);
    }

    #[test]
    fn accepts_numeric_values() {
        let stderr = r#"{"input_i": -20.5, "input_tp": -3, "input_lra": 6.1, "input_thresh": -31, "target_offset": 0.4}"#;
        assert_eq!(parse_report(stderr).unwrap().input_tp, -3.0);
    }

    #[test]
    fn missing_report_is_an_error() {
        assert!(matches!(
            parse_report("Stream mapping:\n no json here"),
            Err(AnalysisError::MissingReport)
        ));
        assert!(matches!(
            parse_report("} reversed {"),
            Err(AnalysisError::MissingReport)
        ));
    }

    #[test]
    fn truncated_report_is_an_error() {
        let truncated = &STDERR[..STDERR.find("\"target_offset\"").unwrap()];
        assert!(parse_report(truncated).is_err());
    }

    #[test]
    fn missing_field_is_an_error() {
        let stderr = r#"{"input_i": "-9", "input_tp": "-6", "input_lra": "0", "input_thresh": "-19"}"#;
        assert!(matches!(parse_report(stderr), Err(AnalysisError::Report(_))));
    }

    #[test]
    fn infinite_value_is_an_error() {
        let stderr = r#"{"input_i": "-inf", "input_tp": "-inf", "input_lra": "0.00", "input_thresh": "-70.00", "target_offset": "inf"}"#;
        assert!(matches!(
            parse_report(stderr),
            Err(AnalysisError::Value { field: "input_i", .. })
        ));
    }

    #[test]
    fn rejects_missing_and_empty_files_before_running() -> anyhow::Result<()> {
        let tmp = tempdir()?;
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg-binary");
        let analyzer = Analyzer::new(&ffmpeg, LoudnessTarget::STREAMING);

        let missing = tmp.path().join("missing.wav");
        assert!(matches!(
            analyzer.analyze(&missing),
            Err(AnalysisError::Input { .. })
        ));

        let empty = tmp.path().join("empty.webm");
        std::fs::write(&empty, b"")?;
        assert!(matches!(
            analyzer.analyze(&empty),
            Err(AnalysisError::Input { .. })
        ));
        Ok(())
    }

    #[test]
    fn unreadable_audio_fails_analysis() -> anyhow::Result<()> {
        let Some(ffmpeg) = ffmpeg_or_skip() else {
            return Ok(());
        };
        let tmp = tempdir()?;
        let garbage = tmp.path().join("garbage.wav");
        std::fs::write(&garbage, b"definitely not audio")?;

        let result = Analyzer::new(&ffmpeg, LoudnessTarget::STREAMING).analyze(&garbage);

        assert!(matches!(result, Err(AnalysisError::Ffmpeg(_))));
        Ok(())
    }

    #[test]
    fn measures_generated_sine() -> anyhow::Result<()> {
        let Some(ffmpeg) = ffmpeg_or_skip() else {
            return Ok(());
        };
        let tmp = tempdir()?;
        let input = tmp.path().join("sine.wav");
        write_sine(&ffmpeg, &input, 10, 0.5);

        let m = Analyzer::new(&ffmpeg, LoudnessTarget::STREAMING).analyze(&input)?;

        // full scale sine reads about -3 LUFS, half scale about -9
        assert!((m.input_i - -9.0).abs() < 1.5, "{m}");
        assert!(m.input_tp < -5.0, "{m}");
        Ok(())
    }
}
