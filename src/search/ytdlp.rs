//! Video host access through the `yt-dlp` command line tool

use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
};

use log::{debug, warn};
use serde::Deserialize;

use crate::{
    domain::candidate::SearchCandidate,
    search::{QueryMode, SearchProvider, error::SearchError},
};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const MUSIC_SEARCH_URL: &str = "https://music.youtube.com/search?q=";

pub struct YtDlp {
    program: PathBuf,
}

/// One line of `--flat-playlist --dump-json` output
#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
}

impl FlatEntry {
    fn into_candidate(self) -> Option<SearchCandidate> {
        let url = self
            .webpage_url
            .or(self.url)
            .or_else(|| self.id.map(|id| format!("{WATCH_URL}{id}")))?;
        let duration = self
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as i64);
        Some(SearchCandidate::new(url, duration))
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn search_target(mode: QueryMode, query: &str, limit: usize) -> String {
        match mode {
            QueryMode::Videos => format!("ytsearch{limit}:{query}"),
            QueryMode::Songs => format!("{MUSIC_SEARCH_URL}{}", urlencoding::encode(query)),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Output, SearchError> {
        let program = self.program.to_string_lossy().to_string();
        debug!("running {program} {}", args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|source| SearchError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SearchError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

/// Parses newline-delimited JSON entries, skipping lines that are not usable candidates
pub(crate) fn parse_search_output(stdout: &str) -> Vec<SearchCandidate> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<FlatEntry>(line) {
            Ok(entry) => entry.into_candidate(),
            Err(e) => {
                warn!("skipping unparseable search result line: {e}");
                None
            }
        })
        .collect()
}

impl SearchProvider for YtDlp {
    fn search(
        &self,
        mode: QueryMode,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let target = Self::search_target(mode, query, limit);
        let playlist_end = limit.to_string();
        let output = self.run(&[
            "--flat-playlist",
            "--dump-json",
            "--no-warnings",
            "--playlist-end",
            &playlist_end,
            &target,
        ])?;

        let mut candidates = parse_search_output(&String::from_utf8_lossy(&output.stdout));
        candidates.truncate(limit);
        Ok(candidates)
    }

    fn download(&self, url: &str, destination: &Path) -> Result<(), SearchError> {
        let destination_str = destination.to_string_lossy();
        self.run(&[
            "--format",
            "bestaudio/best",
            "--no-playlist",
            "--no-part",
            "--quiet",
            "--no-warnings",
            "--force-overwrites",
            "--output",
            &destination_str,
            url,
        ])?;

        let len = std::fs::metadata(destination).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(SearchError::EmptyDownload(destination.to_path_buf()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_playlist_lines() {
        let stdout = r#"{"_type": "url", "id": "aaa", "url": "https://www.youtube.com/watch?v=aaa", "duration": 211.0, "title": "A"}
{"_type": "url", "id": "bbb", "url": "https://www.youtube.com/watch?v=bbb", "duration": 194.6}
"#;
        let candidates = parse_search_output(stdout);
        assert_eq!(
            candidates,
            vec![
                SearchCandidate::new("https://www.youtube.com/watch?v=aaa", Some(211)),
                SearchCandidate::new("https://www.youtube.com/watch?v=bbb", Some(195)),
            ]
        );
    }

    #[test]
    fn missing_duration_stays_absent() {
        let stdout = r#"{"id": "live", "url": "https://www.youtube.com/watch?v=live", "duration": null}"#;
        assert_eq!(
            parse_search_output(stdout),
            vec![SearchCandidate::new("https://www.youtube.com/watch?v=live", None)]
        );
    }

    #[test]
    fn builds_url_from_id_when_url_missing() {
        let stdout = r#"{"id": "xyz", "duration": 10}"#;
        assert_eq!(
            parse_search_output(stdout),
            vec![SearchCandidate::new("https://www.youtube.com/watch?v=xyz", Some(10))]
        );
    }

    #[test]
    fn skips_garbage_and_entries_without_any_url() {
        let stdout = "WARNING: something\n{\"duration\": 5}\n{\"id\": \"ok\"}\n";
        assert_eq!(
            parse_search_output(stdout),
            vec![SearchCandidate::new("https://www.youtube.com/watch?v=ok", None)]
        );
    }

    #[test]
    fn search_target_per_mode() {
        assert_eq!(
            YtDlp::search_target(QueryMode::Videos, "a b", 5),
            "ytsearch5:a b"
        );
        assert_eq!(
            YtDlp::search_target(QueryMode::Songs, "a b", 5),
            "https://music.youtube.com/search?q=a%20b"
        );
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let provider = YtDlp::new("/nonexistent/yt-dlp-binary");
        let err = provider
            .search(QueryMode::Videos, "anything", 3)
            .unwrap_err();
        assert!(matches!(err, SearchError::Spawn { .. }));
    }
}
