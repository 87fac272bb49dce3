//! Builds an M3U playlist from an exported CSV by matching titles against local files

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use walkdir::WalkDir;

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg", "opus", "aac"];

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("music directory {0} does not exist")]
    MusicDir(PathBuf),
}

/// One row of the export, as written by Exportify
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaylistEntry {
    #[serde(rename = "Track Name")]
    pub title: String,
    #[serde(rename = "Artist Name(s)")]
    pub artist: String,
}

#[derive(Debug, Default)]
pub struct PlaylistReport {
    pub found: Vec<PathBuf>,
    pub missing: Vec<PlaylistEntry>,
}

pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn read_entries(csv_path: &Path) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    Ok(reader
        .deserialize::<PlaylistEntry>()
        .collect::<Result<Vec<_>, _>>()?)
}

/// Recursively lists music files under `root`, in a stable order
pub fn scan_music(root: &Path) -> Result<Vec<PathBuf>, PlaylistError> {
    if !root.is_dir() {
        return Err(PlaylistError::MusicDir(root.to_path_buf()));
    }
    let root_str = root.to_string_lossy();

    Ok(WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning dir {root_str}, skipping an entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| is_music_file(p))
        .collect())
}

/// First file whose name contains `title`, ignoring case
pub fn find_song<'a>(title: &str, files: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let title = title.trim().to_lowercase();
    if title.is_empty() {
        return None;
    }
    files.iter().find(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().contains(&title))
            .unwrap_or(false)
    })
}

pub fn build(csv_path: &Path, music_dir: &Path) -> Result<PlaylistReport, PlaylistError> {
    let entries = read_entries(csv_path)?;
    let files = scan_music(music_dir)?;
    log::info!(
        "matching {} playlist entries against {} files",
        entries.len(),
        files.len()
    );

    let mut report = PlaylistReport::default();
    for entry in entries {
        match find_song(&entry.title, &files) {
            Some(path) => report.found.push(path.clone()),
            None => report.missing.push(entry),
        }
    }
    Ok(report)
}

pub fn write_m3u(paths: &[PathBuf], output: &Path) -> Result<(), PlaylistError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::io::BufWriter::new(std::fs::File::create(output)?);
    for path in paths {
        writeln!(file, "{}", path.to_string_lossy())?;
    }
    file.flush()?;
    Ok(())
}
