use std::{
    ffi::OsStr,
    path::PathBuf,
    process::{Command, Output},
};

use log::debug;

use crate::audio::error::FfmpegError;

/// lines of stderr kept in error messages
const STDERR_TAIL: usize = 12;

/// Runs the ffmpeg binary with quiet, non-interactive defaults
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs ffmpeg to completion, failing on a non-zero exit status.
    pub fn run<I, S>(&self, args: I) -> Result<Output, FfmpegError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command.args(["-hide_banner", "-nostdin", "-nostats"]).args(args);
        debug!("running {command:?}");

        let output = command.output().map_err(|source| FfmpegError::Spawn {
            program: self.program.to_string_lossy().to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(FfmpegError::Failed {
                status: output.status,
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }
        Ok(output)
    }

    /// true if the binary can be executed
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines = stderr.trim().lines().collect::<Vec<_>>();
    lines[lines.len().saturating_sub(STDERR_TAIL)..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr = (0..20).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let tail = stderr_tail(&stderr);
        assert_eq!(tail.lines().count(), STDERR_TAIL);
        assert!(tail.ends_with("19"));
        assert!(tail.starts_with("8"));
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg-binary");
        assert!(!ffmpeg.is_available());
        assert!(matches!(
            ffmpeg.run(["-version"]),
            Err(FfmpegError::Spawn { .. })
        ));
    }
}
