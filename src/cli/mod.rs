use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::audio::{
    analyze::Analyzer, cover::UreqFetch, embed::EmbedOutcome, ffmpeg::Ffmpeg, inspect,
    normalize::Normalizer,
};
use crate::catalog::{CatalogDuration, spotify::SpotifyClient};
use crate::config::Config;
use crate::domain::loudness::LoudnessTarget;
use crate::pipeline::{Job, JobSettings, TrackRequest};
use crate::playlist;
use crate::search::ytdlp::YtDlp;

#[derive(Parser)]
#[command(name = "trackgrab")]
#[command(version = "0.1")]
#[command(about = "Fetch catalog tracks as loudness-normalized, tagged FLAC files")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "trackgrab.toml")]
    pub config: PathBuf,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append log records to this file instead of stderr
    #[arg(long, global = true, conflicts_with = "log_dir")]
    pub log_file: Option<PathBuf>,

    /// Write log records to a new timestamped file in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Catalog API client id, overrides the config file
    #[arg(long, env = "TRACKGRAB_CLIENT_ID", hide_env_values = true, global = true)]
    pub client_id: Option<String>,

    /// Catalog API client secret, overrides the config file
    #[arg(long, env = "TRACKGRAB_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, normalize and tag one track
    Fetch {
        /// Track URL, URI or id (free text with --search)
        track: String,
        /// Look the track up by free text
        #[arg(short, long)]
        search: bool,
        /// Replace an existing output file
        #[arg(long)]
        overwrite: bool,
    },
    /// Show which media URL a track resolves to
    Resolve {
        /// Track URL, URI or id (free text with --search)
        track: String,
        /// Look the track up by free text
        #[arg(short, long)]
        search: bool,
    },
    /// Measure the loudness of a local file
    Analyze { file: PathBuf },
    /// Normalize a local file to the streaming loudness target
    Normalize { file: PathBuf },
    /// Print the tags of a local file
    Inspect { file: PathBuf },
    /// Build an M3U playlist from an exported CSV
    Playlist {
        /// Exported playlist
        #[arg(long)]
        csv: PathBuf,
        /// Music library root
        #[arg(long)]
        music: PathBuf,
        /// Where to write the playlist
        #[arg(short, long, default_value = "playlist.m3u")]
        output: PathBuf,
    },
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter = if cli.verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter));

    let log_path = match (&cli.log_file, &cli.log_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log dir {}", dir.to_string_lossy()))?;
            Some(dir.join(log_file_name(chrono::Local::now())))
        }
        (None, None) => None,
    };

    if let Some(path) = log_path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.to_string_lossy()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn log_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("trackgrab-{}.log", now.format("%Y%m%d-%H%M%S"))
}

fn request(track: &str, search: bool) -> TrackRequest {
    if search {
        TrackRequest::Search(track.to_string())
    } else {
        TrackRequest::Reference(track.to_string())
    }
}

/// Collaborators shared by the commands that talk to the catalog
struct Services {
    catalog: SpotifyClient,
    provider: YtDlp,
    fetch: UreqFetch,
    ffmpeg: Ffmpeg,
}

impl Services {
    fn new(cli: &Cli, cfg: &Config) -> anyhow::Result<Self> {
        let client_id = cli.client_id.clone().or_else(|| cfg.catalog.client_id.clone());
        let client_secret = cli
            .client_secret
            .clone()
            .or_else(|| cfg.catalog.client_secret.clone());
        Ok(Self {
            catalog: SpotifyClient::new(client_id, client_secret)
                .context("Failed to set up catalog client")?,
            provider: YtDlp::new(&cfg.search.ytdlp_path),
            fetch: UreqFetch::new(),
            ffmpeg: Ffmpeg::new(&cfg.audio.ffmpeg_path),
        })
    }

    fn job<'a>(&'a self, settings: &'a JobSettings) -> Job<'a> {
        Job {
            catalog: &self.catalog,
            provider: &self.provider,
            fetch: &self.fetch,
            oracle: &CatalogDuration,
            ffmpeg: &self.ffmpeg,
            settings,
        }
    }
}

fn print_outcome(outcome: &EmbedOutcome) {
    let path = outcome.path().to_string_lossy();
    match outcome {
        EmbedOutcome::Written(_) => println!("Wrote {path}"),
        EmbedOutcome::Skipped(_) => {
            println!("Skipped, {path} already exists (use --overwrite to replace it)")
        }
    }
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.to_string_lossy()))?;
    let ffmpeg = Ffmpeg::new(&cfg.audio.ffmpeg_path);
    let target = LoudnessTarget::STREAMING;

    match &cli.command {
        Commands::Fetch {
            track,
            search,
            overwrite,
        } => {
            let services = Services::new(&cli, &cfg)?;
            if !services.ffmpeg.is_available() {
                bail!(
                    "ffmpeg not found at {}",
                    cfg.audio.ffmpeg_path.to_string_lossy()
                );
            }
            let mut settings = JobSettings::from_config(&cfg);
            settings.overwrite |= *overwrite;

            let report = services
                .job(&settings)
                .run(&request(track, *search))
                .map_err(|e| {
                    let stage = e.stage();
                    anyhow::Error::new(e)
                        .context(format!("Failed to fetch {track} ({stage} stage)"))
                })?;

            print_outcome(&report.outcome);
            println!(
                "  track:    {} ({}, {})",
                report.track.metadata.search_query(),
                report.track.metadata.album,
                report.track.metadata.year
            );
            if let Some(resolved) = &report.resolved {
                println!(
                    "  source:   {} (tier \"{}\", #{})",
                    resolved.url(),
                    resolved.tier,
                    resolved.tier_index + 1
                );
            }
            if let Some(loudness) = &report.loudness {
                println!("  measured: {loudness}");
            }
        }

        Commands::Resolve { track, search } => {
            let services = Services::new(&cli, &cfg)?;
            let settings = JobSettings::from_config(&cfg);
            let job = services.job(&settings);

            let found = job
                .lookup(&request(track, *search))
                .and_then(|t| job.resolve(&t).map(|m| (t, m)))
                .with_context(|| format!("Failed to resolve {track}"))?;
            let (track, resolved) = found;

            println!(
                "{} ({}s)",
                track.metadata.search_query(),
                track.duration_seconds
            );
            println!(
                "  {} (tier \"{}\", #{}, {})",
                resolved.url(),
                resolved.tier,
                resolved.tier_index + 1,
                resolved
                    .candidate
                    .duration_seconds
                    .map(|d| format!("{d}s"))
                    .unwrap_or_else(|| "unknown duration".to_string())
            );
        }

        Commands::Analyze { file } => {
            let measurement = Analyzer::new(&ffmpeg, target)
                .analyze(file)
                .with_context(|| format!("Failed to analyze {}", file.to_string_lossy()))?;
            println!("{measurement}");
        }

        Commands::Normalize { file } => {
            let output = normalize_file(&ffmpeg, target, cfg.audio.sample_rate, file)?;
            println!("Wrote {}", output.to_string_lossy());
        }

        Commands::Inspect { file } => {
            let tags = inspect::read_tags(file)
                .with_context(|| format!("Failed to read tags of {}", file.to_string_lossy()))?;
            println!("{tags}");
        }

        Commands::Playlist { csv, music, output } => {
            let report = playlist::build(csv, music).context("Failed to build playlist")?;
            playlist::write_m3u(&report.found, output).with_context(|| {
                format!("Failed to write playlist {}", output.to_string_lossy())
            })?;

            println!(
                "Playlist written to {} ({} tracks)",
                output.to_string_lossy(),
                report.found.len()
            );
            if !report.missing.is_empty() {
                println!("Not found in library ({}):", report.missing.len());
                for entry in &report.missing {
                    println!("    - {} by {}", entry.title, entry.artist);
                }
            }
        }
    }

    Ok(())
}

fn normalize_file(
    ffmpeg: &Ffmpeg,
    target: LoudnessTarget,
    sample_rate: u32,
    file: &Path,
) -> anyhow::Result<PathBuf> {
    let measurement = Analyzer::new(ffmpeg, target)
        .analyze(file)
        .with_context(|| format!("Failed to analyze {}", file.to_string_lossy()))?;
    Normalizer::new(ffmpeg, target, sample_rate)
        .normalize(file, measurement)
        .with_context(|| format!("Failed to normalize {}", file.to_string_lossy()))
}
