//! One download job: catalog lookup, resolution, download, two loudness passes, tagging.
//!
//! Every collaborator is injected; nothing here is process-global. Temporary
//! files live in a [`Workspace`] that is removed on every exit path.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    audio::{
        analyze::Analyzer,
        cover::HttpFetch,
        embed::{EmbedOutcome, Embedder},
        ffmpeg::Ffmpeg,
        normalize::Normalizer,
    },
    catalog::{CatalogClient, DurationOracle, error::CatalogError},
    config::Config,
    domain::{candidate::ResolvedMatch, loudness::LoudnessTarget, track::Track},
    resolve::{Cascade, Tier},
    sanitize,
    search::SearchProvider,
};

pub mod error;
pub mod workspace;

use error::PipelineError;
use workspace::Workspace;

/// How the user named the track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackRequest {
    /// catalog URL, URI or id
    Reference(String),
    /// free text, resolved through catalog search
    Search(String),
}

#[derive(Debug, Clone)]
pub struct JobSettings {
    pub tiers: Vec<Tier>,
    pub tolerance_seconds: u32,
    pub max_candidates: usize,
    pub sample_rate: u32,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl JobSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            tiers: cfg.search.tiers(),
            tolerance_seconds: cfg.search.tolerance_seconds,
            max_candidates: cfg.search.max_candidates,
            sample_rate: cfg.audio.sample_rate,
            output_dir: cfg.output.dir.clone(),
            overwrite: cfg.output.overwrite,
        }
    }
}

#[derive(Debug)]
pub struct JobReport {
    pub track: Track,
    /// `None` when the output already existed and the job was skipped
    pub resolved: Option<ResolvedMatch>,
    /// measured loudness of the download, for display
    pub loudness: Option<String>,
    pub outcome: EmbedOutcome,
}

pub struct Job<'a> {
    pub catalog: &'a dyn CatalogClient,
    pub provider: &'a dyn SearchProvider,
    pub fetch: &'a dyn HttpFetch,
    pub oracle: &'a dyn DurationOracle,
    pub ffmpeg: &'a Ffmpeg,
    pub settings: &'a JobSettings,
}

impl<'a> Job<'a> {
    /// Fetches the track and its artist's genres
    pub fn lookup(&self, request: &TrackRequest) -> Result<Track, PipelineError> {
        let id = match request {
            TrackRequest::Reference(reference) => self
                .catalog
                .parse_reference(reference)
                .map_err(PipelineError::InvalidInput)?,
            TrackRequest::Search(query) => {
                if query.trim().is_empty() {
                    return Err(PipelineError::InvalidInput(CatalogError::InvalidReference(
                        query.clone(),
                    )));
                }
                self.catalog
                    .search_track(query)
                    .map_err(PipelineError::Catalog)?
                    .ok_or_else(|| {
                        PipelineError::Catalog(CatalogError::TrackNotFound(query.clone()))
                    })?
            }
        };

        let mut track = self.catalog.track(&id).map_err(PipelineError::Catalog)?;
        track.metadata.genres = self
            .catalog
            .artist_genres(&track.artist_id)
            .map_err(PipelineError::Catalog)?;
        info!(
            "catalog: {} ({}, {}s)",
            track.metadata.search_query(),
            track.metadata.album,
            track.duration_seconds
        );
        Ok(track)
    }

    /// Maps the track to a media URL, using its catalog duration as reference
    pub fn resolve(&self, track: &Track) -> Result<ResolvedMatch, PipelineError> {
        let reference = self
            .oracle
            .reference_duration(track)
            .map_err(PipelineError::Resolve)?;
        Cascade::new(self.provider, &self.settings.tiers)
            .resolve(
                &track.metadata.search_query(),
                reference,
                self.settings.tolerance_seconds,
                self.settings.max_candidates,
            )
            .map_err(PipelineError::Resolve)
    }

    /// `<output_dir>/<artist> - <title>.flac`
    pub fn output_path(&self, track: &Track) -> PathBuf {
        let name = sanitize::file_name(&track.metadata.search_query());
        self.settings.output_dir.join(format!("{name}.flac"))
    }

    pub fn run(&self, request: &TrackRequest) -> Result<JobReport, PipelineError> {
        let track = self.lookup(request)?;
        let output = self.output_path(&track);

        if output.exists() && !self.settings.overwrite {
            info!(
                "{} already exists, skipping",
                output.to_string_lossy()
            );
            return Ok(JobReport {
                track,
                resolved: None,
                loudness: None,
                outcome: EmbedOutcome::Skipped(output),
            });
        }

        let resolved = self.resolve(&track)?;
        let workspace =
            Workspace::create(&self.settings.output_dir).map_err(PipelineError::Workspace)?;
        let (loudness, outcome) = self.process(&workspace, &resolved, &track, &output)?;

        if let Err(e) = workspace.close() {
            warn!("failed to remove working directory: {e}");
        }

        Ok(JobReport {
            track,
            resolved: Some(resolved),
            loudness: Some(loudness),
            outcome,
        })
    }

    /// download → analyze → normalize → embed, all temporaries inside `workspace`
    fn process(
        &self,
        workspace: &Workspace,
        resolved: &ResolvedMatch,
        track: &Track,
        output: &Path,
    ) -> Result<(String, EmbedOutcome), PipelineError> {
        let raw = workspace.raw_download();
        info!("downloading {}", resolved.url());
        self.provider
            .download(resolved.url(), &raw)
            .map_err(PipelineError::Download)?;

        let target = LoudnessTarget::STREAMING;
        let measurement = Analyzer::new(self.ffmpeg, target)
            .analyze(&raw)
            .map_err(PipelineError::Analysis)?;
        let loudness = measurement.to_string();

        let normalized = Normalizer::new(self.ffmpeg, target, self.settings.sample_rate)
            .normalize(&raw, measurement)
            .map_err(PipelineError::Normalization)?;

        let outcome = Embedder::new(
            self.ffmpeg,
            self.fetch,
            workspace.path(),
            self.settings.overwrite,
        )
        .embed(&normalized, &track.metadata, output)
        .map_err(PipelineError::Embed)?;

        Ok((loudness, outcome))
    }
}
