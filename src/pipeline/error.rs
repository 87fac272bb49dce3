use std::fmt::Display;

use thiserror::Error;

use crate::{
    audio::error::{AnalysisError, EmbedError, NormalizationError},
    catalog::error::CatalogError,
    resolve::error::ResolveError,
    search::error::SearchError,
};

/// Pipeline step, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Input,
    Catalog,
    Resolve,
    Workspace,
    Download,
    Analysis,
    Normalization,
    Embed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Catalog => "catalog",
            Stage::Resolve => "resolve",
            Stage::Workspace => "workspace",
            Stage::Download => "download",
            Stage::Analysis => "analysis",
            Stage::Normalization => "normalization",
            Stage::Embed => "embed",
        };
        write!(f, "{name}")
    }
}

/// Failure of one job; the message names the stage, the source keeps the cause
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid track reference")]
    InvalidInput(#[source] CatalogError),

    #[error("catalog lookup failed")]
    Catalog(#[source] CatalogError),

    #[error("track resolution failed")]
    Resolve(#[source] ResolveError),

    #[error("could not prepare working directory")]
    Workspace(#[source] std::io::Error),

    #[error("download failed")]
    Download(#[source] SearchError),

    #[error("loudness analysis failed")]
    Analysis(#[source] AnalysisError),

    #[error("loudness normalization failed")]
    Normalization(#[source] NormalizationError),

    #[error("tagging failed")]
    Embed(#[source] EmbedError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidInput(_) => Stage::Input,
            PipelineError::Catalog(_) => Stage::Catalog,
            PipelineError::Resolve(_) => Stage::Resolve,
            PipelineError::Workspace(_) => Stage::Workspace,
            PipelineError::Download(_) => Stage::Download,
            PipelineError::Analysis(_) => Stage::Analysis,
            PipelineError::Normalization(_) => Stage::Normalization,
            PipelineError::Embed(_) => Stage::Embed,
        }
    }
}
