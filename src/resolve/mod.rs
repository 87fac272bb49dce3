//! Track resolution cascade.
//!
//! Maps a text query to a single media URL by running an ordered list of
//! [`Tier`]s against a [`SearchProvider`]. Each tier rewrites the query and
//! decides which of its candidates, if any, is acceptable. The first accepted
//! candidate ends the cascade.

use log::{debug, info, warn};
use serde::Deserialize;

use crate::{
    domain::candidate::{ResolvedMatch, SearchCandidate},
    search::{QueryMode, SearchProvider},
};

pub mod error;

use error::ResolveError;

/// How a tier picks a candidate out of its search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    /// first candidate whose known duration is within tolerance of the reference
    WithinTolerance,
    /// first candidate, duration unchecked
    First,
}

impl Acceptance {
    fn select(
        self,
        candidates: Vec<SearchCandidate>,
        reference_seconds: i64,
        tolerance_seconds: u32,
    ) -> Option<SearchCandidate> {
        match self {
            Acceptance::WithinTolerance => candidates
                .into_iter()
                .find(|c| c.within_tolerance(reference_seconds, tolerance_seconds)),
            Acceptance::First => candidates.into_iter().next(),
        }
    }
}

/// One query strategy of the cascade
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tier {
    pub name: String,
    #[serde(default)]
    pub mode: QueryMode,
    /// term appended to the base query, if any
    #[serde(default)]
    pub suffix: Option<String>,
    pub accept: Acceptance,
}

impl Tier {
    pub fn new(name: &str, suffix: Option<&str>, accept: Acceptance) -> Self {
        Self {
            name: name.to_string(),
            mode: QueryMode::Videos,
            suffix: suffix.map(str::to_string),
            accept,
        }
    }

    pub fn query(&self, base: &str) -> String {
        match self.suffix.as_deref().map(str::trim) {
            Some(suffix) if !suffix.is_empty() => format!("{base} {suffix}"),
            _ => base.to_string(),
        }
    }

    /// plain, official audio, lyric video, then first plain result
    pub fn default_tiers() -> Vec<Tier> {
        vec![
            Tier::new("plain", None, Acceptance::WithinTolerance),
            Tier::new("official audio", Some("official audio"), Acceptance::WithinTolerance),
            Tier::new("lyrics", Some("lyrics"), Acceptance::WithinTolerance),
            Tier::new("fallback", None, Acceptance::First),
        ]
    }
}

pub struct Cascade<'a> {
    provider: &'a dyn SearchProvider,
    tiers: &'a [Tier],
}

impl<'a> Cascade<'a> {
    pub fn new(provider: &'a dyn SearchProvider, tiers: &'a [Tier]) -> Self {
        Self { provider, tiers }
    }

    /// Runs the tiers in order and returns the first accepted candidate.
    ///
    /// A failing provider call only empties its own tier. Fails with
    /// [`ResolveError::NotFound`] when no tier accepts anything.
    pub fn resolve(
        &self,
        query: &str,
        reference_duration_seconds: i64,
        tolerance_seconds: u32,
        max_candidates_per_tier: usize,
    ) -> Result<ResolvedMatch, ResolveError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolveError::InvalidInput("empty query".to_string()));
        }
        if reference_duration_seconds <= 0 {
            return Err(ResolveError::InvalidInput(format!(
                "reference duration must be positive, got {reference_duration_seconds}"
            )));
        }
        if max_candidates_per_tier == 0 {
            return Err(ResolveError::InvalidInput(
                "at least one candidate per tier is required".to_string(),
            ));
        }

        for (tier_index, tier) in self.tiers.iter().enumerate() {
            let tier_query = tier.query(query);
            debug!(
                "tier '{}' ({}): searching '{tier_query}'",
                tier.name, tier.mode
            );

            let candidates = match self
                .provider
                .search(tier.mode, &tier_query, max_candidates_per_tier)
            {
                Ok(mut candidates) => {
                    candidates.truncate(max_candidates_per_tier);
                    candidates
                }
                Err(e) => {
                    warn!("tier '{}' failed for '{tier_query}': {e}", tier.name);
                    Vec::new()
                }
            };

            let count = candidates.len();
            if let Some(candidate) =
                tier.accept
                    .select(candidates, reference_duration_seconds, tolerance_seconds)
            {
                info!(
                    "tier '{}' matched {} (duration {:?}s, reference {reference_duration_seconds}s)",
                    tier.name, candidate.url, candidate.duration_seconds
                );
                return Ok(ResolvedMatch {
                    candidate,
                    tier: tier.name.clone(),
                    tier_index,
                });
            }
            debug!("tier '{}': no acceptable candidate among {count}", tier.name);
        }

        Err(ResolveError::NotFound {
            query: query.to_string(),
            tiers: self.tiers.len(),
        })
    }
}
