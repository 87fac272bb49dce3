/// One search hit returned by the video host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub url: String,
    /// whole seconds; `None` when the host did not report a duration
    pub duration_seconds: Option<i64>,
}

impl SearchCandidate {
    pub fn new(url: impl Into<String>, duration_seconds: Option<i64>) -> Self {
        Self {
            url: url.into(),
            duration_seconds,
        }
    }

    /// true iff the duration is known and within `tolerance` of `reference`
    pub fn within_tolerance(&self, reference: i64, tolerance: u32) -> bool {
        self.duration_seconds
            .is_some_and(|d| (d - reference).abs() <= i64::from(tolerance))
    }
}

/// A candidate selected by the resolution cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatch {
    pub candidate: SearchCandidate,
    /// name of the tier that produced the match
    pub tier: String,
    /// position of that tier in the cascade, 0-based
    pub tier_index: usize,
}

impl ResolvedMatch {
    pub fn url(&self) -> &str {
        &self.candidate.url
    }
}
