use std::{fmt::Display, path::Path};

use serde::Deserialize;

use crate::domain::candidate::SearchCandidate;

pub mod error;
pub mod ytdlp;

/// Which index of the video host a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// general video search
    #[default]
    Videos,
    /// music-only index, returns song uploads
    Songs,
}

impl Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryMode::Videos => write!(f, "videos"),
            QueryMode::Songs => write!(f, "songs"),
        }
    }
}

/// Capability to search the video host and download audio from it
pub trait SearchProvider {
    /// Returns up to `limit` candidates in the host's ranking order.
    fn search(
        &self,
        mode: QueryMode,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchCandidate>, error::SearchError>;

    /// Downloads the best audio stream of `url` to `destination`.
    ///
    /// The container at `destination` is whatever the host serves (webm/opus, m4a, ...).
    fn download(&self, url: &str, destination: &Path) -> Result<(), error::SearchError>;
}

/// Scripted provider for tests: answers searches from a queue and records every call
#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::RefCell, collections::VecDeque, path::Path};

    use super::{QueryMode, SearchProvider, error::SearchError};
    use crate::domain::candidate::SearchCandidate;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SearchCall {
        pub mode: QueryMode,
        pub query: String,
        pub limit: usize,
    }

    #[derive(Default)]
    pub struct ScriptedProvider {
        responses: RefCell<VecDeque<Result<Vec<SearchCandidate>, SearchError>>>,
        pub calls: RefCell<Vec<SearchCall>>,
        pub downloads: RefCell<Vec<String>>,
        /// bytes written by `download`
        pub audio: Vec<u8>,
    }

    /// candidates with the given durations, urls `u0`, `u1`, ...
    pub fn candidates(durations: &[Option<i64>]) -> Vec<SearchCandidate> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| SearchCandidate::new(format!("u{i}"), *d))
            .collect()
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn then(self, response: Vec<SearchCandidate>) -> Self {
            self.responses.borrow_mut().push_back(Ok(response));
            self
        }

        pub fn then_fail(self) -> Self {
            self.responses
                .borrow_mut()
                .push_back(Err(SearchError::Fs(std::io::Error::other("network down"))));
            self
        }

        pub fn queries(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|c| c.query.clone()).collect()
        }
    }

    impl SearchProvider for ScriptedProvider {
        fn search(
            &self,
            mode: QueryMode,
            query: &str,
            limit: usize,
        ) -> Result<Vec<SearchCandidate>, SearchError> {
            self.calls.borrow_mut().push(SearchCall {
                mode,
                query: query.to_string(),
                limit,
            });
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn download(&self, url: &str, destination: &Path) -> Result<(), SearchError> {
            self.downloads.borrow_mut().push(url.to_string());
            std::fs::write(destination, &self.audio)?;
            Ok(())
        }
    }
}
