//! Unified error types for the armory scraper.
//!
//! Every failure carries a stable code prefix in its `Display` output and is
//! classified into the pipeline stage it came from, which is what the HTTP
//! layer uses to pick a status code.

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// The request itself was unusable (e.g. empty character name).
    Input,
    /// The page could not be loaded or rendered.
    Fetch,
    /// The page loaded but its content could not be extracted.
    Extract,
    /// The in-memory cache misbehaved.
    Cache,
}

/// Unified error types for the armory scraper.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty character name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A browser session could not be opened.
    #[error("BROWSER_LAUNCH_FAILED: {0}")]
    BrowserLaunch(String),

    /// Navigation or readiness wait exceeded its bound.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// The site served a bot-verification interstitial instead of content.
    #[error("CHALLENGE_DETECTED: {0}")]
    ChallengeDetected(String),

    /// Navigation failed for a reason other than a timeout.
    #[error("NAVIGATION_FAILED: {0}")]
    NavigationFailed(String),

    /// Content extraction failed after a successful fetch.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// Cache store failure.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),
}

impl Error {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> FailureStage {
        match self {
            Error::InvalidInput(_) => FailureStage::Input,
            Error::BrowserLaunch(_)
            | Error::FetchTimeout(_)
            | Error::ChallengeDetected(_)
            | Error::NavigationFailed(_) => FailureStage::Fetch,
            Error::ExtractFailed(_) => FailureStage::Extract,
            Error::Cache(_) => FailureStage::Cache,
        }
    }

    /// Human-readable reason without the code prefix.
    pub fn reason(&self) -> &str {
        match self {
            Error::InvalidInput(msg)
            | Error::BrowserLaunch(msg)
            | Error::FetchTimeout(msg)
            | Error::ChallengeDetected(msg)
            | Error::NavigationFailed(msg)
            | Error::ExtractFailed(msg)
            | Error::Cache(msg) => msg,
        }
    }
}
