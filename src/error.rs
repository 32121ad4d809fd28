use thiserror::Error;

/// Failure of the page-fetching capability.
///
/// Distinct from "element absent": a missing locator match is never an error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("timed out after {waited_ms}ms waiting for `{locator}`")]
    WaitTimeout { locator: String, waited_ms: u64 },

    #[error("no page has been loaded yet")]
    NoPage,
}

/// Conditions that abort a whole run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("authentication failed, refusing to scrape")]
    AuthenticationFailed,

    #[error("no categories found on the bestseller landing page")]
    NoCategoriesFound,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid {field} selector: {reason}")]
    InvalidSelector { field: &'static str, reason: String },
}
