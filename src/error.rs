use thiserror::Error;

/// Failures while pulling the resource feed.
///
/// Every variant is recoverable: the fetcher moves on to the next endpoint and
/// the caller eventually falls back to the bundled snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no resource endpoints configured")]
    NoEndpoints,
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("could not decode resources from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("all resource endpoints failed")]
    AllEndpointsFailed,
}

/// Failures of the copy / download card actions. These are the only errors the
/// user gets to see, as a confirm prompt offering to open the link instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("invalid link: {0}")]
    InvalidLink(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Network(String),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("download failed: {0}")]
    Download(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("\"{name}\" is not a special tag (known: {known})")]
    UnknownSpecialTag { name: String, known: String },
    #[error("local storage unavailable")]
    Storage,
    #[error("invalid site config: {0}")]
    Parse(String),
}
