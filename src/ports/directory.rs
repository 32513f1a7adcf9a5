use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::models::{DomainResponse, Service};

/// Error type for directory lookups
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DirectoryError {
    /// The adapter has no source configured for this directory
    #[error("Directory '{0}' is not configured")]
    NotConfigured(&'static str),

    /// Error when reading a local source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when the payload does not have the expected shape
    #[error("Malformed directory payload: {0}")]
    Decode(String),

    /// Error when the remote source cannot be reached
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    /// Error when the remote source answers with an error status
    #[error("Directory returned error status: {status}, url: {url}")]
    Status {
        /// The URL that was requested
        url: String,
        /// The status code returned
        status: u16,
    },
}

/// Result type for directory lookups
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// ServiceDirectory defines the port for listing backend services
#[async_trait]
pub trait ServiceDirectory: Send + Sync {
    /// Fetch every service that a route may target.
    async fn fetch_services(&self) -> DirectoryResult<Vec<Service>>;
}

/// DomainDirectory defines the port for listing configured domains
#[async_trait]
pub trait DomainDirectory: Send + Sync {
    /// Fetch every domain a route may bind to.
    async fn fetch_domains(&self) -> DirectoryResult<DomainResponse>;
}

/// Directories that can signal when their content may have changed.
pub trait DirectoryWatch: Send + Sync {
    /// Return a channel that signals when a directory changed.
    /// The receiver should trigger a re-fetch. Only the first call yields a receiver.
    fn watch(&self) -> Option<mpsc::Receiver<()>>;
}
