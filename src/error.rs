//! Error types for each stage of a run.
//!
//! Only [`AuthError`] aborts the process. The other kinds are reported and
//! the run ends cleanly.

use std::path::PathBuf;
use thiserror::Error;

/// Token exchange, refresh or cache failure.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No cached token exists yet.
    #[error("no cached token at {0}")]
    NotFound(PathBuf),

    /// The cache file could not be read or written.
    #[error("failed to access token cache {path}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but is not a token.
    #[error("token cache {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The token endpoint rejected the grant.
    #[error("token endpoint rejected {grant} grant: {message}")]
    Exchange {
        grant: &'static str,
        message: String,
    },

    /// The OAuth client could not be built from configuration.
    #[error("invalid OAuth endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Reading the authorization code from the user failed.
    #[error("failed to read authorization code: {0}")]
    Prompt(#[source] std::io::Error),

    /// The user supplied an empty authorization code.
    #[error("authorization code was empty")]
    EmptyCode,
}

/// Failure listing activities.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Refused locally: the bearer token is past its expiry.
    #[error("access token expired at {0}; refusing to call the API")]
    ExpiredToken(i64),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status; the body is kept for reporting.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to parse activity list: {0}")]
    Parse(#[source] reqwest::Error),
}

/// Polyline could not be turned into a route.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The polyline decoded to zero coordinates.
    #[error("polyline contains no points")]
    Empty,

    /// Bad character, truncated value, missing longitude or out-of-range point.
    #[error("malformed polyline: {0}")]
    Malformed(String),
}

/// Failure updating the remote document.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The container marker is not in the document; nothing was written.
    #[error("marker {marker:?} not found in {path}; skipping publish")]
    MissingMarker { marker: String, path: String },

    /// The document changed since it was read.
    #[error("{path} changed since revision {sha}; update rejected")]
    Conflict { path: String, sha: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The contents response could not be decoded.
    #[error("unreadable document {path}: {message}")]
    Content { path: String, message: String },
}
