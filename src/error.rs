//! Error types for the session-token run.
//!
//! Every variant is fatal: the run reports the error and stops. Nothing is
//! retried; OTP codes are single-use, and a blind retry would resubmit a
//! stale code.

use std::io;
use std::path::PathBuf;

use aws_smithy_types::date_time::DateTimeFormatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration problems, reported before any remote call is made.
    #[error("Specified credentials file is missing: {}", .0.display())]
    MissingCredentialsFile(PathBuf),

    #[error("Specified credentials file cannot be modified by current user: {}", .0.display())]
    UnwritableCredentialsFile(PathBuf),

    #[error("Specified AWS profile doesn't exist: {profile}")]
    UnknownProfile { profile: String },

    #[error("Profile {profile} is missing {key}")]
    MissingProfileKey { profile: String, key: &'static str },

    #[error("Failed to load credentials from {}: {message}", .path.display())]
    InvalidCredentialsFile { path: PathBuf, message: String },

    #[error("Profile and session profile must be different")]
    ProfileNameCollision,

    #[error("Either console output or a session profile is required")]
    MissingOutputTarget,

    #[error("Could not determine home directory")]
    NoHomeDirectory,

    // Remote identity-service failures, propagated with their source chain.
    #[error("Identity service request failed")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No credentials returned for the session request")]
    EmptySessionResponse,

    #[error("Invalid expiration timestamp in the session response")]
    ExpirationFormat(#[from] DateTimeFormatError),

    // File and prompt I/O.
    #[error("Failed to read credentials file {}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write credentials file {}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Wraps a remote-service failure without flattening its source chain.
    pub fn service<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Service(Box::new(source))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
