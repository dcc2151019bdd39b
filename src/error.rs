use std::io;
use thiserror::Error;

/// Enum for resource layer errors
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Session or channel setup failed before the target was resolved.
    /// Always fatal, nothing useful survives it
    #[error("connection: {0}")]
    Connection(String),
    /// A remote operation (create, delete, rename, stream open) failed
    #[error("remote operation: {0}")]
    Remote(String),
    /// A directory could not be listed, so its child cache cannot be
    /// rebuilt
    #[error("listing: {0}")]
    Listing(String),
    /// Key material referenced by the URI could not be found or read
    #[error("missing key material: {0}")]
    MissingKey(String),
    /// The URI cannot address a remote resource
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    /// Any errors related to I/O
    #[error("I/O: {0}")]
    IO(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

impl From<russh::Error> for Error {
    fn from(error: russh::Error) -> Self {
        Self::Connection(error.to_string())
    }
}

impl From<russh_keys::Error> for Error {
    fn from(error: russh_keys::Error) -> Self {
        Self::Connection(error.to_string())
    }
}

impl From<russh_sftp::client::error::Error> for Error {
    fn from(error: russh_sftp::client::error::Error) -> Self {
        Self::Remote(error.to_string())
    }
}
