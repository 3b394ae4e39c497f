//! Custom error types and result handling for Tsuzuri operations.
//!
//! Every fallible operation returns a [`Result<T>`], a type alias for
//! `std::result::Result<T, Error>`. Errors raised while processing a single
//! title unit are caught by the batch orchestrator and recorded in the unit's
//! report; only pre-flight failures escape [`crate::ConverterConfig::run`].
//!
use std::path::PathBuf;

/// Type alias for Results with Tsuzuri errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all Tsuzuri operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// ComicInfo.xml serialization errors
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    /// Background task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::converter::ConverterConfigBuilderError),
    /// The given path exists but cannot be used for the requested role
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// A required file or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
