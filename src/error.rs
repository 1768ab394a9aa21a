//! Error types for the slidegen library.

use std::io;
use thiserror::Error;

/// Result type alias for slidegen operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading templates, assembling decks or
/// persisting generated files.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format could not be determined.
    #[error("Unknown file format")]
    UnknownFormat,

    /// The file is an Office document, but not a presentation.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Error reading or writing the ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing or rewriting XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the package.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required package part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// The requested template style is not one of the recognized names.
    #[error("Invalid template selected: {0}")]
    InvalidTemplate(String),

    /// The template has fewer slide layouts than the assembler needs.
    #[error("Template has no slide layout at index {0}")]
    MissingLayout(usize),

    /// A slide layout carries no title placeholder to receive the slide title.
    #[error("Slide layout '{0}' has no title placeholder")]
    MissingTitle(String),

    /// Deck construction steps were applied out of order.
    #[error("Assembly error: {0}")]
    Assembly(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl Error {
    /// Whether the error was caused by the caller's input rather than by the
    /// server or the template files.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidTemplate(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format");

        let err = Error::InvalidTemplate("sepia".to_string());
        assert_eq!(err.to_string(), "Invalid template selected: sepia");

        let err = Error::MissingLayout(1);
        assert_eq!(err.to_string(), "Template has no slide layout at index 1");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::InvalidTemplate("x".into()).is_client_error());
        assert!(!Error::Assembly("x".into()).is_client_error());
    }
}
