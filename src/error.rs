//! Error types for package reading, extraction and serialization

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Invalid .docx package: {0}")]
    MalformedPackage(String),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Main document part has no <w:body> element")]
    MissingBody,

    #[error("Table {0} not found in document body")]
    TableNotFound(usize),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Attribute error: {0}")]
    Attr(String),
}

impl From<quick_xml::events::attributes::AttrError> for SplitError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        SplitError::Attr(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
