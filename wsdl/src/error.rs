use thiserror::Error;

use crate::types::QName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to open file")]
    FileOpenError(#[source] std::io::Error),

    #[error("Unable to get file from server")]
    ReqwestError(#[from] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input")]
    XmlParseError(#[from] quick_xml::Error),

    #[error("Unexpected root element '{0}'")]
    UnexpectedRoot(String),

    #[error("Element '{element}' is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("Namespace prefix '{0}' is not declared")]
    UnknownPrefix(String),

    #[error("Type not found: '{0}'")]
    TypeNotFound(QName),

    #[error("Unknown {kind} '{name}'")]
    UnknownReference { kind: &'static str, name: QName },
}
