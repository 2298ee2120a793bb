use std::path::Path;
use url::Url;

mod parser;

pub mod doctor;
pub mod error;
pub mod locations;
pub mod types;

pub use doctor::{Doctor, Import, ImportDoctor};
pub use locations::SchemaLocations;

/// How a WSDL and the schemas it pulls in are loaded.
#[derive(Debug, Clone)]
pub struct ParseOptions<'a> {
    /// Make the schemas of the WSDL document import each other.
    pub autoblend: bool,
    pub doctor: Option<&'a dyn Doctor>,
    pub locations: SchemaLocations,
}

impl Default for ParseOptions<'_> {
    fn default() -> Self {
        Self {
            autoblend: false,
            doctor: None,
            locations: SchemaLocations::global(),
        }
    }
}

/// Turns a URL or a filesystem path into a URL.
pub fn to_url<S: AsRef<str>>(url: S) -> Result<Url, error::Error> {
    match Url::parse(url.as_ref()) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::from_file_path(
            Path::new(url.as_ref())
                .canonicalize()
                .map_err(|err| error::Error::PathConversionError(Some(err)))?,
        )
        .map_err(|()| error::Error::PathConversionError(None)),
        Err(err) => Err(err.into()),
    }
}

pub fn parse<S: AsRef<str>>(url: S) -> Result<types::Definition, error::Error> {
    parse_with(url, &ParseOptions::default())
}

pub fn parse_with<S: AsRef<str>>(
    url: S,
    options: &ParseOptions<'_>,
) -> Result<types::Definition, error::Error> {
    parser::parse(to_url(url)?, options)
}
