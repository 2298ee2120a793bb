//! A dynamic SOAP 1.1 client driven by a parsed WSDL definition.

use thiserror::Error;

pub mod client;
pub mod envelope;
pub mod options;
pub mod plugin;
pub mod transport;
pub mod xml;

pub use client::{Client, Response};
pub use envelope::Fault;
pub use options::{ClientOption, Options, Selector, SoapHeader};
pub use plugin::MessagePlugin;
pub use transport::{
    AlwaysSendTransport, Credentials, HttpAuthenticated, HttpTransport, Transport, TransportError,
};
pub use xml::Element;

#[cfg(feature = "ntlm")]
pub use transport::WindowsHttpAuthenticated;

pub use sudslib_wsdl as wsdl;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load WSDL")]
    Wsdl(#[from] sudslib_wsdl::error::Error),

    #[error("XML error")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server raised fault: {0}")]
    Fault(Fault),

    #[error("Service {0} not found")]
    ServiceNotFound(Selector),

    #[error("Port {0} not found")]
    PortNotFound(Selector),

    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    #[error("{method}() takes {expected} arguments but {given} were given")]
    TooManyArguments {
        method: String,
        expected: usize,
        given: usize,
    },

    #[error("No location defined for method '{0}'")]
    NoLocation(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),
}
