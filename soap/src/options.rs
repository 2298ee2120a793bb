use super::{
    plugin::MessagePlugin,
    transport::{HttpTransport, Transport, TransportOptions},
    xml::Element,
};

use indexmap::IndexMap;
use std::{fmt, sync::Arc, time::Duration};

/// Picks a service or port by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Index(usize),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapHeader {
    /// Written into the `Header` as is.
    Element(Element),
    /// Each entry becomes a `<name>value</name>` header element.
    Fields(IndexMap<String, String>),
}

#[derive(Debug, Clone)]
pub struct Options {
    pub service: Option<Selector>,
    pub port: Option<Selector>,
    pub proxy: IndexMap<String, String>,
    pub headers: IndexMap<String, String>,
    pub soapheaders: Vec<SoapHeader>,
    pub retxml: bool,
    pub faults: bool,
    pub timeout: Option<Duration>,
    pub transport: Arc<dyn Transport>,
    pub plugins: Vec<Arc<dyn MessagePlugin>>,
}

#[derive(Debug, Clone)]
pub enum ClientOption {
    Service(Selector),
    Port(Selector),
    Proxy(IndexMap<String, String>),
    Headers(IndexMap<String, String>),
    SoapHeaders(Vec<SoapHeader>),
    ReturnXml(bool),
    Faults(bool),
    Timeout(Option<Duration>),
    Transport(Arc<dyn Transport>),
}

impl Default for Options {
    fn default() -> Self {
        Self {
            service: None,
            port: None,
            proxy: IndexMap::new(),
            headers: IndexMap::new(),
            soapheaders: Vec::new(),
            retxml: false,
            faults: true,
            timeout: None,
            transport: Arc::new(HttpTransport),
            plugins: Vec::new(),
        }
    }
}

impl Options {
    pub fn apply(&mut self, option: ClientOption) {
        match option {
            ClientOption::Service(selector) => self.service = Some(selector),
            ClientOption::Port(selector) => self.port = Some(selector),
            ClientOption::Proxy(proxy) => self.proxy = proxy,
            ClientOption::Headers(headers) => self.headers = headers,
            ClientOption::SoapHeaders(headers) => self.soapheaders = headers,
            ClientOption::ReturnXml(retxml) => self.retxml = retxml,
            ClientOption::Faults(faults) => self.faults = faults,
            ClientOption::Timeout(timeout) => self.timeout = timeout,
            ClientOption::Transport(transport) => self.transport = transport,
        }
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            proxy: self.proxy.clone(),
            timeout: self.timeout,
        }
    }

    pub(crate) fn header_elements(&self) -> Vec<Element> {
        self.soapheaders
            .iter()
            .flat_map(|header| match header {
                SoapHeader::Element(element) => vec![element.clone()],
                SoapHeader::Fields(fields) => fields
                    .iter()
                    .map(|(name, value)| Element::new(name.as_str()).with_text(value.as_str()))
                    .collect(),
            })
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => write!(f, "'{}'", name),
        }
    }
}
