use super::{
    envelope::{read_reply, Envelope, Fault, ReplyBody},
    options::{ClientOption, Options, Selector},
    plugin::MessagePlugin,
    transport::Request,
    xml::Element,
    Error,
};

use indexmap::IndexMap;
use std::{fmt, sync::Arc};
use sudslib_wsdl::{
    types::{Definition, Method, Port, Service, Style},
    ParseOptions,
};

/// Prefix bound to the request namespace in outgoing bodies.
const PREFIX: &str = "ns0";

pub struct Client {
    wsdl: Definition,
    options: Options,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The reply envelope as received, when `retxml` is set.
    Xml(String),
    Body(Option<Element>),
    /// Returned instead of an error when `faults` is off.
    Fault(Fault),
}

impl Client {
    pub fn new<S: AsRef<str>>(url: S, parse_options: &ParseOptions<'_>) -> Result<Self, Error> {
        Ok(Self::from_definition(sudslib_wsdl::parse_with(
            url,
            parse_options,
        )?))
    }

    pub fn from_definition(wsdl: Definition) -> Self {
        Self {
            wsdl,
            options: Options::default(),
        }
    }

    pub fn wsdl(&self) -> &Definition {
        &self.wsdl
    }

    pub fn wsdl_mut(&mut self) -> &mut Definition {
        &mut self.wsdl
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_option(&mut self, option: ClientOption) {
        self.options.apply(option);
    }

    pub fn add_plugin(&mut self, plugin: Arc<dyn MessagePlugin>) {
        self.options.plugins.push(plugin);
    }

    /// The selected service, or the first one.
    pub fn service(&self) -> Result<&Service, Error> {
        let selector = self.options.service.clone().unwrap_or(Selector::Index(0));

        let service = match &selector {
            Selector::Index(index) => self.wsdl.services.get(*index),
            Selector::Name(name) => self.wsdl.services.iter().find(|s| &s.name == name),
        };

        service.ok_or(Error::ServiceNotFound(selector))
    }

    /// The selected port of the selected service, or its first one.
    pub fn port(&self) -> Result<&Port, Error> {
        let service = self.service()?;
        let selector = self.options.port.clone().unwrap_or(Selector::Index(0));

        let port = match &selector {
            Selector::Index(index) => service.ports.get(*index),
            Selector::Name(name) => service.ports.iter().find(|p| &p.name == name),
        };

        port.ok_or(Error::PortNotFound(selector))
    }

    pub fn method(&self, name: &str) -> Result<&Method, Error> {
        self.port()?
            .method(name)
            .ok_or_else(|| Error::MethodNotFound(name.to_owned()))
    }

    /// Calls `name` with positional arguments matched against the method's
    /// parameters in order.
    pub fn invoke(&self, name: &str, args: &[String]) -> Result<Response, Error> {
        let method = self.method(name)?;

        if args.len() > method.parameters.len() {
            return Err(Error::TooManyArguments {
                method: method.name.clone(),
                expected: method.parameters.len(),
                given: args.len(),
            });
        }

        let location = method
            .location
            .clone()
            .ok_or_else(|| Error::NoLocation(method.name.clone()))?;

        let message = Envelope::new(request_body(method, args))
            .with_headers(self.options.header_elements())
            .to_request()?;

        for plugin in &self.options.plugins {
            plugin.sending(&message);
        }

        let mut headers = IndexMap::new();
        headers.insert(
            "Content-Type".to_owned(),
            "text/xml; charset=utf-8".to_owned(),
        );
        headers.insert("SOAPAction".to_owned(), format!("\"{}\"", method.soap_action));
        headers.extend(self.options.headers.clone());

        tracing::debug!(method = %method.name, url = %location, "Invoking");

        let reply = self.options.transport.send(
            &Request {
                url: location,
                message,
                headers,
            },
            &self.options.transport_options(),
        )?;

        for plugin in &self.options.plugins {
            plugin.received(&reply.message);
        }

        if self.options.retxml {
            return Ok(Response::Xml(
                String::from_utf8_lossy(&reply.message).into_owned(),
            ));
        }

        match read_reply(&reply.message)? {
            ReplyBody::Body(body) => Ok(Response::Body(body)),
            ReplyBody::Fault(fault) if self.options.faults => Err(Error::Fault(fault)),
            ReplyBody::Fault(fault) => Ok(Response::Fault(fault)),
        }
    }
}

fn request_body(method: &Method, args: &[String]) -> Option<Element> {
    let (wrapper, namespace, qualified) = match (method.style, &method.input) {
        (Style::Document, Some(input)) => (input.name.as_str(), input.namespace.as_str(), true),
        (Style::Document, None) => return None,
        (Style::Rpc, _) => (method.name.as_str(), method.namespace.as_str(), false),
    };

    let mut body = Element::new(format!("{}:{}", PREFIX, wrapper))
        .with_attribute(format!("xmlns:{}", PREFIX), namespace);

    for (parameter, value) in method.parameters.iter().zip(args) {
        let name = if qualified {
            format!("{}:{}", PREFIX, parameter)
        } else {
            parameter.clone()
        };

        body = body.with_child(Element::new(name).with_text(value.as_str()));
    }

    Some(body)
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for service in &self.wsdl.services {
            writeln!(
                f,
                "Service ( {} ) tns=\"{}\"",
                service.name, self.wsdl.target_namespace
            )?;
            writeln!(f, "   Ports ({}):", service.ports.len())?;

            for port in &service.ports {
                writeln!(f, "      ({})", port.name)?;
                writeln!(f, "         Methods ({}):", port.methods.len())?;

                for method in &port.methods {
                    writeln!(
                        f,
                        "            {}({})",
                        method.name,
                        method.parameters.join(", ")
                    )?;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.wsdl.url.as_str())
            .field("options", &self.options)
            .finish()
    }
}
