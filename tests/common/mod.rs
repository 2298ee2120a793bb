#![allow(dead_code)]

use std::{
    cell::RefCell,
    fmt,
    rc::Rc,
    sync::Arc,
};
use sudslib::{
    soap::{
        wsdl::{
            types::{Method, Port, Service, Style},
            SchemaLocations,
        },
        ClientOption, Element, Error, Fault, MessagePlugin, Options, Response,
    },
    ConstructOptions, KeywordError, LibraryOptions, ServiceProxy, SoapBackend, SudsLibrary,
};

/// Records every construction and hands out proxies with `services`
/// services of two methods each. URLs containing `fail` can't be loaded.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub services: usize,
    pub constructed: Rc<RefCell<Vec<(String, ConstructOptions)>>>,
}

pub struct FakeProxy {
    pub url: String,
    pub options: Options,
    pub services: Vec<Service>,
}

impl FakeBackend {
    pub fn with_services(services: usize) -> Self {
        Self {
            services,
            ..Default::default()
        }
    }
}

pub fn service(name: &str) -> Service {
    let method = |method: &str| Method {
        name: method.to_owned(),
        soap_action: format!("urn:fake/{}", method),
        style: Style::Document,
        input: None,
        namespace: "urn:fake".to_owned(),
        parameters: vec!["value".to_owned()],
        location: Some(format!("http://{}.example.com/", name.to_lowercase())),
    };

    Service {
        name: name.to_owned(),
        ports: vec![Port {
            name: format!("{}Soap", name),
            methods: vec![method("Ping"), method("Fail")],
        }],
    }
}

impl SoapBackend for FakeBackend {
    type Proxy = FakeProxy;

    fn construct(&self, url: &str, options: ConstructOptions) -> Result<FakeProxy, KeywordError> {
        self.constructed
            .borrow_mut()
            .push((url.to_owned(), options));

        if url.contains("fail") {
            return Err(KeywordError::NotFound(format!("can't load {}", url)));
        }

        Ok(FakeProxy {
            url: url.to_owned(),
            options: Options::default(),
            services: (0..self.services.max(1))
                .map(|index| service(&format!("Service{}", index)))
                .collect(),
        })
    }
}

impl fmt::Display for FakeProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeProxy({} services)", self.services.len())
    }
}

impl ServiceProxy for FakeProxy {
    fn wsdl_url(&self) -> String {
        self.url.clone()
    }

    fn options(&self) -> &Options {
        &self.options
    }

    fn set_option(&mut self, option: ClientOption) {
        self.options.apply(option);
    }

    fn services_mut(&mut self) -> &mut Vec<Service> {
        &mut self.services
    }

    fn add_plugin(&mut self, plugin: Arc<dyn MessagePlugin>) {
        self.options.plugins.push(plugin);
    }

    /// `Ping` echoes its argument, `Fail` raises a fault.
    fn invoke(&self, method: &str, args: &[String]) -> Result<Response, Error> {
        let sent = format!("<{}>{}</{}>", method, args.join(","), method);
        for plugin in &self.options.plugins {
            plugin.sending(sent.as_bytes());
        }

        let reply = match method {
            "Ping" => Element::new("PingResponse").with_text(args.join(",")),
            "Fail" => {
                let fault = Fault {
                    code: "soap:Server".to_owned(),
                    string: "Failed on purpose".to_owned(),
                    detail: None,
                };
                return if self.options.faults {
                    Err(Error::Fault(fault))
                } else {
                    Ok(Response::Fault(fault))
                };
            }
            other => return Err(Error::MethodNotFound(other.to_owned())),
        };

        let received = reply.to_string();
        for plugin in &self.options.plugins {
            plugin.received(received.as_bytes());
        }

        if self.options.retxml {
            Ok(Response::Xml(received))
        } else {
            Ok(Response::Body(Some(reply)))
        }
    }
}

pub fn library(backend: FakeBackend) -> SudsLibrary<FakeBackend> {
    SudsLibrary::with_backend(
        backend,
        LibraryOptions {
            timeout: None,
            schema_locations: SchemaLocations::new(),
        },
    )
}

pub fn data(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}
