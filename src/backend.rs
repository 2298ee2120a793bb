//! The SOAP client capability the keywords are written against.

use crate::error::KeywordError;

use std::{fmt, sync::Arc, time::Duration};
use sudslib_soap::{
    wsdl::{types::Service, Doctor, ImportDoctor, ParseOptions, SchemaLocations},
    Client, ClientOption, MessagePlugin, Options, Response,
};

/// How a proxy should be built.
#[derive(Debug, Clone)]
pub struct ConstructOptions {
    pub autoblend: bool,
    pub doctor: Option<ImportDoctor>,
    pub locations: SchemaLocations,
    pub timeout: Option<Duration>,
}

pub trait SoapBackend {
    type Proxy: ServiceProxy;

    fn construct(&self, url: &str, options: ConstructOptions) -> Result<Self::Proxy, KeywordError>;
}

/// A callable client for one WSDL.
pub trait ServiceProxy: fmt::Display {
    fn wsdl_url(&self) -> String;

    fn options(&self) -> &Options;

    fn set_option(&mut self, option: ClientOption);

    fn services_mut(&mut self) -> &mut Vec<Service>;

    fn add_plugin(&mut self, plugin: Arc<dyn MessagePlugin>);

    fn invoke(&self, method: &str, args: &[String]) -> Result<Response, sudslib_soap::Error>;
}

/// Builds [`Client`]s from WSDL documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct SudsBackend;

impl SoapBackend for SudsBackend {
    type Proxy = Client;

    fn construct(&self, url: &str, options: ConstructOptions) -> Result<Client, KeywordError> {
        let parse_options = ParseOptions {
            autoblend: options.autoblend,
            doctor: options.doctor.as_ref().map(|doctor| doctor as &dyn Doctor),
            locations: options.locations,
        };

        let mut client = Client::new(url, &parse_options)?;
        client.set_option(ClientOption::Timeout(options.timeout));
        Ok(client)
    }
}

impl ServiceProxy for Client {
    fn wsdl_url(&self) -> String {
        self.wsdl().url.to_string()
    }

    fn options(&self) -> &Options {
        Client::options(self)
    }

    fn set_option(&mut self, option: ClientOption) {
        Client::set_option(self, option)
    }

    fn services_mut(&mut self) -> &mut Vec<Service> {
        &mut self.wsdl_mut().services
    }

    fn add_plugin(&mut self, plugin: Arc<dyn MessagePlugin>) {
        Client::add_plugin(self, plugin)
    }

    fn invoke(&self, method: &str, args: &[String]) -> Result<Response, sudslib_soap::Error> {
        Client::invoke(self, method, args)
    }
}
