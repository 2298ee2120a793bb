use crate::{
    args::{parse_index, parse_selector, to_bool, to_pairs, AuthType, HeaderArgs},
    backend::{ServiceProxy, SoapBackend},
    error::KeywordError,
    value::Value,
    SudsLibrary,
};

use std::sync::Arc;
use sudslib_soap::{
    AlwaysSendTransport, ClientOption, Credentials, Element, HttpAuthenticated, SoapHeader,
    Transport,
};
use sudslib_wsdl::Import;

impl<B: SoapBackend> SudsLibrary<B> {
    /// Uses the given service, by name or index, in future calls.
    pub fn set_service(&mut self, service: &str) -> Result<(), KeywordError> {
        let selector = parse_selector(service)?;
        self.client_mut()?.set_option(ClientOption::Service(selector));
        Ok(())
    }

    /// Uses the given port, by name or index, in future calls.
    pub fn set_port(&mut self, port: &str) -> Result<(), KeywordError> {
        let selector = parse_selector(port)?;
        self.client_mut()?.set_option(ClientOption::Port(selector));
        Ok(())
    }

    /// Sets HTTP proxies from `protocol, url` pairs.
    pub fn set_proxies<S: AsRef<str>>(&mut self, protocol_url_pairs: &[S]) -> Result<(), KeywordError> {
        let client = self.client_mut()?;
        let proxy = to_pairs(protocol_url_pairs, "protocol-url")?;
        client.set_option(ClientOption::Proxy(proxy));
        Ok(())
    }

    /// Sets extra HTTP headers from a single dictionary or `name, value`
    /// pairs.
    pub fn set_headers(&mut self, args: &[Value]) -> Result<(), KeywordError> {
        let client = self.client_mut()?;
        let headers = HeaderArgs::parse(args)?.into_headers();
        client.set_option(ClientOption::Headers(headers));
        Ok(())
    }

    /// Sets the SOAP headers sent with every future call. Dictionaries
    /// become one header element per entry; strings must hold an XML
    /// element.
    pub fn set_soap_headers(&mut self, headers: &[Value]) -> Result<(), KeywordError> {
        let client = self.client_mut()?;

        let headers = headers
            .iter()
            .map(|header| match header {
                Value::Dict(fields) => Ok(SoapHeader::Fields(fields.clone())),
                Value::Xml(element) => Ok(SoapHeader::Element(element.clone())),
                Value::Str(xml) => Element::parse(xml.as_bytes())
                    .map(SoapHeader::Element)
                    .map_err(|err| {
                        KeywordError::Argument(format!("Invalid SOAP header '{}': {}", xml, err))
                    }),
                Value::None => Err(KeywordError::argument("SOAP header can't be None.")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        client.set_option(ClientOption::SoapHeaders(headers));
        Ok(())
    }

    /// Whether future calls return the reply envelope as text.
    pub fn set_return_xml(&mut self, return_xml: &str) -> Result<(), KeywordError> {
        let client = self.client_mut()?;
        client.set_option(ClientOption::ReturnXml(to_bool(return_xml)?));
        Ok(())
    }

    /// Installs a transport sending the given credentials. `auth_type` is
    /// `STANDARD`, `ALWAYS_SEND` or `NTLM`, in any case.
    pub fn set_http_authentication(
        &mut self,
        username: &str,
        password: &str,
        auth_type: &str,
    ) -> Result<(), KeywordError> {
        let client = self.client_mut()?;
        let credentials = Credentials::new(username, password);

        let transport: Arc<dyn Transport> = match auth_type.parse::<AuthType>()? {
            AuthType::Standard => Arc::new(HttpAuthenticated::new(credentials)),
            AuthType::AlwaysSend => Arc::new(AlwaysSendTransport::new(credentials)),
            AuthType::Ntlm => ntlm_transport(credentials)?,
        };

        tracing::debug!(transport = transport.name(), "Using HTTP authentication");
        client.set_option(ClientOption::Transport(transport));
        Ok(())
    }

    /// Overrides the endpoint of methods.
    ///
    /// With a single service the index is ignored. A negative index targets
    /// every service. Without `names` every method of the targeted services
    /// is changed.
    pub fn set_location<S: AsRef<str>>(
        &mut self,
        url: &str,
        service_index: &str,
        names: &[S],
    ) -> Result<(), KeywordError> {
        let services = self.client_mut()?.services_mut();
        let index = if services.len() == 1 {
            0
        } else {
            parse_index(service_index)?
        };

        let names: Vec<String> = names.iter().map(|name| name.as_ref().to_owned()).collect();
        let names = if names.is_empty() {
            None
        } else {
            Some(names.as_slice())
        };

        if index < 0 {
            for service in services.iter_mut() {
                service.set_location(url, names);
            }
            return Ok(());
        }

        let count = services.len();
        let service = usize::try_from(index)
            .ok()
            .and_then(|index| services.get_mut(index))
            .ok_or_else(|| {
                KeywordError::Lookup(format!(
                    "Service index {} out of range, {} services defined.",
                    index, count
                ))
            })?;

        service.set_location(url, names);
        Ok(())
    }

    /// Adds an import to apply to the next client created. An empty
    /// location counts as none.
    pub fn add_doctor_import<S: AsRef<str>>(
        &mut self,
        namespace: &str,
        location: Option<&str>,
        filters: &[S],
    ) {
        let location = location.filter(|location| !location.is_empty());
        let mut import = Import::new(namespace, location.map(str::to_owned));

        for filter in filters {
            import.add_filter(filter.as_ref());
        }

        self.imports.push(import);
    }

    /// Sets where the schema for `namespace` is loaded from when an import
    /// gives no location. Shared by every library using the same bindings.
    pub fn bind_schema_to_location(&self, namespace: &str, location: &str) {
        self.options.schema_locations.bind(namespace, location);
    }
}

#[cfg(feature = "ntlm")]
fn ntlm_transport(credentials: Credentials) -> Result<Arc<dyn Transport>, KeywordError> {
    Ok(Arc::new(sudslib_soap::WindowsHttpAuthenticated::new(
        credentials,
    )))
}

#[cfg(not(feature = "ntlm"))]
fn ntlm_transport(_credentials: Credentials) -> Result<Arc<dyn Transport>, KeywordError> {
    Err(KeywordError::Configuration(
        "NTLM authentication requires the 'ntlm' feature.".to_owned(),
    ))
}
