use crate::{
    args::{parse_selector, to_bool},
    backend::{ServiceProxy, SoapBackend},
    error::KeywordError,
    value::Value,
    SudsLibrary,
};

use sudslib_soap::{ClientOption, Response, Selector};

fn into_value(response: Response) -> Option<Value> {
    match response {
        Response::Xml(xml) => Some(Value::Str(xml)),
        Response::Body(body) => body.map(Value::Xml),
        Response::Fault(fault) => Some(Value::Str(fault.to_string())),
    }
}

impl<B: SoapBackend> SudsLibrary<B> {
    /// Calls `name` on the current client with positional arguments.
    ///
    /// Returns the reply envelope as text when `Set Return Xml` is on, else
    /// the reply body element. A SOAP fault fails the call.
    pub fn call_soap_method<S: AsRef<str>>(
        &self,
        name: &str,
        args: &[S],
    ) -> Result<Option<Value>, KeywordError> {
        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_owned()).collect();
        let response = self.client()?.invoke(name, &args)?;
        Ok(into_value(response))
    }

    /// Like `Call Soap Method`, with the service and port given for this call
    /// only. `None` keeps the current selection.
    pub fn specific_soap_call<S: AsRef<str>>(
        &mut self,
        service: Option<&str>,
        port: Option<&str>,
        name: &str,
        args: &[S],
    ) -> Result<Option<Value>, KeywordError> {
        let service = service.map(parse_selector).transpose()?;
        let port = port.map(parse_selector).transpose()?;

        let client = self.client_mut()?;
        let options = client.options();
        let saved_service = options.service.clone().unwrap_or(Selector::Index(0));
        let saved_port = options.port.clone().unwrap_or(Selector::Index(0));

        if let Some(service) = service {
            client.set_option(ClientOption::Service(service));
        }
        if let Some(port) = port {
            client.set_option(ClientOption::Port(port));
        }

        let result = self.call_soap_method(name, args);

        let client = self.client_mut()?;
        client.set_option(ClientOption::Service(saved_service));
        client.set_option(ClientOption::Port(saved_port));

        result
    }

    /// Calls `name` and returns the fault message the server replies with.
    /// Fails if the call succeeds.
    pub fn call_soap_method_expecting_fault<S: AsRef<str>>(
        &mut self,
        name: &str,
        args: &[S],
    ) -> Result<Value, KeywordError> {
        let client = self.client_mut()?;
        let retxml = client.options().retxml;
        client.set_option(ClientOption::Faults(false));
        client.set_option(ClientOption::ReturnXml(false));

        let args: Vec<String> = args.iter().map(|arg| arg.as_ref().to_owned()).collect();
        let response = client.invoke(name, &args);

        client.set_option(ClientOption::Faults(true));
        client.set_option(ClientOption::ReturnXml(retxml));

        match response? {
            Response::Fault(fault) => {
                tracing::info!(code = %fault.code, "Server raised the expected fault");
                Ok(Value::Str(fault.string))
            }
            _ => Err(KeywordError::Assertion(
                "The server did not raise a fault.".to_owned(),
            )),
        }
    }

    /// Turns logging of sent and received envelopes on or off for the
    /// current client.
    pub fn set_soap_logging(&mut self, log: &str) -> Result<(), KeywordError> {
        let log = to_bool(log)?;
        self.cache.current_mut()?.set_logging_enabled(log);
        self.listener.set_active(log);
        Ok(())
    }

    /// The last envelope sent by any client of this library.
    pub fn get_last_sent(&self) -> Result<String, KeywordError> {
        self.listener
            .last_sent()
            .ok_or_else(|| KeywordError::State("No message sent yet".to_owned()))
    }

    /// The last reply received by any client of this library.
    pub fn get_last_received(&self) -> Result<String, KeywordError> {
        self.listener
            .last_received()
            .ok_or_else(|| KeywordError::State("No message received yet".to_owned()))
    }
}
