use crate::{
    args::to_bool,
    backend::{ConstructOptions, ServiceProxy, SoapBackend},
    error::KeywordError,
    SudsLibrary,
};

use std::{fmt::Write, path::Path, sync::Arc};
use sudslib_soap::ClientOption;
use sudslib_wsdl::{Import, ImportDoctor};
use url::Url;

/// Turns a WSDL location into a URL. Strings with a scheme longer than one
/// character are URLs already; anything else must be an existing file.
pub fn resolve_source(url_or_path: &str) -> Result<String, KeywordError> {
    if let Ok(url) = Url::parse(url_or_path) {
        if url.scheme().len() > 1 {
            return Ok(url_or_path.to_owned());
        }
    }

    let not_found = || KeywordError::NotFound(format!("File '{}' not found.", url_or_path));

    let path = Path::new(url_or_path);
    if !path.is_file() {
        return Err(not_found());
    }

    let path = path.canonicalize().map_err(|_| not_found())?;
    Url::from_file_path(path)
        .map(String::from)
        .map_err(|()| not_found())
}

fn describe_imports(imports: &[Import]) -> String {
    let mut message = String::from("Using Imports for ImportDoctor:");

    for import in imports {
        let _ = write!(
            message,
            "\n   Namespace: '{}' Location: '{}'",
            import.namespace,
            import.location.as_deref().unwrap_or("None")
        );

        for namespace in &import.filter {
            let _ = write!(message, "\n      Filtering for namespace '{}'", namespace);
        }
    }

    message
}

impl<B: SoapBackend> SudsLibrary<B> {
    /// Loads the WSDL at the given URL or path and makes a client for it the
    /// current one. Returns the client's index.
    ///
    /// Imports added with `Add Doctor Import` are applied to this client and
    /// forgotten once it is registered. A failed creation keeps them.
    pub fn create_client(
        &mut self,
        url_or_path: &str,
        alias: Option<&str>,
        autoblend: &str,
    ) -> Result<usize, KeywordError> {
        let url = resolve_source(url_or_path)?;
        let autoblend = to_bool(autoblend)?;
        self.cache.check_alias(alias)?;

        let doctor = if self.imports.is_empty() {
            None
        } else {
            tracing::info!("{}", describe_imports(&self.imports));
            Some(ImportDoctor::new(self.imports.clone()))
        };

        let proxy = self.backend.construct(
            &url,
            ConstructOptions {
                autoblend,
                doctor,
                locations: self.options.schema_locations.clone(),
                timeout: self.options.timeout,
            },
        )?;

        let index = self.add_client(proxy, alias)?;
        self.imports.clear();
        Ok(index)
    }

    /// Registers an already constructed proxy as the current client.
    pub fn add_client(
        &mut self,
        mut proxy: B::Proxy,
        alias: Option<&str>,
    ) -> Result<usize, KeywordError> {
        self.cache.check_alias(alias)?;

        proxy.add_plugin(self.listener.clone());
        proxy.set_option(ClientOption::Faults(true));

        tracing::info!("Using WSDL at {}\n{}", proxy.wsdl_url(), proxy);

        let index = self.cache.register(proxy, alias)?;
        self.listener.set_active(true);
        Ok(index)
    }

    /// Makes the client with the given index or alias current. Strings of
    /// digits are always treated as indices.
    pub fn switch_client(&mut self, index_or_alias: &str) -> Result<(), KeywordError> {
        let handle = self.cache.switch(index_or_alias)?;
        self.listener.set_active(handle.logging_enabled());

        tracing::debug!(index = handle.index(), "Switched client");
        Ok(())
    }
}
