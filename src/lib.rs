//! Keywords for testing SOAP services from tabular test cases.
//!
//! A [`SudsLibrary`] keeps a registry of SOAP clients. `Create Client` adds
//! one and makes it current; the option keywords and `Call Soap Method` act
//! on the current client until `Switch Client` picks another.

use std::{sync::Arc, time::Duration};

mod calls;
mod management;
mod options;

pub mod args;
pub mod backend;
pub mod cache;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod value;

pub use backend::{ConstructOptions, ServiceProxy, SoapBackend, SudsBackend};
pub use error::KeywordError;
pub use management::resolve_source;
pub use value::Value;

pub use sudslib_soap as soap;
pub use sudslib_wsdl as wsdl;

use cache::{ClientCache, ClientHandle};
use listener::MessageListener;
use sudslib_wsdl::{Import, SchemaLocations};

/// How long a transport waits for a reply unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct LibraryOptions {
    /// Network timeout of the clients this library creates.
    pub timeout: Option<Duration>,
    /// Where location-less schema imports are looked up.
    pub schema_locations: SchemaLocations,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            schema_locations: SchemaLocations::global(),
        }
    }
}

pub struct SudsLibrary<B: SoapBackend = SudsBackend> {
    backend: B,
    options: LibraryOptions,
    cache: ClientCache<B::Proxy>,
    imports: Vec<Import>,
    listener: Arc<MessageListener>,
}

impl SudsLibrary<SudsBackend> {
    pub fn new() -> Self {
        Self::with_backend(SudsBackend, LibraryOptions::default())
    }
}

impl Default for SudsLibrary<SudsBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: SoapBackend> SudsLibrary<B> {
    pub fn with_backend(backend: B, options: LibraryOptions) -> Self {
        Self {
            backend,
            options,
            cache: ClientCache::new(),
            imports: Vec::new(),
            listener: Arc::new(MessageListener::new()),
        }
    }

    pub fn library_options(&self) -> &LibraryOptions {
        &self.options
    }

    /// The current client.
    pub fn current(&self) -> Result<&ClientHandle<B::Proxy>, KeywordError> {
        self.cache.current()
    }

    pub fn client(&self) -> Result<&B::Proxy, KeywordError> {
        Ok(self.cache.current()?.proxy())
    }

    pub(crate) fn client_mut(&mut self) -> Result<&mut B::Proxy, KeywordError> {
        Ok(self.cache.current_mut()?.proxy_mut())
    }

    pub fn client_count(&self) -> usize {
        self.cache.len()
    }

    /// Imports waiting for the next `Create Client`.
    pub fn pending_imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn listener(&self) -> &MessageListener {
        &self.listener
    }
}
