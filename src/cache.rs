//! Registry of the clients a library has created.

use crate::error::KeywordError;

#[derive(Debug)]
pub struct ClientHandle<P> {
    index: usize,
    alias: Option<String>,
    proxy: P,
    logging_enabled: bool,
}

/// Clients are numbered from 1 in creation order and never removed.
#[derive(Debug)]
pub struct ClientCache<P> {
    handles: Vec<ClientHandle<P>>,
    current: Option<usize>,
}

impl<P> ClientHandle<P> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    pub fn proxy_mut(&mut self) -> &mut P {
        &mut self.proxy
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn set_logging_enabled(&mut self, enabled: bool) {
        self.logging_enabled = enabled;
    }
}

impl<P> ClientCache<P> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            current: None,
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Fails if `alias` is already bound. An empty alias counts as none.
    pub fn check_alias(&self, alias: Option<&str>) -> Result<(), KeywordError> {
        let alias = match alias.filter(|alias| !alias.is_empty()) {
            Some(alias) => alias,
            None => return Ok(()),
        };

        match self.find_alias(alias) {
            Some(existing) => Err(KeywordError::Configuration(format!(
                "Alias '{}' is already used by client {}.",
                alias, existing.index
            ))),
            None => Ok(()),
        }
    }

    /// Adds `proxy` as the current client and returns its index. An empty
    /// alias counts as none.
    pub fn register(&mut self, proxy: P, alias: Option<&str>) -> Result<usize, KeywordError> {
        self.check_alias(alias)?;
        let alias = alias.filter(|alias| !alias.is_empty());

        let index = self.handles.len() + 1;
        self.handles.push(ClientHandle {
            index,
            alias: alias.map(str::to_owned),
            proxy,
            logging_enabled: true,
        });
        self.current = Some(index - 1);

        Ok(index)
    }

    /// Makes the client with the given index or alias current. Strings of
    /// decimal digits are always indices.
    pub fn switch(&mut self, index_or_alias: &str) -> Result<&mut ClientHandle<P>, KeywordError> {
        let position = if is_index(index_or_alias) {
            index_or_alias
                .parse::<usize>()
                .ok()
                .filter(|index| (1..=self.handles.len()).contains(index))
                .map(|index| index - 1)
                .ok_or_else(|| {
                    KeywordError::Lookup(format!("Non-existing index '{}'.", index_or_alias))
                })?
        } else {
            self.handles
                .iter()
                .position(|handle| handle.alias.as_deref() == Some(index_or_alias))
                .ok_or_else(|| {
                    KeywordError::Lookup(format!("Non-existing alias '{}'.", index_or_alias))
                })?
        };

        self.current = Some(position);
        Ok(&mut self.handles[position])
    }

    pub fn current(&self) -> Result<&ClientHandle<P>, KeywordError> {
        self.current
            .and_then(|position| self.handles.get(position))
            .ok_or_else(no_client)
    }

    pub fn current_mut(&mut self) -> Result<&mut ClientHandle<P>, KeywordError> {
        match self.current {
            Some(position) => self.handles.get_mut(position).ok_or_else(no_client),
            None => Err(no_client()),
        }
    }

    fn find_alias(&self, alias: &str) -> Option<&ClientHandle<P>> {
        self.handles
            .iter()
            .find(|handle| handle.alias.as_deref() == Some(alias))
    }
}

impl<P> Default for ClientCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn is_index(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit())
}

fn no_client() -> KeywordError {
    KeywordError::State("No client created yet".to_owned())
}
