use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, PoisonError,
};
use sudslib_soap::MessagePlugin;

/// Installed on every client a library creates. Remembers the last exchange
/// and logs it while active.
#[derive(Debug)]
pub struct MessageListener {
    active: AtomicBool,
    last_sent: Mutex<Option<String>>,
    last_received: Mutex<Option<String>>,
}

impl MessageListener {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
            last_sent: Mutex::new(None),
            last_received: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn last_sent(&self) -> Option<String> {
        self.last_sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_received(&self) -> Option<String> {
        self.last_received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MessageListener {
    fn default() -> Self {
        Self::new()
    }
}

impl MessagePlugin for MessageListener {
    fn sending(&self, envelope: &[u8]) {
        let envelope = String::from_utf8_lossy(envelope).into_owned();

        if self.is_active() {
            tracing::info!(target: "sudslib::messages", "Sending:\n{}", envelope);
        }

        *self.last_sent.lock().unwrap_or_else(PoisonError::into_inner) = Some(envelope);
    }

    fn received(&self, reply: &[u8]) {
        let reply = String::from_utf8_lossy(reply).into_owned();

        if self.is_active() {
            tracing::info!(target: "sudslib::messages", "Received:\n{}", reply);
        }

        *self
            .last_received
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_last_exchange_even_when_inactive() {
        let listener = MessageListener::new();
        assert!(listener.is_active());
        assert_eq!(listener.last_sent(), None);

        listener.set_active(false);
        listener.sending(b"<a/>");
        listener.received(b"<b/>");
        listener.sending(b"<c/>");

        assert_eq!(listener.last_sent().as_deref(), Some("<c/>"));
        assert_eq!(listener.last_received().as_deref(), Some("<b/>"));
    }
}
