use std::fmt;

/// Observes the raw envelopes a client exchanges.
pub trait MessagePlugin: fmt::Debug + Send + Sync {
    fn sending(&self, _envelope: &[u8]) {}

    fn received(&self, _reply: &[u8]) {}
}
