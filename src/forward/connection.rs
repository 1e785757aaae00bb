//! Seam between the forwarding appender and the RPC client that delivers events

use super::config::ConnectionConfig;
use super::event::TransportEvent;
use crate::core::Result;
use std::sync::Arc;

/// A live client for one or more collector endpoints
///
/// Shared between the appender and in-flight send jobs, so every method
/// takes `&self`.
pub trait Connection: Send + Sync {
    /// Deliver one event; may block up to the configured request timeout
    fn send(&self, event: &TransportEvent) -> Result<()>;

    /// `false` once the client can no longer deliver and must be rebuilt
    fn is_active(&self) -> bool;

    /// Release the underlying sockets
    fn close(&self) -> Result<()>;
}

/// Builds connections from a [`ConnectionConfig`]
pub trait Connector: Send + Sync {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;
}

impl<F> Connector for F
where
    F: Fn(&ConnectionConfig) -> Result<Arc<dyn Connection>> + Send + Sync,
{
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        self(config)
    }
}
