//! Appender that forwards rendered entries to a remote collector

use super::config::{build_config, HostSelector, DEFAULT_REQUEST_TIMEOUT};
use super::connection::{Connection, Connector};
use super::dispatch::{SendDispatcher, DEFAULT_FLUSH_TIMEOUT, DEFAULT_SEND_WORKERS};
use super::event::TransportEvent;
use super::tcp::TcpConnector;
use crate::core::{status, Appender, DeliveryMetrics, Layout, LogEntry, LoggerError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

type ConnectionSlot = Option<Arc<dyn Connection>>;

/// Forwards every entry to a collector without waiting for delivery
///
/// The connection is replaced transparently when it reports inactive.
/// Sends are best-effort: a failed send is reported through the internal
/// status channel and the event is dropped.
///
/// # Example
///
/// ```no_run
/// use rust_log_forwarder::prelude::*;
///
/// let forwarder = ForwardingAppender::new("10.0.0.1:4141 10.0.0.2:4141")?;
///
/// let logger = Logger::builder()
///     .appender(ConsoleAppender::new())
///     .appender(forwarder)
///     .build();
/// logger.info("shipped to the collector fleet");
/// # Ok::<(), LoggerError>(())
/// ```
pub struct ForwardingAppender {
    hosts: String,
    timeout: Duration,
    layout: Layout,
    selector: HostSelector,
    max_backoff: Option<Duration>,
    connector: Arc<dyn Connector>,
    /// Configure, close and reconnect hold the write lock; appends the read lock
    connection: RwLock<ConnectionSlot>,
    dispatcher: SendDispatcher,
    metrics: Arc<DeliveryMetrics>,
}

impl ForwardingAppender {
    /// Connect to `hosts` with the default timeout, layout and TCP transport
    pub fn new(hosts: impl Into<String>) -> Result<Self> {
        Self::builder(hosts).build()
    }

    pub fn with_timeout(hosts: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::builder(hosts).timeout(timeout).build()
    }

    #[must_use]
    pub fn builder(hosts: impl Into<String>) -> ForwardingAppenderBuilder {
        ForwardingAppenderBuilder::new(hosts)
    }

    pub fn hosts(&self) -> &str {
        &self.hosts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    /// Whether a connection is currently held (it may still be inactive)
    pub fn is_configured(&self) -> bool {
        self.connection.read().is_some()
    }

    /// Build a fresh connection into an empty slot
    fn connect_into(&self, slot: &mut ConnectionSlot) -> Result<()> {
        debug_assert!(slot.is_none());

        if self.hosts.trim().is_empty() {
            return Err(LoggerError::config("hosts", "hosts must not be empty"));
        }

        let mut config = build_config(&self.hosts, self.timeout)?;
        if let Some(lb) = config.load_balancing.as_mut() {
            lb.selector = self.selector;
            if let Some(max_backoff) = self.max_backoff {
                lb.backoff = true;
                lb.max_backoff = max_backoff;
            }
        }
        match self.connector.connect(&config) {
            Ok(connection) => {
                *slot = Some(connection);
                Ok(())
            }
            Err(e) => {
                status::report_error("Connection creation failed", &e);
                Err(match e {
                    LoggerError::Connection { .. } => e,
                    other => LoggerError::connection(self.hosts.as_str(), other),
                })
            }
        }
    }

    /// Take the connection out of the slot and release it
    ///
    /// The slot is empty afterwards whether or not the release succeeded.
    fn release(slot: &mut ConnectionSlot) -> Result<()> {
        let connection = slot.take().ok_or(LoggerError::AlreadyClosed)?;
        connection.close().map_err(|e| {
            status::report_error("Error while closing connection", &e);
            match e {
                LoggerError::Close { .. } => e,
                other => LoggerError::close(other),
            }
        })
    }

    /// Replace `stale` with a new connection, unless another thread already did
    ///
    /// Runs entirely under the write lock, so no append observes the slot
    /// between the close and the configure.
    fn reconnect(&self, stale: &Arc<dyn Connection>) -> Result<()> {
        let mut slot = self.connection.write();

        match slot.as_ref() {
            None => return Err(LoggerError::NotConfigured),
            Some(current) if !Arc::ptr_eq(current, stale) && current.is_active() => {
                return Ok(());
            }
            Some(_) => {}
        }

        // Close error already reported via status; the slot is empty either way
        let _ = Self::release(&mut slot);
        self.metrics.record_reconnect();
        self.connect_into(&mut slot)
    }

    /// Let queued sends reach the connection before it is released
    fn drain_sends(&self) {
        if !self.dispatcher.wait_idle(DEFAULT_FLUSH_TIMEOUT) {
            status::report_warning(&format!(
                "Releasing connection with {} forwarded events still pending",
                self.metrics.pending()
            ));
        }
    }

    /// Wait for queued sends to finish, up to `timeout`
    pub fn wait_for_pending(&self, timeout: Duration) -> bool {
        self.dispatcher.wait_idle(timeout)
    }
}

impl Appender for ForwardingAppender {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let rendered = self.layout.format(entry);
        let event = TransportEvent::from_entry(entry, &rendered);

        // The read guard is held until the job is queued, so close, configure
        // and reconnect cannot release the connection in between.
        let stale = {
            let slot = self.connection.read();
            let connection = slot.as_ref().ok_or(LoggerError::NotConfigured)?;
            if connection.is_active() {
                return self.dispatcher.submit(Arc::clone(connection), event);
            }
            Arc::clone(connection)
        };

        self.reconnect(&stale)?;

        let slot = self.connection.read();
        let connection = slot.as_ref().ok_or(LoggerError::NotConfigured)?;
        self.dispatcher.submit(Arc::clone(connection), event)
    }

    fn flush(&self) -> Result<()> {
        if self.dispatcher.wait_idle(DEFAULT_FLUSH_TIMEOUT) {
            Ok(())
        } else {
            Err(LoggerError::writer(format!(
                "{} forwarded events still pending after {:?}",
                self.metrics.pending(),
                DEFAULT_FLUSH_TIMEOUT
            )))
        }
    }

    fn name(&self) -> &str {
        "forwarding"
    }

    /// Connect to the configured hosts, releasing any connection held
    fn configure(&self) -> Result<()> {
        let mut slot = self.connection.write();
        if slot.is_some() {
            self.drain_sends();
            // Close error already reported via status; the slot is empty either way
            let _ = Self::release(&mut slot);
        }
        self.connect_into(&mut slot)
    }

    /// Release the connection once queued sends finished; fails if there is none
    fn close(&self) -> Result<()> {
        let mut slot = self.connection.write();
        if slot.is_none() {
            let err = LoggerError::AlreadyClosed;
            status::report_error("Forwarding appender", &err);
            return Err(err);
        }
        self.drain_sends();
        Self::release(&mut slot)
    }
}

impl Drop for ForwardingAppender {
    fn drop(&mut self) {
        self.dispatcher.shutdown(DEFAULT_FLUSH_TIMEOUT);
        if self.connection.get_mut().is_some() {
            let _ = Self::release(self.connection.get_mut());
        }
    }
}

/// Builder for [`ForwardingAppender`]
///
/// # Example
///
/// ```no_run
/// use rust_log_forwarder::forward::ForwardingAppender;
/// use rust_log_forwarder::Layout;
/// use std::time::Duration;
///
/// let appender = ForwardingAppender::builder("collector-1:4141 collector-2:4141")
///     .timeout(Duration::from_secs(5))
///     .layout(Layout::json())
///     .send_workers(8)
///     .build()
///     .expect("collector unreachable");
/// ```
pub struct ForwardingAppenderBuilder {
    hosts: String,
    timeout: Duration,
    layout: Layout,
    selector: HostSelector,
    max_backoff: Option<Duration>,
    connector: Arc<dyn Connector>,
    send_workers: usize,
}

impl ForwardingAppenderBuilder {
    pub fn new(hosts: impl Into<String>) -> Self {
        Self {
            hosts: hosts.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            layout: Layout::default(),
            selector: HostSelector::default(),
            max_backoff: None,
            connector: Arc::new(TcpConnector),
            send_workers: DEFAULT_SEND_WORKERS,
        }
    }

    /// Connect and request timeout handed to the connection
    #[must_use = "builder methods return a new value"]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Endpoint selection when several hosts are given
    #[must_use = "builder methods return a new value"]
    pub fn host_selector(mut self, selector: HostSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Skip failing endpoints for up to `max_backoff` (load-balanced hosts only)
    #[must_use = "builder methods return a new value"]
    pub fn backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = Some(max_backoff);
        self
    }

    /// Use another transport instead of the built-in TCP one
    #[must_use = "builder methods return a new value"]
    pub fn connector<C: Connector + 'static>(mut self, connector: C) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Send workers kept alive; more are started while all of them are busy
    #[must_use = "builder methods return a new value"]
    pub fn send_workers(mut self, workers: usize) -> Self {
        self.send_workers = workers;
        self
    }

    /// Build and connect immediately
    pub fn build(self) -> Result<ForwardingAppender> {
        let appender = self.build_inactive()?;
        appender.configure()?;
        Ok(appender)
    }

    /// Build without connecting; call [`Appender::configure`] before use
    ///
    /// Appends fail with [`LoggerError::NotConfigured`] until then.
    pub fn build_inactive(self) -> Result<ForwardingAppender> {
        self.layout.validate()?;
        let metrics = Arc::new(DeliveryMetrics::new());
        let dispatcher = SendDispatcher::new(self.send_workers, Arc::clone(&metrics))?;

        Ok(ForwardingAppender {
            hosts: self.hosts,
            timeout: self.timeout,
            layout: self.layout,
            selector: self.selector,
            max_backoff: self.max_backoff,
            connector: self.connector,
            connection: RwLock::new(None),
            dispatcher,
            metrics,
        })
    }
}
