//! Default transport: newline-delimited JSON events over TCP
//!
//! Single-endpoint connections connect eagerly and go inactive after the
//! first write failure, which makes the appender rebuild them. Load-balanced
//! connections connect lazily, fail over across endpoints on every send and
//! stay active until closed.

use super::config::{ConnectionConfig, HostSelector, LoadBalancing};
use super::connection::{Connection, Connector};
use super::event::TransportEvent;
use crate::core::{LoggerError, Result};
use parking_lot::Mutex;
use rand::Rng;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// First skip period after an endpoint fails (load-balanced mode with backoff)
pub const BASE_BACKOFF: Duration = Duration::from_secs(1);

/// Cap used when the config asks for backoff with `max_backoff` of zero
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Connector producing [`TcpConnection`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(TcpConnection::open(config)?))
    }
}

struct EndpointSlot {
    name: String,
    address: String,
    addrs: Vec<SocketAddr>,
    stream: Mutex<Option<TcpStream>>,
    failures: AtomicU32,
    backoff_until: Mutex<Option<Instant>>,
}

impl EndpointSlot {
    fn resolve(name: &str, address: &str) -> io::Result<Self> {
        let addrs: Vec<SocketAddr> = address.to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "address resolved to nothing",
            ));
        }

        Ok(Self {
            name: name.to_string(),
            address: address.to_string(),
            addrs,
            stream: Mutex::new(None),
            failures: AtomicU32::new(0),
            backoff_until: Mutex::new(None),
        })
    }

    fn connect(
        &self,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> io::Result<TcpStream> {
        let mut last_err = None;

        for addr in &self.addrs {
            match TcpStream::connect_timeout(addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_write_timeout(non_zero(request_timeout))?;
                    stream.set_read_timeout(non_zero(request_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable)))
    }

    /// Write `payload`, connecting first if needed; drops the socket on failure
    fn write(
        &self,
        payload: &[u8],
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> io::Result<()> {
        let mut guard = self.stream.lock();
        if guard.is_none() {
            *guard = Some(self.connect(connect_timeout, request_timeout)?);
        }
        let Some(stream) = guard.as_mut() else {
            return Err(io::Error::from(io::ErrorKind::NotConnected));
        };

        let result = stream.write_all(payload).and_then(|()| stream.flush());
        if result.is_err() {
            *guard = None;
        }
        result
    }

    fn is_backed_off(&self, now: Instant) -> bool {
        matches!(*self.backoff_until.lock(), Some(until) if until > now)
    }

    fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
        *self.backoff_until.lock() = None;
    }

    fn record_failure(&self, max_backoff: Duration) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        let factor = 1u32 << failures.saturating_sub(1).min(16);
        let period = BASE_BACKOFF.saturating_mul(factor).min(max_backoff);
        *self.backoff_until.lock() = Some(Instant::now() + period);
    }

    fn close(&self) -> io::Result<()> {
        match self.stream.lock().take() {
            Some(stream) => match stream.shutdown(Shutdown::Both) {
                Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
                _ => Ok(()),
            },
            None => Ok(()),
        }
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// TCP client for one endpoint or a load-balanced set of endpoints
pub struct TcpConnection {
    endpoints: Vec<EndpointSlot>,
    load_balancing: Option<LoadBalancing>,
    connect_timeout: Duration,
    request_timeout: Duration,
    next: AtomicUsize,
    healthy: AtomicBool,
    closed: AtomicBool,
}

impl TcpConnection {
    /// Resolve every endpoint; single-endpoint configs also connect now
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        let hosts = config.hosts();
        if config.endpoints.is_empty() {
            return Err(LoggerError::connection(hosts, "no endpoints configured"));
        }

        let endpoints = config
            .endpoints
            .iter()
            .map(|e| {
                EndpointSlot::resolve(&e.name, &e.address).map_err(|err| {
                    let detail = format!("{} ({}): {}", e.name, e.address, err);
                    LoggerError::connection(hosts.as_str(), detail)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let connection = Self {
            endpoints,
            load_balancing: config
                .load_balancing
                .clone()
                .filter(|_| config.is_load_balanced()),
            connect_timeout: config.connect_timeout,
            request_timeout: config.request_timeout,
            next: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        };

        if connection.load_balancing.is_none() {
            let slot = &connection.endpoints[0];
            let stream = slot
                .connect(connection.connect_timeout, connection.request_timeout)
                .map_err(|e| LoggerError::connection(hosts.as_str(), e))?;
            *slot.stream.lock() = Some(stream);
        }

        Ok(connection)
    }

    pub fn is_load_balanced(&self) -> bool {
        self.load_balancing.is_some()
    }

    /// Endpoint indices to try for the next send, preferred first
    fn selection_order(&self, lb: &LoadBalancing) -> Vec<usize> {
        let n = self.endpoints.len();
        let start = match lb.selector {
            HostSelector::RoundRobin => self.next.fetch_add(1, Ordering::Relaxed) % n,
            HostSelector::Random => rand::thread_rng().gen_range(0..n),
        };
        (0..n).map(|i| (start + i) % n).collect()
    }

    fn write_payload(&self, payload: &[u8]) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LoggerError::delivery("all endpoints", "connection closed"));
        }

        let Some(ref lb) = self.load_balancing else {
            let slot = &self.endpoints[0];
            return slot
                .write(payload, self.connect_timeout, self.request_timeout)
                .map_err(|e| {
                    self.healthy.store(false, Ordering::Release);
                    LoggerError::delivery(slot.address.as_str(), e)
                });
        };

        let max_backoff = if lb.max_backoff.is_zero() {
            DEFAULT_MAX_BACKOFF
        } else {
            lb.max_backoff
        };
        let now = Instant::now();
        let mut last_err = None;

        for idx in self.selection_order(lb) {
            let slot = &self.endpoints[idx];
            if lb.backoff && slot.is_backed_off(now) {
                continue;
            }

            match slot.write(payload, self.connect_timeout, self.request_timeout) {
                Ok(()) => {
                    slot.record_success();
                    return Ok(());
                }
                Err(e) => {
                    if lb.backoff {
                        slot.record_failure(max_backoff);
                    }
                    last_err = Some(format!("{} ({}): {}", slot.name, slot.address, e));
                }
            }
        }

        Err(LoggerError::delivery(
            "all endpoints",
            last_err.unwrap_or_else(|| "every endpoint is backed off".to_string()),
        ))
    }
}

impl Connection for TcpConnection {
    fn send(&self, event: &TransportEvent) -> Result<()> {
        let line = event.to_json_line()?;
        self.write_payload(line.as_bytes())
    }

    fn is_active(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.healthy.load(Ordering::Acquire)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);

        let mut first_error = None;
        for slot in &self.endpoints {
            if let Err(e) = slot.close() {
                first_error
                    .get_or_insert_with(|| format!("{} ({}): {}", slot.name, slot.address, e));
            }
        }

        first_error.map_or(Ok(()), |message| Err(LoggerError::close(message)))
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        let _ = Connection::close(self);
    }
}
