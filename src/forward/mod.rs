//! Forwarding of log entries to remote collectors
//!
//! - [`config`]: turns a `hosts` string into a [`ConnectionConfig`]
//! - [`connection`]: the [`Connection`]/[`Connector`] seam to the RPC client
//! - [`tcp`]: the built-in TCP client
//! - [`dispatch`]: fire-and-forget send workers, started on demand
//! - [`appender`]: the [`ForwardingAppender`] tying them together

pub mod appender;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod event;
pub mod tcp;

pub use appender::{ForwardingAppender, ForwardingAppenderBuilder};
pub use config::{
    build_config, ClientType, ConnectionConfig, Endpoint, HostSelector, LoadBalancing,
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_IO_WORKERS, DEFAULT_REQUEST_TIMEOUT,
};
pub use connection::{Connection, Connector};
pub use dispatch::{
    SendDispatcher, DEFAULT_FLUSH_TIMEOUT, DEFAULT_SEND_WORKERS, IDLE_WORKER_TIMEOUT,
};
pub use event::{
    TransportEvent, HEADER_LOGGER_NAME, HEADER_LOG_LEVEL, HEADER_MESSAGE_ENCODING,
    HEADER_TIMESTAMP, MESSAGE_ENCODING,
};
pub use tcp::{TcpConnection, TcpConnector};
