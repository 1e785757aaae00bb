//! Connection configuration built from a `hosts` string
//!
//! One `host:port` token gives a single-endpoint client; several tokens give
//! a load-balanced client that picks among them round-robin.

use crate::core::{LoggerError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default connect and request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Events per batch requested from the client
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// IO worker threads requested for a single-endpoint client
pub const DEFAULT_MAX_IO_WORKERS: usize = 3;

/// One collector destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Symbolic name (`h0`, `h1`, ...)
    pub name: String,
    /// `host:port`, passed through uninterpreted
    pub address: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientType {
    #[default]
    Default,
    LoadBalancing,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Default => "default",
            ClientType::LoadBalancing => "default_loadbalance",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a load-balanced client picks the endpoint for each send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostSelector {
    #[default]
    RoundRobin,
    Random,
}

impl HostSelector {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostSelector::RoundRobin => "round_robin",
            HostSelector::Random => "random",
        }
    }
}

/// Settings that only exist in load-balanced mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancing {
    pub selector: HostSelector,
    /// Temporarily skip endpoints that failed
    pub backoff: bool,
    /// Upper bound for the skip period; zero selects the transport default
    pub max_backoff: Duration,
}

/// Everything a [`Connector`](super::Connector) needs to build a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub endpoints: Vec<Endpoint>,
    pub client_type: ClientType,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub batch_size: usize,
    /// Set only for single-endpoint clients
    pub max_io_workers: Option<usize>,
    /// Set only for load-balanced clients
    pub load_balancing: Option<LoadBalancing>,
}

impl ConnectionConfig {
    pub fn is_load_balanced(&self) -> bool {
        self.client_type == ClientType::LoadBalancing
    }

    /// Addresses joined by spaces, as given in the hosts string
    pub fn hosts(&self) -> String {
        self.endpoints
            .iter()
            .map(|e| e.address.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Flatten into the named-parameter form RPC clients are configured with
    ///
    /// ```
    /// use rust_log_forwarder::forward::build_config;
    /// use std::time::Duration;
    ///
    /// let props = build_config("10.0.0.1:4141", Duration::from_secs(5))
    ///     .unwrap()
    ///     .to_properties();
    /// assert_eq!(props["hosts"], "h1");
    /// assert_eq!(props["hosts.h1"], "10.0.0.1:4141");
    /// assert_eq!(props["request-timeout"], "5000");
    /// ```
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();

        let names: Vec<&str> = self.endpoints.iter().map(|e| e.name.as_str()).collect();
        props.insert("hosts".to_string(), names.join(" "));
        for endpoint in &self.endpoints {
            props.insert(format!("hosts.{}", endpoint.name), endpoint.address.clone());
        }

        props.insert(
            "connect-timeout".to_string(),
            self.connect_timeout.as_millis().to_string(),
        );
        props.insert(
            "request-timeout".to_string(),
            self.request_timeout.as_millis().to_string(),
        );
        props.insert("batch-size".to_string(), self.batch_size.to_string());

        if let Some(workers) = self.max_io_workers {
            props.insert("maxIoWorkers".to_string(), workers.to_string());
        }

        if let Some(ref lb) = self.load_balancing {
            props.insert("client.type".to_string(), self.client_type.to_string());
            props.insert("host-selector".to_string(), lb.selector.as_str().to_string());
            props.insert("backoff".to_string(), lb.backoff.to_string());
            props.insert(
                "maxBackoff".to_string(),
                lb.max_backoff.as_millis().to_string(),
            );
        }

        props
    }
}

/// Translate a whitespace-separated `host:port` list into a connection config
///
/// Fails with [`LoggerError::InvalidConfiguration`] when `hosts` is blank.
/// Tokens are not validated here; the connector rejects bad addresses.
pub fn build_config(hosts: &str, timeout: Duration) -> Result<ConnectionConfig> {
    let tokens: Vec<&str> = hosts.split_whitespace().collect();

    match tokens.as_slice() {
        [] => Err(LoggerError::config("hosts", "hosts must not be empty")),
        [single] => Ok(ConnectionConfig {
            endpoints: vec![Endpoint {
                name: "h1".to_string(),
                address: (*single).to_string(),
            }],
            client_type: ClientType::Default,
            connect_timeout: timeout,
            request_timeout: timeout,
            batch_size: DEFAULT_BATCH_SIZE,
            max_io_workers: Some(DEFAULT_MAX_IO_WORKERS),
            load_balancing: None,
        }),
        many => Ok(ConnectionConfig {
            endpoints: many
                .iter()
                .enumerate()
                .map(|(i, address)| Endpoint {
                    name: format!("h{}", i),
                    address: (*address).to_string(),
                })
                .collect(),
            client_type: ClientType::LoadBalancing,
            connect_timeout: timeout,
            request_timeout: timeout,
            batch_size: DEFAULT_BATCH_SIZE,
            max_io_workers: None,
            load_balancing: Some(LoadBalancing {
                selector: HostSelector::RoundRobin,
                backoff: false,
                max_backoff: Duration::ZERO,
            }),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_endpoint() {
        let config = build_config("10.0.0.1:4141", DEFAULT_REQUEST_TIMEOUT).unwrap();

        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.endpoints[0].address, "10.0.0.1:4141");
        assert_eq!(config.client_type, ClientType::Default);
        assert_eq!(config.connect_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_io_workers, Some(3));
        assert!(config.load_balancing.is_none());
        assert!(!config.is_load_balanced());
    }

    #[test]
    fn test_multiple_endpoints_in_order() {
        let config = build_config(
            "10.0.0.1:4141 10.0.0.2:4141 10.0.0.3:4141",
            DEFAULT_REQUEST_TIMEOUT,
        )
        .unwrap();

        let names: Vec<&str> = config.endpoints.iter().map(|e| e.name.as_str()).collect();
        let addresses: Vec<&str> = config.endpoints.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(names, ["h0", "h1", "h2"]);
        assert_eq!(addresses, ["10.0.0.1:4141", "10.0.0.2:4141", "10.0.0.3:4141"]);
        assert_eq!(config.client_type, ClientType::LoadBalancing);
        assert_eq!(
            config.load_balancing,
            Some(LoadBalancing {
                selector: HostSelector::RoundRobin,
                backoff: false,
                max_backoff: Duration::ZERO,
            })
        );
        assert_eq!(config.max_io_workers, None);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_blank_hosts_rejected() {
        for hosts in ["", "   ", "\t\n"] {
            let err = build_config(hosts, DEFAULT_REQUEST_TIMEOUT).unwrap_err();
            assert!(matches!(err, LoggerError::InvalidConfiguration { .. }), "{:?}", hosts);
        }
    }

    #[test]
    fn test_irregular_whitespace_and_malformed_tokens_pass_through() {
        let config = build_config("  a:1 \t not-a-port  ", Duration::from_secs(1)).unwrap();
        assert_eq!(config.hosts(), "a:1 not-a-port");
    }

    #[test]
    fn test_load_balanced_properties() {
        let props = build_config("a:1 b:2", Duration::from_millis(1500))
            .unwrap()
            .to_properties();

        assert_eq!(props["hosts"], "h0 h1");
        assert_eq!(props["hosts.h0"], "a:1");
        assert_eq!(props["hosts.h1"], "b:2");
        assert_eq!(props["client.type"], "default_loadbalance");
        assert_eq!(props["host-selector"], "round_robin");
        assert_eq!(props["backoff"], "false");
        assert_eq!(props["maxBackoff"], "0");
        assert_eq!(props["connect-timeout"], "1500");
        assert_eq!(props["batch-size"], "100");
        assert!(!props.contains_key("maxIoWorkers"));
    }

    #[test]
    fn test_single_properties_have_no_load_balancing_keys() {
        let props = build_config("a:1", DEFAULT_REQUEST_TIMEOUT)
            .unwrap()
            .to_properties();

        assert_eq!(props["maxIoWorkers"], "3");
        for key in ["client.type", "host-selector", "backoff", "maxBackoff"] {
            assert!(!props.contains_key(key), "unexpected key {}", key);
        }
    }
}
