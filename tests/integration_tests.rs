//! Integration tests for the forwarding pipeline
//!
//! These tests verify:
//! - End-to-end delivery through the TCP transport
//! - Non-blocking appends under concurrency
//! - Reconnect after the collector drops the connection
//! - Logger lifecycle with several appenders
//! - Declarative setup through `LoggingConfig`

use parking_lot::{Condvar, Mutex};
use rust_log_forwarder::forward::{
    Connection, ConnectionConfig, ForwardingAppender, TransportEvent, HEADER_LOGGER_NAME,
    HEADER_LOG_LEVEL, HEADER_MESSAGE_ENCODING, HEADER_TIMESTAMP,
};
use rust_log_forwarder::prelude::*;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

/// Collector that accepts any number of connections and reports each line
fn spawn_collector() -> (String, mpsc::Receiver<serde_json::Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind collector");
    let address = listener.local_addr().unwrap().to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let tx = tx.clone();
            thread::spawn(move || {
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    let Ok(value) = serde_json::from_str(&line) else { continue };
                    if tx.send(value).is_err() {
                        break;
                    }
                }
            });
        }
    });

    (address, rx)
}

#[test]
fn test_end_to_end_tcp_forwarding() {
    let (address, rx) = spawn_collector();

    let logger = Logger::builder()
        .min_level(LogLevel::Debug)
        .appender(
            ForwardingAppender::builder(address.as_str())
                .timeout(Duration::from_secs(2))
                .build()
                .expect("Failed to connect to collector"),
        )
        .build();

    logger.log_to("app::db", LogLevel::Warn, "pool exhausted");
    logger.flush().unwrap();

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let headers = &event["headers"];
    assert_eq!(headers[HEADER_LOGGER_NAME], "app::db");
    assert_eq!(headers[HEADER_LOG_LEVEL], "30000");
    assert_eq!(headers[HEADER_MESSAGE_ENCODING], "UTF8");
    assert!(headers[HEADER_TIMESTAMP]
        .as_str()
        .unwrap()
        .parse::<i64>()
        .is_ok());
    assert!(event["body"].as_str().unwrap().ends_with("app::db - pool exhausted"));

    logger.shutdown().unwrap();
}

#[test]
fn test_load_balanced_hosts_spread_events() {
    let (first, rx_first) = spawn_collector();
    let (second, rx_second) = spawn_collector();

    let appender = ForwardingAppender::with_timeout(
        format!("{} {}", first, second),
        Duration::from_secs(2),
    )
    .unwrap();

    for i in 0..4 {
        appender
            .append(&LogEntry::new("lb", LogLevel::Info, format!("event {}", i)))
            .unwrap();
    }
    appender.flush().unwrap();

    let mut counts = [0; 2];
    let deadline = Instant::now() + Duration::from_secs(5);
    while counts.iter().sum::<usize>() < 4 && Instant::now() < deadline {
        counts[0] += rx_first.try_iter().count();
        counts[1] += rx_second.try_iter().count();
        thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(counts, [2, 2]);
}

/// Connection whose sends block until the test opens the gate
struct GatedConnection {
    open: Mutex<bool>,
    opened: Condvar,
    sent: AtomicUsize,
}

impl GatedConnection {
    fn new() -> Self {
        Self {
            open: Mutex::new(false),
            opened: Condvar::new(),
            sent: AtomicUsize::new(0),
        }
    }

    fn release(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }
}

impl Connection for GatedConnection {
    fn send(&self, _event: &TransportEvent) -> rust_log_forwarder::Result<()> {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_active(&self) -> bool {
        true
    }

    fn close(&self) -> rust_log_forwarder::Result<()> {
        Ok(())
    }
}

#[test]
fn test_concurrent_appends_do_not_wait_for_delivery() {
    let gated = Arc::new(GatedConnection::new());
    let connection = Arc::clone(&gated);
    let appender = Arc::new(
        ForwardingAppender::builder("collector:4141")
            .connector(
                move |_: &ConnectionConfig| -> rust_log_forwarder::Result<Arc<dyn Connection>> {
                    Ok(Arc::clone(&connection) as Arc<dyn Connection>)
                },
            )
            .build()
            .unwrap(),
    );

    let started = Instant::now();
    let handles: Vec<_> = (0..50)
        .map(|i| {
            let appender = Arc::clone(&appender);
            thread::spawn(move || {
                appender.append(&LogEntry::new("burst", LogLevel::Info, format!("m{}", i)))
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // Every send is still parked behind the gate
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(gated.sent.load(Ordering::SeqCst), 0);
    assert_eq!(appender.metrics().submitted(), 50);

    gated.release();
    assert!(appender.wait_for_pending(Duration::from_secs(5)));
    assert_eq!(gated.sent.load(Ordering::SeqCst), 50);
    assert_eq!(appender.metrics().delivered(), 50);
}

#[test]
fn test_reconnects_after_collector_drops_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let (tx, rx) = mpsc::channel();

    // First connection is dropped immediately, later ones are served
    thread::spawn(move || {
        let mut incoming = listener.incoming();
        if let Some(Ok(first)) = incoming.next() {
            drop(first);
        }
        for stream in incoming {
            let Ok(stream) = stream else { break };
            let tx = tx.clone();
            thread::spawn(move || {
                for line in BufReader::new(stream).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        }
    });

    let appender = ForwardingAppender::with_timeout(address, Duration::from_secs(2)).unwrap();

    let mut delivered = None;
    for i in 0..100 {
        appender
            .append(&LogEntry::new("retry", LogLevel::Info, format!("attempt {}", i)))
            .unwrap();
        appender.flush().unwrap();
        if let Ok(line) = rx.recv_timeout(Duration::from_millis(50)) {
            delivered = Some(line);
            break;
        }
    }

    assert!(delivered.is_some(), "no event reached the collector after reconnect");
    assert!(appender.metrics().reconnects() >= 1);
    assert!(appender.metrics().failed() >= 1);
}

#[test]
fn test_unreachable_collector_fails_construction() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let err = match ForwardingAppender::with_timeout(address, Duration::from_millis(500)) {
        Ok(_) => panic!("expected construction to fail"),
        Err(e) => e,
    };
    assert!(matches!(err, LoggerError::Connection { .. }));
}

#[test]
fn test_shutdown_closes_forwarder_once() {
    let (address, _rx) = spawn_collector();
    let forwarder = Arc::new(ForwardingAppender::new(address).unwrap());

    let logger = Logger::builder()
        .shared_appender(forwarder.clone())
        .build();
    logger.info("before shutdown");

    logger.shutdown().unwrap();
    assert!(!forwarder.is_configured());

    // Detached: nothing reaches the appender any more
    logger.info("after shutdown");
    assert!(matches!(forwarder.close(), Err(LoggerError::AlreadyClosed)));
}

#[test]
fn test_logging_config_builds_forwarding_pipeline() {
    let (address, rx) = spawn_collector();
    let config: LoggingConfig = serde_json::from_value(serde_json::json!({
        "level": "INFO",
        "console": false,
        "layout": { "kind": "json" },
        "forward": { "hosts": address, "timeout_ms": 2000 }
    }))
    .unwrap();

    let logger = Arc::new(config.init().unwrap());
    let handle = LogHandle::new("svc::api", Arc::clone(&logger));
    handle.debug("below threshold");
    handle.info("request served");
    logger.flush().unwrap();

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let body: serde_json::Value = serde_json::from_str(event["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["message"], "request served");
    assert_eq!(body["level"], "INFO");
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
