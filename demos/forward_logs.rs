//! Forwarding example
//!
//! Wires console, daily-rolling file and forwarding appenders into one
//! logger, logs through named handles, then shuts everything down.
//!
//! Run with: cargo run --example forward_logs -- "10.0.0.1:4141 10.0.0.2:4141"
//!
//! Without arguments two local collectors are started and print what they
//! receive.

use rust_log_forwarder::prelude::*;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn spawn_local_collector(label: &'static str) -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let address = listener.local_addr()?.to_string();

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || {
                for line in BufReader::new(stream).lines().map_while(|l| l.ok()) {
                    println!("   [{}] {}", label, line);
                }
            });
        }
    });

    Ok(address)
}

struct Slog;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Failed sends and reconnects are reported through tracing
    tracing_subscriber::fmt().with_target(false).init();

    println!("=== Rust Log Forwarder - Forwarding Example ===\n");

    let hosts = match std::env::args().nth(1) {
        Some(hosts) => hosts,
        None => format!(
            "{} {}",
            spawn_local_collector("collector-a")?,
            spawn_local_collector("collector-b")?
        ),
    };
    println!("1. Forwarding to: {}\n", hosts);

    let log_path = std::env::temp_dir().join("rust_log_forwarder_demo.log");
    let config: LoggingConfig = serde_json::from_value(serde_json::json!({
        "level": "DEBUG",
        "target_levels": {
            "net::rpc::client": "ERROR",
            "net::transceiver": "ERROR"
        },
        "file": { "path": log_path, "daily": true },
        "forward": { "hosts": hosts, "timeout_ms": 5000 }
    }))?;

    let logger = Arc::new(config.init()?);

    println!("2. Logging through a handle named after a type:");
    let log = LogHandle::for_type::<Slog>(Arc::clone(&logger));
    log.info("[AA22122] info:dad33255afaggge");
    log.debug("[AA21234] debug:haha333432haha");
    log.debug("[AA21234] debug:hahahsr344a2ha");

    println!("\n3. Noisy transport loggers are held at ERROR:");
    let rpc = LogHandle::new("net::rpc::client", Arc::clone(&logger));
    rpc.info("connection pool warmed (hidden)");
    rpc.error("handshake rejected (visible)");

    thread::sleep(Duration::from_millis(500));

    println!("\n4. Shutting down");
    logger.flush()?;
    logger.shutdown()?;
    println!("   File output: {}", log_path.display());

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
