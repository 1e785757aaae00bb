//! Basic logger usage example
//!
//! Demonstrates the root dispatcher with a console appender, level
//! thresholds, per-target overrides and the formatting macros.
//!
//! Run with: cargo run --example basic_usage

use rust_log_forwarder::prelude::*;
use rust_log_forwarder::{info, log, warn};

fn main() -> Result<()> {
    println!("=== Rust Log Forwarder - Basic Usage Example ===\n");

    let logger = Logger::builder()
        .min_level(LogLevel::Trace)
        .appender(ConsoleAppender::new())
        .build();

    println!("1. Logging at different levels:");
    logger.trace("This is a trace message");
    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message");
    logger.fatal("This is a fatal message");

    println!("\n2. Logging with different minimum levels:");
    logger.set_min_level(LogLevel::Info);
    println!("   Minimum level set to INFO - trace and debug won't show:");
    logger.trace("Trace message (hidden)");
    logger.debug("Debug message (hidden)");
    logger.info("Info message (visible)");

    println!("\n3. Per-target overrides:");
    logger.set_target_level("db", LogLevel::Debug);
    logger.log_to("db::pool", LogLevel::Debug, "Debug from db::pool (visible)");
    logger.log_to("http", LogLevel::Debug, "Debug from http (hidden)");

    println!("\n4. Formatting macros:");
    let port = 4141;
    info!(logger, "Listening on port {}", port);
    warn!(logger, "Retry attempt {} of {}", 2, 5);
    log!(logger, target: "db", LogLevel::Debug, "Pool size: {}", 8);

    println!("\n5. JSON layout:");
    let json_logger = Logger::builder()
        .appender(ConsoleAppender::with_colors(false).with_layout(Layout::json()))
        .build();
    json_logger.info("Structured output");

    logger.shutdown()?;
    json_logger.shutdown()?;

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
