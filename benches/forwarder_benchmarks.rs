//! Criterion benchmarks for rust_log_forwarder

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_log_forwarder::forward::{
    build_config, Connection, ConnectionConfig, TransportEvent,
};
use rust_log_forwarder::prelude::*;
use std::sync::Arc;
use std::time::Duration;

struct NullConnection;

impl Connection for NullConnection {
    fn send(&self, event: &TransportEvent) -> rust_log_forwarder::Result<()> {
        black_box(event);
        Ok(())
    }

    fn is_active(&self) -> bool {
        true
    }

    fn close(&self) -> rust_log_forwarder::Result<()> {
        Ok(())
    }
}

fn null_forwarder() -> ForwardingAppender {
    ForwardingAppender::builder("bench:4141")
        .connector(
            |_: &ConnectionConfig| -> rust_log_forwarder::Result<Arc<dyn Connection>> {
                Ok(Arc::new(NullConnection))
            },
        )
        .build()
        .expect("null connector never fails")
}

// ============================================================================
// Configuration Benchmarks
// ============================================================================

fn bench_build_config(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_config");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_host", |b| {
        b.iter(|| build_config(black_box("10.0.0.1:4141"), Duration::from_secs(20)));
    });

    group.bench_function("eight_hosts", |b| {
        let hosts = (1..=8)
            .map(|i| format!("10.0.0.{}:4141", i))
            .collect::<Vec<_>>()
            .join(" ");
        b.iter(|| build_config(black_box(&hosts), Duration::from_secs(20)));
    });

    group.finish();
}

// ============================================================================
// Rendering Benchmarks
// ============================================================================

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    group.throughput(Throughput::Elements(1));

    let entry = LogEntry::new("bench::layout", LogLevel::Info, "request served in 12ms");

    for (name, layout) in [
        ("text", Layout::text()),
        ("json", Layout::json()),
        ("logfmt", Layout::logfmt()),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| layout.format(black_box(&entry)));
        });
    }

    group.bench_function("transport_event", |b| {
        let rendered = Layout::text().format(&entry);
        b.iter(|| TransportEvent::from_entry(black_box(&entry), &rendered));
    });

    group.finish();
}

// ============================================================================
// Forwarding Benchmarks
// ============================================================================

fn bench_forwarding(c: &mut Criterion) {
    let mut group = c.benchmark_group("forwarding");
    group.throughput(Throughput::Elements(1));

    let forwarder = null_forwarder();
    let entry = LogEntry::new("bench::forward", LogLevel::Info, "forwarded message");

    group.bench_function("append", |b| {
        b.iter(|| forwarder.append(black_box(&entry)));
    });
    forwarder.wait_for_pending(Duration::from_secs(10));

    let logger = Logger::builder().appender(null_forwarder()).build();
    group.bench_function("logger_info", |b| {
        b.iter(|| logger.info(black_box("through the root dispatcher")));
    });
    group.bench_function("filtered_debug", |b| {
        b.iter(|| logger.debug(black_box("below threshold")));
    });

    group.finish();
}

criterion_group!(benches, bench_build_config, bench_layouts, bench_forwarding);
criterion_main!(benches);
