//! Internal diagnostics for failures that cannot be returned to a caller
//!
//! A logging framework cannot log its own failures through itself. When the
//! host installed a `tracing` subscriber (global or scoped to the current
//! thread) the report goes there; otherwise it is written to stderr.

use std::fmt::Display;

const TARGET: &str = "rust_log_forwarder";

fn has_subscriber() -> bool {
    tracing::dispatcher::get_default(|dispatch| {
        !dispatch.is::<tracing::subscriber::NoSubscriber>()
    })
}

/// Report an error that was swallowed (failed send, failed release, ...)
pub fn report_error(context: &str, err: &dyn Display) {
    if has_subscriber() {
        tracing::error!(target: TARGET, error = %err, "{}", context);
    } else {
        eprintln!("[LOGGER ERROR] {}: {}", context, err);
    }
}

/// Report a condition worth an operator's attention
pub fn report_warning(message: &str) {
    if has_subscriber() {
        tracing::warn!(target: TARGET, "{}", message);
    } else {
        eprintln!("[LOGGER WARNING] {}", message);
    }
}

/// Run `f` with a thread-scoped subscriber and return what it reported
#[cfg(test)]
pub(crate) fn capture<F: FnOnce()>(f: F) -> String {
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let buffer = Buffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
