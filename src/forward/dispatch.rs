//! Fire-and-forget delivery of transport events
//!
//! `append` hands each event to a send worker through an unbounded channel
//! and returns. Every submitted job gets a worker of its own: an idle one is
//! claimed if available, otherwise a new worker is started, so one slow send
//! never holds up another. Workers beyond the core set retire after
//! [`IDLE_WORKER_TIMEOUT`] without work.
//!
//! There is no backpressure, no retry and no ordering between jobs: a failed
//! send is reported and the event is lost.

use super::connection::Connection;
use super::event::TransportEvent;
use crate::core::{status, DeliveryMetrics, LoggerError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Worker threads kept alive per forwarding appender
pub const DEFAULT_SEND_WORKERS: usize = 4;

/// How long `flush`, `close` and shutdown wait for in-flight sends
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle time after which a worker started on demand exits
pub const IDLE_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

struct SendJob {
    connection: Arc<dyn Connection>,
    event: TransportEvent,
}

/// State shared by the dispatcher and its workers
struct Pool {
    receiver: Receiver<SendJob>,
    metrics: Arc<DeliveryMetrics>,
    /// Workers blocked on the channel that no submitter has claimed yet
    idle: AtomicUsize,
    spawned: AtomicUsize,
}

impl Pool {
    /// Take one idle worker for a job about to be queued
    fn claim_idle(&self) -> bool {
        self.idle
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

pub struct SendDispatcher {
    sender: Option<Sender<SendJob>>,
    pool: Arc<Pool>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl SendDispatcher {
    /// Start `core_workers` permanent workers; more are added on demand
    pub fn new(core_workers: usize, metrics: Arc<DeliveryMetrics>) -> Result<Self> {
        let (sender, receiver) = unbounded::<SendJob>();
        let pool = Arc::new(Pool {
            receiver,
            metrics,
            idle: AtomicUsize::new(0),
            spawned: AtomicUsize::new(0),
        });

        let workers = (0..core_workers.max(1))
            .map(|_| {
                pool.idle.fetch_add(1, Ordering::AcqRel);
                spawn_worker(&pool, true)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sender: Some(sender),
            pool,
            workers: Mutex::new(workers),
        })
    }

    /// Workers currently running, core and on-demand
    pub fn worker_count(&self) -> usize {
        self.workers
            .lock()
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Queue one send; never blocks
    pub fn submit(&self, connection: Arc<dyn Connection>, event: TransportEvent) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(LoggerError::ChannelSendError)?;

        if !self.pool.claim_idle() {
            match spawn_worker(&self.pool, false) {
                Ok(handle) => {
                    let mut workers = self.workers.lock();
                    workers.retain(|handle| !handle.is_finished());
                    workers.push(handle);
                }
                // The job still runs once a busy worker frees up
                Err(e) => status::report_error("Failed to start send worker", &e),
            }
        }

        self.pool.metrics.record_submitted();
        sender.send(SendJob { connection, event }).map_err(|_| {
            // keep pending() balanced
            self.pool.metrics.record_failed();
            LoggerError::ChannelSendError
        })
    }

    /// Wait until every submitted job has finished, up to `timeout`
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.pool.metrics.pending() > 0 {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(2));
        }
        true
    }

    /// Stop accepting jobs and let workers drain the queue
    ///
    /// Returns `false` if the workers did not finish within `timeout`; they
    /// are left running detached in that case.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let start = Instant::now();
        let mut clean = true;

        for handle in self.workers.get_mut().drain(..) {
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        status::report_warning("Send worker panicked during shutdown");
                        clean = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    status::report_warning(&format!(
                        "Send workers did not finish within {:?}; pending events may be lost",
                        timeout
                    ));
                    return false;
                }

                thread::sleep(Duration::from_millis(5));
            }
        }

        clean
    }
}

impl Drop for SendDispatcher {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.shutdown(DEFAULT_FLUSH_TIMEOUT);
        }
    }
}

/// Start a worker; the caller has already accounted for it in `idle` or
/// is about to hand it a job
fn spawn_worker(pool: &Arc<Pool>, core: bool) -> Result<thread::JoinHandle<()>> {
    let idx = pool.spawned.fetch_add(1, Ordering::Relaxed);
    let pool = Arc::clone(pool);
    thread::Builder::new()
        .name(format!("log-forward-send-{}", idx))
        .spawn(move || run_worker(&pool, core))
        .map_err(LoggerError::from)
}

fn run_worker(pool: &Pool, core: bool) {
    loop {
        let job = if core {
            match pool.receiver.recv() {
                Ok(job) => job,
                Err(_) => return,
            }
        } else {
            match pool.receiver.recv_timeout(IDLE_WORKER_TIMEOUT) {
                Ok(job) => job,
                Err(RecvTimeoutError::Disconnected) => return,
                // Retire only if no submitter claimed this worker meanwhile
                Err(RecvTimeoutError::Timeout) if pool.claim_idle() => return,
                Err(RecvTimeoutError::Timeout) => continue,
            }
        };

        let delivered = deliver(job);
        // Back in the idle set before the job counts as settled
        pool.idle.fetch_add(1, Ordering::AcqRel);
        if delivered {
            pool.metrics.record_delivered();
        } else {
            pool.metrics.record_failed();
        }
    }
}

fn deliver(job: SendJob) -> bool {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        job.connection.send(&job.event)
    }));

    match outcome {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            status::report_error("Forwarding send failed, event dropped", &e);
            false
        }
        Err(_) => {
            status::report_error(
                "Forwarding send panicked, event dropped",
                &"connection panicked",
            );
            false
        }
    }
}
