//! Background repair of pool entries.
//!
//! A maintenance pass visits every entry of every rack, one lock at a time:
//! valid entries get a liveness probe, and entries that are invalid, or
//! fail it, get a fresh connection. The
//! [`Reconnector`] runs passes on a fixed interval until stopped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use metrics::counter;
use tracing::{debug, info, warn};

use crate::connection::{establish, ConnectOptions, Connection, Connector};
use crate::topology::Topology;

const RECONNECT_OK: &str = "dyno_client.reconnect.ok";
const RECONNECT_FAILED: &str = "dyno_client.reconnect.failed";

/// Default pause between maintenance passes.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(10);

/// What one maintenance pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Valid entries whose probe succeeded.
    pub healthy: usize,
    /// Valid entries whose probe failed. Each is also counted under
    /// `reconnected` or `failed`.
    pub invalidated: usize,
    /// Entries that got a new connection.
    pub reconnected: usize,
    /// Entries still without a connection after this pass.
    pub failed: usize,
}

/// Runs one maintenance pass over the whole topology.
pub fn maintain<K: Connector>(
    topology: &Topology<K::Connection>,
    connector: &K,
    options: &ConnectOptions,
) -> PassReport {
    let mut report = PassReport::default();
    for dc in topology.datacenters() {
        for rack in dc.racks() {
            for (slot, entry) in rack.pool().iter().enumerate() {
                let Some(endpoint) = rack.endpoint(slot) else {
                    continue;
                };
                let mut guard = entry.lock();
                if let Some(conn) = guard.connection() {
                    match conn.ping() {
                        Ok(()) => {
                            report.healthy += 1;
                            continue;
                        }
                        Err(err) => {
                            warn!(
                                %endpoint,
                                rack = rack.name(),
                                error = %err,
                                "liveness probe failed, invalidating"
                            );
                            guard.invalidate();
                            counter!(crate::dispatcher::INVALIDATED).increment(1);
                            report.invalidated += 1;
                        }
                    }
                }
                // Invalid, possibly just now: reconnect under the same lock.
                match establish(connector, endpoint, options) {
                    Ok(conn) => {
                        debug!(%endpoint, rack = rack.name(), "reconnected");
                        guard.install(conn);
                        counter!(RECONNECT_OK).increment(1);
                        report.reconnected += 1;
                    }
                    Err(err) => {
                        debug!(%endpoint, rack = rack.name(), error = %err, "reconnect failed");
                        counter!(RECONNECT_FAILED).increment(1);
                        report.failed += 1;
                    }
                }
            }
        }
    }
    report
}

/// Handle to the background maintenance thread.
pub struct Reconnector {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Reconnector {
    /// Starts a thread running [`maintain`] every `interval` until
    /// [`Reconnector::stop`] is called.
    pub fn spawn<K: Connector>(
        topology: Arc<Topology<K::Connection>>,
        connector: Arc<K>,
        options: ConnectOptions,
        interval: Duration,
    ) -> std::io::Result<Self> {
        let (stop, stopped) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("dyno-reconnector".to_owned())
            .spawn(move || {
                debug!(?interval, "reconnector started");
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let report = maintain(&*topology, &*connector, &options);
                            debug!(?report, "maintenance pass done");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("reconnector stopped");
            })?;
        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for it. A pass in progress finishes
    /// first. Calling this twice is harmless.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("reconnector thread panicked");
            } else {
                info!("reconnector joined");
            }
        }
    }
}

impl Drop for Reconnector {
    fn drop(&mut self) {
        self.stop();
    }
}
