//! Sends one command along a key's failover walk.

use metrics::counter;
use tracing::{debug, warn};

use crate::connection::{Command, Connection, Reply};
use crate::error::{ClientError, Result};
use crate::topology::Topology;

pub(crate) const INVALIDATED: &str = "dyno_client.invalidated";
pub(crate) const FAILOVER: &str = "dyno_client.failover";
pub(crate) const ROUTING_EXHAUSTED: &str = "dyno_client.routing_exhausted";

impl<C: Connection> Topology<C> {
    /// Executes `command` on the first candidate of `key` that is valid and
    /// answers.
    ///
    /// Invalid entries are skipped without I/O. A connection-level failure
    /// invalidates the entry and moves on to the next rack. An error reply
    /// ends the walk as [`ClientError::Protocol`] and leaves the connection
    /// in place.
    pub fn dispatch(&self, key: &[u8], command: &Command) -> Result<Reply> {
        if self.is_unconfigured() {
            return Err(ClientError::DatacenterUnconfigured);
        }

        for (attempt, candidate) in self.walk(key).enumerate() {
            if attempt > 0 {
                counter!(FAILOVER).increment(1);
            }

            let mut guard = candidate.entry.lock();
            let Some(conn) = guard.connection() else {
                debug!(
                    datacenter = candidate.datacenter,
                    rack = candidate.rack,
                    slot = candidate.slot,
                    "skipping invalid entry"
                );
                continue;
            };

            match conn.execute(command) {
                Ok(Reply::Error(msg)) => return Err(ClientError::Protocol(msg)),
                Ok(reply) => return Ok(reply),
                Err(err) => {
                    warn!(
                        endpoint = %candidate.endpoint,
                        rack = candidate.rack,
                        command = %command.name(),
                        error = %err,
                        "connection failed, invalidating"
                    );
                    guard.invalidate();
                    counter!(INVALIDATED).increment(1);
                }
            }
        }

        counter!(ROUTING_EXHAUSTED).increment(1);
        warn!(command = %command.name(), "routing exhausted");
        Err(ClientError::RoutingExhausted)
    }
}
