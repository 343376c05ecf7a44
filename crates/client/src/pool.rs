//! Connection pool entries.
//!
//! Every continuum slot owns one [`PoolEntry`]: a lock around an optional
//! connection. `Some` is the valid state and `None` the invalid one, so state
//! and handle always change together and a valid entry without a handle
//! cannot be represented.
//!
//! Whoever holds the lock owns the handle for the whole check-act sequence,
//! including any I/O on it. Closing swaps the handle out and drops it under
//! that same lock.

use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::connection::Connection;

/// Observed state of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Valid,
    Invalid,
    /// The entry lock was held by someone else when looked at.
    Busy,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotState::Valid => f.write_str("valid"),
            SlotState::Invalid => f.write_str("invalid"),
            SlotState::Busy => f.write_str("busy"),
        }
    }
}

/// One lockable connection slot. Starts invalid.
pub struct PoolEntry<C> {
    conn: Mutex<Option<C>>,
}

impl<C: Connection> PoolEntry<C> {
    pub fn new() -> Self {
        Self {
            conn: Mutex::new(None),
        }
    }

    /// Blocks until the entry is ours.
    pub fn lock(&self) -> PoolGuard<'_, C> {
        PoolGuard {
            slot: self.conn.lock(),
        }
    }

    /// State without waiting; [`SlotState::Busy`] if the lock is taken.
    pub fn state(&self) -> SlotState {
        match self.conn.try_lock() {
            Some(slot) if slot.is_some() => SlotState::Valid,
            Some(_) => SlotState::Invalid,
            None => SlotState::Busy,
        }
    }
}

impl<C: Connection> Default for PoolEntry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for PoolEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEntry")
            .field("locked", &self.conn.is_locked())
            .finish()
    }
}

/// Exclusive access to an entry's state and handle.
pub struct PoolGuard<'a, C: Connection> {
    slot: MutexGuard<'a, Option<C>>,
}

impl<'a, C: Connection> PoolGuard<'a, C> {
    pub fn is_valid(&self) -> bool {
        self.slot.is_some()
    }

    /// The live handle, if the entry is valid.
    pub fn connection(&mut self) -> Option<&mut C> {
        self.slot.as_mut()
    }

    /// Marks the entry valid with `conn`, closing any handle it replaces.
    pub fn install(&mut self, conn: C) {
        if let Some(mut old) = self.slot.replace(conn) {
            old.close();
        }
    }

    /// Marks the entry invalid and closes its handle. Returns whether there
    /// was a handle to close.
    pub fn invalidate(&mut self) -> bool {
        match self.slot.take() {
            Some(mut conn) => {
                conn.close();
                true
            }
            None => false,
        }
    }
}
