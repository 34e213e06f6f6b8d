//! Shared access to the single store connection with a bounded wait.

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use super::{Database, DbError, DbResult};

/// How often a waiting caller re-checks the connection.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Hands the connection to one operation at a time.
///
/// Waiting is bounded by `lock_timeout`; a caller that cannot get the
/// connection in time gets [`DbError::Timeout`] instead of hanging.
pub struct Gateway {
    db: Mutex<Database>,
    lock_timeout: Duration,
}

impl Gateway {
    pub fn new(db: Database, lock_timeout: Duration) -> Self {
        Self {
            db: Mutex::new(db),
            lock_timeout,
        }
    }

    /// Borrow the connection for one operation.
    pub fn acquire(&self) -> DbResult<MutexGuard<'_, Database>> {
        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match self.db.try_lock() {
                Ok(guard) => return Ok(guard),
                // A panicking operation never committed; its transaction was
                // rolled back on unwind, so the connection is still sound.
                Err(TryLockError::Poisoned(poisoned)) => {
                    tracing::warn!("recovering store connection after a panicked operation");
                    self.db.clear_poison();
                    return Ok(poisoned.into_inner());
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        tracing::warn!(
                            timeout_ms = self.lock_timeout.as_millis() as u64,
                            "timed out waiting for the store connection"
                        );
                        return Err(DbError::Timeout(format!(
                            "store connection busy for more than {} ms",
                            self.lock_timeout.as_millis()
                        )));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL);
                }
            }
        }
    }
}
