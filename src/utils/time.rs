use crate::error::{BlockchainError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of block timestamps. Minting takes a clock so tests can pin time.
pub trait Clock: Send + Sync {
    /// Current time in whole seconds since the unix epoch
    fn now(&self) -> Result<i64>;
}

/// Wall clock backed by `SystemTime`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<i64> {
        current_timestamp()
    }
}

pub fn current_timestamp() -> Result<i64> {
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| BlockchainError::Clock(format!("System time error: {e}")))?
        .as_secs();

    i64::try_from(duration).map_err(|_| BlockchainError::Clock("Timestamp overflow".to_string()))
}
