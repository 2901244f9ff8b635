// Clock port: wall-clock millis used to time command executions

/// Source of the current time, swappable in tests
pub trait TimeProvider: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;

    /// Milliseconds elapsed since `start`, zero if the clock stepped back
    fn elapsed_since(&self, start: i64) -> u64 {
        u64::try_from(self.now_millis().saturating_sub(start)).unwrap_or(0)
    }
}

/// Wall clock
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock moving forward by a fixed step on every read
    pub struct SteppingClock {
        now: AtomicI64,
        step: i64,
    }

    impl SteppingClock {
        pub fn new(start: i64, step: i64) -> Self {
            Self {
                now: AtomicI64::new(start),
                step,
            }
        }
    }

    impl TimeProvider for SteppingClock {
        fn now_millis(&self) -> i64 {
            self.now.fetch_add(self.step, Ordering::SeqCst)
        }
    }
}
