/// Clock abstraction for dependency injection and testing
///
/// Wall-clock milliseconds are used (not `Instant`) because key timestamps
/// and the last-used-server time are persisted across process restarts.
pub trait ClockTrait: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Production clock implementation using system time
#[derive(Default)]
pub struct SystemClock;

impl ClockTrait for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
