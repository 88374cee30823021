//! Sleep capability.
//!
//! The handshake wait and the click hold are the only places the crate pauses. Both go
//! through [`Delay`] so tests can substitute [`RecordingDelay`] and run without
//! wall-clock waits.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

pub trait Delay: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returns immediately and remembers every requested duration.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Sum of all requested sleeps.
    pub fn elapsed(&self) -> Duration {
        self.calls().iter().sum()
    }
}

impl Delay for RecordingDelay {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(duration);
        }
    }
}

/// Fixed waits used by the protocol, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait between the discover write and the single reply read.
    pub handshake_wait_ms: u64,
    /// Hold between button down and button up in `click()`.
    pub click_hold_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            handshake_wait_ms: 500,
            click_hold_ms: 10,
        }
    }
}

impl Timing {
    #[inline]
    pub fn handshake_wait(&self) -> Duration {
        Duration::from_millis(self.handshake_wait_ms)
    }

    #[inline]
    pub fn click_hold(&self) -> Duration {
        Duration::from_millis(self.click_hold_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_delay_does_not_block() {
        let d = RecordingDelay::new();
        d.sleep(Duration::from_secs(3600));
        d.sleep(Duration::from_millis(10));
        assert_eq!(
            d.calls(),
            vec![Duration::from_secs(3600), Duration::from_millis(10)]
        );
        assert_eq!(d.elapsed(), Duration::from_millis(3_600_010));
    }
}
