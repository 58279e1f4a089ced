/// Decides when the ramp should advance, from a free-running millisecond clock.
///
/// The scheduler fires at most once per call. If the caller was busy and several intervals
/// passed, only one ramp step happens, so ramps stretch under load instead of catching up.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval_ms: u32,
    last_tick_ms: u32,
}

impl TickScheduler {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_tick_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Returns `true` if a tick is due at `now_ms`, and records it.
    ///
    /// `now_ms` may wrap around.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_tick_ms) < self.interval_ms {
            return false;
        }
        self.last_tick_ms = now_ms;
        true
    }
}
