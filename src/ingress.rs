//! Hand-off of target speeds from the network handler to the ramp tick.
//!
//! Every value shared between the two contexts is a single word written with a plain atomic
//! store, so no read-modify-write ever races and no lock is needed. This also holds on cores
//! without atomic compare-and-swap such as the ESP32-C3.

use core::sync::atomic::{AtomicI16, AtomicU32, Ordering};

use crate::{
    config::{AxisConfig, DriveConfig},
    Axis,
};

/// Latest target speed of each axis.
pub struct Targets {
    throttle: AtomicI16,
    steering: AtomicI16,
    /// Bumped on every accepted command.
    sequence: AtomicU32,
}

impl Targets {
    pub const fn new() -> Self {
        Self {
            throttle: AtomicI16::new(0),
            steering: AtomicI16::new(0),
            sequence: AtomicU32::new(0),
        }
    }

    pub fn get(&self, axis: Axis) -> i16 {
        match axis {
            Axis::Throttle => self.throttle.load(Ordering::Relaxed),
            Axis::Steering => self.steering.load(Ordering::Relaxed),
        }
    }

    /// Throttle and steering targets.
    pub fn load(&self) -> (i16, i16) {
        (self.get(Axis::Throttle), self.get(Axis::Steering))
    }

    /// Number of commands accepted so far, wrapping.
    pub fn sequence(&self) -> u32 {
        self.sequence.load(Ordering::Acquire)
    }

    fn store(&self, throttle: i16, steering: i16) {
        self.throttle.store(throttle, Ordering::Relaxed);
        self.steering.store(steering, Ordering::Relaxed);
    }
}

impl Default for Targets {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps raw commands into each axis' range and publishes them.
///
/// There must be only one ingress per [`Targets`]; it is the sole writer of the command
/// sequence.
pub struct CommandIngress<'a> {
    targets: &'a Targets,
    throttle: AxisConfig,
    steering: AxisConfig,
}

impl<'a> CommandIngress<'a> {
    pub fn new(targets: &'a Targets, config: &DriveConfig) -> Self {
        Self {
            targets,
            throttle: config.throttle,
            steering: config.steering,
        }
    }

    pub fn targets(&self) -> &'a Targets {
        self.targets
    }

    /// Clamp and publish new targets, returning the values that were stored.
    pub fn set_targets(&self, raw_throttle: i32, raw_steering: i32) -> (i16, i16) {
        let throttle = self.throttle.clamp(raw_throttle);
        let steering = self.steering.clamp(raw_steering);

        self.targets.store(throttle, steering);
        let sequence = self.targets.sequence.load(Ordering::Relaxed);
        self.targets
            .sequence
            .store(sequence.wrapping_add(1), Ordering::Release);

        log::debug!("targets: throttle {}, steering {}", throttle, steering);
        (throttle, steering)
    }
}

/// Detects when commands stop arriving.
///
/// A browser that loses its connection mid-drag never sends the final stop, so without this
/// the vehicle would keep its last command indefinitely. The watchdog only reads [`Targets`];
/// while it is expired the tick ramps toward zero instead of the published targets, and the
/// next accepted command clears it.
pub struct Watchdog {
    timeout_ms: u32,
    seen: u32,
    last_command_ms: u32,
    expired: bool,
}

impl Watchdog {
    pub fn new(timeout_ms: u32, targets: &Targets, now_ms: u32) -> Self {
        Self {
            timeout_ms,
            seen: targets.sequence(),
            last_command_ms: now_ms,
            expired: false,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Returns `true` while no command has arrived within the timeout.
    pub fn check(&mut self, targets: &Targets, now_ms: u32) -> bool {
        let sequence = targets.sequence();
        if sequence != self.seen {
            self.seen = sequence;
            self.last_command_ms = now_ms;
            self.expired = false;
            return false;
        }

        let silent_ms = now_ms.wrapping_sub(self.last_command_ms);
        if !self.expired && silent_ms >= self.timeout_ms {
            self.expired = true;
            if targets.load() != (0, 0) {
                log::warn!("no command for {} ms, stopping motors", silent_ms);
            }
        }
        self.expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_per_axis() {
        let targets = Targets::new();
        let ingress = CommandIngress::new(&targets, &DriveConfig::default());

        assert_eq!(ingress.set_targets(255, -255), (200, -250));
        assert_eq!(targets.load(), (200, -250));

        assert_eq!(ingress.set_targets(-17, 42), (-17, 42));
        assert_eq!(targets.get(Axis::Throttle), -17);
        assert_eq!(targets.get(Axis::Steering), 42);
    }

    #[test]
    fn clamping_is_idempotent() {
        let targets = Targets::new();
        let ingress = CommandIngress::new(&targets, &DriveConfig::default());

        for (x, y) in [(1000, -1000), (-201, 251), (12, -3), (i32::MAX, i32::MIN)] {
            let once = ingress.set_targets(x, y);
            let twice = ingress.set_targets(i32::from(once.0), i32::from(once.1));
            assert_eq!(once, twice);
            assert_eq!(targets.load(), once);
        }
    }

    #[test]
    fn counts_commands() {
        let targets = Targets::new();
        let ingress = CommandIngress::new(&targets, &DriveConfig::default());

        ingress.set_targets(0, 0);
        ingress.set_targets(0, 0);
        assert_eq!(targets.sequence(), 2);
    }

    #[test]
    fn watchdog_expires_without_touching_targets() {
        let targets = Targets::new();
        let ingress = CommandIngress::new(&targets, &DriveConfig::default());
        let mut watchdog = Watchdog::new(1000, &targets, 0);

        ingress.set_targets(150, 30);
        assert!(!watchdog.check(&targets, 100));
        assert!(!watchdog.check(&targets, 1099));
        assert!(watchdog.check(&targets, 1100));
        assert_eq!(targets.load(), (150, 30));
        assert_eq!(targets.sequence(), 1);

        // Stays expired until the next command
        assert!(watchdog.check(&targets, 5000));
        assert!(watchdog.is_expired());

        ingress.set_targets(80, 0);
        assert!(!watchdog.check(&targets, 5010));
        assert!(!watchdog.is_expired());
        assert_eq!(targets.load(), (80, 0));
    }

    #[test]
    fn watchdog_fed_by_commands() {
        let targets = Targets::new();
        let ingress = CommandIngress::new(&targets, &DriveConfig::default());
        let mut watchdog = Watchdog::new(500, &targets, u32::MAX - 200);

        for step in 0..20u32 {
            ingress.set_targets(100, 0);
            let now = (u32::MAX - 200).wrapping_add(step * 100);
            assert!(!watchdog.check(&targets, now));
        }
        assert_eq!(targets.load(), (100, 0));
    }
}
