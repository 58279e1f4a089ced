//! Ramped dual-motor drive for a small joystick-controlled vehicle.
//!
//! Targets arrive from the network through [`CommandIngress`], a fixed-rate tick moves each
//! axis toward its target with [`RampController`], and the result is written to a dual-input
//! H-bridge through [`Drive`].
//!
//! ```no_run
//! # use racer_drive::{Axis, Drive, DriveConfig, Targets, Vehicle};
//! # struct Motors;
//! # impl Drive for Motors { fn write_axis(&mut self, _: Axis, _: i16) {} }
//! # fn millis() -> u32 { 0 }
//! static TARGETS: Targets = Targets::new();
//!
//! let config = DriveConfig::default();
//! let mut vehicle = Vehicle::new(&config, &TARGETS, Motors, millis()).unwrap();
//! loop {
//!     vehicle.poll(millis());
//! }
//! ```
#![cfg_attr(not(test), no_std)]

use core::fmt;

pub mod config;
pub use config::{AxisConfig, ConfigError, DriveConfig};

pub mod control;
pub use control::{Outputs, RampController};

pub mod drive;
pub use drive::{AxisChannels, Drive, DriveError, HBridgeDrive};

pub mod ingress;
pub use ingress::{CommandIngress, Targets, Watchdog};

pub mod scheduler;
pub use scheduler::TickScheduler;

pub mod state;
pub use state::{Event, ProcessState, StateCell};

pub mod web;

/// One of the two motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Throttle,
    Steering,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Throttle, Axis::Steering];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::Throttle => "throttle",
            Axis::Steering => "steering",
        })
    }
}

/// The drive core: ramps the published targets onto the motors at a fixed rate.
pub struct Vehicle<'a, D> {
    pub drive: D,
    targets: &'a Targets,
    ramp: RampController,
    scheduler: TickScheduler,
    watchdog: Option<Watchdog>,
}

impl<'a, D> Vehicle<'a, D>
where
    D: Drive,
{
    /// Validate `config` and start from rest at `now_ms`.
    pub fn new(
        config: &DriveConfig,
        targets: &'a Targets,
        drive: D,
        now_ms: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut scheduler = TickScheduler::new(config.tick_interval_ms);
        scheduler.poll(now_ms);

        Ok(Self {
            drive,
            targets,
            ramp: RampController::new(config),
            scheduler,
            watchdog: config
                .command_timeout_ms
                .map(|timeout| Watchdog::new(timeout, targets, now_ms)),
        })
    }

    /// Run the watchdog and, if a tick is due, one ramp step.
    ///
    /// Call as often as possible from the main loop. Returns the new outputs if it ticked.
    pub fn poll(&mut self, now_ms: u32) -> Option<Outputs> {
        if let Some(watchdog) = self.watchdog.as_mut() {
            watchdog.check(self.targets, now_ms);
        }

        if !self.scheduler.poll(now_ms) {
            return None;
        }
        Some(self.tick())
    }

    /// Advance both axes one step and write them out, whether or not they changed.
    ///
    /// Ramps toward zero instead of the published targets while the watchdog is expired.
    pub fn tick(&mut self) -> Outputs {
        let expired = self.watchdog.as_ref().map_or(false, Watchdog::is_expired);
        let (throttle, steering) = if expired {
            (0, 0)
        } else {
            self.targets.load()
        };
        let outputs = self.ramp.tick(throttle, steering);

        for axis in Axis::ALL {
            self.drive.write_axis(axis, outputs.get(axis));
        }
        outputs
    }

    pub fn outputs(&self) -> Outputs {
        self.ramp.outputs()
    }

    pub fn ramp(&self) -> &RampController {
        &self.ramp
    }
}
