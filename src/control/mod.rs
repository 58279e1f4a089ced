use crate::{config::DriveConfig, Axis};

pub mod pwm;
pub use pwm::{duty_pair, DutyPair};

mod ramp;
pub use ramp::{Ramp, RampState};

/// Signed outputs of both axes after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outputs {
    pub throttle: i16,
    pub steering: i16,
}

impl Outputs {
    pub fn get(&self, axis: Axis) -> i16 {
        match axis {
            Axis::Throttle => self.throttle,
            Axis::Steering => self.steering,
        }
    }
}

/// Ramps both axes of the vehicle, each with its own tuning.
pub struct RampController {
    throttle: Ramp,
    steering: Ramp,
}

impl RampController {
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            throttle: Ramp::new(&config.throttle),
            steering: Ramp::new(&config.steering),
        }
    }

    pub fn ramp(&self, axis: Axis) -> &Ramp {
        match axis {
            Axis::Throttle => &self.throttle,
            Axis::Steering => &self.steering,
        }
    }

    pub fn outputs(&self) -> Outputs {
        Outputs {
            throttle: self.throttle.current(),
            steering: self.steering.current(),
        }
    }

    /// Advance both axes one tick toward the given targets.
    ///
    /// Targets are trusted to be clamped into each axis' range already.
    pub fn tick(&mut self, throttle: i16, steering: i16) -> Outputs {
        let before = self.outputs();
        let outputs = Outputs {
            throttle: self.throttle.step(throttle),
            steering: self.steering.step(steering),
        };
        if outputs != before {
            log::trace!(
                "ramp: throttle {}/{}, steering {}/{}",
                outputs.throttle,
                throttle,
                outputs.steering,
                steering
            );
        }
        outputs
    }

    pub fn reset(&mut self) {
        self.throttle.reset();
        self.steering.reset();
    }
}
