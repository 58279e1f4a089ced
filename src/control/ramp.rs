use crate::config::AxisConfig;

/// Where a ramp is relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampState {
    AtRest,
    Ramping,
    AtTarget,
}

/// Rate limited output for one motor axis.
///
/// A zero target stops the output on the same tick. Leaving rest jumps straight to the
/// kick-start magnitude (never past the target), after which the output moves by at most
/// `accel_step` per tick.
///
/// A target of the opposite sign first ramps the output down and lands on zero for one tick
/// before kicking off in the new direction.
#[derive(Debug, Clone)]
pub struct Ramp {
    accel_step: i16,
    kick_start: i16,
    current: i16,
    target: i16,
}

impl Ramp {
    pub fn new(config: &AxisConfig) -> Self {
        Self {
            accel_step: config.accel_step,
            kick_start: config.kick_start,
            current: 0,
            target: 0,
        }
    }

    pub fn current(&self) -> i16 {
        self.current
    }

    /// Target seen on the last tick.
    pub fn target(&self) -> i16 {
        self.target
    }

    pub fn state(&self) -> RampState {
        if self.current == 0 {
            RampState::AtRest
        } else if self.current == self.target {
            RampState::AtTarget
        } else {
            RampState::Ramping
        }
    }

    /// Advance the output one tick toward `target` and return it.
    ///
    /// `target` must already be clamped into the axis range.
    pub fn step(&mut self, target: i16) -> i16 {
        self.target = target;

        self.current = if target == 0 {
            0
        } else if self.current == 0 {
            // Kick off from rest, but never past a small target
            let kick = target.signum() * self.kick_start;
            if kick.abs() > target.abs() {
                target
            } else {
                kick
            }
        } else if self.current.signum() != target.signum() {
            // Reversal: slow down to a standstill first
            if self.current.abs() > self.accel_step {
                self.current - self.current.signum() * self.accel_step
            } else {
                0
            }
        } else {
            let distance = i32::from(target) - i32::from(self.current);
            if distance.abs() > i32::from(self.accel_step) {
                self.current + distance.signum() as i16 * self.accel_step
            } else {
                target
            }
        };

        self.current
    }

    /// Drop the output to zero immediately.
    pub fn reset(&mut self) {
        self.current = 0;
        self.target = 0;
    }
}
