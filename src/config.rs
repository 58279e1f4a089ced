use core::fmt;

use crate::Axis;

/// Ramp parameters for a single motor axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisConfig {
    /// Output ceiling; targets are clamped into `[-limit, limit]`.
    pub limit: i16,
    /// Maximum change of the output per tick.
    pub accel_step: i16,
    /// Magnitude the output jumps to when leaving rest.
    pub kick_start: i16,
}

impl AxisConfig {
    pub const fn new(limit: i16, accel_step: i16, kick_start: i16) -> Self {
        Self {
            limit,
            accel_step,
            kick_start,
        }
    }

    /// Reference tuning for the drive motor: gentle ramp, kick at about 50% duty.
    pub const THROTTLE: Self = Self::new(200, 5, 128);

    /// Reference tuning for the steering motor: sharper ramp and a slightly higher kick.
    pub const STEERING: Self = Self::new(250, 20, 150);

    /// Clamp a raw command into this axis' range.
    pub fn clamp(&self, raw: i32) -> i16 {
        let limit = i32::from(self.limit).abs();
        // The clamped value is within `i16` since `limit` is.
        raw.clamp(-limit, limit) as i16
    }

    fn validate(&self, axis: Axis, pwm_max: u16) -> Result<(), ConfigError> {
        if self.limit <= 0 || (self.limit as u16) > pwm_max {
            return Err(ConfigError::Limit { axis, limit: self.limit });
        }
        if self.accel_step <= 0 {
            return Err(ConfigError::AccelStep(axis));
        }
        if self.kick_start <= 0 {
            return Err(ConfigError::KickStart(axis));
        }
        if self.kick_start > self.limit {
            return Err(ConfigError::KickAboveLimit(axis));
        }
        Ok(())
    }
}

/// Complete configuration of the drive core.
///
/// The default is the reference tuning: 20 kHz, 8-bit PWM, a 10 ms ramp tick and a
/// one second command watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveConfig {
    pub throttle: AxisConfig,
    pub steering: AxisConfig,
    pub pwm_freq_hz: u32,
    pub pwm_resolution_bits: u8,
    pub tick_interval_ms: u32,
    /// Stop both axes if no command arrives within this window. `None` disables the watchdog.
    pub command_timeout_ms: Option<u32>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            throttle: AxisConfig::THROTTLE,
            steering: AxisConfig::STEERING,
            pwm_freq_hz: 20_000,
            pwm_resolution_bits: 8,
            tick_interval_ms: 10,
            command_timeout_ms: Some(1000),
        }
    }
}

impl DriveConfig {
    pub fn with_throttle(mut self, throttle: AxisConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_steering(mut self, steering: AxisConfig) -> Self {
        self.steering = steering;
        self
    }

    pub fn with_pwm(mut self, freq_hz: u32, resolution_bits: u8) -> Self {
        self.pwm_freq_hz = freq_hz;
        self.pwm_resolution_bits = resolution_bits;
        self
    }

    pub fn with_tick_interval_ms(mut self, interval: u32) -> Self {
        self.tick_interval_ms = interval;
        self
    }

    pub fn with_command_timeout_ms(mut self, timeout: Option<u32>) -> Self {
        self.command_timeout_ms = timeout;
        self
    }

    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Throttle => &self.throttle,
            Axis::Steering => &self.steering,
        }
    }

    /// Largest duty value of the PWM domain, `2^bits - 1`.
    pub fn pwm_max(&self) -> u16 {
        let bits = u32::from(self.pwm_resolution_bits.min(16));
        ((1u32 << bits) - 1) as u16
    }

    /// Check the configuration before any output is driven.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=16).contains(&self.pwm_resolution_bits) {
            return Err(ConfigError::Resolution(self.pwm_resolution_bits));
        }
        if self.pwm_freq_hz == 0 {
            return Err(ConfigError::Frequency);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        if self.command_timeout_ms == Some(0) {
            return Err(ConfigError::CommandTimeout);
        }

        let pwm_max = self.pwm_max();
        self.throttle.validate(Axis::Throttle, pwm_max)?;
        self.steering.validate(Axis::Steering, pwm_max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Limit { axis: Axis, limit: i16 },
    AccelStep(Axis),
    KickStart(Axis),
    KickAboveLimit(Axis),
    Resolution(u8),
    Frequency,
    TickInterval,
    CommandTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limit { axis, limit } => {
                write!(f, "{axis} limit {limit} is outside the PWM duty range")
            }
            Self::AccelStep(axis) => write!(f, "{axis} acceleration step must be positive"),
            Self::KickStart(axis) => write!(f, "{axis} kick start must be positive"),
            Self::KickAboveLimit(axis) => write!(f, "{axis} kick start exceeds its limit"),
            Self::Resolution(bits) => write!(f, "PWM resolution of {bits} bits is unsupported"),
            Self::Frequency => f.write_str("PWM frequency must be non-zero"),
            Self::TickInterval => f.write_str("ramp tick interval must be non-zero"),
            Self::CommandTimeout => f.write_str("command timeout must be non-zero"),
        }
    }
}
