use core::fmt;

use embedded_hal::{digital::v2::OutputPin, Pwm};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::{
    config::{ConfigError, DriveConfig},
    control::{duty_pair, pwm::scale_duty, DutyPair},
    Axis,
};

/// Writes signed axis outputs to the motors.
pub trait Drive {
    /// Drive `axis` at `speed`, in `[-domain_max, domain_max]`.
    fn write_axis(&mut self, axis: Axis, speed: i16);
}

/// The two PWM channels feeding one H-bridge.
#[derive(Debug, Clone)]
pub struct AxisChannels<C> {
    pub positive: C,
    pub negative: C,
}

impl<C> AxisChannels<C> {
    pub fn new(positive: C, negative: C) -> Self {
        Self { positive, negative }
    }

    /// Swap directions, for motors wired the other way around.
    pub fn reversed(self) -> Self {
        Self {
            positive: self.negative,
            negative: self.positive,
        }
    }
}

/// Dual-input H-bridge drive (DRV8833 style) for both axes on one PWM peripheral.
pub struct HBridgeDrive<T, C> {
    pub pwm: T,
    pub throttle: AxisChannels<C>,
    pub steering: AxisChannels<C>,
    domain_max: u16,
    max_duty: u32,
}

impl<T, C> HBridgeDrive<T, C>
where
    T: Pwm<Channel = C>,
    T::Duty: FromPrimitive + ToPrimitive,
    C: Clone,
{
    /// Enable all four channels and leave the motors coasting.
    ///
    /// Speeds are in the duty domain of `config`, `2^resolution - 1`. The peripheral must
    /// already run at `config.pwm_freq_hz`; its timer type is HAL specific.
    pub fn new(
        mut pwm: T,
        throttle: AxisChannels<C>,
        steering: AxisChannels<C>,
        config: &DriveConfig,
    ) -> Result<Self, DriveError> {
        config.validate()?;
        let domain_max = config.pwm_max();
        let max_duty = pwm
            .get_max_duty()
            .to_u32()
            .filter(|max| *max > 0)
            .ok_or(DriveError::MaxDuty)?;

        for channel in [&throttle, &steering]
            .into_iter()
            .flat_map(|axis| [axis.positive.clone(), axis.negative.clone()])
        {
            pwm.enable(channel);
        }

        let mut drive = Self {
            pwm,
            throttle,
            steering,
            domain_max,
            max_duty,
        };
        drive.write_axis(Axis::Throttle, 0);
        drive.write_axis(Axis::Steering, 0);

        log::info!(
            "h-bridge drive ready: {} Hz, duty domain {}, peripheral max {}",
            config.pwm_freq_hz,
            domain_max,
            max_duty
        );
        Ok(drive)
    }

    /// Write a duty pair to the channels of `axis`.
    pub fn write_duties(&mut self, axis: Axis, duties: DutyPair) {
        let positive = self.duty(duties.positive);
        let negative = self.duty(duties.negative);

        let channels = match axis {
            Axis::Throttle => &self.throttle,
            Axis::Steering => &self.steering,
        };
        self.pwm.set_duty(channels.positive.clone(), positive);
        self.pwm.set_duty(channels.negative.clone(), negative);
    }

    fn duty(&self, duty: u16) -> T::Duty {
        let raw = scale_duty(duty, self.domain_max, self.max_duty);
        // `raw` never exceeds the peripheral max, which came from a `T::Duty`
        T::Duty::from_u32(raw)
            .or_else(|| T::Duty::from_u32(self.max_duty))
            .unwrap_or_else(|| self.pwm.get_max_duty())
    }
}

impl<T, C> Drive for HBridgeDrive<T, C>
where
    T: Pwm<Channel = C>,
    T::Duty: FromPrimitive + ToPrimitive,
    C: Clone,
{
    fn write_axis(&mut self, axis: Axis, speed: i16) {
        self.write_duties(axis, duty_pair(speed));
    }
}

/// Drive the driver's sleep line high so the bridges accept PWM.
pub fn wake<P: OutputPin>(nsleep: &mut P) -> Result<(), DriveError> {
    nsleep.set_high().map_err(|_| DriveError::WakePin)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveError {
    Config(ConfigError),
    /// The PWM peripheral reported a zero max duty.
    MaxDuty,
    /// The sleep line of the motor driver could not be driven.
    WakePin,
}

impl From<ConfigError> for DriveError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl fmt::Display for DriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid drive configuration: {e}"),
            Self::MaxDuty => f.write_str("PWM peripheral has no duty range"),
            Self::WakePin => f.write_str("failed to wake the motor driver"),
        }
    }
}
