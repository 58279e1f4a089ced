/// Duty cycles for the two inputs of one H-bridge channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyPair {
    /// Duty on the input that turns the motor in the positive direction.
    pub positive: u16,
    /// Duty on the input that turns the motor in the negative direction.
    pub negative: u16,
}

impl DutyPair {
    /// Both inputs low: the motor freewheels.
    pub const COAST: Self = Self {
        positive: 0,
        negative: 0,
    };
}

/// Calculate the input duties for a signed speed.
///
/// Positive speeds drive the positive input, negative speeds the negative input and zero
/// leaves both low (coast, not brake).
pub fn duty_pair(speed: i16) -> DutyPair {
    let duty = speed.unsigned_abs();
    match speed {
        s if s > 0 => DutyPair {
            positive: duty,
            negative: 0,
        },
        s if s < 0 => DutyPair {
            positive: 0,
            negative: duty,
        },
        _ => DutyPair::COAST,
    }
}

/// Map a duty from the configured domain `[0, domain_max]` onto `[0, max_duty]`.
///
/// Duties above `domain_max` saturate at `max_duty`.
pub fn scale_duty(duty: u16, domain_max: u16, max_duty: u32) -> u32 {
    if domain_max == 0 {
        return 0;
    }
    let duty = u32::from(duty.min(domain_max));
    let domain_max = u32::from(domain_max);
    if max_duty == domain_max {
        duty
    } else {
        // Round to nearest
        ((u64::from(duty) * u64::from(max_duty) + u64::from(domain_max) / 2)
            / u64::from(domain_max)) as u32
    }
}
