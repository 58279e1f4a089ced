use core::{
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

/// Lifecycle of the device, from Wi-Fi provisioning to accepting drive commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ProcessState {
    /// Configuration portal is up, waiting for credentials.
    Provisioning = 0,
    /// Joined a network, services not started yet.
    Connected = 1,
    /// Web server is up and drive commands are accepted.
    Running = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Joined a network as a station.
    Associated,
    /// Name resolution, firmware update and web server are up.
    ServicesStarted,
    /// Station connection failed or dropped; the portal is back.
    LinkLost,
}

impl ProcessState {
    pub fn next(self, event: Event) -> Result<Self, TransitionError> {
        match (self, event) {
            (Self::Provisioning, Event::Associated) => Ok(Self::Connected),
            (Self::Connected, Event::ServicesStarted) => Ok(Self::Running),
            (Self::Connected | Self::Running, Event::LinkLost) => Ok(Self::Provisioning),
            (from, event) => Err(TransitionError { from, event }),
        }
    }

    pub fn accepts_commands(self) -> bool {
        self == Self::Running
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            2 => Self::Running,
            1 => Self::Connected,
            _ => Self::Provisioning,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Provisioning => "provisioning",
            Self::Connected => "connected",
            Self::Running => "running",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransitionError {
    pub from: ProcessState,
    pub event: Event,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {:?} is not valid while {}", self.event, self.from)
    }
}

/// Process state shared with the network layer, which only reads it.
///
/// Transitions are applied from the setup/main context alone.
pub struct StateCell {
    state: AtomicU8,
}

impl StateCell {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ProcessState::Provisioning as u8),
        }
    }

    pub fn get(&self) -> ProcessState {
        ProcessState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn apply(&self, event: Event) -> Result<ProcessState, TransitionError> {
        let from = self.get();
        let to = from.next(event)?;
        self.state.store(to as u8, Ordering::Release);
        log::info!("state: {} -> {}", from, to);
        Ok(to)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
