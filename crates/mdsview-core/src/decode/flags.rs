//! Bitflag decoding for thread state, device flags and timer flags.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// `MDS_Thread_t.state`
    ///
    /// The low nibble is an enumerated run state, not a set of flags; see
    /// [`ThreadState::run_state`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ThreadState: u8
    {
        const STATE_MASK = 0x0F;
        const YIELD = 0x80;
    }
}

bitflags! {
    /// `MDS_Device_t.flags`, the kind and open state of a device
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceFlags: u8
    {
        const PERIPHERAL = 0x01;
        const ADAPTER = 0x02;
        const MODULE = 0x04;
        const OPENED = 0x80;
    }
}

bitflags! {
    /// `MDS_Timer_t.flags`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TimerFlags: u8
    {
        const PERIOD = 0x01;
        const SYSTEM = 0x08;
        const ACTIVE = 0x80;
    }
}

/// Scheduler state held in the low nibble of [`ThreadState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState
{
    Inactive,
    Ready,
    Running,
    Terminated,
    Blocking,
    Unknown,
}

impl ThreadState
{
    /// Decode the run state from the low nibble
    pub fn run_state(self) -> RunState
    {
        match self.bits() & Self::STATE_MASK.bits() {
            0x00 => RunState::Inactive,
            0x01 => RunState::Ready,
            0x02 => RunState::Running,
            0x03 => RunState::Terminated,
            0x04 => RunState::Blocking,
            _ => RunState::Unknown,
        }
    }
}

impl fmt::Display for RunState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            RunState::Inactive => "Inactive",
            RunState::Ready => "Ready",
            RunState::Running => "Running",
            RunState::Terminated => "Terminated",
            RunState::Blocking => "Blocking",
            RunState::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// `Yield|Ready`, `Blocking`, ...
impl fmt::Display for ThreadState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.contains(Self::YIELD) {
            f.write_str("Yield|")?;
        }
        write!(f, "{}", self.run_state())
    }
}

/// Device category, from the first flag set in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind
{
    Module,
    Adapter,
    Peripheral,
    Unknown,
}

impl DeviceFlags
{
    /// Category by priority `MODULE > ADAPTER > PERIPHERAL`, never more than one
    pub fn kind(self) -> DeviceKind
    {
        if self.contains(Self::MODULE) {
            DeviceKind::Module
        } else if self.contains(Self::ADAPTER) {
            DeviceKind::Adapter
        } else if self.contains(Self::PERIPHERAL) {
            DeviceKind::Peripheral
        } else {
            DeviceKind::Unknown
        }
    }
}

impl fmt::Display for DeviceKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            DeviceKind::Module => "Module",
            DeviceKind::Adapter => "Adapter",
            DeviceKind::Peripheral => "Peripheral",
            DeviceKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// `Opened|Module`, `Closed|Unknown`, ...
impl fmt::Display for DeviceFlags
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let open = if self.contains(Self::OPENED) { "Opened" } else { "Closed" };
        write!(f, "{open}|{}", self.kind())
    }
}

/// `Active|System|Period`, `Inactive`, ...
impl fmt::Display for TimerFlags
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(if self.contains(Self::ACTIVE) { "Active" } else { "Inactive" })?;
        if self.contains(Self::SYSTEM) {
            f.write_str("|System")?;
        }
        if self.contains(Self::PERIOD) {
            f.write_str("|Period")?;
        }
        Ok(())
    }
}
