//! Target architectures and saved-register sets.

use std::fmt;
use std::str::FromStr;

use super::Address;
use crate::error::InspectError;

/// CPU architecture of the inspected target
///
/// The kernel saves a different context frame per architecture, so the
/// architecture decides how a thread's stack pointer is turned into registers.
/// It is probed once per session (see [`crate::frame::detect_architecture`])
/// or forced through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// RISC-V (RV32/RV64), 32 integer registers x0-x31
    RiscV,
    /// ARM Cortex-M (Thumb), 16 core registers r0-r15
    ArmThumb,
}

/// ABI names of the RISC-V integer registers, indexed by x-number
const RISCV_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7",
    "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6",
];

/// Names of the ARM core registers, indexed by r-number
const ARM_NAMES: [&str; 16] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "sp", "lr", "pc",
];

impl Architecture
{
    /// Number of general-purpose register slots
    pub const fn register_count(self) -> usize
    {
        match self {
            Architecture::RiscV => RISCV_NAMES.len(),
            Architecture::ArmThumb => ARM_NAMES.len(),
        }
    }

    /// Register number of the stack pointer (x2 / r13)
    pub const fn sp_index(self) -> usize
    {
        match self {
            Architecture::RiscV => 2,
            Architecture::ArmThumb => 13,
        }
    }

    /// ABI name of a general-purpose register
    ///
    /// ```rust
    /// use mdsview_core::types::Architecture;
    ///
    /// assert_eq!(Architecture::RiscV.register_name(10), Some("a0"));
    /// assert_eq!(Architecture::ArmThumb.register_name(14), Some("lr"));
    /// assert_eq!(Architecture::ArmThumb.register_name(16), None);
    /// ```
    pub fn register_name(self, index: usize) -> Option<&'static str>
    {
        match self {
            Architecture::RiscV => RISCV_NAMES.get(index).copied(),
            Architecture::ArmThumb => ARM_NAMES.get(index).copied(),
        }
    }

    /// Name of the status register exposed alongside the general registers
    pub const fn status_name(self) -> &'static str
    {
        match self {
            Architecture::RiscV => "mstatus",
            Architecture::ArmThumb => "xpsr",
        }
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Architecture::RiscV => write!(f, "RISC-V"),
            Architecture::ArmThumb => write!(f, "ARM Thumb"),
        }
    }
}

impl FromStr for Architecture
{
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "riscv" | "risc-v" | "rv32" | "rv64" => Ok(Architecture::RiscV),
            "arm" | "thumb" | "arm-thumb" | "cortex-m" => Ok(Architecture::ArmThumb),
            other => Err(InspectError::InvalidArgument(format!(
                "unknown architecture '{other}' (expected riscv or arm)"
            ))),
        }
    }
}

/// Identifier for a register within a [`RegisterSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterId
{
    /// Program counter at the time the thread was switched out
    Pc,
    /// Stack pointer before the context was pushed
    Sp,
    /// Status register (`mstatus` on RISC-V, `xPSR` on ARM)
    Status,
    /// General-purpose register by architecture number (x-number / r-number)
    General(u8),
}

/// Registers recovered from a thread's saved context
///
/// `general` is indexed by architecture register number and always has
/// [`Architecture::register_count`] slots. A slot is `None` when the saved
/// frame does not define it (for example `gp` when the live core register is
/// unavailable).
///
/// ```rust
/// use mdsview_core::types::{Address, Architecture, RegisterId, RegisterSet};
///
/// let mut regs = RegisterSet::new(Architecture::ArmThumb);
/// regs.set(RegisterId::General(0), 0x1234);
/// assert_eq!(regs.get(RegisterId::General(0)), Some(0x1234));
/// assert_eq!(regs.get(RegisterId::General(1)), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSet
{
    /// Program counter
    pub pc: Address,
    /// Stack pointer (mirrors the architecture's sp slot in `general`)
    pub sp: Address,
    /// Status register
    pub status: u64,
    /// General-purpose registers, indexed by register number
    pub general: Vec<Option<u64>>,
    architecture: Architecture,
}

impl RegisterSet
{
    /// Create an empty register set with every slot unset
    pub fn new(architecture: Architecture) -> Self
    {
        Self {
            pc: Address::ZERO,
            sp: Address::ZERO,
            status: 0,
            general: vec![None; architecture.register_count()],
            architecture,
        }
    }

    /// Architecture this register set was decoded for
    pub fn architecture(&self) -> Architecture
    {
        self.architecture
    }

    /// Get the value of a register, `None` when the slot is unset or out of range
    pub fn get(&self, id: RegisterId) -> Option<u64>
    {
        match id {
            RegisterId::Pc => Some(self.pc.value()),
            RegisterId::Sp => Some(self.sp.value()),
            RegisterId::Status => Some(self.status),
            RegisterId::General(idx) => self.general.get(usize::from(idx)).copied().flatten(),
        }
    }

    /// Set the value of a register
    ///
    /// Returns `None` if a general register number is out of range for the
    /// architecture. Setting the sp slot also updates [`RegisterSet::sp`].
    pub fn set(&mut self, id: RegisterId, value: u64) -> Option<()>
    {
        match id {
            RegisterId::Pc => self.pc = Address::from(value),
            RegisterId::Sp => {
                self.sp = Address::from(value);
                let sp_index = self.architecture.sp_index();
                self.general[sp_index] = Some(value);
            }
            RegisterId::Status => self.status = value,
            RegisterId::General(idx) => {
                let slot = self.general.get_mut(usize::from(idx))?;
                *slot = Some(value);
                if usize::from(idx) == self.architecture.sp_index() {
                    self.sp = Address::from(value);
                }
            }
        }
        Some(())
    }

    /// Iterate `(name, value)` pairs over the general registers in number order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, Option<u64>)> + '_
    {
        self.general
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| Some((self.architecture.register_name(idx)?, *value)))
    }
}
