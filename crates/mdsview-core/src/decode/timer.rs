//! Timer decoding.

use super::flags::TimerFlags;
use super::format::SymbolRef;
use super::{Decoder, PayloadRow};
use crate::error::Result;
use crate::oracle::MemoryOracle;
use crate::types::Address;

/// `MDS_Timer_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerInfo
{
    pub flags: TimerFlags,
    pub entry: SymbolRef,
    pub arg: SymbolRef,
    pub tick_start: u64,
    pub tick_limit: u64,
}

impl PayloadRow for TimerInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![
            self.flags.to_string(),
            self.entry.to_string(),
            self.arg.to_string(),
            self.tick_start.to_string(),
            self.tick_limit.to_string(),
        ]
    }
}

impl<O: MemoryOracle + ?Sized> Decoder<'_, O>
{
    pub(crate) fn timer(&self, timer: Address) -> Result<TimerInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().timer;
        let entry = reader.read_address(timer, &layout.entry)?;
        let arg = reader.read_address(timer, &layout.arg)?;

        Ok(TimerInfo {
            flags: TimerFlags::from_bits_retain(reader.read(timer, &layout.flags)? as u8),
            entry: self.symbol(entry)?,
            arg: self.symbol(arg)?,
            tick_start: reader.read(timer, &layout.tick_start)?,
            tick_limit: reader.read(timer, &layout.tick_limit)?,
        })
    }
}
