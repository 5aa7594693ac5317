//! Thread decoding.
//!
//! A thread row shows where its saved context sits relative to its stack:
//! `StackBase` carries `sp - base` and `StackLimit` carries `limit - sp`,
//! where `limit = base + size`. Both are signed so a smashed stack shows up
//! as a negative offset instead of a huge unsigned one.

use super::flags::ThreadState;
use super::format::{stack_cell, SymbolRef};
use super::{Decoder, PayloadRow};
use crate::error::Result;
use crate::oracle::MemoryOracle;
use crate::types::Address;

/// `MDS_Thread_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo
{
    pub entry: SymbolRef,
    pub state: ThreadState,
    /// Saved stack pointer; also the context pointer for register decoding
    pub stack_point: Address,
    pub stack_base: Address,
    pub stack_size: u64,
    pub init_prio: u8,
    pub curr_prio: u8,
    pub init_tick: u64,
    pub remain_tick: u64,
}

impl ThreadInfo
{
    /// One past the highest stack address
    pub fn stack_limit(&self) -> Address
    {
        self.stack_base + self.stack_size
    }

    /// `curr`, or `init->curr` while the priority is inherited or boosted
    pub fn priority(&self) -> String
    {
        if self.init_prio == self.curr_prio {
            self.curr_prio.to_string()
        } else {
            format!("{}->{}", self.init_prio, self.curr_prio)
        }
    }

    /// `remain/init`
    pub fn ticks(&self) -> String
    {
        format!("{}/{}", self.remain_tick, self.init_tick)
    }
}

impl PayloadRow for ThreadInfo
{
    fn cells(&self) -> Vec<String>
    {
        let limit = self.stack_limit();
        vec![
            self.entry.to_string(),
            self.state.to_string(),
            self.stack_point.to_string(),
            stack_cell(self.stack_base, self.stack_point.offset_from(self.stack_base)),
            stack_cell(limit, limit.offset_from(self.stack_point)),
            self.priority(),
            self.ticks(),
        ]
    }

    fn warning(&self) -> Option<String>
    {
        let inside = self.stack_point >= self.stack_base && self.stack_point <= self.stack_limit();
        (!inside).then(|| "stack pointer outside thread stack".to_string())
    }

    fn context(&self) -> Option<Address>
    {
        Some(self.stack_point)
    }
}

impl<O: MemoryOracle + ?Sized> Decoder<'_, O>
{
    pub(crate) fn thread(&self, thread: Address) -> Result<ThreadInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().thread;
        let entry = reader.read_address(thread, &layout.entry)?;

        Ok(ThreadInfo {
            entry: self.symbol(entry)?,
            state: ThreadState::from_bits_retain(reader.read(thread, &layout.state)? as u8),
            stack_point: reader.read_address(thread, &layout.stack_point)?,
            stack_base: reader.read_address(thread, &layout.stack_base)?,
            stack_size: reader.read(thread, &layout.stack_size)?,
            init_prio: reader.read(thread, &layout.init_prio)? as u8,
            curr_prio: reader.read(thread, &layout.curr_prio)? as u8,
            init_tick: reader.read(thread, &layout.init_tick)?,
            remain_tick: reader.read(thread, &layout.remain_tick)?,
        })
    }
}
