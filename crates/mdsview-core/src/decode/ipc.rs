//! Synchronization and messaging objects.
//!
//! Each of these owns one or two wait lists: circular lists threaded through
//! the waiting threads' scheduling `node`. The decoders report the waiters
//! as thread addresses, in queue order.

use super::format::address_list;
use super::{Decoder, PayloadRow, WaitList};
use crate::error::Result;
use crate::oracle::MemoryOracle;
use crate::types::Address;

/// `MDS_Semaphore_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemaphoreInfo
{
    pub value: u64,
    pub max: u64,
    pub waiters: WaitList,
}

impl PayloadRow for SemaphoreInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![self.value.to_string(), self.max.to_string(), address_list(&self.waiters)]
    }

    fn warning(&self) -> Option<String>
    {
        (self.value > self.max).then(|| format!("count {} exceeds max {}", self.value, self.max))
    }
}

/// `MDS_Mutex_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutexInfo
{
    pub value: u8,
    pub nest: u16,
    pub owner: Address,
    pub waiters: WaitList,
}

impl PayloadRow for MutexInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![
            self.value.to_string(),
            self.nest.to_string(),
            self.owner.to_string(),
            address_list(&self.waiters),
        ]
    }
}

/// `MDS_Event_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo
{
    /// Pending event bits, shown as a plain decimal count
    pub value: u64,
    pub waiters: WaitList,
}

impl PayloadRow for EventInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![self.value.to_string(), address_list(&self.waiters)]
    }
}

/// `MDS_MsgQueue_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgQueueInfo
{
    pub que_buff: Address,
    pub msg_size: u64,
    /// Messages on the free chain
    pub free: usize,
    /// Messages queued for delivery
    pub used: usize,
    pub receivers: WaitList,
    pub senders: WaitList,
}

impl MsgQueueInfo
{
    /// Every message slot, free or queued
    pub fn total(&self) -> usize
    {
        self.free + self.used
    }
}

impl PayloadRow for MsgQueueInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![
            self.que_buff.to_string(),
            self.msg_size.to_string(),
            format!("{}/{}", self.free, self.total()),
            address_list(&self.receivers),
            address_list(&self.senders),
        ]
    }
}

impl<O: MemoryOracle + ?Sized> Decoder<'_, O>
{
    pub(crate) fn semaphore(&self, semaphore: Address) -> Result<SemaphoreInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().semaphore;

        Ok(SemaphoreInfo {
            value: reader.read(semaphore, &layout.value)?,
            max: reader.read(semaphore, &layout.max)?,
            waiters: self.wait_list(layout.list.at(semaphore))?,
        })
    }

    pub(crate) fn mutex(&self, mutex: Address) -> Result<MutexInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().mutex;

        Ok(MutexInfo {
            value: reader.read(mutex, &layout.value)? as u8,
            nest: reader.read(mutex, &layout.nest)? as u16,
            owner: reader.read_address(mutex, &layout.owner)?,
            waiters: self.wait_list(layout.list.at(mutex))?,
        })
    }

    pub(crate) fn event(&self, event: Address) -> Result<EventInfo>
    {
        let layout = &self.layout().event;

        Ok(EventInfo {
            value: self.reader().read(event, &layout.value)?,
            waiters: self.wait_list(layout.list.at(event))?,
        })
    }

    pub(crate) fn msg_queue(&self, queue: Address) -> Result<MsgQueueInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().msg_queue;
        let lfree = reader.read_address(queue, &layout.lfree)?;
        let lhead = reader.read_address(queue, &layout.lhead)?;

        Ok(MsgQueueInfo {
            que_buff: reader.read_address(queue, &layout.que_buff)?,
            msg_size: reader.read(queue, &layout.msg_size)?,
            free: self.chain_len(lfree, layout.header_next)?,
            used: self.chain_len(lhead, layout.header_next)?,
            receivers: self.wait_list(layout.list_recv.at(queue))?,
            senders: self.wait_list(layout.list_send.at(queue))?,
        })
    }
}

#[cfg(test)]
mod tests
{
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn test_empty_waiters_render_blank()
    {
        let info = SemaphoreInfo {
            value: 0,
            max: 1,
            waiters: WaitList::new(),
        };
        assert_eq!(info.cells(), ["0", "1", ""]);
        assert!(info.warning().is_none());
    }

    #[test]
    fn test_semaphore_over_max_warns()
    {
        let info = SemaphoreInfo {
            value: 3,
            max: 2,
            waiters: WaitList::new(),
        };
        assert!(info.warning().is_some());
    }

    #[test]
    fn test_event_value_is_decimal()
    {
        let info = EventInfo {
            value: 0x2A,
            waiters: smallvec![Address::new(0x2000_0100), Address::new(0x2000_0200)],
        };
        assert_eq!(info.cells(), ["42", "0x20000100,0x20000200"]);
    }

    #[test]
    fn test_msg_queue_free_over_total()
    {
        let info = MsgQueueInfo {
            que_buff: Address::new(0x2000_1000),
            msg_size: 16,
            free: 2,
            used: 3,
            receivers: WaitList::new(),
            senders: smallvec![Address::new(0x2000_0100)],
        };
        assert_eq!(info.cells(), ["0x20001000", "16", "2/5", "", "0x20000100"]);
    }
}
