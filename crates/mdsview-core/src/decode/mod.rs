//! # Object Decoders
//!
//! Turns registry nodes into typed kernel objects and table rows.
//!
//! Every kernel object starts with the same `MDS_Object_t` header (list node,
//! flags byte, inline name), so a decoded object is that [`ObjectHeader`]
//! plus one kind-specific [`ObjectPayload`]. Decoding reads the target once;
//! rendering a [`Row`] from the result is pure, which keeps refreshes of an
//! unchanged target identical.
//!
//! ## Layout of this module
//!
//! - [`flags`]: state and flag bitfields
//! - [`format`]: address and symbol cell formatting
//! - [`thread`], [`device`], [`timer`]: scheduler and driver objects
//! - [`ipc`]: semaphores, mutexes, events, message queues
//! - [`memory`]: memory pools and heaps

pub mod device;
pub mod flags;
pub mod format;
pub mod ipc;
pub mod memory;
pub mod thread;
pub mod timer;

use smallvec::SmallVec;
use tracing::trace;

pub use self::device::DeviceInfo;
pub use self::format::SymbolRef;
pub use self::ipc::{EventInfo, MsgQueueInfo, MutexInfo, SemaphoreInfo};
pub use self::memory::{MemHeapInfo, MemPoolInfo};
pub use self::thread::ThreadInfo;
pub use self::timer::TimerInfo;
use crate::category::Category;
use crate::error::Result;
use crate::layout::{FieldDescriptor, KernelLayout};
use crate::oracle::{FieldReader, MemoryOracle};
use crate::sink::Row;
use crate::types::Address;
use crate::walker::{self, ListWalker};

/// Thread addresses waiting on an object, in queue order
///
/// Wait queues are short; four entries cover nearly every real target.
pub type WaitList = SmallVec<[Address; 4]>;

/// `MDS_Object_t` fields shared by every kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeader
{
    pub name: String,
    /// Object type in the low bits, `0x80` once created; never the device
    /// or timer kind flags
    pub flags: u8,
}

/// Kind-specific part of a decoded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPayload
{
    Thread(ThreadInfo),
    Device(DeviceInfo),
    Timer(TimerInfo),
    Semaphore(SemaphoreInfo),
    Mutex(MutexInfo),
    Event(EventInfo),
    MsgQueue(MsgQueueInfo),
    MemPool(MemPoolInfo),
    MemHeap(MemHeapInfo),
}

/// A decoded kernel object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelObject
{
    /// Address of the object (its `MDS_Object_t`)
    pub address: Address,
    pub header: ObjectHeader,
    pub payload: ObjectPayload,
}

/// Table cells and row metadata of a payload
///
/// `cells` covers every column after the leading address and name columns.
pub(crate) trait PayloadRow
{
    fn cells(&self) -> Vec<String>;

    /// Derived invariant that does not hold, if any
    fn warning(&self) -> Option<String>
    {
        None
    }

    /// Saved-context pointer for register lookup
    fn context(&self) -> Option<Address>
    {
        None
    }
}

impl ObjectPayload
{
    /// Category this payload is listed under
    pub fn category(&self) -> Category
    {
        match self {
            ObjectPayload::Thread(_) => Category::Threads,
            ObjectPayload::Device(_) => Category::Devices,
            ObjectPayload::Timer(_) => Category::Timers,
            ObjectPayload::Semaphore(_) => Category::Semaphores,
            ObjectPayload::Mutex(_) => Category::Mutexes,
            ObjectPayload::Event(_) => Category::Events,
            ObjectPayload::MsgQueue(_) => Category::MsgQueues,
            ObjectPayload::MemPool(_) => Category::MemPools,
            ObjectPayload::MemHeap(_) => Category::MemHeaps,
        }
    }

    fn as_row(&self) -> &dyn PayloadRow
    {
        match self {
            ObjectPayload::Thread(info) => info,
            ObjectPayload::Device(info) => info,
            ObjectPayload::Timer(info) => info,
            ObjectPayload::Semaphore(info) => info,
            ObjectPayload::Mutex(info) => info,
            ObjectPayload::Event(info) => info,
            ObjectPayload::MsgQueue(info) => info,
            ObjectPayload::MemPool(info) => info,
            ObjectPayload::MemHeap(info) => info,
        }
    }
}

impl KernelObject
{
    /// Category this object is listed under
    pub fn category(&self) -> Category
    {
        self.payload.category()
    }

    /// Render the object as a table row in its category's column order
    pub fn to_row(&self) -> Row
    {
        let payload = self.payload.as_row();
        let mut cells = vec![self.address.to_string(), self.header.name.clone()];
        cells.extend(payload.cells());

        let mut row = Row::new(cells);
        row.context = payload.context();
        if let Some(warning) = payload.warning() {
            row = row.with_warning(warning);
        }
        row
    }
}

/// Decodes registry nodes of any category
pub struct Decoder<'a, O: ?Sized>
{
    reader: FieldReader<'a, O>,
    cap: usize,
}

impl<'a, O: MemoryOracle + ?Sized> Decoder<'a, O>
{
    /// Create a decoder; `cap` bounds every list walk it performs
    pub fn new(reader: FieldReader<'a, O>, cap: usize) -> Self
    {
        Self { reader, cap }
    }

    pub(crate) fn reader(&self) -> FieldReader<'a, O>
    {
        self.reader
    }

    pub(crate) fn layout(&self) -> &'a KernelLayout
    {
        self.reader.layout()
    }

    pub(crate) fn cap(&self) -> usize
    {
        self.cap
    }

    /// Decode the registry node at `node` as an object of `category`
    pub fn decode(&self, category: Category, node: Address) -> Result<KernelObject>
    {
        let address = self.layout().object.node.container_of(node);
        let header = ObjectHeader {
            name: self.reader.read_name(address)?,
            flags: self.reader.read_header_flags(address)?,
        };
        trace!(%category, %address, name = %header.name, "decoding object");

        let payload = match category {
            Category::Threads => ObjectPayload::Thread(self.thread(address)?),
            Category::Devices => ObjectPayload::Device(self.device(address)?),
            Category::Timers => ObjectPayload::Timer(self.timer(address)?),
            Category::Semaphores => ObjectPayload::Semaphore(self.semaphore(address)?),
            Category::Mutexes => ObjectPayload::Mutex(self.mutex(address)?),
            Category::Events => ObjectPayload::Event(self.event(address)?),
            Category::MsgQueues => ObjectPayload::MsgQueue(self.msg_queue(address)?),
            Category::MemPools => ObjectPayload::MemPool(self.mem_pool(address)?),
            Category::MemHeaps => ObjectPayload::MemHeap(self.mem_heap(address)?),
        };

        Ok(KernelObject {
            address,
            header,
            payload,
        })
    }

    /// Resolve a pointer to a symbol; null pointers are never looked up
    pub(crate) fn symbol(&self, address: Address) -> Result<SymbolRef>
    {
        if address.is_null() {
            return Ok(SymbolRef::new(address, None));
        }
        let symbol = self.reader.oracle().resolve_symbol(address)?;
        Ok(SymbolRef::new(address, symbol))
    }

    /// Threads queued on the wait list whose sentinel node is at `sentinel`
    pub(crate) fn wait_list(&self, sentinel: Address) -> Result<WaitList>
    {
        let node = self.layout().thread.node;
        ListWalker::circular(self.reader, sentinel, self.cap)
            .map(|link| link.map(|link| node.container_of(link)))
            .collect()
    }

    /// Length of the null-terminated chain starting at `first`
    pub(crate) fn chain_len(&self, first: Address, link: FieldDescriptor) -> Result<usize>
    {
        walker::count(ListWalker::chain(self.reader, first, link, self.cap))
    }
}
