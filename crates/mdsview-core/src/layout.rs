//! # Kernel Structure Layouts
//!
//! Typed field descriptors for every kernel structure the decoders read.
//!
//! Offsets are computed the way a C compiler lays out a plain struct on the
//! target: each field is aligned to its natural alignment, nested structs
//! align to their widest member, and the struct size is padded to its
//! alignment. The only inputs are the ABI parameters in
//! [`InspectorConfig`](crate::InspectorConfig), so a 32-bit RISC-V build and a
//! 64-bit one produce different offsets from the same description.
//!
//! ## Example
//!
//! ```rust
//! use mdsview_core::{InspectorConfig, KernelLayout};
//!
//! let layout = KernelLayout::new(&InspectorConfig::default()).unwrap();
//! // ListNode (8) + flags (1) + name[7]
//! assert_eq!(layout.object.size, 16);
//! assert_eq!(layout.thread.node.offset, 16);
//! ```

use crate::config::InspectorConfig;
use crate::error::{InspectError, Result};
use crate::types::{Address, Architecture};

/// Location of one field inside a kernel structure
///
/// Decoders never build field offsets by hand; they hand a descriptor to the
/// [`FieldReader`](crate::oracle::FieldReader), which turns it into a typed
/// read at `base + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor
{
    /// C struct the field belongs to
    pub strukt: &'static str,
    /// C field name
    pub name: &'static str,
    /// Byte offset from the start of the struct
    pub offset: u64,
    /// Width in bytes (array length for `char[]` fields)
    pub width: usize,
}

impl FieldDescriptor
{
    /// Address of this field inside the struct at `base`
    pub fn at(&self, base: Address) -> Address
    {
        base + self.offset
    }

    /// Address of the enclosing struct given the address of this field
    ///
    /// This is `container_of`: intrusive list links point at an embedded
    /// node, and the owner sits `offset` bytes before it.
    pub fn container_of(&self, field: Address) -> Address
    {
        field - self.offset
    }
}

/// Incremental C struct layout
struct StructBuilder
{
    strukt: &'static str,
    offset: u64,
    align: u64,
}

impl StructBuilder
{
    fn new(strukt: &'static str) -> Self
    {
        Self {
            strukt,
            offset: 0,
            align: 1,
        }
    }

    fn field(&mut self, name: &'static str, width: usize, align: u64) -> FieldDescriptor
    {
        self.offset = align_up(self.offset, align);
        self.align = self.align.max(align);
        let descriptor = FieldDescriptor {
            strukt: self.strukt,
            name,
            offset: self.offset,
            width,
        };
        self.offset += width as u64;
        descriptor
    }

    /// Naturally aligned scalar
    fn scalar(&mut self, name: &'static str, width: usize) -> FieldDescriptor
    {
        self.field(name, width, width as u64)
    }

    /// Embedded struct
    fn nested(&mut self, name: &'static str, shape: Shape) -> FieldDescriptor
    {
        self.field(name, shape.size as usize, shape.align)
    }

    fn finish(self) -> Shape
    {
        Shape {
            size: align_up(self.offset, self.align),
            align: self.align,
        }
    }
}

/// Size and alignment of a finished struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape
{
    /// `sizeof`
    pub size: u64,
    /// `_Alignof`
    pub align: u64,
}

const fn align_up(value: u64, align: u64) -> u64
{
    value.div_ceil(align) * align
}

/// `MDS_ListNode_t`
#[derive(Debug, Clone, Copy)]
pub struct ListNodeLayout
{
    pub prev: FieldDescriptor,
    pub next: FieldDescriptor,
    pub shape: Shape,
}

/// `MDS_Object_t`, the header shared by every kernel object
#[derive(Debug, Clone, Copy)]
pub struct ObjectLayout
{
    pub node: FieldDescriptor,
    pub flags: FieldDescriptor,
    pub name: FieldDescriptor,
    pub size: u64,
    shape: Shape,
}

/// `MDS_Timer_t`
#[derive(Debug, Clone, Copy)]
pub struct TimerLayout
{
    /// `node[MDS_TIMER_SKIPLIST_LEVEL]`; registry links go through the header
    pub node: FieldDescriptor,
    pub entry: FieldDescriptor,
    pub arg: FieldDescriptor,
    pub flags: FieldDescriptor,
    pub tick_start: FieldDescriptor,
    pub tick_limit: FieldDescriptor,
    shape: Shape,
}

/// `MDS_Thread_t`
#[derive(Debug, Clone, Copy)]
pub struct ThreadLayout
{
    /// Scheduling node; wait lists link threads through it
    pub node: FieldDescriptor,
    pub entry: FieldDescriptor,
    pub stack_size: FieldDescriptor,
    pub stack_base: FieldDescriptor,
    pub stack_point: FieldDescriptor,
    pub init_tick: FieldDescriptor,
    pub remain_tick: FieldDescriptor,
    pub timer: FieldDescriptor,
    pub init_prio: FieldDescriptor,
    pub curr_prio: FieldDescriptor,
    pub state: FieldDescriptor,
}

/// `MDS_Device_t` and its module/adapter/peripheral extensions
#[derive(Debug, Clone, Copy)]
pub struct DeviceLayout
{
    /// Kind and open state; the object header only says "device"
    pub flags: FieldDescriptor,
    pub module_driver: FieldDescriptor,
    pub module_handle: FieldDescriptor,
    pub adapter_driver: FieldDescriptor,
    pub adapter_handle: FieldDescriptor,
    pub adapter_owner: FieldDescriptor,
    pub periph_mount: FieldDescriptor,
}

/// `MDS_Semaphore_t`
#[derive(Debug, Clone, Copy)]
pub struct SemaphoreLayout
{
    pub list: FieldDescriptor,
    pub value: FieldDescriptor,
    pub max: FieldDescriptor,
    shape: Shape,
}

/// `MDS_Mutex_t`
#[derive(Debug, Clone, Copy)]
pub struct MutexLayout
{
    pub list: FieldDescriptor,
    pub owner: FieldDescriptor,
    pub value: FieldDescriptor,
    pub nest: FieldDescriptor,
}

/// `MDS_Event_t`
#[derive(Debug, Clone, Copy)]
pub struct EventLayout
{
    pub list: FieldDescriptor,
    pub value: FieldDescriptor,
}

/// `MDS_MsgQueue_t` plus the message header chaining its buffers
#[derive(Debug, Clone, Copy)]
pub struct MsgQueueLayout
{
    pub list_recv: FieldDescriptor,
    pub list_send: FieldDescriptor,
    pub que_buff: FieldDescriptor,
    pub msg_size: FieldDescriptor,
    pub lfree: FieldDescriptor,
    pub lhead: FieldDescriptor,
    pub ltail: FieldDescriptor,
    /// `MDS_MsgQueueHeader_t.next`
    pub header_next: FieldDescriptor,
}

/// `MDS_MemPool_t` plus the block header union
#[derive(Debug, Clone, Copy)]
pub struct MemPoolLayout
{
    pub list: FieldDescriptor,
    pub mem_buff: FieldDescriptor,
    pub blk_size: FieldDescriptor,
    pub lfree: FieldDescriptor,
    /// `union MDS_MemPoolHeader`: `next` while free, owning pool while allocated
    pub header_next: FieldDescriptor,
    pub header_size: u64,
}

/// `MDS_MemHeap_t` plus the allocator's heap node
#[derive(Debug, Clone, Copy)]
pub struct MemHeapLayout
{
    pub limit: FieldDescriptor,
    /// `size.cur` and `size.max` when heap statistics are compiled in
    pub stats: Option<HeapStatsLayout>,
    /// `MemHeapNode_t.next`
    pub node_next: FieldDescriptor,
}

/// `MDS_MemHeapSize_t` fields at their offsets inside `MDS_MemHeap_t`
#[derive(Debug, Clone, Copy)]
pub struct HeapStatsLayout
{
    pub cur: FieldDescriptor,
    pub max: FieldDescriptor,
}

/// Where a saved-context word ends up in the decoded register set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSlot
{
    /// Program counter (`mepc` / exception `pc`)
    Pc,
    /// Status register (`mstatus` / `psr`)
    Status,
    /// General register by architecture number
    General(u8),
    /// Saved but not part of the register file (`fcsr`, FPU registers)
    Skip,
}

/// A saved thread context, one word per slot
#[derive(Debug, Clone)]
pub struct FrameLayout
{
    pub slots: Vec<(FieldDescriptor, FrameSlot)>,
    /// `sizeof(StackFrame)`; the pre-exception sp is `context + size`
    pub size: u64,
}

/// RISC-V `StackFrame` save order
const RISCV_FRAME: [(&str, FrameSlot); 32] = [
    ("mepc", FrameSlot::Pc),
    ("ra", FrameSlot::General(1)),
    ("mstatus", FrameSlot::Status),
    ("fcsr", FrameSlot::Skip),
    ("tp", FrameSlot::General(4)),
    ("t0", FrameSlot::General(5)),
    ("t1", FrameSlot::General(6)),
    ("t2", FrameSlot::General(7)),
    ("s0_fp", FrameSlot::General(8)),
    ("s1", FrameSlot::General(9)),
    ("a0", FrameSlot::General(10)),
    ("a1", FrameSlot::General(11)),
    ("a2", FrameSlot::General(12)),
    ("a3", FrameSlot::General(13)),
    ("a4", FrameSlot::General(14)),
    ("a5", FrameSlot::General(15)),
    ("a6", FrameSlot::General(16)),
    ("a7", FrameSlot::General(17)),
    ("s2", FrameSlot::General(18)),
    ("s3", FrameSlot::General(19)),
    ("s4", FrameSlot::General(20)),
    ("s5", FrameSlot::General(21)),
    ("s6", FrameSlot::General(22)),
    ("s7", FrameSlot::General(23)),
    ("s8", FrameSlot::General(24)),
    ("s9", FrameSlot::General(25)),
    ("s10", FrameSlot::General(26)),
    ("s11", FrameSlot::General(27)),
    ("t3", FrameSlot::General(28)),
    ("t4", FrameSlot::General(29)),
    ("t5", FrameSlot::General(30)),
    ("t6", FrameSlot::General(31)),
];

/// ARM Cortex-M software-saved registers
const ARM_CALLEE_SAVED: [(&str, FrameSlot); 8] = [
    ("r4", FrameSlot::General(4)),
    ("r5", FrameSlot::General(5)),
    ("r6", FrameSlot::General(6)),
    ("r7", FrameSlot::General(7)),
    ("r8", FrameSlot::General(8)),
    ("r9", FrameSlot::General(9)),
    ("r10", FrameSlot::General(10)),
    ("r11", FrameSlot::General(11)),
];

/// ARM Cortex-M hardware exception frame
const ARM_EXCEPTION: [(&str, FrameSlot); 8] = [
    ("r0", FrameSlot::General(0)),
    ("r1", FrameSlot::General(1)),
    ("r2", FrameSlot::General(2)),
    ("r3", FrameSlot::General(3)),
    ("r12", FrameSlot::General(12)),
    ("lr", FrameSlot::General(14)),
    ("pc", FrameSlot::Pc),
    ("psr", FrameSlot::Status),
];

/// Software-saved FPU registers of an extended frame
const ARM_FPU_CALLEE_SAVED: [&str; 16] = [
    "s16", "s17", "s18", "s19", "s20", "s21", "s22", "s23", "s24", "s25", "s26", "s27", "s28", "s29", "s30", "s31",
];

/// FPU tail of an extended hardware exception frame
const ARM_FPU_EXCEPTION: [&str; 18] = [
    "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "s12", "s13", "s14", "s15", "fpscr",
    "rsv",
];

/// Cortex-M contexts of a kernel built with FPU support
///
/// Every frame starts with `exc_flag`, the `EXC_RETURN` the thread was
/// switched out with. Bit 4 clear means the thread had live FPU state and
/// both the software and the hardware part of the frame carry FPU registers.
#[derive(Debug, Clone)]
pub struct ArmFpuFrames
{
    pub exc_flag: FieldDescriptor,
    /// `exc_flag` bit 4 set: integer registers only
    pub standard: FrameLayout,
    /// `exc_flag` bit 4 clear: `s16-s31` and `s0-s15, fpscr` saved too
    pub extended: FrameLayout,
}

impl ArmFpuFrames
{
    /// `EXC_RETURN` bit selecting the frame without FPU state
    pub const STANDARD_FRAME_BIT: u64 = 0x10;

    /// Frame saved by a thread that switched out with `exc_flag`
    pub fn select(&self, exc_flag: u64) -> &FrameLayout
    {
        if exc_flag & Self::STANDARD_FRAME_BIT == 0 {
            &self.extended
        } else {
            &self.standard
        }
    }
}

/// Every structure layout for one target ABI
#[derive(Debug, Clone)]
pub struct KernelLayout
{
    pub pointer_width: usize,
    pub tick_width: usize,
    pub list_node: ListNodeLayout,
    pub object: ObjectLayout,
    pub thread: ThreadLayout,
    pub timer: TimerLayout,
    pub device: DeviceLayout,
    pub semaphore: SemaphoreLayout,
    pub mutex: MutexLayout,
    pub event: EventLayout,
    pub msg_queue: MsgQueueLayout,
    pub mem_pool: MemPoolLayout,
    pub mem_heap: MemHeapLayout,
    pub riscv_frame: FrameLayout,
    pub arm_frame: FrameLayout,
    /// Set when the kernel was built for a Cortex-M core with an FPU
    pub arm_fpu: Option<ArmFpuFrames>,
}

impl KernelLayout
{
    /// Compute all layouts for the configured ABI
    ///
    /// ## Errors
    ///
    /// [`InspectError::InvalidLayout`] for pointer or tick widths other than
    /// 4 or 8, a zero name size or a zero timer skiplist level.
    pub fn new(config: &InspectorConfig) -> Result<Self>
    {
        let ptr = config.pointer_width;
        let tick = config.tick_width;
        if !matches!(ptr, 4 | 8) {
            return Err(InspectError::InvalidLayout(format!("pointer width {ptr} (expected 4 or 8)")));
        }
        if !matches!(tick, 4 | 8) {
            return Err(InspectError::InvalidLayout(format!("tick width {tick} (expected 4 or 8)")));
        }
        if config.name_size == 0 {
            return Err(InspectError::InvalidLayout("object name size must be non-zero".into()));
        }
        if config.timer_skiplist_level == 0 {
            return Err(InspectError::InvalidLayout("timer skiplist level must be non-zero".into()));
        }

        let list_node = list_node_layout(ptr);
        let object = object_layout(list_node.shape, config.name_size);
        let timer = timer_layout(object.shape, list_node.shape, config.timer_skiplist_level, ptr, tick);
        let semaphore = semaphore_layout(object.shape, list_node.shape, ptr);

        Ok(Self {
            pointer_width: ptr,
            tick_width: tick,
            list_node,
            object,
            thread: thread_layout(object.shape, list_node.shape, timer.shape, ptr, tick),
            timer,
            device: device_layout(object.shape, ptr),
            semaphore,
            mutex: mutex_layout(object.shape, list_node.shape, ptr),
            event: event_layout(object.shape, list_node.shape, ptr),
            msg_queue: msg_queue_layout(object.shape, list_node.shape, ptr),
            mem_pool: mem_pool_layout(object.shape, list_node.shape, ptr),
            mem_heap: mem_heap_layout(object.shape, semaphore.shape, ptr, config.heap_stats),
            riscv_frame: frame_layout("StackFrame", &RISCV_FRAME, ptr),
            arm_frame: arm_frame_layout(false, false),
            arm_fpu: config.arm_fpu.then(arm_fpu_frames),
        })
    }

    /// Saved-context layout for an architecture, ignoring FPU frames
    pub fn frame(&self, architecture: Architecture) -> &FrameLayout
    {
        match architecture {
            Architecture::RiscV => &self.riscv_frame,
            Architecture::ArmThumb => &self.arm_frame,
        }
    }
}

fn list_node_layout(ptr: usize) -> ListNodeLayout
{
    let mut b = StructBuilder::new("MDS_ListNode_t");
    let prev = b.scalar("prev", ptr);
    let next = b.scalar("next", ptr);
    ListNodeLayout {
        prev,
        next,
        shape: b.finish(),
    }
}

fn object_layout(list_node: Shape, name_size: usize) -> ObjectLayout
{
    let mut b = StructBuilder::new("MDS_Object_t");
    let node = b.nested("node", list_node);
    let flags = b.scalar("flags", 1);
    let name = b.field("name", name_size, 1);
    let shape = b.finish();
    ObjectLayout {
        node,
        flags,
        name,
        size: shape.size,
        shape,
    }
}

fn timer_layout(object: Shape, list_node: Shape, levels: usize, ptr: usize, tick: usize) -> TimerLayout
{
    let mut b = StructBuilder::new("MDS_Timer_t");
    b.nested("object", object);
    let node = b.field("node", list_node.size as usize * levels, list_node.align);
    let entry = b.scalar("entry", ptr);
    let arg = b.scalar("arg", ptr);
    let flags = b.scalar("flags", ptr);
    let tick_start = b.scalar("tickstart", tick);
    let tick_limit = b.scalar("ticklimit", tick);
    TimerLayout {
        node,
        entry,
        arg,
        flags,
        tick_start,
        tick_limit,
        shape: b.finish(),
    }
}

fn thread_layout(object: Shape, list_node: Shape, timer: Shape, ptr: usize, tick: usize) -> ThreadLayout
{
    let mut b = StructBuilder::new("MDS_Thread_t");
    b.nested("object", object);
    let node = b.nested("node", list_node);
    let entry = b.scalar("entry", ptr);
    b.scalar("arg", ptr);
    let stack_size = b.scalar("stackSize", ptr);
    let stack_base = b.scalar("stackBase", ptr);
    let stack_point = b.scalar("stackPoint", ptr);
    let init_tick = b.scalar("initTick", tick);
    let remain_tick = b.scalar("remainTick", tick);
    let timer = b.nested("timer", timer);
    b.scalar("err", 4);
    ThreadLayout {
        node,
        entry,
        stack_size,
        stack_base,
        stack_point,
        init_tick,
        remain_tick,
        timer,
        init_prio: b.scalar("initPrio", 1),
        curr_prio: b.scalar("currPrio", 1),
        state: b.scalar("state", 1),
    }
}

fn device_layout(object: Shape, ptr: usize) -> DeviceLayout
{
    let mut b = StructBuilder::new("MDS_Device_t");
    b.nested("object", object);
    let flags = b.scalar("flags", ptr);
    b.scalar("hook", ptr);
    let device = b.finish();

    let mut m = StructBuilder::new("MDS_DevModule_t");
    m.nested("device", device);
    let module_driver = m.scalar("driver", ptr);
    let module_handle = m.scalar("handle", ptr);

    let mut a = StructBuilder::new("MDS_DevAdaptr_t");
    a.nested("device", device);
    let adapter_driver = a.scalar("driver", ptr);
    let adapter_handle = a.scalar("handle", ptr);
    let adapter_owner = a.scalar("owner", ptr);

    let mut p = StructBuilder::new("MDS_DevPeriph_t");
    p.nested("device", device);
    let periph_mount = p.scalar("mount", ptr);

    DeviceLayout {
        flags,
        module_driver,
        module_handle,
        adapter_driver,
        adapter_handle,
        adapter_owner,
        periph_mount,
    }
}

fn semaphore_layout(object: Shape, list_node: Shape, ptr: usize) -> SemaphoreLayout
{
    let mut b = StructBuilder::new("MDS_Semaphore_t");
    b.nested("object", object);
    let list = b.nested("list", list_node);
    let value = b.scalar("value", ptr);
    let max = b.scalar("max", ptr);
    SemaphoreLayout {
        list,
        value,
        max,
        shape: b.finish(),
    }
}

fn mutex_layout(object: Shape, list_node: Shape, ptr: usize) -> MutexLayout
{
    let mut b = StructBuilder::new("MDS_Mutex_t");
    b.nested("object", object);
    let list = b.nested("list", list_node);
    let owner = b.scalar("owner", ptr);
    b.scalar("priority", 1);
    MutexLayout {
        list,
        owner,
        value: b.scalar("value", 1),
        nest: b.scalar("nest", 2),
    }
}

fn event_layout(object: Shape, list_node: Shape, ptr: usize) -> EventLayout
{
    let mut b = StructBuilder::new("MDS_Event_t");
    b.nested("object", object);
    EventLayout {
        list: b.nested("list", list_node),
        value: b.scalar("value", ptr),
    }
}

fn msg_queue_layout(object: Shape, list_node: Shape, ptr: usize) -> MsgQueueLayout
{
    let mut header = StructBuilder::new("MDS_MsgQueueHeader_t");
    let header_next = header.scalar("next", ptr);

    let mut b = StructBuilder::new("MDS_MsgQueue_t");
    b.nested("object", object);
    MsgQueueLayout {
        list_recv: b.nested("listRecv", list_node),
        list_send: b.nested("listSend", list_node),
        que_buff: b.scalar("queBuff", ptr),
        msg_size: b.scalar("msgSize", ptr),
        lfree: b.scalar("lfree", ptr),
        lhead: b.scalar("lhead", ptr),
        ltail: b.scalar("ltail", ptr),
        header_next,
    }
}

fn mem_pool_layout(object: Shape, list_node: Shape, ptr: usize) -> MemPoolLayout
{
    let mut header = StructBuilder::new("MDS_MemPoolHeader");
    let header_next = header.scalar("next", ptr);
    let header_size = header.finish().size;

    let mut b = StructBuilder::new("MDS_MemPool_t");
    b.nested("object", object);
    MemPoolLayout {
        list: b.nested("list", list_node),
        mem_buff: b.scalar("memBuff", ptr),
        blk_size: b.scalar("blkSize", ptr),
        lfree: b.scalar("lfree", ptr),
        header_next,
        header_size,
    }
}

fn mem_heap_layout(object: Shape, semaphore: Shape, ptr: usize, heap_stats: bool) -> MemHeapLayout
{
    let mut node = StructBuilder::new("MemHeapNode_t");
    node.scalar("baseptr", ptr);
    node.scalar("prev", ptr);
    let node_next = node.scalar("next", ptr);

    let mut b = StructBuilder::new("MDS_MemHeap_t");
    b.nested("object", object);
    b.nested("lock", semaphore);
    b.scalar("ops", ptr);
    b.scalar("begin", ptr);
    let limit = b.scalar("limit", ptr);
    let stats = heap_stats.then(|| HeapStatsLayout {
        cur: b.scalar("size.cur", ptr),
        max: b.scalar("size.max", ptr),
    });

    MemHeapLayout {
        limit,
        stats,
        node_next,
    }
}

fn frame_layout(strukt: &'static str, order: &[(&'static str, FrameSlot)], word: usize) -> FrameLayout
{
    let mut b = StructBuilder::new(strukt);
    let slots = order.iter().map(|&(name, slot)| (b.scalar(name, word), slot)).collect();
    FrameLayout {
        slots,
        size: b.finish().size,
    }
}

/// Cortex-M `StackFrame`, optionally led by `exc_flag` and carrying FPU state
fn arm_frame_layout(with_exc_flag: bool, extended: bool) -> FrameLayout
{
    let skip = |name: &'static str| (name, FrameSlot::Skip);
    let mut order = Vec::with_capacity(51);
    if with_exc_flag {
        order.push(skip("exc_flag"));
    }
    order.extend(ARM_CALLEE_SAVED);
    if extended {
        order.extend(ARM_FPU_CALLEE_SAVED.map(skip));
    }
    order.extend(ARM_EXCEPTION);
    if extended {
        order.extend(ARM_FPU_EXCEPTION.map(skip));
    }
    frame_layout("StackFrame", &order, 4)
}

fn arm_fpu_frames() -> ArmFpuFrames
{
    ArmFpuFrames {
        exc_flag: StructBuilder::new("StackFrame").scalar("exc_flag", 4),
        standard: arm_frame_layout(true, false),
        extended: arm_frame_layout(true, true),
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn layout(ptr: usize, tick: usize) -> KernelLayout
    {
        let config = InspectorConfig::default().with_pointer_width(ptr).with_tick_width(tick);
        KernelLayout::new(&config).unwrap()
    }

    #[test]
    fn test_object_header_32bit()
    {
        let l = layout(4, 4);
        assert_eq!(l.object.node.offset, 0);
        assert_eq!(l.object.flags.offset, 8);
        assert_eq!(l.object.name.offset, 9);
        assert_eq!(l.object.name.width, 7);
        assert_eq!(l.object.size, 16);
    }

    #[test]
    fn test_object_header_64bit_pads_to_pointer()
    {
        let l = layout(8, 4);
        assert_eq!(l.object.flags.offset, 16);
        assert_eq!(l.object.size, 24);
    }

    #[test]
    fn test_thread_offsets_32bit()
    {
        let l = layout(4, 4);
        assert_eq!(l.thread.node.offset, 16);
        assert_eq!(l.thread.entry.offset, 24);
        assert_eq!(l.thread.stack_size.offset, 32);
        assert_eq!(l.thread.stack_base.offset, 36);
        assert_eq!(l.thread.stack_point.offset, 40);
        assert_eq!(l.thread.init_tick.offset, 44);
        assert_eq!(l.thread.remain_tick.offset, 48);
        // Timer: object 16 + node 8 + entry/arg/flags 12 + ticks 8 = 44
        assert_eq!(l.thread.timer.offset, 52);
        assert_eq!(l.thread.timer.width, 44);
        // err (4) sits between the timer and the priorities
        assert_eq!(l.thread.init_prio.offset, 100);
        assert_eq!(l.thread.state.offset, 102);
    }

    #[test]
    fn test_timer_skiplist_levels()
    {
        let config = InspectorConfig::default().with_timer_skiplist_level(2);
        let l = KernelLayout::new(&config).unwrap();
        assert_eq!(l.timer.node.offset, 16);
        assert_eq!(l.timer.node.width, 16);
        assert_eq!(l.timer.entry.offset, 32);
        assert_eq!(l.timer.flags.offset, 40);
        assert_eq!(l.timer.tick_limit.offset, 48);
        // Embedded timer grows by one list node and pushes the priorities back
        assert_eq!(l.thread.timer.width, 52);
        assert_eq!(l.thread.init_prio.offset, 108);

        let config = InspectorConfig::default().with_timer_skiplist_level(0);
        assert!(matches!(KernelLayout::new(&config), Err(InspectError::InvalidLayout(_))));
    }

    #[test]
    fn test_eight_byte_ticks_align()
    {
        let l = layout(4, 8);
        // flags ends at 36; tickstart needs 8-byte alignment
        assert_eq!(l.timer.tick_start.offset, 40);
        assert_eq!(l.timer.tick_limit.offset, 48);
        assert_eq!(l.thread.init_tick.offset, 48);
    }

    #[test]
    fn test_device_extensions_follow_device()
    {
        let l = layout(4, 4);
        assert_eq!(l.device.flags.offset, 16);
        // hook at 20
        assert_eq!(l.device.module_driver.offset, 24);
        assert_eq!(l.device.adapter_owner.offset, 32);
        assert_eq!(l.device.periph_mount.offset, 24);
    }

    #[test]
    fn test_mutex_small_fields_pack()
    {
        let l = layout(4, 4);
        assert_eq!(l.mutex.owner.offset, 24);
        // priority at 28
        assert_eq!(l.mutex.value.offset, 29);
        assert_eq!(l.mutex.nest.offset, 30);
    }

    #[test]
    fn test_mem_heap_stats_optional()
    {
        let with = layout(4, 4);
        let stats = with.mem_heap.stats.unwrap();
        // object 16 + semaphore 32 + ops/begin/limit
        assert_eq!(with.mem_heap.limit.offset, 56);
        assert_eq!(stats.cur.offset, 60);
        assert_eq!(stats.max.offset, 64);

        let config = InspectorConfig {
            heap_stats: false,
            ..InspectorConfig::default()
        };
        assert!(KernelLayout::new(&config).unwrap().mem_heap.stats.is_none());
    }

    #[test]
    fn test_frame_sizes()
    {
        assert_eq!(layout(4, 4).riscv_frame.size, 128);
        assert_eq!(layout(8, 4).riscv_frame.size, 256);
        assert_eq!(layout(8, 4).arm_frame.size, 64);
        assert!(layout(4, 4).arm_fpu.is_none());
    }

    #[test]
    fn test_arm_fpu_frames()
    {
        let config = InspectorConfig::default().with_arm_fpu(true);
        let l = KernelLayout::new(&config).unwrap();
        let fpu = l.arm_fpu.as_ref().unwrap();
        assert_eq!(fpu.exc_flag.offset, 0);
        assert_eq!(fpu.standard.size, 68);
        assert_eq!(fpu.extended.size, 204);

        let offset = |frame: &FrameLayout, slot: FrameSlot| {
            frame.slots.iter().find(|(_, s)| *s == slot).map(|(field, _)| field.offset)
        };
        assert_eq!(offset(&fpu.standard, FrameSlot::General(4)), Some(4));
        assert_eq!(offset(&fpu.standard, FrameSlot::Pc), Some(0x3C));
        // s16-s31 between r11 and r0, s0-s15/fpscr/rsv after psr
        assert_eq!(offset(&fpu.extended, FrameSlot::General(0)), Some(0x64));
        assert_eq!(offset(&fpu.extended, FrameSlot::Pc), Some(0x7C));
        assert_eq!(offset(&fpu.extended, FrameSlot::Status), Some(0x80));

        // Fresh threads start with 0xFFFFFFED, an extended frame
        assert_eq!(fpu.select(0xFFFF_FFED).size, 204);
        assert_eq!(fpu.select(0xFFFF_FFFD).size, 68);
    }

    #[test]
    fn test_invalid_widths_rejected()
    {
        let config = InspectorConfig::default().with_pointer_width(2);
        assert!(matches!(KernelLayout::new(&config), Err(InspectError::InvalidLayout(_))));
        let config = InspectorConfig::default().with_tick_width(3);
        assert!(matches!(KernelLayout::new(&config), Err(InspectError::InvalidLayout(_))));
    }

    #[test]
    fn test_container_of()
    {
        let l = layout(4, 4);
        let thread = Address::new(0x2000_0100);
        let node = l.thread.node.at(thread);
        assert_eq!(node, Address::new(0x2000_0110));
        assert_eq!(l.thread.node.container_of(node), thread);
    }
}
