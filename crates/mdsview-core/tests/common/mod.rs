//! Synthetic MDS kernels for integration tests
//!
//! Objects are laid out in a RAM segment with the same [`KernelLayout`] the
//! engine decodes with, and linked into `g_objectList` like the kernel's own
//! `MDS_ObjectInit` would.

#![allow(dead_code)]

use mdsview_core::image::{Endian, MemoryImage};
use mdsview_core::layout::FieldDescriptor;
use mdsview_core::{Address, Category, InspectorConfig, KernelLayout, MemoryOracle};

pub const RAM_BASE: u64 = 0x2000_0000;
pub const RAM_SIZE: usize = 0x1_0000;
const OBJECT_SLOT: u64 = 0x100;
/// `MDS_OBJECT_FLAG_CREATED`, set in the header of every created object
pub const OBJECT_CREATED: u8 = 0x80;

pub struct Kernel
{
    pub image: MemoryImage,
    pub layout: KernelLayout,
    pub config: InspectorConfig,
    next_free: u64,
}

impl Kernel
{
    pub fn new() -> Self
    {
        Self::with_config(InspectorConfig::default())
    }

    pub fn with_config(config: InspectorConfig) -> Self
    {
        let layout = KernelLayout::new(&config).unwrap();
        let mut image = MemoryImage::new(Endian::Little);
        image.add_segment(Address::new(RAM_BASE), vec![0; RAM_SIZE]);

        let node_size = layout.list_node.shape.size;
        image.add_symbol("g_objectList", Address::new(RAM_BASE), node_size * 10);

        let mut kernel = Self {
            image,
            layout,
            config,
            next_free: RAM_BASE + 0x100,
        };
        for index in 0..10 {
            kernel.init_list(Address::new(RAM_BASE + index * node_size));
        }
        kernel
    }

    /// Bump-allocate zeroed RAM
    pub fn alloc(&mut self, size: u64) -> Address
    {
        let address = Address::new(self.next_free);
        self.next_free += (size + 7) & !7;
        assert!(self.next_free <= RAM_BASE + RAM_SIZE as u64, "synthetic RAM exhausted");
        address
    }

    pub fn write(&mut self, base: Address, field: &FieldDescriptor, value: u64)
    {
        self.image.write_scalar(field.at(base), field.width, value).unwrap();
    }

    pub fn write_pointer(&mut self, address: Address, value: u64)
    {
        self.image.write_scalar(address, self.layout.pointer_width, value).unwrap();
    }

    pub fn read_pointer(&self, address: Address) -> Address
    {
        Address::new(self.image.read_scalar(address, self.layout.pointer_width).unwrap())
    }

    /// Make `sentinel` an empty circular list
    pub fn init_list(&mut self, sentinel: Address)
    {
        let node = self.layout.list_node;
        self.write(sentinel, &node.prev, sentinel.value());
        self.write(sentinel, &node.next, sentinel.value());
    }

    /// Insert `node` before `sentinel`, i.e. at the list tail
    pub fn link_tail(&mut self, sentinel: Address, node: Address)
    {
        let list = self.layout.list_node;
        let tail = self.read_pointer(list.prev.at(sentinel));
        self.write(node, &list.prev, tail.value());
        self.write(node, &list.next, sentinel.value());
        self.write(tail, &list.next, node.value());
        self.write(sentinel, &list.prev, node.value());
    }

    pub fn registry(&self, category: Category) -> Address
    {
        Address::new(RAM_BASE + category.registry_index() * self.layout.list_node.shape.size)
    }

    /// Allocate an object, name it and register it under `category`
    ///
    /// The header flags carry the object type and the created bit, as
    /// `MDS_ObjectCreate` leaves them.
    pub fn object(&mut self, category: Category, name: &str) -> Address
    {
        self.object_with_header(category, name, category.registry_index() as u8 | OBJECT_CREATED)
    }

    /// Like [`Kernel::object`] with explicit header flags
    pub fn object_with_header(&mut self, category: Category, name: &str, header: u8) -> Address
    {
        let object = self.alloc(OBJECT_SLOT);
        let layout = self.layout.object;
        self.image.write_c_string(layout.name.at(object), name, layout.name.width).unwrap();
        self.write(object, &layout.flags, u64::from(header));
        let registry = self.registry(category);
        self.link_tail(registry, layout.node.at(object));
        object
    }

    /// Device whose own `flags` word holds `kind` (`DeviceFlags` bits)
    pub fn device(&mut self, name: &str, kind: u8) -> Address
    {
        let device = self.object(Category::Devices, name);
        let flags = self.layout.device.flags;
        self.write(device, &flags, u64::from(kind));
        device
    }

    pub fn thread(&mut self, name: &str, spec: &ThreadSpec) -> Address
    {
        let thread = self.object(Category::Threads, name);
        let layout = self.layout.thread;
        self.write(thread, &layout.entry, spec.entry);
        self.write(thread, &layout.state, u64::from(spec.state));
        self.write(thread, &layout.stack_point, spec.stack_point);
        self.write(thread, &layout.stack_base, spec.stack_base);
        self.write(thread, &layout.stack_size, spec.stack_size);
        self.write(thread, &layout.init_prio, u64::from(spec.init_prio));
        self.write(thread, &layout.curr_prio, u64::from(spec.curr_prio));
        self.write(thread, &layout.init_tick, spec.init_tick);
        self.write(thread, &layout.remain_tick, spec.remain_tick);
        thread
    }

    /// Queue `thread` on the wait list whose sentinel is at `list`
    pub fn wait_on(&mut self, list: Address, thread: Address)
    {
        let node = self.layout.thread.node.at(thread);
        self.link_tail(list, node);
    }

    pub fn semaphore(&mut self, name: &str, value: u64, max: u64) -> Address
    {
        let semaphore = self.object(Category::Semaphores, name);
        let layout = self.layout.semaphore;
        self.init_list(layout.list.at(semaphore));
        self.write(semaphore, &layout.value, value);
        self.write(semaphore, &layout.max, max);
        semaphore
    }

    /// Timer whose own `flags` word holds `flags` (`TimerFlags` bits)
    pub fn timer(&mut self, name: &str, flags: u8, entry: u64, tick_start: u64, tick_limit: u64) -> Address
    {
        let timer = self.object(Category::Timers, name);
        let layout = self.layout.timer;
        self.write(timer, &layout.flags, u64::from(flags));
        self.write(timer, &layout.entry, entry);
        self.write(timer, &layout.tick_start, tick_start);
        self.write(timer, &layout.tick_limit, tick_limit);
        timer
    }

    /// Pool of `blocks` blocks whose headers at `free` indices form the free chain
    ///
    /// The last free header links to itself, the way the kernel seeds it.
    pub fn mem_pool(&mut self, name: &str, blk_size: u64, blocks: u64, free: &[u64]) -> Address
    {
        let pool = self.object(Category::MemPools, name);
        let layout = self.layout.mem_pool;
        self.init_list(layout.list.at(pool));

        let stride = layout.header_size + blk_size;
        let mem_buff = self.alloc(stride * (blocks + 1));
        self.write(pool, &layout.mem_buff, mem_buff.value());
        self.write(pool, &layout.blk_size, blk_size);

        let header = |index: u64| mem_buff + index * stride;
        for index in 0..blocks {
            self.write_pointer(header(index), pool.value());
        }
        for (pos, &index) in free.iter().enumerate() {
            let next = free.get(pos + 1).map_or(header(index), |&next| header(next));
            self.write_pointer(header(index), next.value());
        }
        let lfree = free.first().map_or(Address::ZERO, |&index| header(index));
        self.write(pool, &layout.lfree, lfree.value());
        pool
    }
}

/// Thread fields worth setting in tests
pub struct ThreadSpec
{
    pub entry: u64,
    pub state: u8,
    pub stack_point: u64,
    pub stack_base: u64,
    pub stack_size: u64,
    pub init_prio: u8,
    pub curr_prio: u8,
    pub init_tick: u64,
    pub remain_tick: u64,
}

impl Default for ThreadSpec
{
    fn default() -> Self
    {
        Self {
            entry: 0x0800_0100,
            state: 0x01,
            stack_point: 0x2000_F080,
            stack_base: 0x2000_F000,
            stack_size: 0x200,
            init_prio: 5,
            curr_prio: 5,
            init_tick: 10,
            remain_tick: 10,
        }
    }
}
