//! # Memory Oracle
//!
//! The engine's only window into the target.
//!
//! A [`MemoryOracle`] is provided by whatever hosts the engine: a debug probe
//! connection, a GDB remote stub, or the in-memory [`MemoryImage`] used for
//! offline dumps and tests. The engine only ever reads through it.
//!
//! ## Typed field access
//!
//! Decoders do not compute addresses themselves. They ask a [`FieldReader`]
//! for a [`FieldDescriptor`] of a struct at some base address, and the reader
//! issues a read of the descriptor's width at `base + offset`.
//!
//! [`MemoryImage`]: crate::image::MemoryImage

use crate::error::Result;
use crate::layout::{FieldDescriptor, KernelLayout};
use crate::types::Address;

/// Read-only access to target memory, symbols and core registers
///
/// ## Errors
///
/// Implementations return [`InspectError::MemoryRead`] for unreadable
/// addresses and [`InspectError::Disconnected`] once the target is gone. The
/// refresh loop treats the former as a local failure and the latter as fatal.
///
/// Lookups that simply find nothing (`symbol_address`, `symbol_size`,
/// `resolve_symbol`, `core_register`) return `Ok(None)` rather than an error.
///
/// [`InspectError::MemoryRead`]: crate::InspectError::MemoryRead
/// [`InspectError::Disconnected`]: crate::InspectError::Disconnected
pub trait MemoryOracle
{
    /// Read an unsigned scalar of `width` bytes (1, 2, 4 or 8) in target byte order
    fn read_scalar(&self, address: Address, width: usize) -> Result<u64>;

    /// Read a NUL-terminated string of at most `max_len` bytes
    ///
    /// The string ends at the first NUL or after `max_len` bytes, whichever
    /// comes first. Kernel object names fill their buffer without a NUL
    /// when they are exactly `name_size` long.
    fn read_c_string(&self, address: Address, max_len: usize) -> Result<String>;

    /// Address of a global symbol, `None` if the target has no such symbol
    fn symbol_address(&self, name: &str) -> Result<Option<Address>>;

    /// Size in bytes of the symbol starting exactly at `address`
    ///
    /// `None` when no symbol starts there or its size is unknown. Oracles
    /// without size information keep the default.
    fn symbol_size(&self, _address: Address) -> Result<Option<u64>>
    {
        Ok(None)
    }

    /// Name of the symbol covering `address`, `None` if nothing covers it
    fn resolve_symbol(&self, address: Address) -> Result<Option<String>>;

    /// Live value of a core register by name, `None` if unavailable
    fn core_register(&self, name: &str) -> Result<Option<u64>>;
}

impl<T: MemoryOracle + ?Sized> MemoryOracle for &T
{
    fn read_scalar(&self, address: Address, width: usize) -> Result<u64>
    {
        (**self).read_scalar(address, width)
    }

    fn read_c_string(&self, address: Address, max_len: usize) -> Result<String>
    {
        (**self).read_c_string(address, max_len)
    }

    fn symbol_address(&self, name: &str) -> Result<Option<Address>>
    {
        (**self).symbol_address(name)
    }

    fn symbol_size(&self, address: Address) -> Result<Option<u64>>
    {
        (**self).symbol_size(address)
    }

    fn resolve_symbol(&self, address: Address) -> Result<Option<String>>
    {
        (**self).resolve_symbol(address)
    }

    fn core_register(&self, name: &str) -> Result<Option<u64>>
    {
        (**self).core_register(name)
    }
}

impl<T: MemoryOracle + ?Sized> MemoryOracle for Box<T>
{
    fn read_scalar(&self, address: Address, width: usize) -> Result<u64>
    {
        (**self).read_scalar(address, width)
    }

    fn read_c_string(&self, address: Address, max_len: usize) -> Result<String>
    {
        (**self).read_c_string(address, max_len)
    }

    fn symbol_address(&self, name: &str) -> Result<Option<Address>>
    {
        (**self).symbol_address(name)
    }

    fn symbol_size(&self, address: Address) -> Result<Option<u64>>
    {
        (**self).symbol_size(address)
    }

    fn resolve_symbol(&self, address: Address) -> Result<Option<String>>
    {
        (**self).resolve_symbol(address)
    }

    fn core_register(&self, name: &str) -> Result<Option<u64>>
    {
        (**self).core_register(name)
    }
}

/// Typed reads of kernel struct fields
///
/// Pairs an oracle with the session's [`KernelLayout`] so decoders can write
/// `reader.read(thread, &layout.thread.stack_base)` instead of building
/// addresses by hand.
pub struct FieldReader<'a, O: ?Sized>
{
    oracle: &'a O,
    layout: &'a KernelLayout,
}

impl<O: ?Sized> Clone for FieldReader<'_, O>
{
    fn clone(&self) -> Self
    {
        *self
    }
}

impl<O: ?Sized> Copy for FieldReader<'_, O> {}

impl<'a, O: MemoryOracle + ?Sized> FieldReader<'a, O>
{
    /// Create a reader over `oracle` using `layout` for pointer widths
    pub fn new(oracle: &'a O, layout: &'a KernelLayout) -> Self
    {
        Self { oracle, layout }
    }

    /// The underlying oracle
    pub fn oracle(&self) -> &'a O
    {
        self.oracle
    }

    /// The session's struct layouts
    pub fn layout(&self) -> &'a KernelLayout
    {
        self.layout
    }

    /// Read `field` of the struct at `base` as an unsigned scalar
    pub fn read(&self, base: Address, field: &FieldDescriptor) -> Result<u64>
    {
        self.oracle.read_scalar(field.at(base), field.width)
    }

    /// Read a pointer-typed `field` of the struct at `base`
    pub fn read_address(&self, base: Address, field: &FieldDescriptor) -> Result<Address>
    {
        self.read(base, field).map(Address::from)
    }

    /// Read a bare pointer stored at `address`
    pub fn read_pointer(&self, address: Address) -> Result<Address>
    {
        self.oracle.read_scalar(address, self.layout.pointer_width).map(Address::from)
    }

    /// Read the inline name of the kernel object at `object`
    pub fn read_name(&self, object: Address) -> Result<String>
    {
        let name = &self.layout.object.name;
        self.oracle.read_c_string(name.at(object), name.width)
    }

    /// Read the raw flags byte of the object header at `object`
    pub fn read_header_flags(&self, object: Address) -> Result<u8>
    {
        self.read(object, &self.layout.object.flags).map(|flags| flags as u8)
    }
}
