//! Target memory address type.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed target memory address
///
/// This wrapper around `u64` keeps addresses apart from sizes, counts and the
/// raw scalars read out of kernel structures. Targets are 32- or 64-bit, so
/// every address fits a `u64` regardless of the configured pointer width.
///
/// ## Rendering
///
/// `Display` renders uppercase hex with a `0x` prefix and no padding, which
/// is the format every address cell in the kernel tables uses.
///
/// ## Example
///
/// ```rust
/// use mdsview_core::types::Address;
///
/// let node = Address::from(0x2000_0100);
/// assert_eq!((node + 0x10).to_string(), "0x20000110");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Used as the terminator of singly-linked chains.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ```rust
    /// use mdsview_core::types::Address;
    ///
    /// const OBJECT_LIST: Address = Address::new(0x2000_0000);
    /// assert_eq!(OBJECT_LIST.value(), 0x2000_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use mdsview_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset from this address, checking for underflow
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }

    /// Signed distance `self - other` in bytes
    ///
    /// Stack cells show how far the saved stack pointer sits from the stack
    /// bounds; a corrupt thread can put it on either side, hence the sign.
    ///
    /// ```rust
    /// use mdsview_core::types::Address;
    ///
    /// let sp = Address::new(0x1080);
    /// assert_eq!(sp.offset_from(Address::new(0x1000)), 0x80);
    /// assert_eq!(Address::new(0x1000).offset_from(sp), -0x80);
    /// ```
    pub fn offset_from(self, other: Address) -> i128
    {
        i128::from(self.0) - i128::from(other.0)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
