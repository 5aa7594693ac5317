//! # Error Types
//!
//! General error handling for kernel-object introspection.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! ## Local vs. fatal failures
//!
//! Most failures are local to a single kernel object or category: the
//! refresh loop turns them into a placeholder row and carries on. Only
//! [`InspectError::Disconnected`] aborts a refresh, see
//! [`InspectError::is_fatal`].

use thiserror::Error;

use crate::types::Address;

/// Main error type for introspection operations
///
/// ## Error Categories
///
/// 1. **Target errors**: Disconnected, MemoryRead
/// 2. **Structure errors**: MalformedList, InvalidLayout
/// 3. **Symbol errors**: SymbolNotFound, UnsupportedArchitecture
/// 4. **Input errors**: InvalidArgument, Image, Io
#[derive(Error, Debug)]
pub enum InspectError
{
    /// Neither architecture marker symbol is present in the target
    ///
    /// Register extraction is skipped when this is returned; registers are
    /// never fabricated.
    #[error("Unsupported architecture: no RISC-V or ARM Thumb marker symbol found")]
    UnsupportedArchitecture,

    /// A list traversal exceeded the hard cap without terminating
    ///
    /// Either the target mutated while we were reading it or the list is
    /// corrupt. The object (or category) being decoded is abandoned.
    #[error("Malformed list at {sentinel}: no termination after {cap} nodes")]
    MalformedList
    {
        /// Sentinel (or chain head) the walk started from
        sentinel: Address,
        /// Traversal cap that was exceeded
        cap: usize,
    },

    /// The oracle could not read target memory at the given address
    #[error("Failed to read {width} bytes at {address}")]
    MemoryRead
    {
        /// Address of the failed read
        address: Address,
        /// Width of the failed read in bytes
        width: usize,
    },

    /// The oracle lost connectivity to the target
    ///
    /// This is the only error that aborts a refresh.
    #[error("Target disconnected: {0}")]
    Disconnected(String),

    /// A symbol the engine depends on is missing
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The configured target ABI cannot be laid out
    ///
    /// Examples:
    /// - Pointer width other than 4 or 8
    /// - Zero-sized object names
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Invalid argument passed to an engine function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to parse an object file for the in-memory image
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error (reading ELF files, RAM dumps, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InspectError
{
    /// Whether this error must abort the current refresh
    ///
    /// Everything except loss of connectivity is reported in place and the
    /// refresh keeps going with the next node or category.
    pub const fn is_fatal(&self) -> bool
    {
        matches!(self, Self::Disconnected(_))
    }
}

impl From<object::Error> for InspectError
{
    fn from(err: object::Error) -> Self
    {
        Self::Image(err.to_string())
    }
}

/// Convenience type alias for `Result<T, InspectError>`
///
/// ```rust
/// use mdsview_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, InspectError>;
