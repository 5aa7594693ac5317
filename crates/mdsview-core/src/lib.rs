//! # mdsview-core
//!
//! Kernel object introspection for the MDS RTOS.
//!
//! Given read access to a halted (or running) target, this crate walks the
//! kernel's object registries and decodes threads, devices, timers,
//! semaphores, mutexes, events, message queues, memory pools and heaps into
//! table rows for a debugger front end.
//!
//! ## Pieces
//!
//! - [`MemoryOracle`]: the only way the engine sees the target. Implement it
//!   over a debug probe, or use [`image::MemoryImage`] for ELF files and RAM
//!   dumps.
//! - [`KernelLayout`]: C struct offsets for the configured ABI, handed to a
//!   typed [`oracle::FieldReader`].
//! - [`walker::ListWalker`]: bounded traversal of intrusive lists.
//! - [`decode`]: one decoder per object kind.
//! - [`Inspector`]: the session; refreshes a [`DisplaySink`] and decodes
//!   saved thread registers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mdsview_core::image::MemoryImage;
//! use mdsview_core::{Inspector, InspectorConfig, TableSink};
//!
//! # fn main() -> mdsview_core::Result<()> {
//! let image = MemoryImage::from_elf("firmware.elf")?;
//! let inspector = Inspector::new(image, InspectorConfig::default())?;
//!
//! let mut sink = TableSink::new();
//! inspector.declare_schemas(&mut sink);
//! inspector.refresh(&mut sink)?;
//! # Ok(())
//! # }
//! ```

pub mod category;
pub mod config;
pub mod decode;
pub mod error;
pub mod frame;
pub mod image;
pub mod inspector;
pub mod layout;
pub mod oracle;
pub mod prelude;
pub mod sink;
pub mod types;
pub mod walker;

pub use category::Category;
pub use config::InspectorConfig;
pub use decode::{KernelObject, ObjectHeader, ObjectPayload};
pub use error::{InspectError, Result};
pub use inspector::{CategorySummary, Inspector, RefreshSummary};
pub use layout::KernelLayout;
pub use oracle::MemoryOracle;
pub use sink::{Annotation, CategorySchema, DisplaySink, Row, TableSink};
pub use types::{Address, Architecture, RegisterId, RegisterSet};
