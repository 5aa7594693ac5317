//! # Types
//!
//! Target-agnostic value types used throughout the engine.
//!
//! These types keep raw target scalars apart: an [`Address`] is never a size
//! or a tick count, and a [`RegisterSet`] always knows which
//! [`Architecture`] it was decoded for.

pub mod address;
pub mod registers;

// Re-export all public types
pub use address::Address;
pub use registers::{Architecture, RegisterId, RegisterSet};
