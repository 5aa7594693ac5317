//! Common imports for hosts embedding the engine

pub use crate::category::Category;
pub use crate::config::InspectorConfig;
pub use crate::error::{InspectError, Result};
pub use crate::image::{Endian, MemoryImage};
pub use crate::inspector::{Inspector, RefreshSummary};
pub use crate::oracle::MemoryOracle;
pub use crate::sink::{Annotation, CategorySchema, DisplaySink, Row, TableSink};
pub use crate::types::{Address, Architecture, RegisterId, RegisterSet};
