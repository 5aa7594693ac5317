//! # Inspector Configuration
//!
//! Target ABI parameters the kernel was built with. The engine cannot learn
//! these from memory, so they come from the host (CLI flags, environment).
//!
//! | Parameter         | Kernel setting            | Default |
//! |-------------------|---------------------------|---------|
//! | `pointer_width`   | `sizeof(void *)`          | 4       |
//! | `tick_width`      | `sizeof(MDS_Tick_t)`      | 4       |
//! | `name_size`       | `CONFIG_MDS_OBJECT_NAME_SIZE` | 7   |
//! | `heap_stats`      | `CONFIG_MDS_MEMHEAP_STATS` | true   |
//! | `timer_skiplist_level` | `MDS_TIMER_SKIPLIST_LEVEL` | 1  |
//! | `arm_fpu`         | Cortex-M built with an FPU | false  |
//! | `traversal_cap`   | n/a                       | 1024    |

use crate::types::Architecture;

/// Default hard cap on nodes visited by a single list walk
pub const DEFAULT_TRAVERSAL_CAP: usize = 1024;

/// Default size of the inline object name buffer
pub const DEFAULT_NAME_SIZE: usize = 7;

/// Configuration for an [`Inspector`](crate::Inspector) session
///
/// ```rust
/// use mdsview_core::InspectorConfig;
///
/// let config = InspectorConfig::default().with_pointer_width(8);
/// assert_eq!(config.pointer_width, 8);
/// assert_eq!(config.traversal_cap, 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig
{
    /// Size of a target pointer in bytes (4 or 8)
    pub pointer_width: usize,
    /// Size of `MDS_Tick_t` in bytes (4 or 8)
    pub tick_width: usize,
    /// Size of the inline object name buffer
    pub name_size: usize,
    /// Whether `MDS_MemHeap_t` carries cur/max/total usage counters
    pub heap_stats: bool,
    /// Number of list nodes in `MDS_Timer_t.node`
    pub timer_skiplist_level: usize,
    /// Cortex-M contexts start with `exc_flag` and may carry FPU registers
    pub arm_fpu: bool,
    /// Hard cap on nodes visited by one list walk
    pub traversal_cap: usize,
    /// Skip symbol probing and use this architecture
    pub architecture: Option<Architecture>,
}

impl Default for InspectorConfig
{
    fn default() -> Self
    {
        Self {
            pointer_width: 4,
            tick_width: 4,
            name_size: DEFAULT_NAME_SIZE,
            heap_stats: true,
            timer_skiplist_level: 1,
            arm_fpu: false,
            traversal_cap: DEFAULT_TRAVERSAL_CAP,
            architecture: None,
        }
    }
}

impl InspectorConfig
{
    /// Set the target pointer width
    #[must_use]
    pub fn with_pointer_width(mut self, width: usize) -> Self
    {
        self.pointer_width = width;
        self
    }

    /// Set the tick counter width
    #[must_use]
    pub fn with_tick_width(mut self, width: usize) -> Self
    {
        self.tick_width = width;
        self
    }

    /// Set the number of skiplist levels in a timer
    #[must_use]
    pub fn with_timer_skiplist_level(mut self, level: usize) -> Self
    {
        self.timer_skiplist_level = level;
        self
    }

    /// Decode Cortex-M contexts as saved by an FPU-enabled kernel
    #[must_use]
    pub fn with_arm_fpu(mut self, arm_fpu: bool) -> Self
    {
        self.arm_fpu = arm_fpu;
        self
    }

    /// Set the traversal cap
    #[must_use]
    pub fn with_traversal_cap(mut self, cap: usize) -> Self
    {
        self.traversal_cap = cap;
        self
    }

    /// Force an architecture instead of probing marker symbols
    #[must_use]
    pub fn with_architecture(mut self, architecture: Architecture) -> Self
    {
        self.architecture = Some(architecture);
        self
    }
}
