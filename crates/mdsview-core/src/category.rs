//! Kernel object categories and their registry slots.

use std::fmt;
use std::str::FromStr;

use crate::error::InspectError;

/// A kind of kernel object, one display table each
///
/// Threads are always refreshed; every other category is optional and only
/// walked while the display shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category
{
    Threads,
    Devices,
    Timers,
    Semaphores,
    Mutexes,
    Events,
    MsgQueues,
    MemPools,
    MemHeaps,
}

impl Category
{
    /// Every category in refresh order
    pub const ALL: [Category; 9] = [
        Category::Threads,
        Category::Devices,
        Category::Timers,
        Category::Semaphores,
        Category::Mutexes,
        Category::Events,
        Category::MsgQueues,
        Category::MemPools,
        Category::MemHeaps,
    ];

    /// Display name, also the identifier hosts use for visibility
    pub const fn name(self) -> &'static str
    {
        match self {
            Category::Threads => "Threads",
            Category::Devices => "Devices",
            Category::Timers => "Timers",
            Category::Semaphores => "Semaphores",
            Category::Mutexes => "Mutexes",
            Category::Events => "Events",
            Category::MsgQueues => "MsgQueues",
            Category::MemPools => "MemPools",
            Category::MemHeaps => "MemHeaps",
        }
    }

    /// Index of this category's list head in `g_objectList` (`MDS_ObjectType_t`)
    pub const fn registry_index(self) -> u64
    {
        match self {
            Category::Devices => 1,
            Category::Timers => 2,
            Category::Threads => 3,
            Category::Semaphores => 4,
            Category::Mutexes => 5,
            Category::Events => 6,
            Category::MsgQueues => 7,
            Category::MemPools => 8,
            Category::MemHeaps => 9,
        }
    }

    /// Whether the category is refreshed regardless of visibility
    pub const fn is_mandatory(self) -> bool
    {
        matches!(self, Category::Threads)
    }
}

impl fmt::Display for Category
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

impl FromStr for Category
{
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        Category::ALL
            .into_iter()
            .find(|category| category.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| InspectError::InvalidArgument(format!("unknown category '{s}'")))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_round_trip_names()
    {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>().unwrap(), category);
        }
        assert_eq!("msgqueues".parse::<Category>().unwrap(), Category::MsgQueues);
        assert!("Queues".parse::<Category>().is_err());
    }

    #[test]
    fn test_registry_indices_are_distinct()
    {
        let mut indices: Vec<_> = Category::ALL.iter().map(|c| c.registry_index()).collect();
        indices.sort_unstable();
        assert_eq!(indices, (1..=9).collect::<Vec<_>>());
    }
}
