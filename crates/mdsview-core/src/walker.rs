//! # List Walker
//!
//! Lazy traversal of the kernel's intrusive lists.
//!
//! The kernel links its objects through embedded list nodes, so a walk yields
//! node addresses and leaves it to the caller to map a node back to its
//! owner (see [`FieldDescriptor::container_of`]). Two shapes occur:
//!
//! - **Circular** doubly-linked lists with a sentinel node (object
//!   registries, wait lists). The walk starts at `sentinel->next` and ends
//!   when the link returns to the sentinel.
//! - **Chains**: singly-linked, null-terminated (free and used message
//!   lists, pool free lists). A link that points back at its own node also
//!   ends the chain; the kernel seeds the last free block that way.
//!
//! Both are the same iterator with a different [`Termination`]. Every walk
//! re-reads the target and is bounded by a hard cap: the target may be
//! running, or simply corrupt, and a walk that never terminates yields
//! [`InspectError::MalformedList`] and stops.

use tracing::trace;

use crate::error::{InspectError, Result};
use crate::layout::FieldDescriptor;
use crate::oracle::{FieldReader, MemoryOracle};
use crate::types::Address;

/// How a walk recognizes the end of its list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination
{
    /// Stop when the link returns to the sentinel node
    Sentinel,
    /// Stop on a null link or a node linking to itself
    Null,
}

/// Iterator over the node addresses of one list
///
/// ```rust
/// use mdsview_core::image::{Endian, MemoryImage};
/// use mdsview_core::oracle::FieldReader;
/// use mdsview_core::types::Address;
/// use mdsview_core::walker::ListWalker;
/// use mdsview_core::{InspectorConfig, KernelLayout};
///
/// let layout = KernelLayout::new(&InspectorConfig::default()).unwrap();
/// let mut image = MemoryImage::new(Endian::Little);
/// image.add_segment(Address::new(0x100), vec![0; 0x40]);
/// // Empty circular list: the sentinel links to itself
/// image.write_scalar(Address::new(0x104), 4, 0x100).unwrap();
///
/// let reader = FieldReader::new(&image, &layout);
/// let nodes: Vec<_> = ListWalker::circular(reader, Address::new(0x100), 16).collect();
/// assert!(nodes.is_empty());
/// ```
pub struct ListWalker<'a, O: ?Sized>
{
    reader: FieldReader<'a, O>,
    link: FieldDescriptor,
    head: Address,
    termination: Termination,
    cap: usize,
    cursor: Option<Address>,
    visited: usize,
    done: bool,
}

impl<'a, O: MemoryOracle + ?Sized> ListWalker<'a, O>
{
    /// Walk the circular list whose sentinel node is at `sentinel`
    pub fn circular(reader: FieldReader<'a, O>, sentinel: Address, cap: usize) -> Self
    {
        let link = reader.layout().list_node.next;
        Self::new(reader, sentinel, link, Termination::Sentinel, cap)
    }

    /// Walk the null-terminated chain starting at `first`, following `link`
    ///
    /// `first` itself is the first node; a null `first` is an empty chain.
    pub fn chain(reader: FieldReader<'a, O>, first: Address, link: FieldDescriptor, cap: usize) -> Self
    {
        Self::new(reader, first, link, Termination::Null, cap)
    }

    /// Walk with an explicit link field and termination mode
    pub fn new(
        reader: FieldReader<'a, O>,
        head: Address,
        link: FieldDescriptor,
        termination: Termination,
        cap: usize,
    ) -> Self
    {
        Self {
            reader,
            link,
            head,
            termination,
            cap,
            cursor: None,
            visited: 0,
            done: false,
        }
    }

    /// Number of nodes yielded so far
    pub fn visited(&self) -> usize
    {
        self.visited
    }

    fn candidate(&self) -> Result<Address>
    {
        match (self.cursor, self.termination) {
            (Some(node), _) => self.reader.read_address(node, &self.link),
            (None, Termination::Sentinel) => self.reader.read_address(self.head, &self.link),
            (None, Termination::Null) => Ok(self.head),
        }
    }

    fn is_end(&self, candidate: Address) -> bool
    {
        match self.termination {
            Termination::Sentinel => candidate == self.head,
            Termination::Null => candidate.is_null() || Some(candidate) == self.cursor,
        }
    }
}

impl<O: MemoryOracle + ?Sized> Iterator for ListWalker<'_, O>
{
    type Item = Result<Address>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.done {
            return None;
        }

        let candidate = match self.candidate() {
            Ok(candidate) => candidate,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        if self.is_end(candidate) {
            self.done = true;
            return None;
        }

        if self.visited >= self.cap {
            self.done = true;
            return Some(Err(InspectError::MalformedList {
                sentinel: self.head,
                cap: self.cap,
            }));
        }

        trace!(node = %candidate, "list node");
        self.visited += 1;
        self.cursor = Some(candidate);
        Some(Ok(candidate))
    }
}

/// Count the nodes of a walk, failing on the first error
pub fn count<O: MemoryOracle + ?Sized>(mut walker: ListWalker<'_, O>) -> Result<usize>
{
    walker.try_fold(0usize, |n, node| node.map(|_| n + 1))
}
