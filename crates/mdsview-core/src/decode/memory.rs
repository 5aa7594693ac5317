//! Memory pools and heaps.
//!
//! ## Pools
//!
//! A pool's buffer is a run of equally sized blocks, each prefixed by a
//! one-word header union. While a block is free its header links to the
//! next free header; once allocated it holds the owning pool's address. The
//! free chain ends on null, on a header linking to itself, or on a link back
//! to the pool.
//!
//! The pool struct does not record its block count, so the total comes from
//! scanning the buffer: a block belongs to the pool while its header is on
//! the free chain or points at the pool. When a sized symbol starts at the
//! buffer the kernel's own count, `size / (header + blkSize)`, bounds the
//! scan; otherwise it stops at [`POOL_SCAN_LIMIT`]. The traversal cap only
//! bounds the free chain.
//!
//! ## Heaps
//!
//! `limit` is the allocator's end node; its `next` link is the first node of
//! the buffer, so the buffer spans `[limit->next, limit)`.

use std::collections::HashSet;

use tracing::debug;

use super::format::address_list;
use super::{Decoder, PayloadRow, WaitList};
use crate::error::{InspectError, Result};
use crate::oracle::MemoryOracle;
use crate::types::Address;
use crate::walker::ListWalker;

/// Blocks scanned before an unsized pool buffer is reported as malformed
pub const POOL_SCAN_LIMIT: usize = 0x1_0000;

/// `MDS_MemPool_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemPoolInfo
{
    pub mem_buff: Address,
    pub blk_size: u64,
    pub free: usize,
    pub total: usize,
    pub waiters: WaitList,
}

impl PayloadRow for MemPoolInfo
{
    fn cells(&self) -> Vec<String>
    {
        vec![
            self.mem_buff.to_string(),
            self.blk_size.to_string(),
            format!("{}/{}", self.free, self.total),
            address_list(&self.waiters),
        ]
    }

    fn warning(&self) -> Option<String>
    {
        (self.free > self.total).then(|| format!("free count {} exceeds total {}", self.free, self.total))
    }
}

/// `MDS_MemHeap_t` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemHeapInfo
{
    pub base: Address,
    pub limit: Address,
    /// Bytes in use, when heap statistics are compiled in
    pub cur: Option<u64>,
    /// Peak bytes in use, when heap statistics are compiled in
    pub max: Option<u64>,
}

impl MemHeapInfo
{
    /// `limit - base`; negative when the snapshot is inconsistent
    pub fn size(&self) -> i128
    {
        self.limit.offset_from(self.base)
    }
}

impl PayloadRow for MemHeapInfo
{
    fn cells(&self) -> Vec<String>
    {
        let stat = |value: Option<u64>| value.map(|value| value.to_string()).unwrap_or_default();
        vec![self.base.to_string(), self.size().to_string(), stat(self.cur), stat(self.max)]
    }

    fn warning(&self) -> Option<String>
    {
        if self.limit < self.base {
            return Some("heap limit below base".to_string());
        }
        match (self.cur, self.max) {
            (Some(cur), Some(max)) if cur > max => Some(format!("usage {cur} exceeds peak {max}")),
            _ => None,
        }
    }
}

impl<O: MemoryOracle + ?Sized> Decoder<'_, O>
{
    pub(crate) fn mem_pool(&self, pool: Address) -> Result<MemPoolInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().mem_pool;
        let mem_buff = reader.read_address(pool, &layout.mem_buff)?;
        let blk_size = reader.read(pool, &layout.blk_size)?;
        let lfree = reader.read_address(pool, &layout.lfree)?;

        let free_headers = ListWalker::chain(reader, lfree, layout.header_next, self.cap())
            .take_while(|node| !matches!(node, Ok(node) if *node == pool))
            .collect::<Result<HashSet<Address>>>()?;

        Ok(MemPoolInfo {
            mem_buff,
            blk_size,
            free: free_headers.len(),
            total: self.pool_blocks(pool, mem_buff, blk_size, &free_headers)?,
            waiters: self.wait_list(layout.list.at(pool))?,
        })
    }

    /// Count the blocks of `pool` laid out from `mem_buff`
    fn pool_blocks(&self, pool: Address, mem_buff: Address, blk_size: u64, free: &HashSet<Address>) -> Result<usize>
    {
        if mem_buff.is_null() {
            return Ok(0);
        }

        let reader = self.reader();
        let stride = self.layout().mem_pool.header_size + blk_size;
        let buffer_blocks = reader
            .oracle()
            .symbol_size(mem_buff)?
            .map(|size| usize::try_from(size / stride).unwrap_or(usize::MAX));
        let limit = buffer_blocks.unwrap_or(POOL_SCAN_LIMIT);

        let mut header = mem_buff;
        let mut total = 0;
        loop {
            if total == limit {
                if buffer_blocks.is_some() {
                    return Ok(total);
                }
                return Err(InspectError::MalformedList {
                    sentinel: mem_buff,
                    cap: limit,
                });
            }
            let belongs = free.contains(&header) ||
                match reader.read_pointer(header) {
                    Ok(owner) => owner == pool,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        debug!(%pool, %header, error = %err, "pool scan stopped");
                        false
                    }
                };
            if !belongs {
                return Ok(total);
            }
            total += 1;
            header = header + stride;
        }
    }

    pub(crate) fn mem_heap(&self, heap: Address) -> Result<MemHeapInfo>
    {
        let reader = self.reader();
        let layout = &self.layout().mem_heap;
        let limit = reader.read_address(heap, &layout.limit)?;
        let base = reader.read_address(limit, &layout.node_next)?;

        let (cur, max) = match &layout.stats {
            Some(stats) => (Some(reader.read(heap, &stats.cur)?), Some(reader.read(heap, &stats.max)?)),
            None => (None, None),
        };

        Ok(MemHeapInfo { base, limit, cur, max })
    }
}
