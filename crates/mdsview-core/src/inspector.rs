//! # Inspector
//!
//! The session object a host holds on to: one oracle, one validated layout,
//! one cached architecture probe.
//!
//! ## Refresh
//!
//! [`Inspector::refresh`] rebuilds the sink's tables from scratch:
//!
//! 1. Clear every row
//! 2. Walk Threads, then each optional category the sink reports visible
//! 3. Decode every node of the category's registry list into one row
//!
//! Failures stay local. A node that fails to decode becomes a diagnostic
//! placeholder row, a registry list that cannot be walked becomes a single
//! category placeholder, and the refresh moves on. Only
//! [`InspectError::Disconnected`] aborts it.

use once_cell::unsync::OnceCell;
use tracing::{debug, trace, warn};

use crate::category::Category;
use crate::config::InspectorConfig;
use crate::decode::{Decoder, KernelObject};
use crate::error::{InspectError, Result};
use crate::frame::{decode_frame, detect_architecture};
use crate::layout::KernelLayout;
use crate::oracle::{FieldReader, MemoryOracle};
use crate::sink::{Annotation, CategorySchema, DisplaySink, Row};
use crate::types::{Address, Architecture, RegisterSet};
use crate::walker::ListWalker;

/// Name reported to hosts that list supported kernels
pub const OS_NAME: &str = "MDS_RTOS";

/// Array of registry sentinels, indexed by [`Category::registry_index`]
pub const OBJECT_LIST_SYMBOL: &str = "g_objectList";

/// Scheduler routine that performs the context switch
pub const CONTEXT_SWITCH_SYMBOL: &str = "MDS_CoreSchedulerSwitch";

/// Outcome of one category walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySummary
{
    pub category: Category,
    /// Rows decoded successfully
    pub rows: usize,
    /// Placeholder rows emitted
    pub failures: usize,
}

/// Outcome of a whole refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary
{
    /// Walked categories, in refresh order
    pub categories: Vec<CategorySummary>,
    /// Optional categories skipped because the sink hid them
    pub skipped: Vec<Category>,
}

impl RefreshSummary
{
    /// Summary of one walked category
    pub fn category(&self, category: Category) -> Option<&CategorySummary>
    {
        self.categories.iter().find(|summary| summary.category == category)
    }

    /// Placeholder rows across every category
    pub fn failures(&self) -> usize
    {
        self.categories.iter().map(|summary| summary.failures).sum()
    }
}

/// Kernel object introspection session
///
/// ## Example
///
/// ```rust
/// use mdsview_core::image::{Endian, MemoryImage};
/// use mdsview_core::{Inspector, InspectorConfig, TableSink};
///
/// let image = MemoryImage::new(Endian::Little);
/// let inspector = Inspector::new(image, InspectorConfig::default()).unwrap();
/// assert_eq!(inspector.os_name(), "MDS_RTOS");
///
/// // No registry symbol: Threads gets a single placeholder row
/// let mut sink = TableSink::new();
/// let summary = inspector.refresh(&mut sink).unwrap();
/// assert_eq!(summary.failures(), 9);
/// ```
pub struct Inspector<O>
{
    oracle: O,
    config: InspectorConfig,
    layout: KernelLayout,
    /// `None` once probed and found unsupported
    architecture: OnceCell<Option<Architecture>>,
}

impl<O: MemoryOracle> Inspector<O>
{
    /// Create a session over `oracle`
    ///
    /// ## Errors
    ///
    /// [`InspectError::InvalidLayout`] if `config` describes an ABI that
    /// cannot be laid out.
    pub fn new(oracle: O, config: InspectorConfig) -> Result<Self>
    {
        let layout = KernelLayout::new(&config)?;
        debug!(
            pointer_width = config.pointer_width,
            tick_width = config.tick_width,
            cap = config.traversal_cap,
            "Created inspector"
        );
        Ok(Self {
            oracle,
            config,
            layout,
            architecture: OnceCell::new(),
        })
    }

    pub fn oracle(&self) -> &O
    {
        &self.oracle
    }

    /// Mutable oracle access; forgets the cached architecture probe
    pub fn oracle_mut(&mut self) -> &mut O
    {
        self.architecture.take();
        &mut self.oracle
    }

    pub fn config(&self) -> &InspectorConfig
    {
        &self.config
    }

    pub fn layout(&self) -> &KernelLayout
    {
        &self.layout
    }

    pub fn os_name(&self) -> &'static str
    {
        OS_NAME
    }

    fn reader(&self) -> FieldReader<'_, O>
    {
        FieldReader::new(&self.oracle, &self.layout)
    }

    fn decoder(&self) -> Decoder<'_, O>
    {
        Decoder::new(self.reader(), self.config.traversal_cap)
    }

    /// Target architecture: the configured override, else a one-time probe
    ///
    /// ## Errors
    ///
    /// [`InspectError::UnsupportedArchitecture`] if the probe found neither
    /// marker symbol. Oracle errors during the probe are returned without
    /// caching, so the next call probes again.
    pub fn architecture(&self) -> Result<Architecture>
    {
        if let Some(architecture) = self.config.architecture {
            return Ok(architecture);
        }
        let probed = self.architecture.get_or_try_init(|| match detect_architecture(&self.oracle) {
            Ok(architecture) => Ok(Some(architecture)),
            Err(InspectError::UnsupportedArchitecture) => Ok(None),
            Err(err) => Err(err),
        })?;
        probed.ok_or(InspectError::UnsupportedArchitecture)
    }

    /// Addresses where the kernel switches threads, for host breakpoints
    ///
    /// Empty if the scheduler symbol is absent.
    pub fn context_switch_addresses(&self) -> Result<Vec<Address>>
    {
        Ok(self.oracle.symbol_address(CONTEXT_SWITCH_SYMBOL)?.into_iter().collect())
    }

    /// Registers saved in the thread context at `context`
    ///
    /// `context` is a thread row's [`Row::context`].
    pub fn thread_registers(&self, context: Address) -> Result<RegisterSet>
    {
        let architecture = self.architecture()?;
        decode_frame(self.reader(), architecture, context)
    }

    /// Declare every category's columns to `sink`
    pub fn declare_schemas<S: DisplaySink + ?Sized>(&self, sink: &mut S)
    {
        for category in Category::ALL {
            sink.set_schema(&CategorySchema::for_category(category));
        }
    }

    /// Sentinel node of a category's registry list
    pub fn registry_root(&self, category: Category) -> Result<Address>
    {
        let base = self
            .oracle
            .symbol_address(OBJECT_LIST_SYMBOL)?
            .ok_or_else(|| InspectError::SymbolNotFound(OBJECT_LIST_SYMBOL.to_string()))?;
        Ok(base + category.registry_index() * self.layout.list_node.shape.size)
    }

    /// Decode one registry node of `category`
    pub fn decode(&self, category: Category, node: Address) -> Result<KernelObject>
    {
        self.decoder().decode(category, node)
    }

    /// Every object of `category`, failing on the first error
    pub fn objects(&self, category: Category) -> Result<Vec<KernelObject>>
    {
        let decoder = self.decoder();
        ListWalker::circular(self.reader(), self.registry_root(category)?, self.config.traversal_cap)
            .map(|node| node.and_then(|node| decoder.decode(category, node)))
            .collect()
    }

    /// Rebuild the sink's rows from the current target state
    ///
    /// ## Errors
    ///
    /// Only fatal oracle errors ([`InspectError::is_fatal`]) are returned;
    /// everything else ends up in placeholder rows and the summary.
    pub fn refresh<S: DisplaySink + ?Sized>(&self, sink: &mut S) -> Result<RefreshSummary>
    {
        sink.clear();
        let mut summary = RefreshSummary::default();

        for category in Category::ALL {
            if !category.is_mandatory() && !sink.is_visible(category) {
                trace!(%category, "Skipping hidden category");
                summary.skipped.push(category);
                continue;
            }
            summary.categories.push(self.refresh_category(category, sink)?);
        }

        debug!(
            walked = summary.categories.len(),
            skipped = summary.skipped.len(),
            failures = summary.failures(),
            "Refresh complete"
        );
        Ok(summary)
    }

    fn refresh_category<S: DisplaySink + ?Sized>(&self, category: Category, sink: &mut S) -> Result<CategorySummary>
    {
        let mut summary = CategorySummary {
            category,
            rows: 0,
            failures: 0,
        };

        let root = match self.registry_root(category) {
            Ok(root) => root,
            Err(err) => {
                let err = fatal_or(err)?;
                warn!(%category, error = %err, "Registry root unavailable");
                sink.add_row(category, Row::placeholder(category, None, &err.to_string()));
                summary.failures += 1;
                return Ok(summary);
            }
        };
        debug!(%category, %root, "Walking registry");

        let decoder = self.decoder();
        let object_node = self.layout.object.node;
        for node in ListWalker::circular(self.reader(), root, self.config.traversal_cap) {
            let node = match node {
                Ok(node) => node,
                Err(err) => {
                    let err = fatal_or(err)?;
                    warn!(%category, error = %err, "Registry walk abandoned");
                    sink.add_row(category, Row::placeholder(category, None, &err.to_string()));
                    summary.failures += 1;
                    break;
                }
            };

            match decoder.decode(category, node) {
                Ok(object) => {
                    let row = object.to_row();
                    if let Some(Annotation::Warning(message)) = &row.annotation {
                        warn!(%category, address = %object.address, "{message}");
                    }
                    sink.add_row(category, row);
                    summary.rows += 1;
                }
                Err(err) => {
                    let err = fatal_or(err)?;
                    let address = object_node.container_of(node);
                    warn!(%category, %address, error = %err, "Object decode failed");
                    sink.add_row(category, Row::placeholder(category, Some(address), &err.to_string()));
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Propagate fatal errors, hand back the rest for reporting
fn fatal_or(err: InspectError) -> Result<InspectError>
{
    if err.is_fatal() {
        Err(err)
    } else {
        Ok(err)
    }
}
