//! # Display Sink
//!
//! Where decoded rows go.
//!
//! The engine never draws anything itself. A host (terminal UI, headless
//! report, debugger plugin) implements [`DisplaySink`], receives one
//! [`CategorySchema`] per category up front, and then a full snapshot of rows
//! on every refresh. [`TableSink`] is the in-memory implementation the
//! bundled front ends share.

use std::collections::{BTreeMap, BTreeSet};

use crate::category::Category;
use crate::types::Address;

/// Thread states worth drawing attention to
const THREAD_HIGHLIGHT: &[&str] = &["Ready", "Running", "Blocking"];

/// Column names and cosmetic hints for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySchema
{
    pub category: Category,
    pub columns: &'static [&'static str],
    /// Column whose numeric value should order rows
    pub sort_by: Option<&'static str>,
    /// Column and the values worth highlighting in it
    pub highlight: Option<(&'static str, &'static [&'static str])>,
}

impl CategorySchema
{
    /// The fixed schema for `category`
    pub fn for_category(category: Category) -> Self
    {
        let columns: &'static [&'static str] = match category {
            Category::Threads => &[
                "Thread",
                "Name",
                "Entry",
                "State",
                "StackPoint",
                "StackBase",
                "StackLimit",
                "Priority",
                "Ticks",
            ],
            Category::Devices => &["Device", "Name", "Type", "Driver", "Handler", "Owner/Mount"],
            Category::Timers => &["Timer", "Name", "Type", "Entry", "Arg", "TickStart", "TickLimit"],
            Category::Semaphores => &["Semaphore", "Name", "Value", "Max", "Thread"],
            Category::Mutexes => &["Mutex", "Name", "Value", "Nest", "Owner", "Thread"],
            Category::Events => &["Event", "Name", "Value", "Thread"],
            Category::MsgQueues => &["MsgQueue", "Name", "QueBuff", "MsgSize", "Free", "Recver", "Sender"],
            Category::MemPools => &["MemPool", "Name", "MemBuff", "BlkSize", "Free", "Thread"],
            Category::MemHeaps => &["MemHeap", "Name", "MemBuff", "BufSize", "Cur", "Max"],
        };

        let (sort_by, highlight) = match category {
            Category::Threads => (Some("Priority"), Some(("State", THREAD_HIGHLIGHT))),
            _ => (None, None),
        };

        Self {
            category,
            columns,
            sort_by,
            highlight,
        }
    }

    /// Index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize>
    {
        self.columns.iter().position(|column| *column == name)
    }

    /// Whether `value` in `column` should be highlighted
    ///
    /// Matches the whole cell or its last `|`-separated part, so
    /// `Yield|Ready` highlights like `Ready`.
    pub fn is_highlighted(&self, column: usize, value: &str) -> bool
    {
        let Some((name, values)) = self.highlight else {
            return false;
        };
        if self.column_index(name) != Some(column) {
            return false;
        }
        let last = value.rsplit('|').next().unwrap_or(value);
        values.contains(&value) || values.contains(&last)
    }
}

/// Something noteworthy about a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation
{
    /// The row decoded, but a derived invariant does not hold
    Warning(String),
    /// The row stands in for an object (or category) that failed to decode
    Diagnostic(String),
}

/// One table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row
{
    pub cells: Vec<String>,
    /// Saved-context pointer for register lookup (threads only)
    pub context: Option<Address>,
    pub annotation: Option<Annotation>,
}

impl Row
{
    /// A plain row
    pub fn new(cells: Vec<String>) -> Self
    {
        Self {
            cells,
            context: None,
            annotation: None,
        }
    }

    /// Attach a warning annotation
    #[must_use]
    pub fn with_warning(mut self, message: impl Into<String>) -> Self
    {
        self.annotation = Some(Annotation::Warning(message.into()));
        self
    }

    /// Diagnostic row standing in for a failed decode
    ///
    /// The first cell is the node address (or `-` for a whole category),
    /// the second the error; the rest are blank so column counts still match.
    pub fn placeholder(category: Category, node: Option<Address>, message: &str) -> Self
    {
        let width = CategorySchema::for_category(category).columns.len();
        let mut cells = vec![String::new(); width];
        cells[0] = node.map_or_else(|| "-".to_string(), |node| node.to_string());
        cells[1] = format!("<{message}>");
        Self {
            cells,
            context: None,
            annotation: Some(Annotation::Diagnostic(message.to_string())),
        }
    }

    /// Whether this row is a decode failure placeholder
    pub fn is_placeholder(&self) -> bool
    {
        matches!(self.annotation, Some(Annotation::Diagnostic(_)))
    }
}

/// Receiver of schemas and rows
pub trait DisplaySink
{
    /// Declare the columns of a category
    fn set_schema(&mut self, schema: &CategorySchema);

    /// Drop every row of every category
    fn clear(&mut self);

    /// Append a row to a category
    fn add_row(&mut self, category: Category, row: Row);

    /// Whether an optional category is currently shown
    fn is_visible(&self, category: Category) -> bool;
}

/// In-memory table store
///
/// Every category starts visible. Threads cannot be hidden.
#[derive(Debug, Clone)]
pub struct TableSink
{
    schemas: BTreeMap<Category, CategorySchema>,
    rows: BTreeMap<Category, Vec<Row>>,
    hidden: BTreeSet<Category>,
}

impl Default for TableSink
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl TableSink
{
    /// An empty sink with every category visible
    pub fn new() -> Self
    {
        Self {
            schemas: BTreeMap::new(),
            rows: BTreeMap::new(),
            hidden: BTreeSet::new(),
        }
    }

    /// Show or hide an optional category
    pub fn set_visible(&mut self, category: Category, visible: bool)
    {
        if visible || category.is_mandatory() {
            self.hidden.remove(&category);
        } else {
            self.hidden.insert(category);
        }
    }

    /// Flip an optional category's visibility, returning the new state
    pub fn toggle(&mut self, category: Category) -> bool
    {
        let visible = !self.is_visible(category);
        self.set_visible(category, visible);
        self.is_visible(category)
    }

    /// Declared schema of a category
    pub fn schema(&self, category: Category) -> Option<&CategorySchema>
    {
        self.schemas.get(&category)
    }

    /// Rows of a category from the last refresh
    pub fn rows(&self, category: Category) -> &[Row]
    {
        self.rows.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows ordered by the schema's sort column, numeric values first
    ///
    /// `init->curr` priorities sort by their current value. Rows whose sort
    /// cell is not a number keep their refresh order after the numeric ones.
    pub fn sorted_rows(&self, category: Category) -> Vec<&Row>
    {
        let mut rows: Vec<&Row> = self.rows(category).iter().collect();
        let Some(column) = self
            .schema(category)
            .and_then(|schema| schema.sort_by.and_then(|name| schema.column_index(name)))
        else {
            return rows;
        };
        rows.sort_by_key(|row| {
            let cell = row.cells.get(column).map_or("", String::as_str);
            let current = cell.rsplit("->").next().unwrap_or(cell);
            current.parse::<u64>().map_or((1, 0), |value| (0, value))
        });
        rows
    }
}

impl DisplaySink for TableSink
{
    fn set_schema(&mut self, schema: &CategorySchema)
    {
        self.schemas.insert(schema.category, schema.clone());
    }

    fn clear(&mut self)
    {
        self.rows.clear();
    }

    fn add_row(&mut self, category: Category, row: Row)
    {
        self.rows.entry(category).or_default().push(row);
    }

    fn is_visible(&self, category: Category) -> bool
    {
        !self.hidden.contains(&category)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_thread_schema_hints()
    {
        let schema = CategorySchema::for_category(Category::Threads);
        assert_eq!(schema.columns.len(), 9);
        assert_eq!(schema.sort_by, Some("Priority"));
        let state = schema.column_index("State").unwrap();
        assert!(schema.is_highlighted(state, "Running"));
        assert!(schema.is_highlighted(state, "Yield|Ready"));
        assert!(!schema.is_highlighted(state, "Inactive"));
        assert!(!schema.is_highlighted(0, "Running"));
    }

    #[test]
    fn test_placeholder_matches_column_count()
    {
        let row = Row::placeholder(Category::MsgQueues, None, "malformed list");
        assert_eq!(row.cells.len(), 7);
        assert_eq!(row.cells[0], "-");
        assert_eq!(row.cells[1], "<malformed list>");
        assert!(row.is_placeholder());
    }

    #[test]
    fn test_threads_cannot_be_hidden()
    {
        let mut sink = TableSink::new();
        sink.set_visible(Category::Threads, false);
        assert!(sink.is_visible(Category::Threads));
        assert!(!sink.toggle(Category::Timers));
        assert!(sink.toggle(Category::Timers));
    }

    #[test]
    fn test_sorted_rows_by_current_priority()
    {
        let mut sink = TableSink::new();
        sink.set_schema(&CategorySchema::for_category(Category::Threads));
        for prio in ["9", "2->5", "1", "x"] {
            let mut cells = vec![String::new(); 9];
            cells[7] = prio.to_string();
            sink.add_row(Category::Threads, Row::new(cells));
        }
        let order: Vec<_> = sink.sorted_rows(Category::Threads).iter().map(|r| r.cells[7].as_str()).collect();
        assert_eq!(order, ["1", "2->5", "9", "x"]);
    }
}
