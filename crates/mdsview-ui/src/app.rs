//! Application state and logic

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use mdsview_core::{Category, Inspector, MemoryOracle, RefreshSummary, RegisterSet, Row, TableSink};
use mdsview_utils::{debug, warn};
use ratatui::widgets::TableState;

/// Application state
pub struct App<O>
{
    pub inspector: Inspector<O>,
    /// Rows from the last refresh
    pub sink: TableSink,
    /// Category shown in the main table
    pub category: Category,
    pub table_state: TableState,
    /// Whether the register panel is open beside the thread table
    pub show_registers: bool,
    /// Registers of the selected thread, or why they are unavailable
    pub registers: Option<Result<RegisterSet, String>>,
    pub summary: Option<RefreshSummary>,
    /// Error message to display (if any)
    pub error_message: Option<String>,
    /// Whether the application should exit
    pub should_quit: bool,
    /// Auto-refresh period; `None` refreshes on demand only
    pub refresh_interval: Option<Duration>,
    pub paused: bool,
    last_refresh: Instant,
}

impl<O: MemoryOracle> App<O>
{
    /// Create the application and take the first snapshot
    ///
    /// Categories in `hidden` start hidden; Threads are shown regardless.
    pub fn new(inspector: Inspector<O>, refresh_interval: Option<Duration>, hidden: &[Category]) -> Self
    {
        let mut sink = TableSink::new();
        inspector.declare_schemas(&mut sink);
        for category in hidden {
            sink.set_visible(*category, false);
        }

        let mut app = Self {
            inspector,
            sink,
            category: Category::Threads,
            table_state: TableState::default(),
            show_registers: false,
            registers: None,
            summary: None,
            error_message: None,
            should_quit: false,
            refresh_interval,
            paused: false,
            last_refresh: Instant::now(),
        };
        app.refresh();
        app
    }

    /// Re-read every visible category from the target
    pub fn refresh(&mut self)
    {
        self.last_refresh = Instant::now();
        match self.inspector.refresh(&mut self.sink) {
            Ok(summary) => {
                debug!(failures = summary.failures(), "TUI refresh");
                self.summary = Some(summary);
            }
            Err(err) => {
                // Only a lost target gets here; stop polling it
                warn!("Refresh aborted: {err}");
                self.error_message = Some(format!("Refresh aborted: {err}"));
                self.paused = true;
            }
        }
        self.clamp_selection();
        self.update_registers();
    }

    /// Rows of the current category in display order
    pub fn rows(&self) -> Vec<&Row>
    {
        self.sink.sorted_rows(self.category)
    }

    pub fn selected_row(&self) -> Option<&Row>
    {
        let index = self.table_state.selected()?;
        self.rows().get(index).copied()
    }

    /// Whether the current category is hidden from refreshes
    pub fn is_hidden(&self) -> bool
    {
        use mdsview_core::DisplaySink;
        !self.sink.is_visible(self.category)
    }

    /// Handle a keyboard event
    ///
    /// Returns `true` if the application should quit, `false` otherwise.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool
    {
        self.error_message = None;

        match key_event.code {
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => {
                self.should_quit = true;
                return true;
            }
            KeyCode::Tab | KeyCode::Right => self.select_category(self.category_index() + 1),
            KeyCode::BackTab | KeyCode::Left => {
                self.select_category(self.category_index() + Category::ALL.len() - 1);
            }
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '1' as usize;
                self.select_category(index);
            }
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('p') => self.toggle_pause(),
            KeyCode::Char('h') => self.toggle_visibility(),
            KeyCode::Char('g') | KeyCode::Enter => {
                self.show_registers = !self.show_registers;
                self.update_registers();
            }
            KeyCode::Up => self.navigate(-1),
            KeyCode::Down => self.navigate(1),
            _ => {}
        }

        false
    }

    /// Update the application state (called on each tick)
    pub fn tick(&mut self)
    {
        let Some(interval) = self.refresh_interval else {
            return;
        };
        if !self.paused && self.last_refresh.elapsed() >= interval {
            self.refresh();
        }
    }

    fn category_index(&self) -> usize
    {
        Category::ALL.iter().position(|c| *c == self.category).unwrap_or(0)
    }

    fn select_category(&mut self, index: usize)
    {
        let category = Category::ALL[index % Category::ALL.len()];
        if category != self.category {
            self.category = category;
            self.table_state = TableState::default();
            self.clamp_selection();
            self.update_registers();
        }
    }

    fn toggle_pause(&mut self)
    {
        if self.refresh_interval.is_none() {
            self.error_message = Some("Auto-refresh is off; start with --refresh-ms to enable it".to_string());
            return;
        }
        self.paused = !self.paused;
    }

    fn toggle_visibility(&mut self)
    {
        if self.category.is_mandatory() {
            self.error_message = Some(format!("{} are always shown", self.category));
            return;
        }
        let visible = self.sink.toggle(self.category);
        debug!(category = %self.category, visible, "Toggled category");
        self.refresh();
    }

    /// Move the selection by `delta`, wrapping at either end
    fn navigate(&mut self, delta: isize)
    {
        let len = self.rows().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(len as isize) as usize;
        self.table_state.select(Some(next));
        self.update_registers();
    }

    fn clamp_selection(&mut self)
    {
        let len = self.rows().len();
        let selected = match self.table_state.selected() {
            _ if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => Some(0),
        };
        self.table_state.select(selected);
    }

    fn update_registers(&mut self)
    {
        self.registers = None;
        if !self.show_registers || self.category != Category::Threads {
            return;
        }
        let Some(context) = self.selected_row().and_then(|row| row.context) else {
            return;
        };
        self.registers = Some(self.inspector.thread_registers(context).map_err(|err| err.to_string()));
    }
}

#[cfg(test)]
mod tests
{
    use crossterm::event::KeyModifiers;
    use mdsview_core::image::{Endian, MemoryImage};
    use mdsview_core::InspectorConfig;

    use super::*;

    fn app() -> App<MemoryImage>
    {
        let inspector = Inspector::new(MemoryImage::new(Endian::Little), InspectorConfig::default()).unwrap();
        App::new(inspector, None, &[])
    }

    fn press(app: &mut App<MemoryImage>, code: KeyCode) -> bool
    {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_tabs_wrap()
    {
        let mut app = app();
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.category, Category::MemHeaps);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.category, Category::Threads);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.category, Category::Timers);
    }

    #[test]
    fn test_threads_cannot_be_hidden()
    {
        let mut app = app();
        press(&mut app, KeyCode::Char('h'));
        assert!(!app.is_hidden());
        assert!(app.error_message.is_some());

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('h'));
        assert!(app.is_hidden());
        assert!(app.rows().is_empty());
    }

    #[test]
    fn test_placeholder_rows_are_selectable()
    {
        // No registry symbol: every category has one diagnostic row
        let mut app = app();
        assert_eq!(app.rows().len(), 1);
        assert_eq!(app.table_state.selected(), Some(0));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.table_state.selected(), Some(0));
        assert!(app.selected_row().unwrap().is_placeholder());
    }

    #[test]
    fn test_initially_hidden()
    {
        let inspector = Inspector::new(MemoryImage::new(Endian::Little), InspectorConfig::default()).unwrap();
        let app = App::new(inspector, None, &[Category::Threads, Category::Timers]);
        let summary = app.summary.as_ref().unwrap();
        assert_eq!(summary.skipped, vec![Category::Timers]);
        assert!(summary.category(Category::Threads).is_some());
    }

    #[test]
    fn test_quit()
    {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
