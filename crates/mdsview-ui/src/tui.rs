//! Terminal setup, teardown and the main loop

use std::io::{self, Stdout};
use std::panic;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use mdsview_core::MemoryOracle;
use mdsview_utils::info;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::App;
use crate::event::{Event, EventHandler};

/// Input poll period; also the resolution of auto-refresh
const TICK_RATE: Duration = Duration::from_millis(250);

/// Owns the terminal for the lifetime of the UI
///
/// Raw mode and the alternate screen are undone on drop and on panic.
pub struct Tui
{
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui
{
    /// Switch the terminal into raw mode on the alternate screen
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be configured.
    pub fn new() -> io::Result<Self>
    {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let previous_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = Self::restore();
            previous_hook(panic_info);
        }));

        Ok(Self { terminal })
    }

    /// Draw and handle input until the user quits
    ///
    /// # Errors
    ///
    /// Returns an error if drawing or restoring the terminal fails.
    pub async fn run<O: MemoryOracle>(&mut self, mut app: App<O>) -> io::Result<()>
    {
        info!(os = app.inspector.os_name(), "TUI started");
        let mut events = EventHandler::new(TICK_RATE);

        while !app.should_quit {
            self.terminal.draw(|frame| crate::ui::draw(frame, &mut app))?;

            match events.next().await {
                Some(Event::Key(key)) => {
                    if app.handle_key_event(key) {
                        break;
                    }
                }
                Some(Event::Tick) => app.tick(),
                Some(Event::Resize) => {}
                None => break,
            }
        }

        events.stop();
        Self::restore()?;
        info!("TUI closed");
        Ok(())
    }

    /// Leave the alternate screen and raw mode
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be restored.
    pub fn restore() -> io::Result<()>
    {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        Ok(())
    }
}

impl Drop for Tui
{
    fn drop(&mut self)
    {
        let _ = Self::restore();
    }
}
