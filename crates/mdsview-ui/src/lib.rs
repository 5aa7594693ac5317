//! # mdsview-ui
//!
//! Terminal UI for browsing MDS RTOS kernel objects.
//!
//! One tab per object category, a register panel for the selected thread,
//! and optional periodic refresh. Rendering is built on `ratatui`; input is
//! polled from `crossterm` on a blocking task.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use mdsview_core::image::{Endian, MemoryImage};
//! use mdsview_core::{Inspector, InspectorConfig};
//! use mdsview_ui::run_tui;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let image = MemoryImage::new(Endian::Little);
//! let inspector = Inspector::new(image, InspectorConfig::default())?;
//! run_tui(inspector, Some(Duration::from_secs(1)), &[]).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod event;
pub mod tui;
pub mod ui;
pub mod widgets;

use std::time::Duration;

pub use app::App;
use mdsview_core::{Category, Inspector, MemoryOracle};
pub use tui::Tui;

/// Take over the terminal and browse `inspector` until the user quits
///
/// `refresh_interval` enables periodic re-reads of the target; `None`
/// refreshes only on demand. Categories in `hidden` start hidden.
///
/// # Errors
///
/// Returns an error if the terminal cannot be set up, drawn or restored.
pub async fn run_tui<O: MemoryOracle>(
    inspector: Inspector<O>,
    refresh_interval: Option<Duration>,
    hidden: &[Category],
) -> std::io::Result<()>
{
    let app = App::new(inspector, refresh_interval, hidden);
    let mut tui = Tui::new()?;
    tui.run(app).await
}
