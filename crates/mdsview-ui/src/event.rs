//! Terminal input and tick events

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events the TUI loop reacts to
#[derive(Debug, Clone)]
pub enum Event
{
    /// Key press
    Key(KeyEvent),
    /// Terminal resized; redraw
    Resize,
    /// Periodic wake-up, drives auto-refresh
    Tick,
}

/// Polls crossterm on a blocking task and forwards events over a channel
pub struct EventHandler
{
    receiver: mpsc::Receiver<Event>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl EventHandler
{
    /// Start polling; a [`Event::Tick`] is sent every `tick_rate`
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self
    {
        let (sender, receiver) = mpsc::channel(64);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::task::spawn_blocking({
            let stop = Arc::clone(&stop);
            move || poll_loop(&sender, &stop, tick_rate)
        });

        Self { receiver, stop, handle }
    }

    /// Next event, `None` once the poller has exited
    pub async fn next(&mut self) -> Option<Event>
    {
        self.receiver.recv().await
    }

    /// Ask the poller to exit after its current poll
    pub fn stop(&mut self)
    {
        self.stop.store(true, Ordering::Relaxed);
        self.receiver.close();
    }

    #[must_use]
    pub fn is_running(&self) -> bool
    {
        !self.handle.is_finished()
    }
}

impl Drop for EventHandler
{
    fn drop(&mut self)
    {
        self.stop();
    }
}

fn poll_loop(sender: &mpsc::Sender<Event>, stop: &AtomicBool, tick_rate: Duration)
{
    let mut last_tick = Instant::now();
    while !stop.load(Ordering::Relaxed) {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout).unwrap_or(false) {
            let forwarded = match event::read() {
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
                Ok(CrosstermEvent::Resize(..)) => Some(Event::Resize),
                _ => None,
            };
            if let Some(event) = forwarded {
                if sender.blocking_send(event).is_err() {
                    return;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if sender.blocking_send(Event::Tick).is_err() {
                return;
            }
            last_tick = Instant::now();
        }
    }
}
