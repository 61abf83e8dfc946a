use std::io::{self, Stderr};
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::warn;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the ellipsis animation and picks up finished requests
const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
}

/// Merges terminal input with a fixed tick, one event per `next` call
pub struct EventHandler {
    reader: EventStream,
    tick: Interval,
}

impl EventHandler {
    pub fn new() -> Self {
        let mut tick = interval(TICK_RATE);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            reader: EventStream::new(),
            tick,
        }
    }

    /// Wait for the next event; `None` once the terminal stream ends
    pub async fn next(&mut self) -> Option<AppEvent> {
        loop {
            tokio::select! {
                _ = self.tick.tick() => return Some(AppEvent::Tick),
                event = self.reader.next() => match event? {
                    Ok(event) => {
                        if let Some(app_event) = translate(event) {
                            return Some(app_event);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "terminal event stream failed");
                        return None;
                    }
                },
            }
        }
    }
}

/// Map a terminal event to an app event, dropping the ones nothing handles
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        // Key release and repeat events are ignored
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_translate_keeps_key_presses_only() {
        let press = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(translate(Event::Key(press)), Some(AppEvent::Key(press)));

        let release = KeyEvent::new_with_kind(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(translate(Event::Key(release)), None);
    }

    #[test]
    fn test_translate_resize_and_focus() {
        assert_eq!(translate(Event::Resize(80, 24)), Some(AppEvent::Resize));
        assert_eq!(translate(Event::FocusGained), None);
    }
}
