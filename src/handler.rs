use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use furnish_core::Page;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match (app.page, app.input_mode) {
        (Page::Recommendation, InputMode::Editing) => handle_chat_editing(app, key),
        (Page::Recommendation, InputMode::Normal) => handle_chat_normal(app, key),
        (Page::Analytics, _) => handle_analytics(app, key),
    }
}

/// Keys shared by every page in normal mode; returns true when consumed
fn handle_navigation(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.set_page(app.page.next()),
        KeyCode::Char('1') => app.set_page(Page::Recommendation),
        KeyCode::Char('2') => app.set_page(Page::Analytics),
        _ => return false,
    }
    true
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    if handle_navigation(app, key) {
        return;
    }

    match key.code {
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Char('/') => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.scroll_top(),
        KeyCode::Char('G') => app.scroll_bottom(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_down();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Tab => app.set_page(app.page.next()),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        // The input box is disabled while a request is in flight
        _ if !app.input_enabled() => {}
        KeyCode::Enter => app.submit_draft(),
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_analytics(app: &mut App, key: KeyEvent) {
    if handle_navigation(app, key) {
        return;
    }

    match key.code {
        // Reload the dashboard
        KeyCode::Char('r') => app.load_analytics(),
        KeyCode::Esc => app.set_page(Page::Recommendation),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.page != Page::Recommendation {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}
