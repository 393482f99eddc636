use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::ui::app::{App, Overlay, Pending, RegisterField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key_event(app, key),
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }
    if app.overlay.is_some() {
        handle_overlay_key(app, key);
        return EventResult::Continue;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return EventResult::Quit,
        KeyCode::Tab | KeyCode::Right => app.select_tab(app.tab.next()),
        KeyCode::BackTab | KeyCode::Left => app.select_tab(app.tab.previous()),
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.select_tab(crate::ui::app::Tab::ALL[index]);
        }
        KeyCode::Char('r') => app.pending = Some(Pending::Refresh(app.tab)),
        KeyCode::Char('l') => {
            app.overlay = Some(Overlay::Login {
                input: String::new(),
            })
        }
        KeyCode::Char('n') => app.overlay = Some(Overlay::register()),
        KeyCode::Char('s') => app.pending = Some(Pending::SaveToken),
        KeyCode::Char('j') | KeyCode::Down => {
            if let Some(view) = app.tree_view_mut() {
                view.select_next();
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if let Some(view) = app.tree_view_mut() {
                view.select_previous();
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => {
            if let Some(view) = app.tree_view_mut() {
                view.toggle_selected();
            }
        }
        _ => {}
    }
    EventResult::Continue
}

fn handle_overlay_key(app: &mut App, key: KeyEvent) {
    let Some(overlay) = app.overlay.as_mut() else {
        return;
    };
    if key.code == KeyCode::Esc {
        app.overlay = None;
        return;
    }

    match overlay {
        Overlay::Login { input } => match key.code {
            KeyCode::Enter => {
                let token = input.trim().to_string();
                if !token.is_empty() {
                    app.pending = Some(Pending::Login(token));
                    app.overlay = None;
                }
            }
            KeyCode::Tab => app.overlay = Some(Overlay::register()),
            code => edit(input, code),
        },
        Overlay::Register {
            symbol,
            faction,
            field,
            error,
        } => match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                *field = match *field {
                    RegisterField::Symbol => RegisterField::Faction,
                    RegisterField::Faction => RegisterField::Symbol,
                };
            }
            KeyCode::Enter => {
                if symbol.trim().is_empty() {
                    *error = Some("Call sign is required".to_string());
                } else {
                    app.pending = Some(Pending::Register {
                        symbol: symbol.trim().to_string(),
                        faction: faction.trim().to_string(),
                    });
                    app.overlay = None;
                }
            }
            code => match field {
                RegisterField::Symbol => edit(symbol, code),
                RegisterField::Faction => edit(faction, code),
            },
        },
        Overlay::Registered { token } => match key.code {
            KeyCode::Char('c') => app.clipboard = Some(token.clone()),
            KeyCode::Char('s') => app.pending = Some(Pending::SaveToken),
            KeyCode::Enter => app.overlay = None,
            _ => {}
        },
    }
}

fn edit(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Char(c) => buffer.push(c),
        KeyCode::Backspace => {
            buffer.pop();
        }
        _ => {}
    }
}
