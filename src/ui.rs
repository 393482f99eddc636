pub mod app;
pub mod events;
pub mod render;
pub mod tree_view;

use std::io::{self, stdout};
use std::time::Duration;

use crossterm::{
    clipboard::CopyToClipboard,
    event, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use app::App;
use events::{handle_event, EventResult};

/// Takes over the terminal until the user quits, restoring it afterwards even on error
pub async fn run(app: App) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render::render(f, &app))?;

        if let Some(pending) = app.pending.take() {
            app.set_status("Working...");
            terminal.draw(|f| render::render(f, &app))?;
            tracing::debug!("Performing {}", pending);
            app.perform(pending).await;
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            if handle_event(&mut app, event::read()?) == EventResult::Quit {
                app.should_quit = true;
            }
        }

        if let Some(text) = app.clipboard.take() {
            // OSC 52: the terminal emulator owns the clipboard, including over ssh
            match execute!(stdout(), CopyToClipboard::to_clipboard_from(text)) {
                Ok(()) => app.set_status("Access token copied to clipboard"),
                Err(e) => {
                    tracing::warn!("Clipboard copy failed: {}", e);
                    app.set_status(format!("Could not copy token: {}", e));
                }
            }
        }

        if app.should_quit {
            tracing::info!("Quitting");
            return Ok(());
        }
    }
}
