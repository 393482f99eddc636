use itertools::Itertools;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::captains_log::AgentPhase;
use crate::envelope::Fault;
use crate::ui::app::{App, Overlay, RegisterField, Tab};
use crate::ui::tree_view::TreeView;

const HOTKEYS: &str = "Tab/←→ switch · r refresh · l login · n new agent · s save token · j/k move · Enter expand · q quit";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, app, chunks[0]);
    match app.tab {
        Tab::Status => render_status(frame, app, chunks[1]),
        Tab::Agent => render_agent(frame, app, chunks[1]),
        Tab::Ships => render_tree(frame, app.ships.as_ref(), "Ships", chunks[1]),
        Tab::Contracts => render_tree(frame, app.contracts.as_ref(), "Contracts", chunks[1]),
        Tab::Factions => render_factions(frame, app, chunks[1]),
    }
    frame.render_widget(
        Paragraph::new(app.status_message().unwrap_or_default())
            .style(Style::default().fg(Color::Yellow)),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(HOTKEYS).style(Style::default().fg(Color::DarkGray)),
        chunks[3],
    );

    if let Some(overlay) = &app.overlay {
        render_overlay(frame, overlay);
    }
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Tab::ALL.iter().map(Tab::to_string).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Trading Space"))
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn panel(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

fn fault_lines(fault: &Fault) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        fault.to_string(),
        Style::default().fg(Color::Red),
    ))];
    if let Some(error) = fault.api_error() {
        lines.push(Line::from(format!("Code: {}", error.code)));
    }
    lines
}

fn loading() -> Vec<Line<'static>> {
    vec![Line::from("Loading...")]
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match &app.server_status {
        None => loading(),
        Some(Err(fault)) => fault_lines(fault),
        Some(Ok(status)) => vec![
            Line::from(Span::styled(
                format!("Status: {}", status.status),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Version: {}", status.version)),
            Line::from(format!("Description: {}", status.description)),
            Line::from(""),
            Line::from(format!("Agents: {}", status.stats.agents)),
            Line::from(format!("Ships: {}", status.stats.ships)),
            Line::from(format!("Systems: {}", status.stats.systems)),
            Line::from(format!("Waypoints: {}", status.stats.waypoints)),
            Line::from(""),
            Line::from(format!("Reset Date: {}", status.reset_date)),
            Line::from(format!("Next: {}", status.server_resets.next)),
            Line::from(format!("Frequency: {}", status.server_resets.frequency)),
        ],
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel("Status"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_agent(frame: &mut Frame, app: &App, area: Rect) {
    let record = app.captains_log.record();
    let mut lines = Vec::new();
    if let Some(fault) = &record.last_error {
        lines.extend(fault_lines(fault));
        lines.push(Line::from(""));
    }
    match record.phase() {
        AgentPhase::Unauthenticated => {
            if record.last_error.is_none() {
                lines.push(Line::from("Not logged in. Press l to log in or n to register."));
            }
        }
        phase => {
            let profile = &record.profile;
            lines.extend([
                Line::from(format!("Account ID: {}", profile.account_id)),
                Line::from(format!("Symbol: {}", profile.symbol)),
                Line::from(format!("Headquarters: {}", profile.headquarters)),
                Line::from(format!("Credits: {}", profile.credits)),
                Line::from(format!("Starting Faction: {}", profile.starting_faction)),
            ]);
            if let Some(updated) = record.last_updated {
                let stale = if phase == AgentPhase::PopulatedWithError {
                    " (stale)"
                } else {
                    ""
                };
                lines.push(Line::from(Span::styled(
                    format!("Last updated: {}{}", updated.format("%Y-%m-%d %H:%M:%S UTC"), stale),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).block(panel("Agent")), area);
}

fn render_tree(
    frame: &mut Frame,
    view: Option<&Result<TreeView, Fault>>,
    title: &str,
    area: Rect,
) {
    let view = match view {
        None => {
            frame.render_widget(Paragraph::new(loading()).block(panel(title)), area);
            return;
        }
        Some(Err(fault)) => {
            frame.render_widget(Paragraph::new(fault_lines(fault)).block(panel(title)), area);
            return;
        }
        Some(Ok(view)) => view,
    };

    let items: Vec<ListItem> = view
        .rows()
        .iter()
        .map(|row| {
            let marker = match (row.node.allow_expand(), row.expanded) {
                (false, _) => "  ",
                (true, true) => "▾ ",
                (true, false) => "▸ ",
            };
            ListItem::new(format!("{}{}{}", "  ".repeat(row.depth), marker, row.node.label))
        })
        .collect();
    let list = List::new(items)
        .block(panel(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(view.selected()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_factions(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match &app.factions {
        None => loading(),
        Some(Err(fault)) => fault_lines(fault),
        Some(Ok(factions)) if factions.is_empty() => vec![Line::from("No factions are recruiting")],
        Some(Ok(factions)) => {
            let mut lines = vec![Line::from(format!(
                "Recruiting: {}",
                factions.iter().map(|f| f.symbol.as_str()).join(", ")
            ))];
            for faction in factions {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("{} ({})", faction.name, faction.symbol),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(faction.description.clone()));
            }
            lines
        }
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel("Factions"))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn render_overlay(frame: &mut Frame, overlay: &Overlay) {
    let area = centered_rect(60, 12, frame.area());
    frame.render_widget(Clear, area);

    let (title, lines) = match overlay {
        Overlay::Login { input } => (
            "Login",
            vec![
                Line::from("Enter access token to start, or press Tab to create a new account."),
                Line::from(""),
                Line::from(format!("Access Token: {}_", input)),
                Line::from(""),
                Line::from("Enter login · Tab register · Esc close"),
            ],
        ),
        Overlay::Register {
            symbol,
            faction,
            field,
            error,
        } => {
            let cursor = |f: RegisterField| if *field == f { "_" } else { "" };
            let mut lines = vec![
                Line::from("Choose a unique call sign, such as ZER0_SH0T or SP4CE_TR4DER."),
                Line::from(""),
                Line::from(format!("Call Sign: {}{}", symbol, cursor(RegisterField::Symbol))),
                Line::from(format!(
                    "Starting Faction: {}{}",
                    faction,
                    cursor(RegisterField::Faction)
                )),
                Line::from(""),
                Line::from("Enter register · Tab switch field · Esc close"),
            ];
            if let Some(error) = error {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
            ("Register new agent", lines)
        }
        Overlay::Registered { token } => (
            "Register Successful!",
            vec![
                Line::from("Your access token is:"),
                Line::from(""),
                Line::from(token.clone()),
                Line::from(""),
                Line::from("c copy token · s save token · Enter close"),
            ],
        ),
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(panel(title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
