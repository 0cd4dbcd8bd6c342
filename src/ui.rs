//! TUI rendering for the air-quality lookup.
//!
//! One screen: the coordinate and place form, the candidate dropdown, the
//! shared status line and, on top of everything when a reading arrives, the
//! results popup.

use crate::app::{App, Field, GeocodeStatus};
use crate::models::TRACKED_POLLUTANTS;
use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{
        block::{Position, Title},
        *,
    },
};

const HELP: &str =
    " Tab/Shift+Tab move │ Enter search/select │ ↑/↓ choose place │ → complete state │ Esc close │ Ctrl+C quit";

/// Renders one frame of the TUI based on current application state.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Latitude / longitude
            Constraint::Length(3), // Place / region
            Constraint::Length(3), // Search button
            Constraint::Min(0),    // Candidates
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help
        ])
        .split(f.size());

    let title = Paragraph::new(" Air Quality Lookup ")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let coord_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_input(f, app, Field::Latitude, &app.latitude, None, coord_row[0]);
    render_input(f, app, Field::Longitude, &app.longitude, None, coord_row[1]);

    let place_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    render_input(f, app, Field::PlaceName, &app.place_name, None, place_row[0]);
    let ghost = if app.focus == Field::Region {
        app.region_completion()
    } else {
        None
    };
    render_input(f, app, Field::Region, &app.region, ghost, place_row[1]);

    render_search_button(f, app, chunks[3]);
    render_candidates(f, app, chunks[4]);
    render_status_line(f, app, chunks[5]);

    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[6]);

    if app.panel_visible {
        render_results_panel(f, app);
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Single-line text field; `ghost` is drawn dimmed after the typed text.
fn render_input(
    f: &mut Frame,
    app: &App,
    field: Field,
    text: &str,
    ghost: Option<String>,
    area: Rect,
) {
    let focused = app.focus == field && !app.panel_visible;

    let mut spans = vec![Span::raw(text)];
    if let Some(rest) = ghost {
        spans.push(Span::styled(rest, Style::default().fg(Color::DarkGray)));
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(format!(" {} ", field.title()))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(focus_style(focused)),
    );
    f.render_widget(input, area);

    if focused {
        let max_x = area.x + area.width.saturating_sub(2);
        let typed = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        let x = area.x.saturating_add(1).saturating_add(typed).min(max_x);
        f.set_cursor(x, area.y + 1);
    }
}

fn render_search_button(f: &mut Frame, app: &App, area: Rect) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(0)])
        .split(area);

    let focused = app.focus == Field::Search && !app.panel_visible;
    let label_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .bg(Color::Rgb(30, 30, 60))
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let button = Paragraph::new(Span::styled(" Search ", label_style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(focus_style(focused)),
        );
    f.render_widget(button, row[0]);

    if app.locating || app.fetching {
        let msg = if app.locating {
            " Detecting your location..."
        } else {
            " Fetching air quality..."
        };
        let spinner = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let frame = spinner[app.tick_count % spinner.len()];
        let p = Paragraph::new(Line::from(vec![
            Span::styled(format!(" {frame}"), Style::default().fg(Color::Cyan)),
            Span::styled(msg, Style::default().fg(Color::DarkGray)),
        ]));
        let inner = Rect {
            y: row[1].y + 1,
            height: 1,
            ..row[1]
        };
        f.render_widget(p, inner);
    }
}

/// Dropdown of geocoding candidates under the form.
fn render_candidates(f: &mut Frame, app: &App, area: Rect) {
    let title = match app.geocode_status {
        GeocodeStatus::Searching => " Searching... ",
        GeocodeStatus::NoMatches => " No matching places ",
        GeocodeStatus::Failed => " Place lookup failed ",
        GeocodeStatus::Idle => " Places ",
    };
    if app.candidates.is_empty() && app.geocode_status == GeocodeStatus::Idle {
        return;
    }

    let selecting = app.focus == Field::PlaceName;
    let items: Vec<ListItem> = app
        .candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let style = if candidate.coords.is_none() {
                Style::default().fg(Color::DarkGray)
            } else if selecting && i == app.highlighted {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {}", candidate.label(&app.countries))).style(style)
        })
        .collect();

    let title_style = match app.geocode_status {
        GeocodeStatus::Failed => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let list = List::new(items).block(
        Block::default()
            .title(Span::styled(title, title_style))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    );
    f.render_widget(list, area);
}

fn render_status_line(f: &mut Frame, app: &App, area: Rect) {
    if app.error.is_empty() {
        return;
    }
    let p = Paragraph::new(format!(" {}", app.error)).style(Style::default().fg(Color::Red));
    f.render_widget(p, area);
}

/// Popup with the AQI, its classification and every tracked pollutant.
fn render_results_panel(f: &mut Frame, app: &App) {
    let Some(reading) = app.reading.as_ref() else {
        return;
    };
    let level = crate::aqi::AqiLevel::from_index(reading.aqi);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Air Quality Index: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(reading.aqi.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" ({})", level.label()),
                Style::default().fg(level.color()).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ■■■", Style::default().fg(level.color())),
        ]),
        Line::from(""),
    ];

    for (key, label) in TRACKED_POLLUTANTS {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<7}", label), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(reading.component_text(key)),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Location: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{}, {}", app.latitude, app.longitude)),
    ]));
    if let Some(at) = reading.measured_at {
        lines.push(Line::from(vec![
            Span::styled("Measured: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()),
        ]));
    }

    let area = centered_rect(60, 70, f.size());
    let panel = Paragraph::new(lines).block(
        Block::default()
            .title(" Air Quality ")
            .title(
                Title::from(" Esc close ")
                    .position(Position::Bottom)
                    .alignment(Alignment::Right),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(level.color()))
            .padding(Padding::new(2, 2, 1, 0)),
    );
    f.render_widget(Clear, area);
    f.render_widget(panel, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
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
