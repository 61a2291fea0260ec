//! UI rendering for the TUI.

mod check;
mod generator;
mod incidents;
mod kb;
mod logs;
mod rank;

use logdesk_core::format::{format_count, or_placeholder, short_hash, truncate};
use logdesk_core::{format_server_time, IncidentStatus, KbStatus, LogLevel, LogStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Wrap},
    Frame,
};

use crate::app::{App, FlashKind, Tab, ViewMode};

// ========== Standard View Colors ==========

/// Label color for detail attributes
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Border color for summary blocks
const BORDER_INFO: Color = Color::Rgb(0, 150, 150);
/// Border color for message and content blocks
const BORDER_CONTENT: Color = Color::Rgb(80, 160, 80);
/// Border color for AI analysis blocks
const BORDER_AI: Color = Color::Rgb(180, 100, 180);
/// Border color for editable forms
const BORDER_FORM: Color = Color::Rgb(220, 180, 0);
/// Stack trace text
const STACK_COLOR: Color = Color::Rgb(150, 150, 150);
/// Fatal and critical severities
const LEVEL_SEVERE: Color = Color::Rgb(255, 85, 85);
/// Error severity
const LEVEL_ERROR: Color = Color::Rgb(255, 140, 60);
/// Warning severity
const LEVEL_WARN: Color = Color::Rgb(230, 200, 60);
/// Filled part of ranking bars
const BAR_FILLED: Color = Color::Rgb(0, 180, 180);
/// Empty part of ranking bars
const BAR_EMPTY: Color = Color::Rgb(60, 60, 60);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Logs => logs::render_logs_view(frame, app),
        ViewMode::LogDetail => logs::render_log_detail_view(frame, app),
        ViewMode::Incidents => incidents::render_incidents_view(frame, app),
        ViewMode::IncidentDetail => incidents::render_incident_detail_view(frame, app),
        ViewMode::Kb => kb::render_kb_view(frame, app),
        ViewMode::KbDetail => kb::render_kb_detail_view(frame, app),
        ViewMode::Ranking => rank::render_rank_view(frame, app),
        ViewMode::Generator => generator::render_generator_view(frame, app),
        ViewMode::Check => check::render_check_view(frame, app),
    }
}

/// Split into tab header, body and footer.
fn page_layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::vertical([
        Constraint::Length(2), // Tab header
        Constraint::Min(5),    // Body
        Constraint::Length(1), // Footer
    ])
    .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Render the tab bar with the active tab highlighted.
fn render_tab_header(frame: &mut Frame, active: Tab, area: Rect) {
    // Layout: app name on left, tabs in center/right
    let chunks = Layout::horizontal([
        Constraint::Length(10), // App name
        Constraint::Min(1),     // Tabs
    ])
    .split(area);

    let app_name = Paragraph::new(" logdesk").style(Style::default().fg(Color::Cyan).bold());
    frame.render_widget(app_name, chunks[0]);

    let active_style = Style::default()
        .fg(Color::Cyan)
        .bold()
        .add_modifier(Modifier::UNDERLINED);
    let inactive_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if *tab == active {
            active_style
        } else {
            inactive_style
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, tab.title()), style));
    }

    let tabs = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, chunks[1]);
}

/// Render the footer: an open prompt or confirmation wins over key hints.
fn render_footer(frame: &mut Frame, app: &App, hints: &[(&str, &str)], info: String, area: Rect) {
    if let Some(prompt) = &app.prompt {
        let line = Line::from(vec![
            Span::styled(format!(" {}: ", prompt.field.label()), Style::default().fg(Color::Yellow).bold()),
            Span::raw(prompt.buffer.clone()),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
            Span::styled("  Enter save  Esc cancel", Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    if let Some(confirm) = &app.confirm {
        let line = Line::from(vec![
            Span::styled(format!(" {} ", confirm.message), Style::default().fg(Color::Yellow).bold()),
            Span::styled("[y/n]", Style::default().fg(Color::Cyan)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        let key = if i == 0 {
            format!(" {}", key)
        } else {
            key.to_string()
        };
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    spans.push(Span::raw("│ "));
    spans.push(Span::styled(info, Style::default().fg(Color::DarkGray)));

    if let Some(flash) = &app.flash {
        let color = match flash.kind {
            FlashKind::Info => Color::Green,
            FlashKind::Error => Color::Red,
        };
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(flash.text.clone(), Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Rounded block with a title.
fn titled_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", title))
}

/// Rounded block with a colored border and title.
fn colored_block(title: &str, color: Color) -> Block<'static> {
    titled_block(title)
        .border_style(Style::default().fg(color))
        .title_style(Style::default().fg(color).bold())
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(
        titles
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).bold())),
    )
    .height(1)
}

fn highlight_style() -> Style {
    Style::default()
        .add_modifier(Modifier::REVERSED)
        .fg(Color::Cyan)
}

/// `label: value` line for detail panels.
fn field_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<14}", label), Style::default().fg(LABEL_COLOR)),
        Span::raw(value.into()),
    ])
}

/// Centered message inside a bordered block, for empty and error states.
fn render_notice(frame: &mut Frame, title: &str, text: &str, color: Color, area: Rect) {
    let notice = Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: true })
        .block(titled_block(title));
    frame.render_widget(notice, area);
}

/// "Loading..." suffix when a request is outstanding.
fn loading_suffix(loading: bool) -> &'static str {
    if loading {
        " ⟳"
    } else {
        ""
    }
}

fn paging_info(page: u32, total: Option<i64>, rows: usize) -> String {
    match total {
        Some(total) => format!("page {} · {} total", page + 1, format_count(total)),
        None => format!("page {} · {} rows", page + 1, rows),
    }
}

fn level_color(level: Option<&LogLevel>) -> Color {
    match level {
        Some(LogLevel::Fatal) | Some(LogLevel::Critical) => LEVEL_SEVERE,
        Some(LogLevel::Error) => LEVEL_ERROR,
        Some(LogLevel::Warn) => LEVEL_WARN,
        Some(LogLevel::Info) => Color::Green,
        _ => Color::DarkGray,
    }
}

fn log_status_color(status: Option<&LogStatus>) -> Color {
    match status {
        Some(LogStatus::New) => Color::Red,
        Some(LogStatus::Acknowledged) => Color::Yellow,
        Some(LogStatus::Resolved) => Color::Green,
        _ => Color::DarkGray,
    }
}

fn incident_status_color(status: Option<&IncidentStatus>) -> Color {
    match status {
        Some(IncidentStatus::Open) => Color::Red,
        Some(IncidentStatus::Underway) => Color::Yellow,
        Some(IncidentStatus::Resolved) | Some(IncidentStatus::Closed) => Color::Green,
        _ => Color::DarkGray,
    }
}

fn kb_status_color(status: Option<&KbStatus>) -> Color {
    match status {
        Some(KbStatus::Draft) => Color::Yellow,
        Some(KbStatus::InProgress) => Color::Cyan,
        Some(KbStatus::Published) => Color::Green,
        _ => Color::DarkGray,
    }
}

/// Display form of an optional wire enum.
fn enum_label<T: std::fmt::Display>(value: Option<&T>) -> String {
    value
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// Filter summary like `status=NEW service=api`, or `all`.
fn filter_summary(filters: &[(&str, Option<String>)]) -> String {
    let parts: Vec<String> = filters
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{}={}", name, v)))
        .collect();
    if parts.is_empty() {
        "all".to_string()
    } else {
        parts.join(" ")
    }
}

/// Multi-line text block as styled lines.
fn text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|l| Line::styled(l.to_string(), style))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use logdesk_core::{ApiClient, Config, LogEntry};
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;

    fn offline_app() -> App {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/api".to_string();
        config.api.timeout_secs = 1;
        let client = ApiClient::new(&config.api).unwrap();
        App::new(Arc::new(client), config).unwrap()
    }

    fn draw(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_every_tab_renders() {
        let mut app = offline_app();
        for index in 0..Tab::ALL.len() {
            app.switch_tab(index);
            let screen = draw(&mut app);
            assert!(screen.contains("logdesk"), "tab {index}");
            assert!(screen.contains(Tab::ALL[index].title()), "tab {index}");
        }
    }

    #[test]
    fn test_logs_table_and_flash() {
        let mut app = offline_app();
        app.logs.rows = vec![LogEntry {
            service_name: Some("billing-api".to_string()),
            message: Some("Deadlock found when trying to get lock".to_string()),
            ..Default::default()
        }];
        app.flash_info("Status updated");

        let screen = draw(&mut app);
        assert!(screen.contains("billing-api"));
        assert!(screen.contains("Deadlock found"));
        assert!(screen.contains("Status updated"));
    }

    #[test]
    fn test_filter_summary() {
        assert_eq!(filter_summary(&[("status", None)]), "all");
        assert_eq!(
            filter_summary(&[
                ("status", Some("NEW".to_string())),
                ("service", None),
                ("today", Some("yes".to_string())),
            ]),
            "status=NEW today=yes"
        );
    }

    #[test]
    fn test_paging_info() {
        assert_eq!(paging_info(0, Some(1234), 20), "page 1 · 1,234 total");
        assert_eq!(paging_info(2, None, 7), "page 3 · 7 rows");
    }
}
