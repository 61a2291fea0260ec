use logdesk_core::ranking::BoardResult;

use crate::app::Channel;

use super::*;

/// Width of a ranking bar in cells.
const BAR_WIDTH: usize = 20;

pub(super) fn render_rank_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Ranking, header);

    let loading = app.is_loading(Channel::Ranking);
    if app.rank.boards.is_empty() {
        let text = if loading { "Loading..." } else { "No rankings loaded (r)" };
        render_notice(frame, "Ranking", text, Color::DarkGray, body);
    } else {
        let count = app.rank.boards.len() as u32;
        let areas = Layout::vertical(
            (0..count).map(|_| Constraint::Ratio(1, count)).collect::<Vec<_>>(),
        )
        .split(body);
        for (board, area) in app.rank.boards.iter().zip(areas.iter()) {
            render_board(frame, board, loading, *area);
        }
    }

    let service = if app.rank.service.is_empty() {
        "all services".to_string()
    } else {
        format!("service={}", app.rank.service)
    };
    let info = match app.rank.loaded_at {
        Some(at) => format!("{} · updated {}", service, at.format("%H:%M:%S")),
        None => service,
    };
    render_footer(
        frame,
        app,
        &[("Tab", "tabs"), ("s", "service"), ("x", "clear"), ("r", "reload"), ("q", "quit")],
        info,
        footer,
    );
}

fn render_board(frame: &mut Frame, board: &BoardResult, loading: bool, area: Rect) {
    let title = format!("{}{}", board.board.title(), loading_suffix(loading));

    if let Some(err) = &board.error {
        render_notice(frame, &title, &format!("✗ {}", err), Color::Red, area);
        return;
    }
    if board.entries.is_empty() {
        render_notice(frame, &title, "No incidents", Color::DarkGray, area);
        return;
    }

    let lines: Vec<Line> = board
        .bars()
        .into_iter()
        .enumerate()
        .map(|(i, (entry, ratio))| {
            let filled = (ratio * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);
            Line::from(vec![
                Span::styled(format!(" {:>2}. ", i + 1), Style::default().fg(Color::Yellow)),
                Span::styled("█".repeat(filled), Style::default().fg(BAR_FILLED)),
                Span::styled("░".repeat(BAR_WIDTH - filled), Style::default().fg(BAR_EMPTY)),
                Span::styled(
                    format!(" {:>7}  ", format_count(entry.count())),
                    Style::default().fg(Color::White).bold(),
                ),
                Span::styled(
                    format!("{:<10}", enum_label(entry.status.as_ref())),
                    Style::default().fg(incident_status_color(entry.status.as_ref())),
                ),
                Span::styled(
                    format!("{:<18} ", or_placeholder(entry.service_name.as_deref())),
                    Style::default().fg(LABEL_COLOR),
                ),
                Span::raw(truncate(entry.display_title(), 120)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(colored_block(&title, BORDER_INFO)), area);
}
