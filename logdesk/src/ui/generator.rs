use ratatui::widgets::Gauge;

use crate::app::GenField;

use super::*;

pub(super) fn render_generator_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Generator, header);

    let chunks = Layout::vertical([
        Constraint::Length(GenField::ALL.len() as u16 + 4), // Form
        Constraint::Length(3),                              // Progress
        Constraint::Min(1),                                 // Last run
    ])
    .split(body);

    let state = &app.generator;
    let running = app.generator_running();

    let mut lines: Vec<Line> = GenField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let selected = i == state.selected && !running;
            let marker = if selected { "▶ " } else { "  " };
            let value = state.value(*field);
            let value_style = if value.is_empty() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            let line = Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(format!("{:<14}", field.label()), Style::default().fg(LABEL_COLOR)),
                Span::styled(
                    if value.is_empty() {
                        "(empty)".to_string()
                    } else {
                        truncate(&value, 120)
                    },
                    value_style,
                ),
            ]);
            if selected {
                line.style(highlight_style())
            } else {
                line
            }
        })
        .collect();
    lines.push(Line::raw(""));
    lines.push(Line::from(vec![
        Span::styled("  Predicted level ", Style::default().fg(LABEL_COLOR)),
        Span::styled(
            state.template.predicted_level(),
            Style::default()
                .fg(level_color(state.template.log_level.as_ref()))
                .bold(),
        ),
        Span::styled(
            match state.preset {
                Some(p) => format!("   preset {}", p.name()),
                None => String::new(),
            },
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(
        Paragraph::new(lines).block(colored_block("Log Generator", BORDER_FORM)),
        chunks[0],
    );

    let sent = state.sent();
    let total = state.total;
    let ratio = if total == 0 {
        0.0
    } else {
        (f64::from(sent) / f64::from(total)).min(1.0)
    };
    let gauge = Gauge::default()
        .block(titled_block("Progress"))
        .gauge_style(Style::default().fg(BAR_FILLED).bg(BAR_EMPTY))
        .ratio(ratio)
        .label(format!("{}/{}", sent, total));
    frame.render_widget(gauge, chunks[1]);

    let summary = match (&state.last_summary, running) {
        (_, true) => Line::styled("Sending...", Style::default().fg(Color::Yellow)),
        (Some(summary), false) => Line::raw(format!(" {}", summary)),
        (None, false) => Line::styled(" No runs yet", Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(Paragraph::new(summary), chunks[2]);

    let hints: &[(&str, &str)] = if running {
        &[("Esc/c", "cancel"), ("q", "quit")]
    } else {
        &[
            ("Tab", "tabs"),
            ("j/k", "field"),
            ("Enter", "edit"),
            ("p", "preset"),
            ("x", "reset"),
            ("r", "send"),
            ("q", "quit"),
        ]
    };
    let info = format!("repeat {} · delay {}ms", state.repeat, state.delay_ms);
    render_footer(frame, app, hints, info, footer);
}
