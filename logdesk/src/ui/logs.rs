use ratatui::widgets::Table;

use crate::app::{Channel, LOG_STATUS_KEYS};

use super::*;

pub(super) fn render_logs_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Logs, header);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Filter line
        Constraint::Min(3),    // Table
    ])
    .split(body);

    let query = &app.logs.query;
    let filters = filter_summary(&[
        ("status", query.status.as_ref().map(ToString::to_string)),
        ("service", query.service_name.clone()),
        ("today", query.today_only.then(|| "yes".to_string())),
    ]);
    let mut filter_spans = vec![
        Span::styled(" Filters: ", Style::default().fg(LABEL_COLOR)),
        Span::raw(filters),
    ];
    if let Some(err) = &app.logs.error {
        filter_spans.push(Span::styled(
            format!("  ✗ {}", truncate(err, 60)),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(filter_spans)), chunks[0]);

    render_logs_table(frame, app, chunks[1]);

    let live = if app.logs.live { " · ● LIVE" } else { "" };
    let info = format!(
        "{}{}",
        paging_info(app.logs.query.page, app.logs.total, app.logs.rows.len()),
        live
    );
    render_footer(
        frame,
        app,
        &[
            ("Tab", "tabs"),
            ("Enter", "open"),
            ("f", "status"),
            ("s", "service"),
            ("t", "today"),
            ("n/p", "page"),
            ("l", "live"),
            ("q", "quit"),
        ],
        info,
        footer,
    );
}

fn render_logs_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let loading = app.is_loading(Channel::Logs);
    let title = format!("Logs{}", loading_suffix(loading));

    if app.logs.rows.is_empty() {
        let text = if loading { "Loading..." } else { "No logs" };
        render_notice(frame, &title, text, Color::DarkGray, area);
        return;
    }

    let header = header_row(&["Occurred", "Level", "Service", "Host", "Status", "Message", "Count"]);

    let rows = app.logs.rows.iter().map(|log| {
        let new_marker = if log.is_new.unwrap_or(false) { "★ " } else { "" };
        Row::new([
            Cell::from(format_server_time(log.occurred_at())),
            Cell::from(enum_label(log.log_level.as_ref()))
                .style(Style::default().fg(level_color(log.log_level.as_ref()))),
            Cell::from(log.service().to_string()),
            Cell::from(or_placeholder(log.host()).to_string()),
            Cell::from(enum_label(log.status.as_ref()))
                .style(Style::default().fg(log_status_color(log.status.as_ref()))),
            Cell::from(format!("{}{}", new_marker, truncate(log.display_message(), 200))),
            Cell::from(log.repeat_count.map(format_count).unwrap_or_default()),
        ])
    });

    let widths = [
        Constraint::Length(26), // Occurred
        Constraint::Length(8),  // Level
        Constraint::Length(18), // Service
        Constraint::Length(14), // Host
        Constraint::Length(12), // Status
        Constraint::Fill(1),    // Message
        Constraint::Length(7),  // Count
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(titled_block(&title))
        .row_highlight_style(highlight_style())
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.logs.table_state);
}

pub(super) fn render_log_detail_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Logs, header);

    let Some(detail) = app.log_detail.as_ref() else {
        return;
    };
    let log = &detail.log;

    let chunks = Layout::vertical([
        Constraint::Length(9), // Summary
        Constraint::Min(4),    // Message and stack trace
        Constraint::Length(7), // Analysis
    ])
    .split(body);

    let incident_text = if app.is_loading(Channel::LogIncident) {
        "loading...".to_string()
    } else if let Some(incident) = &detail.incident {
        format!(
            "{} [{}]",
            incident.display_title(),
            enum_label(incident.status.as_ref())
        )
    } else if let Some(err) = &detail.incident_error {
        format!("unavailable ({})", err)
    } else {
        "none".to_string()
    };

    let summary = vec![
        field_line(
            "Log",
            format!(
                "#{}  hash {}",
                log.id().map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                short_hash(log.log_hash.as_deref().unwrap_or("-"))
            ),
        ),
        Line::from(vec![
            Span::styled(format!("{:<14}", "Level"), Style::default().fg(LABEL_COLOR)),
            Span::styled(
                enum_label(log.log_level.as_ref()),
                Style::default().fg(level_color(log.log_level.as_ref())).bold(),
            ),
            Span::raw("   "),
            Span::styled(
                enum_label(log.status.as_ref()),
                Style::default().fg(log_status_color(log.status.as_ref())),
            ),
        ]),
        field_line("Service", log.service().to_string()),
        field_line("Host", or_placeholder(log.host()).to_string()),
        field_line("Occurred", format_server_time(log.occurred_at())),
        field_line(
            "Repeats",
            log.repeat_count.map(format_count).unwrap_or_else(|| "-".to_string()),
        ),
        field_line("Incident", incident_text),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(colored_block("Log", BORDER_INFO)),
        chunks[0],
    );

    let mut body_lines = text_lines(log.display_message(), Style::default());
    if log.has_stack_trace() {
        body_lines.push(Line::raw(""));
        body_lines.push(Line::styled("Stack trace", Style::default().fg(LABEL_COLOR).bold()));
        body_lines.extend(text_lines(
            log.stack_trace.as_deref().unwrap_or_default(),
            Style::default().fg(STACK_COLOR),
        ));
    }
    frame.render_widget(
        Paragraph::new(body_lines)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0))
            .block(colored_block("Message", BORDER_CONTENT)),
        chunks[1],
    );

    let analyzing = app.is_loading(Channel::LogAnalysis);
    let analysis_lines = analysis_lines(
        detail.analysis.as_ref(),
        detail.analysis_error.as_deref(),
        analyzing,
    );
    frame.render_widget(
        Paragraph::new(analysis_lines)
            .wrap(Wrap { trim: true })
            .block(colored_block("AI Analysis", BORDER_AI)),
        chunks[2],
    );

    let current = log.status.as_ref();
    let status_hint: String = LOG_STATUS_KEYS
        .iter()
        .filter(|(_, s)| Some(s) != current)
        .map(|(k, s)| format!("{}={}", k, s))
        .collect::<Vec<_>>()
        .join(" ");
    render_footer(
        frame,
        app,
        &[
            ("Esc", "back"),
            ("1-4", "status"),
            ("a", "analyze"),
            ("i", "incident"),
            ("j/k", "scroll"),
        ],
        status_hint,
        footer,
    );
}

/// Cause and suggestion lines, shared with the incident view.
pub(super) fn analysis_lines(
    analysis: Option<&logdesk_core::AiAnalysis>,
    error: Option<&str>,
    loading: bool,
) -> Vec<Line<'static>> {
    if loading {
        return vec![Line::styled("Analyzing...", Style::default().fg(Color::DarkGray))];
    }
    if let Some(err) = error {
        return vec![Line::styled(format!("✗ {}", err), Style::default().fg(Color::Red))];
    }
    let Some(analysis) = analysis else {
        return vec![Line::styled(
            "No analysis yet",
            Style::default().fg(Color::DarkGray),
        )];
    };

    let mut lines = vec![Line::styled("Cause", Style::default().fg(LABEL_COLOR).bold())];
    lines.extend(text_lines(or_placeholder(analysis.cause.as_deref()), Style::default()));
    lines.push(Line::styled("Suggestion", Style::default().fg(LABEL_COLOR).bold()));
    lines.extend(text_lines(
        or_placeholder(analysis.suggestion.as_deref()),
        Style::default(),
    ));
    if let Some(kb_id) = analysis.kb_id {
        lines.push(field_line("KB article", format!("#{}", kb_id)));
    }
    lines
}
