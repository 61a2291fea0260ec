use logdesk_core::format::format_relative;
use ratatui::widgets::Table;

use crate::app::Channel;

use super::logs::analysis_lines;
use super::*;

pub(super) fn render_incidents_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Incidents, header);

    let chunks = Layout::vertical([
        Constraint::Length(7), // Recent NEW logs
        Constraint::Length(1), // Filter line
        Constraint::Min(3),    // Table
    ])
    .split(body);

    render_recent_new(frame, app, chunks[0]);

    let query = &app.incidents.query;
    let filters = filter_summary(&[
        ("q", query.query.clone()),
        ("status", query.status.as_ref().map(ToString::to_string)),
    ]);
    let mut filter_spans = vec![
        Span::styled(" Filters: ", Style::default().fg(LABEL_COLOR)),
        Span::raw(filters),
    ];
    if let Some(err) = &app.incidents.error {
        filter_spans.push(Span::styled(
            format!("  ✗ {}", truncate(err, 60)),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(filter_spans)), chunks[1]);

    render_incidents_table(frame, app, chunks[2]);

    let info = paging_info(
        app.incidents.query.page,
        app.incidents.total,
        app.incidents.rows.len(),
    );
    render_footer(
        frame,
        app,
        &[
            ("Tab", "tabs"),
            ("Enter", "open"),
            ("/", "search"),
            ("f", "status"),
            ("n/p", "page"),
            ("x", "reset"),
            ("q", "quit"),
        ],
        info,
        footer,
    );
}

/// Strip of the latest NEW logs above the incident table.
fn render_recent_new(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        "Latest NEW logs{}",
        loading_suffix(app.is_loading(Channel::RecentNew))
    );
    if let Some(err) = &app.incidents.recent_error {
        render_notice(frame, &title, &format!("✗ {}", err), Color::Red, area);
        return;
    }
    if app.incidents.recent_new.is_empty() {
        render_notice(frame, &title, "No NEW logs", Color::DarkGray, area);
        return;
    }

    let lines: Vec<Line> = app
        .incidents
        .recent_new
        .iter()
        .map(|log| {
            Line::from(vec![
                Span::styled(
                    format!("{:<9}", format_relative(log.occurred_at())),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<9}", enum_label(log.log_level.as_ref())),
                    Style::default().fg(level_color(log.log_level.as_ref())),
                ),
                Span::styled(format!("{:<18} ", log.service()), Style::default().fg(LABEL_COLOR)),
                Span::raw(truncate(log.display_message(), 120)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(colored_block(&title, BORDER_INFO)), area);
}

fn render_incidents_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let loading = app.is_loading(Channel::Incidents);
    let title = format!("Incidents{}", loading_suffix(loading));

    if app.incidents.rows.is_empty() {
        let text = if loading { "Loading..." } else { "No incidents" };
        render_notice(frame, &title, text, Color::DarkGray, area);
        return;
    }

    let header = header_row(&["Last seen", "Status", "Level", "Service", "Title", "Count", "KB"]);
    let rows = app.incidents.rows.iter().map(|incident| {
        Row::new([
            Cell::from(format_server_time(incident.last_occurred_at.as_ref())),
            Cell::from(enum_label(incident.status.as_ref()))
                .style(Style::default().fg(incident_status_color(incident.status.as_ref()))),
            Cell::from(enum_label(incident.error_level.as_ref()))
                .style(Style::default().fg(level_color(incident.error_level.as_ref()))),
            Cell::from(or_placeholder(incident.service_name.as_deref()).to_string()),
            Cell::from(truncate(incident.display_title(), 200)),
            Cell::from(incident.repeat_count.map(format_count).unwrap_or_default()),
            Cell::from(
                incident
                    .linked_kb_id()
                    .map(|id| format!("#{}", id))
                    .unwrap_or_default(),
            ),
        ])
    });

    let widths = [
        Constraint::Length(26), // Last seen
        Constraint::Length(10), // Status
        Constraint::Length(9),  // Level
        Constraint::Length(18), // Service
        Constraint::Fill(1),    // Title
        Constraint::Length(7),  // Count
        Constraint::Length(6),  // KB
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(titled_block(&title))
        .row_highlight_style(highlight_style())
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.incidents.table_state);
}

pub(super) fn render_incident_detail_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Incidents, header);

    let Some(detail) = app.incident_detail.as_ref() else {
        return;
    };

    let Some(incident) = detail.incident.as_ref() else {
        let (text, color) = match &detail.error {
            Some(err) => (format!("✗ {}", err), Color::Red),
            None => ("Loading...".to_string(), Color::DarkGray),
        };
        render_notice(frame, "Incident", &text, color, body);
        render_footer(frame, app, &[("Esc", "back"), ("r", "reload")], detail.log_hash.clone(), footer);
        return;
    };

    let columns = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    let left = Layout::vertical([
        Constraint::Length(10), // Summary
        Constraint::Min(4),     // Summary text and stack trace
    ])
    .split(columns[0]);
    let right = Layout::vertical([
        Constraint::Length(5), // Edit form
        Constraint::Length(7), // KB check
        Constraint::Min(4),    // AI analysis
    ])
    .split(columns[1]);

    // === Summary ===
    let summary = vec![
        Line::styled(
            incident.display_title().to_string(),
            Style::default().fg(Color::White).bold(),
        ),
        Line::from(vec![
            Span::styled(format!("{:<14}", "Status"), Style::default().fg(LABEL_COLOR)),
            Span::styled(
                enum_label(incident.status.as_ref()),
                Style::default().fg(incident_status_color(incident.status.as_ref())).bold(),
            ),
            Span::raw("   "),
            Span::styled(
                enum_label(incident.error_level.as_ref()),
                Style::default().fg(level_color(incident.error_level.as_ref())),
            ),
        ]),
        field_line("Service", or_placeholder(incident.service_name.as_deref()).to_string()),
        field_line("Log hash", detail.log_hash.clone()),
        field_line(
            "Repeats",
            incident.repeat_count.map(format_count).unwrap_or_else(|| "-".to_string()),
        ),
        field_line("First seen", format_server_time(incident.first_occurred_at.as_ref())),
        field_line("Last seen", format_server_time(incident.last_occurred_at.as_ref())),
        field_line("Resolved", format_server_time(incident.resolved_at.as_ref())),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(colored_block("Incident", BORDER_INFO)),
        left[0],
    );

    let mut body_lines = text_lines(
        or_placeholder(incident.summary.as_deref().or(incident.log_summary.as_deref())),
        Style::default(),
    );
    if incident.has_stack_trace() {
        body_lines.push(Line::raw(""));
        body_lines.push(Line::styled("Stack trace", Style::default().fg(LABEL_COLOR).bold()));
        body_lines.extend(text_lines(
            incident.stack_trace.as_deref().unwrap_or_default(),
            Style::default().fg(STACK_COLOR),
        ));
    }
    frame.render_widget(
        Paragraph::new(body_lines)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0))
            .block(colored_block("Summary", BORDER_CONTENT)),
        left[1],
    );

    // === Edit form ===
    let form = vec![
        field_line("Title (e)", or_placeholder(Some(detail.title.as_str())).to_string()),
        field_line("Assignee (a)", or_placeholder(Some(detail.assignee.as_str())).to_string()),
        field_line("Status (f)", enum_label(detail.pending_status.as_ref())),
    ];
    frame.render_widget(
        Paragraph::new(form).block(colored_block("Edit · u to save", BORDER_FORM)),
        right[0],
    );

    // === Step 1: existing KB ===
    let kb_lines = if app.is_loading(Channel::KbAddendums) {
        vec![Line::styled("Checking...", Style::default().fg(Color::DarkGray))]
    } else if !detail.kb_checked {
        vec![Line::styled(
            "Press c to check the linked KB before analysis",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        let mut lines = vec![field_line(
            "Linked KB",
            incident
                .linked_kb_id()
                .map(|id| format!("#{}", id))
                .unwrap_or_else(|| "none".to_string()),
        )];
        if let Some(err) = &detail.kb_error {
            lines.push(Line::styled(format!("✗ {}", err), Style::default().fg(Color::Red)));
        } else if detail.top_addendums.is_empty() {
            lines.push(Line::styled("No addendums", Style::default().fg(Color::DarkGray)));
        }
        for (i, addendum) in detail.top_addendums.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(truncate(&addendum.headline(i), 80)),
            ]));
        }
        lines
    };
    frame.render_widget(
        Paragraph::new(kb_lines).block(colored_block("1 · Existing KB", BORDER_INFO)),
        right[1],
    );

    // === Step 2: AI ===
    let ai_title = if detail.ai_enabled() {
        "2 · AI Analysis (i)"
    } else {
        "2 · AI Analysis (locked)"
    };
    let ai = analysis_lines(
        detail.analysis.as_ref(),
        detail.analysis_error.as_deref(),
        app.is_loading(Channel::IncidentAnalysis),
    );
    frame.render_widget(
        Paragraph::new(ai)
            .wrap(Wrap { trim: true })
            .block(colored_block(ai_title, BORDER_AI)),
        right[2],
    );

    let mut hints = vec![("Esc", "back"), ("u", "save"), ("R", "resolve")];
    if detail.can_create_draft() {
        hints.push(("d", "draft"));
    }
    hints.extend([("c", "check KB"), ("i", "analyze"), ("o", "open KB")]);
    let info = format!("created by {}", or_placeholder(incident.created_by.as_deref()));
    render_footer(frame, app, &hints, info, footer);
}
