use ratatui::widgets::Table;

use crate::app::Channel;

use super::*;

pub(super) fn render_kb_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Kb, header);

    let chunks = Layout::vertical([
        Constraint::Length(1), // Filter line
        Constraint::Min(3),    // Table
    ])
    .split(body);

    let query = &app.kb.query;
    let filters = filter_summary(&[
        ("status", query.status.as_ref().map(ToString::to_string)),
        ("keyword", query.keyword.clone()),
        ("author", query.created_by.as_ref().map(ToString::to_string)),
    ]);
    let mut filter_spans = vec![
        Span::styled(" Filters: ", Style::default().fg(LABEL_COLOR)),
        Span::raw(filters),
    ];
    if let Some(err) = &app.kb.error {
        filter_spans.push(Span::styled(
            format!("  ✗ {}", truncate(err, 60)),
            Style::default().fg(Color::Red),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(filter_spans)), chunks[0]);

    render_kb_table(frame, app, chunks[1]);

    let info = paging_info(app.kb.query.page, app.kb.total, app.kb.rows.len());
    render_footer(
        frame,
        app,
        &[
            ("Tab", "tabs"),
            ("Enter", "open"),
            ("/", "keyword"),
            ("f", "status"),
            ("w", "author"),
            ("n/p", "page"),
            ("S", "scheduler"),
            ("q", "quit"),
        ],
        info,
        footer,
    );
}

fn render_kb_table(frame: &mut Frame, app: &mut App, area: Rect) {
    let loading = app.is_loading(Channel::KbList);
    let title = format!("Knowledge Base{}", loading_suffix(loading));

    if app.kb.rows.is_empty() {
        let text = if loading { "Loading..." } else { "No articles" };
        render_notice(frame, &title, text, Color::DarkGray, area);
        return;
    }

    let header = header_row(&["Last activity", "Status", "Service", "Title", "Author", "Conf."]);
    let rows = app.kb.rows.iter().map(|article| {
        Row::new([
            Cell::from(format_server_time(article.last_activity())),
            Cell::from(enum_label(article.status.as_ref()))
                .style(Style::default().fg(kb_status_color(article.status.as_ref()))),
            Cell::from(or_placeholder(article.service_name.as_deref()).to_string()),
            Cell::from(truncate(article.display_title(), 200)),
            Cell::from(article.author().to_string()),
            Cell::from(
                article
                    .confidence_level
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            ),
        ])
    });

    let widths = [
        Constraint::Length(26), // Last activity
        Constraint::Length(12), // Status
        Constraint::Length(18), // Service
        Constraint::Fill(1),    // Title
        Constraint::Length(10), // Author
        Constraint::Length(6),  // Confidence
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(titled_block(&title))
        .row_highlight_style(highlight_style())
        .highlight_symbol("▶ ");

    frame.render_stateful_widget(table, area, &mut app.kb.table_state);
}

pub(super) fn render_kb_detail_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Kb, header);

    let Some(detail) = app.kb_detail.as_ref() else {
        return;
    };
    let loading = app.is_loading(Channel::KbDetail);

    let Some(article) = detail.article.as_ref() else {
        let (text, color) = match &detail.error {
            Some(err) => (format!("✗ {}", err), Color::Red),
            None => ("Loading...".to_string(), Color::DarkGray),
        };
        render_notice(frame, &format!("KB #{}", detail.id), &text, color, body);
        render_footer(frame, app, &[("Esc", "back"), ("r", "reload")], String::new(), footer);
        return;
    };

    let columns = Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body);
    let left = Layout::vertical([
        Constraint::Length(8), // Summary
        Constraint::Min(4),    // Content
    ])
    .split(columns[0]);
    let right = Layout::vertical([
        Constraint::Length(6), // Form
        Constraint::Min(4),    // Addendums
    ])
    .split(columns[1]);

    let summary = vec![
        Line::styled(
            article.display_title().to_string(),
            Style::default().fg(Color::White).bold(),
        ),
        Line::from(vec![
            Span::styled(format!("{:<14}", "Status"), Style::default().fg(LABEL_COLOR)),
            Span::styled(
                enum_label(article.status.as_ref()),
                Style::default().fg(kb_status_color(article.status.as_ref())).bold(),
            ),
        ]),
        field_line("Service", or_placeholder(article.service_name.as_deref()).to_string()),
        field_line("Author", article.author().to_string()),
        field_line("Created", format_server_time(article.created_at.as_ref())),
        field_line("Last activity", format_server_time(article.last_activity())),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(colored_block(
            &format!("KB #{}{}", detail.id, loading_suffix(loading)),
            BORDER_INFO,
        )),
        left[0],
    );

    let content = article.content.as_deref().unwrap_or_default();
    let content_lines = if content.trim().is_empty() {
        vec![Line::styled("(empty)", Style::default().fg(Color::DarkGray))]
    } else {
        text_lines(content, Style::default())
    };
    frame.render_widget(
        Paragraph::new(content_lines)
            .wrap(Wrap { trim: false })
            .scroll((detail.scroll, 0))
            .block(colored_block("Content", BORDER_CONTENT)),
        left[1],
    );

    let form = vec![
        field_line("Title (e)", or_placeholder(Some(detail.title.as_str())).to_string()),
        field_line(
            "Content (c)",
            truncate(or_placeholder(Some(detail.content.as_str())), 60),
        ),
        field_line("Author (w)", detail.author.to_string()),
        Line::styled(
            "s save/append · U update draft · P publish",
            Style::default().fg(Color::DarkGray),
        ),
    ];
    frame.render_widget(
        Paragraph::new(form).block(colored_block("Edit", BORDER_FORM)),
        right[0],
    );

    let page = detail.query.addendum_page;
    let mut addendum_lines: Vec<Line> = Vec::new();
    if article.addendums.is_empty() {
        addendum_lines.push(Line::styled("No addendums", Style::default().fg(Color::DarkGray)));
    }
    let offset = (page * detail.query.addendum_size) as usize;
    for (i, addendum) in article.addendums.iter().enumerate() {
        addendum_lines.push(Line::from(vec![
            Span::styled(
                format!("{}. ", offset + i + 1),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                addendum.headline(offset + i),
                Style::default().fg(Color::White).bold(),
            ),
            Span::styled(
                format!(
                    "  {} · {}",
                    or_placeholder(addendum.created_by.as_deref()),
                    format_server_time(addendum.created_at.as_ref())
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        addendum_lines.push(Line::raw(format!("   {}", addendum.preview())));
    }
    let total = article
        .addendum_total
        .map(|t| format!(" of {}", format_count(t)))
        .unwrap_or_default();
    let addendum_title = format!(
        "Addendums · page {} · size {}{}",
        page + 1,
        detail.query.addendum_size,
        total
    );
    frame.render_widget(
        Paragraph::new(addendum_lines)
            .wrap(Wrap { trim: true })
            .block(colored_block(&addendum_title, BORDER_AI)),
        right[1],
    );

    let mut hints = vec![("Esc", "back")];
    if page > 0 {
        hints.push(("[", "prev"));
    }
    if detail.has_next_addendums() {
        hints.push(("]", "next"));
    }
    hints.extend([("z", "size"), ("A", "add addendum"), ("j/k", "scroll")]);
    render_footer(frame, app, &hints, format!("{} addendums shown", article.addendums.len()), footer);
}
