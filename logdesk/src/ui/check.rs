use logdesk_core::checks::{CheckId, CheckStatus};

use crate::app::Channel;

use super::*;

pub(super) fn render_check_view(frame: &mut Frame, app: &mut App) {
    let (header, body, footer) = page_layout(frame.area());
    render_tab_header(frame, Tab::Check, header);

    let running = app.is_loading(Channel::Check);
    let title = format!("System Check{}", loading_suffix(running));

    let mut lines = vec![Line::raw("")];
    for id in CheckId::ALL {
        let result = app.check.report.as_ref().and_then(|r| r.get(id));
        let (badge, color, message) = match result {
            _ if running => ("  ..  ", Color::DarkGray, String::new()),
            None => (" ---- ", Color::DarkGray, String::new()),
            Some(r) => {
                let color = match r.status {
                    CheckStatus::Pass => Color::Green,
                    CheckStatus::Fail => Color::Red,
                    CheckStatus::Skip => Color::Yellow,
                };
                (status_badge(r.status), color, r.message.clone())
            }
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(badge, Style::default().fg(color).bold()),
            Span::raw("  "),
            Span::styled(format!("{:<44}", id.label()), Style::default().fg(LABEL_COLOR)),
            Span::raw(message),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(colored_block(&title, BORDER_INFO)),
        body,
    );

    let info = match &app.check.report {
        Some(report) => format!(
            "Last run {} · {} failed",
            report
                .started_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S"),
            report.failed()
        ),
        None => "not run yet".to_string(),
    };
    render_footer(
        frame,
        app,
        &[("Tab", "tabs"), ("r", "run"), ("q", "quit")],
        info,
        footer,
    );
}

fn status_badge(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => " PASS ",
        CheckStatus::Fail => " FAIL ",
        CheckStatus::Skip => " SKIP ",
    }
}
