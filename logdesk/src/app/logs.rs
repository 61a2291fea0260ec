use chrono::{DateTime, Local};
use logdesk_core::LogQuery;

use super::*;

/// Paged log list.
pub struct LogsState {
    pub rows: Vec<LogEntry>,
    pub table_state: TableState,
    pub query: LogQuery,
    pub has_next: bool,
    pub total: Option<i64>,
    /// Refresh on a timer while on the list
    pub live: bool,
    pub error: Option<String>,
    pub loaded_at: Option<DateTime<Local>>,
    last_request: Option<Instant>,
}

impl LogsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            table_state: TableState::default(),
            query: LogQuery {
                size: page_size,
                ..Default::default()
            },
            has_next: false,
            total: None,
            live: false,
            error: None,
            loaded_at: None,
            last_request: None,
        }
    }

    pub(super) fn poll_due(&self, interval: Duration) -> bool {
        self.last_request.map_or(true, |t| t.elapsed() >= interval)
    }

    pub fn selected(&self) -> Option<&LogEntry> {
        self.table_state.selected().and_then(|i| self.rows.get(i))
    }
}

/// One log opened from the list.
pub struct LogDetailState {
    pub log: LogEntry,
    /// Incident sharing this log's hash, when the backend has one
    pub incident: Option<Incident>,
    pub incident_error: Option<String>,
    pub analysis: Option<AiAnalysis>,
    pub analysis_error: Option<String>,
    pub scroll: u16,
}

impl LogDetailState {
    fn new(log: LogEntry) -> Self {
        Self {
            log,
            incident: None,
            incident_error: None,
            analysis: None,
            analysis_error: None,
            scroll: 0,
        }
    }

    pub fn log_hash(&self) -> Option<&str> {
        self.log.log_hash.as_deref().filter(|h| !h.is_empty())
    }
}

/// Status shortcuts in the log detail view, in key order.
pub const LOG_STATUS_KEYS: [(char, LogStatus); 4] = [
    ('1', LogStatus::New),
    ('2', LogStatus::Acknowledged),
    ('3', LogStatus::Resolved),
    ('4', LogStatus::Ignored),
];

impl App {
    // ========== Log List Methods ==========

    pub(super) fn load_logs(&mut self) {
        let query = self.logs.query.clone();
        self.logs.last_request = Some(Instant::now());
        self.submit(Channel::Logs, move |api| async move {
            Reply::Logs(api.search_logs(&query).await)
        });
    }

    pub(super) fn apply_logs(&mut self, result: ApiResult<Page<LogEntry>>) {
        match result {
            Ok(page) => {
                self.logs.has_next = page.has_next(self.logs.query.size);
                self.logs.total = page.total_elements;
                self.logs.rows = page.content;
                self.logs.error = None;
                self.logs.loaded_at = Some(Local::now());
                clamp_selection(&mut self.logs.table_state, self.logs.rows.len());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load logs");
                self.logs.error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the log list.
    pub(super) fn handle_logs_key(&mut self, key: KeyEvent) {
        if self.handle_global_key(key) {
            return;
        }
        let len = self.logs.rows.len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.logs.table_state, len),
            KeyCode::Up | KeyCode::Char('k') => select_prev(&mut self.logs.table_state, len),
            KeyCode::Char('g') => self.logs.table_state.select((len > 0).then_some(0)),
            KeyCode::Char('G') => self.logs.table_state.select(len.checked_sub(1)),
            KeyCode::Enter => self.open_log_detail(),
            KeyCode::Char('n') if self.logs.has_next => {
                self.logs.query.page += 1;
                self.load_logs();
            }
            KeyCode::Char('p') if self.logs.query.page > 0 => {
                self.logs.query.page -= 1;
                self.load_logs();
            }
            KeyCode::Char('s') => {
                let current = self.logs.query.service_name.clone().unwrap_or_default();
                self.open_prompt(Field::LogService, &current);
            }
            KeyCode::Char('f') => {
                self.logs.query.status =
                    cycle_filter(self.logs.query.status.as_ref(), &LogStatus::all());
                self.logs.query.page = 0;
                self.load_logs();
            }
            KeyCode::Char('t') => {
                self.logs.query.today_only = !self.logs.query.today_only;
                self.logs.query.page = 0;
                self.load_logs();
            }
            KeyCode::Char('x') => {
                self.logs.query = LogQuery {
                    size: self.logs.query.size,
                    ..Default::default()
                };
                self.load_logs();
            }
            KeyCode::Char('l') => {
                self.logs.live = !self.logs.live;
                self.flash_info(if self.logs.live {
                    "Live refresh on"
                } else {
                    "Live refresh off"
                });
            }
            KeyCode::Char('r') => self.load_logs(),
            _ => {}
        }
    }

    // ========== Log Detail Methods ==========

    fn open_log_detail(&mut self) {
        let Some(log) = self.logs.selected().cloned() else {
            return;
        };
        let detail = LogDetailState::new(log);
        if let Some(hash) = detail.log_hash().map(str::to_string) {
            self.submit(Channel::LogIncident, move |api| async move {
                Reply::LogIncident(api.get_incident(&hash).await)
            });
        } else {
            self.dispatcher.cancel(Channel::LogIncident);
        }
        self.dispatcher.cancel(Channel::LogAnalysis);
        self.log_detail = Some(detail);
        self.view_mode = ViewMode::LogDetail;
    }

    pub(super) fn apply_log_incident(&mut self, result: ApiResult<Incident>) {
        let Some(detail) = self.log_detail.as_mut() else {
            return;
        };
        match result {
            Ok(incident) => detail.incident = Some(incident),
            Err(e) if e.is_not_found() => detail.incident = None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load incident for log");
                detail.incident_error = Some(e.user_message());
            }
        }
    }

    pub(super) fn apply_log_analysis(&mut self, result: ApiResult<AiAnalysis>) {
        let Some(detail) = self.log_detail.as_mut() else {
            return;
        };
        match result {
            Ok(analysis) => {
                detail.analysis = Some(analysis);
                detail.analysis_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Log analysis failed");
                detail.analysis_error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the log detail view.
    pub(super) fn handle_log_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.log_detail.as_mut() else {
            self.view_mode = ViewMode::Logs;
            return;
        };
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.dispatcher.cancel(Channel::LogIncident);
                self.dispatcher.cancel(Channel::LogAnalysis);
                self.log_detail = None;
                self.view_mode = ViewMode::Logs;
            }
            KeyCode::Down | KeyCode::Char('j') => detail.scroll = detail.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),
            KeyCode::Char(c @ '1'..='4') => {
                let Some((_, status)) = LOG_STATUS_KEYS.iter().find(|(k, _)| *k == c).cloned()
                else {
                    return;
                };
                let Some(log_id) = detail.log.id() else {
                    self.flash_error("Log has no id");
                    return;
                };
                if detail.log.status.as_ref() == Some(&status) {
                    self.flash_info(format!("Already {}", status));
                    return;
                }
                self.ask(
                    Pending::LogStatus { log_id, status: status.clone() },
                    format!("Change status to {}?", status),
                );
            }
            KeyCode::Char('a') => {
                let Some(hash) = detail.log_hash().map(str::to_string) else {
                    self.flash_error("Log has no hash to analyze");
                    return;
                };
                detail.analysis_error = None;
                self.submit(Channel::LogAnalysis, move |api| async move {
                    Reply::LogAnalysis(api.analyze(&hash, false).await)
                });
            }
            KeyCode::Char('i') => match detail.log_hash().map(str::to_string) {
                Some(hash) => self.open_incident_detail(hash, ViewMode::LogDetail),
                None => self.flash_error("Log has no incident hash"),
            },
            _ => {}
        }
    }

    pub(super) fn change_log_status(&mut self, log_id: i64, status: LogStatus) {
        self.submit(Channel::Mutation(Mutation::LogStatus), move |api| async move {
            let result = api.update_log_status(log_id, &status).await;
            Reply::Done(result.map(|()| Done::LogStatus(status)))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{key, test_app};
    use super::*;

    fn with_rows(app: &mut App) {
        app.apply_logs(Ok(Page {
            content: vec![
                LogEntry {
                    log_id: Some(11),
                    log_hash: Some("h11".to_string()),
                    status: Some(LogStatus::New),
                    ..Default::default()
                },
                LogEntry {
                    id: Some(12),
                    ..Default::default()
                },
            ],
            total_elements: Some(2),
            ..Default::default()
        }));
    }

    #[test]
    fn test_loaded_page_selects_first_row() {
        let mut app = test_app();
        with_rows(&mut app);
        assert_eq!(app.logs.table_state.selected(), Some(0));
        assert!(!app.logs.has_next);
        assert!(app.logs.loaded_at.is_some());
    }

    #[test]
    fn test_failed_reload_keeps_rows() {
        let mut app = test_app();
        with_rows(&mut app);
        app.apply_logs(Err(logdesk_core::Error::Http("connection refused".to_string())));
        assert_eq!(app.logs.rows.len(), 2);
        assert!(app.logs.error.is_some());
    }

    #[test]
    fn test_status_filter_resets_page() {
        let mut app = test_app();
        app.logs.query.page = 3;
        app.handle_key(key(KeyCode::Char('f')));
        assert_eq!(app.logs.query.status, Some(LogStatus::New));
        assert_eq!(app.logs.query.page, 0);
    }

    #[test]
    fn test_prev_page_stops_at_zero() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.logs.query.page, 0);
    }

    #[test]
    fn test_same_status_is_not_offered() {
        let mut app = test_app();
        with_rows(&mut app);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view_mode, ViewMode::LogDetail);

        app.handle_key(key(KeyCode::Char('1')));
        assert!(app.confirm.is_none());

        app.handle_key(key(KeyCode::Char('3')));
        let confirm = app.confirm.as_ref().unwrap();
        assert_eq!(
            confirm.action,
            Pending::LogStatus {
                log_id: 11,
                status: LogStatus::Resolved
            }
        );
    }

    #[test]
    fn test_missing_incident_is_not_an_error() {
        let mut app = test_app();
        with_rows(&mut app);
        app.handle_key(key(KeyCode::Enter));
        app.apply_log_incident(Err(logdesk_core::Error::Api {
            status: 404,
            message: "not found".to_string(),
        }));
        let detail = app.log_detail.as_ref().unwrap();
        assert!(detail.incident.is_none());
        assert!(detail.incident_error.is_none());
    }
}
