use logdesk_core::{IncidentDetailsUpdate, IncidentQuery, IncidentStatus, LogQuery};

use super::*;

/// NEW logs shown above the incident table.
const RECENT_NEW_SIZE: u32 = 5;

/// Addendums previewed after the KB check.
const TOP_ADDENDUMS: usize = 3;

pub struct IncidentsState {
    pub rows: Vec<Incident>,
    pub table_state: TableState,
    pub query: IncidentQuery,
    pub has_next: bool,
    pub total: Option<i64>,
    pub error: Option<String>,
    pub recent_new: Vec<LogEntry>,
    pub recent_error: Option<String>,
}

impl IncidentsState {
    pub fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            table_state: TableState::default(),
            query: IncidentQuery {
                size: page_size,
                ..Default::default()
            },
            has_next: false,
            total: None,
            error: None,
            recent_new: Vec::new(),
            recent_error: None,
        }
    }

    pub fn selected(&self) -> Option<&Incident> {
        self.table_state.selected().and_then(|i| self.rows.get(i))
    }
}

/// A single incident with its edit form and the KB/AI workflow.
pub struct IncidentDetailState {
    pub log_hash: String,
    pub incident: Option<Incident>,
    pub error: Option<String>,
    pub title: String,
    pub assignee: String,
    pub pending_status: Option<IncidentStatus>,
    /// Step 1 done: existing KB content has been looked at
    pub kb_checked: bool,
    pub top_addendums: Vec<Addendum>,
    pub kb_error: Option<String>,
    pub analysis: Option<AiAnalysis>,
    pub analysis_error: Option<String>,
    pub scroll: u16,
    return_to: ViewMode,
}

impl IncidentDetailState {
    fn new(log_hash: String, return_to: ViewMode) -> Self {
        Self {
            log_hash,
            incident: None,
            error: None,
            title: String::new(),
            assignee: String::new(),
            pending_status: None,
            kb_checked: false,
            top_addendums: Vec::new(),
            kb_error: None,
            analysis: None,
            analysis_error: None,
            scroll: 0,
            return_to,
        }
    }

    /// Reset the form from a freshly loaded incident.
    fn fill_form(&mut self, incident: &Incident) {
        self.title = incident.incident_title.clone().unwrap_or_default();
        self.assignee = incident.created_by.clone().unwrap_or_default();
        self.pending_status = incident.status.clone();
    }

    /// Form contents as a partial update. Blank fields are left untouched.
    pub fn details_update(&self) -> IncidentDetailsUpdate {
        IncidentDetailsUpdate {
            title: non_empty(self.title.trim().to_string()),
            created_by: non_empty(self.assignee.trim().to_string()),
            status: self.pending_status.clone(),
        }
    }

    /// AI analysis unlocks once the KB check ran.
    pub fn ai_enabled(&self) -> bool {
        self.kb_checked
    }

    /// KB article to open: the linked one, else the one analysis produced.
    pub fn kb_target(&self) -> Option<i64> {
        self.incident
            .as_ref()
            .and_then(Incident::linked_kb_id)
            .or_else(|| self.analysis.as_ref().and_then(|a| a.kb_id))
    }

    pub fn can_create_draft(&self) -> bool {
        self.incident.as_ref().is_some_and(Incident::can_create_draft)
    }
}

impl App {
    // ========== Incident List Methods ==========

    pub(super) fn load_incidents(&mut self) {
        let query = self.incidents.query.clone();
        self.submit(Channel::Incidents, move |api| async move {
            Reply::Incidents(api.search_incidents(&query).await)
        });

        let recent = LogQuery {
            page: 0,
            size: RECENT_NEW_SIZE,
            status: Some(LogStatus::New),
            ..Default::default()
        };
        self.submit(Channel::RecentNew, move |api| async move {
            Reply::RecentNew(api.search_logs(&recent).await)
        });
    }

    pub(super) fn apply_incidents(&mut self, result: ApiResult<Page<Incident>>) {
        match result {
            Ok(page) => {
                self.incidents.has_next = page.has_next(self.incidents.query.size);
                self.incidents.total = page.total_elements;
                self.incidents.rows = page.content;
                self.incidents.error = None;
                clamp_selection(&mut self.incidents.table_state, self.incidents.rows.len());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to search incidents");
                self.incidents.error = Some(e.user_message());
            }
        }
    }

    pub(super) fn apply_recent_new(&mut self, result: ApiResult<Page<LogEntry>>) {
        match result {
            Ok(page) => {
                self.incidents.recent_new = page.content;
                self.incidents.recent_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load recent NEW logs");
                self.incidents.recent_error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the incident list.
    pub(super) fn handle_incidents_key(&mut self, key: KeyEvent) {
        if self.handle_global_key(key) {
            return;
        }
        let len = self.incidents.rows.len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                select_next(&mut self.incidents.table_state, len)
            }
            KeyCode::Up | KeyCode::Char('k') => select_prev(&mut self.incidents.table_state, len),
            KeyCode::Char('g') => self.incidents.table_state.select((len > 0).then_some(0)),
            KeyCode::Char('G') => self.incidents.table_state.select(len.checked_sub(1)),
            KeyCode::Enter => {
                let hash = self
                    .incidents
                    .selected()
                    .and_then(|i| i.log_hash.clone())
                    .filter(|h| !h.is_empty());
                match hash {
                    Some(hash) => self.open_incident_detail(hash, ViewMode::Incidents),
                    None if len > 0 => self.flash_error("Incident has no log hash"),
                    None => {}
                }
            }
            KeyCode::Char('/') => {
                let current = self.incidents.query.query.clone().unwrap_or_default();
                self.open_prompt(Field::IncidentQuery, &current);
            }
            KeyCode::Char('f') => {
                self.incidents.query.status =
                    cycle_filter(self.incidents.query.status.as_ref(), &IncidentStatus::all());
                self.incidents.query.page = 0;
                self.load_incidents();
            }
            KeyCode::Char('n') if self.incidents.has_next => {
                self.incidents.query.page += 1;
                self.load_incidents();
            }
            KeyCode::Char('p') if self.incidents.query.page > 0 => {
                self.incidents.query.page -= 1;
                self.load_incidents();
            }
            KeyCode::Char('x') => {
                self.incidents.query = IncidentQuery {
                    size: self.incidents.query.size,
                    ..Default::default()
                };
                self.load_incidents();
            }
            KeyCode::Char('r') => self.load_incidents(),
            _ => {}
        }
    }

    // ========== Incident Detail Methods ==========

    pub(super) fn open_incident_detail(&mut self, log_hash: String, return_to: ViewMode) {
        self.dispatcher.cancel(Channel::KbAddendums);
        self.dispatcher.cancel(Channel::IncidentAnalysis);
        self.incident_detail = Some(IncidentDetailState::new(log_hash, return_to));
        self.view_mode = ViewMode::IncidentDetail;
        self.reload_incident_detail();
    }

    pub(super) fn reload_incident_detail(&mut self) {
        let Some(hash) = self.incident_detail.as_ref().map(|d| d.log_hash.clone()) else {
            return;
        };
        self.submit(Channel::IncidentDetail, move |api| async move {
            Reply::Incident(api.get_incident(&hash).await)
        });
    }

    pub(super) fn apply_incident(&mut self, result: ApiResult<Incident>) {
        let Some(detail) = self.incident_detail.as_mut() else {
            return;
        };
        match result {
            Ok(incident) => {
                detail.fill_form(&incident);
                detail.incident = Some(incident);
                detail.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, log_hash = %detail.log_hash, "Failed to load incident");
                detail.error = Some(e.user_message());
            }
        }
    }

    pub(super) fn apply_kb_addendums(&mut self, result: ApiResult<Vec<Addendum>>) {
        let Some(detail) = self.incident_detail.as_mut() else {
            return;
        };
        detail.kb_checked = true;
        match result {
            Ok(mut addendums) => {
                addendums.truncate(TOP_ADDENDUMS);
                detail.top_addendums = addendums;
                detail.kb_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "KB check failed");
                detail.top_addendums.clear();
                detail.kb_error = Some(e.user_message());
            }
        }
    }

    pub(super) fn apply_incident_analysis(&mut self, result: ApiResult<AiAnalysis>) {
        let Some(detail) = self.incident_detail.as_mut() else {
            return;
        };
        match result {
            Ok(analysis) => {
                detail.analysis = Some(analysis);
                detail.analysis_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Incident analysis failed");
                detail.analysis_error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the incident detail view.
    pub(super) fn handle_incident_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.incident_detail.as_mut() else {
            self.view_mode = ViewMode::Incidents;
            return;
        };
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                let back = detail.return_to;
                self.dispatcher.cancel(Channel::IncidentDetail);
                self.dispatcher.cancel(Channel::KbAddendums);
                self.dispatcher.cancel(Channel::IncidentAnalysis);
                self.incident_detail = None;
                self.view_mode = back;
            }
            KeyCode::Down | KeyCode::Char('j') => detail.scroll = detail.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),
            KeyCode::Char('e') => {
                let current = detail.title.clone();
                self.open_prompt(Field::IncidentTitle, &current);
            }
            KeyCode::Char('a') => {
                let current = detail.assignee.clone();
                self.open_prompt(Field::IncidentAssignee, &current);
            }
            KeyCode::Char('f') => {
                detail.pending_status =
                    cycle_filter(detail.pending_status.as_ref(), &IncidentStatus::all());
            }
            KeyCode::Char('u') => {
                if detail.details_update().is_empty() {
                    self.flash_error("Nothing to update");
                    return;
                }
                self.ask(Pending::IncidentDetails, "Save incident details?");
            }
            KeyCode::Char('R') => {
                if detail
                    .incident
                    .as_ref()
                    .and_then(|i| i.status.as_ref())
                    .is_some_and(|s| *s == IncidentStatus::Resolved)
                {
                    self.flash_info("Already RESOLVED");
                    return;
                }
                self.ask(Pending::ResolveIncident, "Mark this incident RESOLVED?");
            }
            KeyCode::Char('d') => {
                let incident_id = detail.incident.as_ref().and_then(|i| i.id);
                match incident_id {
                    _ if !detail.can_create_draft() => {
                        self.flash_error("Drafts cannot be created for resolved or closed incidents")
                    }
                    Some(incident_id) => self.ask(
                        Pending::CreateDraft { incident_id },
                        "Create a KB draft from this incident?",
                    ),
                    None => self.flash_error("Incident has no id"),
                }
            }
            KeyCode::Char('c') => self.check_existing_kb(),
            KeyCode::Char('i') => {
                if !detail.ai_enabled() {
                    self.flash_error("Check existing KB first (c)");
                } else if detail.analysis.is_some() {
                    self.ask(Pending::Reanalyze, "Run the analysis again?");
                } else {
                    self.analyze_incident(false);
                }
            }
            KeyCode::Char('o') => match detail.kb_target() {
                Some(id) => self.open_kb_detail(id),
                None => self.flash_error("No linked KB"),
            },
            KeyCode::Char('r') => self.reload_incident_detail(),
            _ => {}
        }
    }

    /// Step 1: look at what the linked article already says.
    fn check_existing_kb(&mut self) {
        let Some(detail) = self.incident_detail.as_mut() else {
            return;
        };
        match detail.incident.as_ref().and_then(Incident::linked_kb_id) {
            None => {
                detail.kb_checked = true;
                detail.top_addendums.clear();
                detail.kb_error = None;
            }
            Some(kb_id) => {
                self.submit(Channel::KbAddendums, move |api| async move {
                    Reply::KbAddendums(api.list_addendums(kb_id).await)
                });
            }
        }
    }

    /// Step 2: ask the backend for a cause and suggestion.
    pub(super) fn analyze_incident(&mut self, force: bool) {
        let Some(detail) = self.incident_detail.as_mut() else {
            return;
        };
        if !detail.ai_enabled() {
            return;
        }
        detail.analysis_error = None;
        let hash = detail.log_hash.clone();
        self.submit(Channel::IncidentAnalysis, move |api| async move {
            Reply::IncidentAnalysis(api.analyze(&hash, force).await)
        });
    }

    pub(super) fn update_incident_details(&mut self) {
        let Some(detail) = self.incident_detail.as_ref() else {
            return;
        };
        let hash = detail.log_hash.clone();
        let update = detail.details_update();
        self.submit(
            Channel::Mutation(Mutation::IncidentDetails),
            move |api| async move {
                let result = api.update_incident_details(&hash, &update).await;
                Reply::Done(result.map(|()| Done::IncidentDetails))
            },
        );
    }

    pub(super) fn resolve_incident(&mut self) {
        let Some(hash) = self.incident_detail.as_ref().map(|d| d.log_hash.clone()) else {
            return;
        };
        self.submit(
            Channel::Mutation(Mutation::IncidentStatus),
            move |api| async move {
                let result = api
                    .update_incident_status(&hash, &IncidentStatus::Resolved)
                    .await;
                Reply::Done(result.map(|()| Done::IncidentStatus))
            },
        );
    }

    pub(super) fn create_draft(&mut self, incident_id: i64) {
        self.submit(Channel::Mutation(Mutation::CreateDraft), move |api| async move {
            Reply::Done(api.create_draft(incident_id).await.map(Done::DraftCreated))
        });
    }
}
