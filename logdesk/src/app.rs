//! Application state for the TUI.

mod check;
mod generator;
mod incidents;
mod kb;
mod logs;
mod rank;

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use logdesk_core::checks::CheckReport;
use logdesk_core::generator::RunReport;
use logdesk_core::ranking::BoardResult;
use logdesk_core::{
    Addendum, AiAnalysis, Config, ConsoleApi, Dispatcher, Incident, KbArticle, LogEntry,
    LogStatus, Page, Result as ApiResult,
};
use ratatui::widgets::TableState;

pub use check::CheckState;
pub use generator::{GenField, GeneratorState};
pub use incidents::{IncidentDetailState, IncidentsState};
pub use kb::{KbDetailState, KbState};
pub use logs::{LogDetailState, LogsState, LOG_STATUS_KEYS};
pub use rank::RankState;

/// How long a status message stays in the footer.
const FLASH_TTL: Duration = Duration::from_secs(6);

/// Top-level tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Logs,
    Incidents,
    Kb,
    Ranking,
    Generator,
    Check,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Logs,
        Tab::Incidents,
        Tab::Kb,
        Tab::Ranking,
        Tab::Generator,
        Tab::Check,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Logs => "Logs",
            Tab::Incidents => "Incidents",
            Tab::Kb => "Knowledge Base",
            Tab::Ranking => "Ranking",
            Tab::Generator => "Generator",
            Tab::Check => "System Check",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

/// Current view mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Paged log list (default)
    #[default]
    Logs,
    LogDetail,
    Incidents,
    IncidentDetail,
    Kb,
    KbDetail,
    Ranking,
    Generator,
    Check,
}

impl ViewMode {
    pub fn tab(self) -> Tab {
        match self {
            ViewMode::Logs | ViewMode::LogDetail => Tab::Logs,
            ViewMode::Incidents | ViewMode::IncidentDetail => Tab::Incidents,
            ViewMode::Kb | ViewMode::KbDetail => Tab::Kb,
            ViewMode::Ranking => Tab::Ranking,
            ViewMode::Generator => Tab::Generator,
            ViewMode::Check => Tab::Check,
        }
    }
}

/// Request streams. A new request on a channel supersedes the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Logs,
    RecentNew,
    LogIncident,
    LogAnalysis,
    Incidents,
    IncidentDetail,
    KbAddendums,
    IncidentAnalysis,
    KbList,
    KbDetail,
    Ranking,
    Check,
    Generator,
    Mutation(Mutation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutation {
    LogStatus,
    IncidentStatus,
    IncidentDetails,
    CreateDraft,
    SaveArticle,
    UpdateDraft,
    Publish,
    AddAddendum,
    Scheduler,
}

/// Payload of a finished request.
#[derive(Debug)]
pub enum Reply {
    Logs(ApiResult<Page<LogEntry>>),
    RecentNew(ApiResult<Page<LogEntry>>),
    LogIncident(ApiResult<Incident>),
    Incidents(ApiResult<Page<Incident>>),
    Incident(ApiResult<Incident>),
    KbList(ApiResult<Page<KbArticle>>),
    KbDetail(ApiResult<KbArticle>),
    KbAddendums(ApiResult<Vec<Addendum>>),
    LogAnalysis(ApiResult<AiAnalysis>),
    IncidentAnalysis(ApiResult<AiAnalysis>),
    Boards(Vec<BoardResult>),
    Check(CheckReport),
    Generator(RunReport),
    Done(ApiResult<Done>),
}

/// Successful mutation, with whatever the follow-up needs.
#[derive(Debug)]
pub enum Done {
    LogStatus(LogStatus),
    IncidentStatus,
    IncidentDetails,
    DraftCreated(i64),
    ArticleSaved,
    DraftUpdated,
    Published,
    AddendumAdded,
    Scheduler(String),
}

/// Text fields edited through the prompt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LogService,
    IncidentQuery,
    KbKeyword,
    RankService,
    Generator(GenField),
    IncidentTitle,
    IncidentAssignee,
    KbTitle,
    KbContent,
    AddendumContent,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::LogService => "Service name",
            Field::IncidentQuery => "Search",
            Field::KbKeyword => "Keyword",
            Field::RankService => "Service filter",
            Field::Generator(field) => field.label(),
            Field::IncidentTitle => "Incident title",
            Field::IncidentAssignee => "Assignee",
            Field::KbTitle => "Article title",
            Field::KbContent => "Article content",
            Field::AddendumContent => "Addendum",
        }
    }
}

/// Single-line editor shown over the footer.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub field: Field,
    pub buffer: String,
}

/// Actions that need a y/n confirmation first.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending {
    LogStatus { log_id: i64, status: LogStatus },
    IncidentDetails,
    ResolveIncident,
    CreateDraft { incident_id: i64 },
    Reanalyze,
    Publish { id: i64 },
    RunScheduler,
}

#[derive(Debug, Clone)]
pub struct Confirm {
    pub action: Pending,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Flash {
    pub text: String,
    pub kind: FlashKind,
    at: Instant,
}

/// Main application state.
pub struct App {
    dispatcher: Dispatcher<Channel, Reply>,
    pub config: Config,
    /// Current view mode
    pub view_mode: ViewMode,
    /// Whether the app should exit
    pub should_quit: bool,
    /// Active text prompt, if any
    pub prompt: Option<Prompt>,
    /// Pending confirmation, if any
    pub confirm: Option<Confirm>,
    /// Last status message
    pub flash: Option<Flash>,

    pub logs: LogsState,
    pub log_detail: Option<LogDetailState>,
    pub incidents: IncidentsState,
    pub incident_detail: Option<IncidentDetailState>,
    pub kb: KbState,
    pub kb_detail: Option<KbDetailState>,
    pub rank: RankState,
    pub generator: GeneratorState,
    pub check: CheckState,
}

impl App {
    /// Create a new App talking to `api`.
    pub fn new(api: Arc<dyn ConsoleApi>, config: Config) -> logdesk_core::Result<Self> {
        let dispatcher = Dispatcher::new(api)?;
        Ok(Self {
            dispatcher,
            logs: LogsState::new(config.console.page_size),
            log_detail: None,
            incidents: IncidentsState::new(config.console.page_size),
            incident_detail: None,
            kb: KbState::new(config.console.page_size),
            kb_detail: None,
            rank: RankState::default(),
            generator: GeneratorState::new(&config.generator),
            check: CheckState::default(),
            config,
            view_mode: ViewMode::default(),
            should_quit: false,
            prompt: None,
            confirm: None,
            flash: None,
        })
    }

    /// Open the default view (called from main for startup).
    pub fn start(&mut self) {
        self.load_logs();
    }

    /// Per-frame housekeeping: apply finished requests, run live polling.
    pub fn tick(&mut self) {
        for completion in self.dispatcher.drain() {
            self.apply(completion.outcome);
        }

        if self.view_mode == ViewMode::Logs && self.logs.live {
            let interval = Duration::from_secs(self.config.console.live_poll_secs);
            if self.logs.poll_due(interval) && !self.is_loading(Channel::Logs) {
                self.load_logs();
            }
        }

        if self
            .flash
            .as_ref()
            .is_some_and(|f| f.at.elapsed() > FLASH_TTL)
        {
            self.flash = None;
        }
    }

    pub fn is_loading(&self, channel: Channel) -> bool {
        self.dispatcher.is_loading(channel)
    }

    fn submit<F, Fut>(&mut self, channel: Channel, job: F)
    where
        F: FnOnce(Arc<dyn ConsoleApi>) -> Fut,
        Fut: Future<Output = Reply> + Send + 'static,
    {
        self.dispatcher.submit(channel, job);
    }

    fn apply(&mut self, reply: Reply) {
        match reply {
            Reply::Logs(result) => self.apply_logs(result),
            Reply::RecentNew(result) => self.apply_recent_new(result),
            Reply::LogIncident(result) => self.apply_log_incident(result),
            Reply::Incidents(result) => self.apply_incidents(result),
            Reply::Incident(result) => self.apply_incident(result),
            Reply::KbList(result) => self.apply_kb_list(result),
            Reply::KbDetail(result) => self.apply_kb_detail(result),
            Reply::KbAddendums(result) => self.apply_kb_addendums(result),
            Reply::LogAnalysis(result) => self.apply_log_analysis(result),
            Reply::IncidentAnalysis(result) => self.apply_incident_analysis(result),
            Reply::Boards(boards) => self.apply_boards(boards),
            Reply::Check(report) => self.apply_check(report),
            Reply::Generator(report) => self.apply_generator(report),
            Reply::Done(result) => self.apply_done(result),
        }
    }

    fn apply_done(&mut self, result: ApiResult<Done>) {
        let done = match result {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(error = %e, "Mutation failed");
                self.flash_error(format!("Failed: {}", e.user_message()));
                return;
            }
        };

        match done {
            Done::LogStatus(status) => {
                self.flash_info(format!("Status changed to {}", status));
                self.log_detail = None;
                self.view_mode = ViewMode::Logs;
                self.load_logs();
            }
            Done::IncidentStatus | Done::IncidentDetails => {
                self.flash_info("Incident updated");
                self.reload_incident_detail();
            }
            Done::DraftCreated(id) => {
                self.flash_info(format!("Draft created (id {})", id));
                self.open_kb_detail(id);
            }
            Done::ArticleSaved | Done::DraftUpdated | Done::Published | Done::AddendumAdded => {
                self.flash_info("Article saved");
                self.reload_kb_detail();
            }
            Done::Scheduler(reply) => {
                let reply = reply.trim();
                self.flash_info(if reply.is_empty() {
                    "Scheduler executed".to_string()
                } else {
                    format!("Scheduler: {}", reply)
                });
                self.load_kb_list();
            }
        }
    }

    pub fn flash_info(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            kind: FlashKind::Info,
            at: Instant::now(),
        });
    }

    pub fn flash_error(&mut self, text: impl Into<String>) {
        self.flash = Some(Flash {
            text: text.into(),
            kind: FlashKind::Error,
            at: Instant::now(),
        });
    }

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }

        match self.view_mode {
            ViewMode::Logs => self.handle_logs_key(key),
            ViewMode::LogDetail => self.handle_log_detail_key(key),
            ViewMode::Incidents => self.handle_incidents_key(key),
            ViewMode::IncidentDetail => self.handle_incident_detail_key(key),
            ViewMode::Kb => self.handle_kb_key(key),
            ViewMode::KbDetail => self.handle_kb_detail_key(key),
            ViewMode::Ranking => self.handle_rank_key(key),
            ViewMode::Generator => self.handle_generator_key(key),
            ViewMode::Check => self.handle_check_key(key),
        }
    }

    /// Keys shared by every top-level list view. Returns true when consumed.
    fn handle_global_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.switch_tab((self.view_mode.tab().index() + 1) % Tab::ALL.len()),
            KeyCode::BackTab => {
                let n = Tab::ALL.len();
                self.switch_tab((self.view_mode.tab().index() + n - 1) % n)
            }
            KeyCode::Char(c @ '1'..='6') => self.switch_tab(c as usize - '1' as usize),
            _ => return false,
        }
        true
    }

    /// Switch to a top-level tab, loading it on first visit.
    pub fn switch_tab(&mut self, index: usize) {
        let Some(tab) = Tab::ALL.get(index).copied() else {
            return;
        };
        self.view_mode = match tab {
            Tab::Logs => {
                if self.logs.loaded_at.is_none() {
                    self.load_logs();
                }
                ViewMode::Logs
            }
            Tab::Incidents => {
                self.load_incidents();
                ViewMode::Incidents
            }
            Tab::Kb => {
                self.load_kb_list();
                ViewMode::Kb
            }
            Tab::Ranking => {
                if self.rank.boards.is_empty() {
                    self.load_boards();
                }
                ViewMode::Ranking
            }
            Tab::Generator => ViewMode::Generator,
            Tab::Check => {
                if self.check.report.is_none() && !self.is_loading(Channel::Check) {
                    self.run_check();
                }
                ViewMode::Check
            }
        };
    }

    // ========== Prompt & Confirm ==========

    pub fn open_prompt(&mut self, field: Field, initial: &str) {
        self.prompt = Some(Prompt {
            field,
            buffer: initial.to_string(),
        });
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt.field, prompt.buffer);
                }
            }
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.buffer.clear();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            _ => {}
        }
    }

    fn submit_prompt(&mut self, field: Field, value: String) {
        let trimmed = value.trim().to_string();
        match field {
            Field::LogService => {
                self.logs.query.service_name = non_empty(trimmed);
                self.logs.query.page = 0;
                self.load_logs();
            }
            Field::IncidentQuery => {
                self.incidents.query.query = non_empty(trimmed);
                self.incidents.query.page = 0;
                self.load_incidents();
            }
            Field::KbKeyword => {
                self.kb.query.keyword = non_empty(trimmed);
                self.kb.query.page = 0;
                self.load_kb_list();
            }
            Field::RankService => {
                self.rank.service = trimmed;
                self.load_boards();
            }
            Field::Generator(gen_field) => self.set_generator_field(gen_field, value),
            Field::IncidentTitle => {
                if let Some(detail) = self.incident_detail.as_mut() {
                    detail.title = trimmed;
                }
            }
            Field::IncidentAssignee => {
                if let Some(detail) = self.incident_detail.as_mut() {
                    detail.assignee = trimmed;
                }
            }
            Field::KbTitle => {
                if let Some(detail) = self.kb_detail.as_mut() {
                    detail.title = trimmed;
                }
            }
            Field::KbContent => {
                if let Some(detail) = self.kb_detail.as_mut() {
                    detail.content = value;
                }
            }
            Field::AddendumContent => self.add_addendum(value),
        }
    }

    pub fn ask(&mut self, action: Pending, message: impl Into<String>) {
        self.confirm = Some(Confirm {
            action,
            message: message.into(),
        });
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(confirm) = self.confirm.take() {
                    self.run_pending(confirm.action);
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.confirm = None,
            _ => {}
        }
    }

    fn run_pending(&mut self, action: Pending) {
        match action {
            Pending::LogStatus { log_id, status } => self.change_log_status(log_id, status),
            Pending::IncidentDetails => self.update_incident_details(),
            Pending::ResolveIncident => self.resolve_incident(),
            Pending::CreateDraft { incident_id } => self.create_draft(incident_id),
            Pending::Reanalyze => self.analyze_incident(true),
            Pending::Publish { id } => self.publish_article(id),
            Pending::RunScheduler => self.run_scheduler(),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Step a filter through `None -> all[0] -> ... -> all[n-1] -> None`.
pub(crate) fn cycle_filter<T: Clone + PartialEq>(current: Option<&T>, all: &[T]) -> Option<T> {
    match current.and_then(|c| all.iter().position(|v| v == c)) {
        None if current.is_some() => None,
        None => all.first().cloned(),
        Some(i) => all.get(i + 1).cloned(),
    }
}

/// Move a table selection down, clamped to `len`.
pub(crate) fn select_next(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
    state.select(Some(next));
}

pub(crate) fn select_prev(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let prev = state.selected().map(|i| i.saturating_sub(1)).unwrap_or(0);
    state.select(Some(prev));
}

/// Keep the selection valid after the rows changed.
pub(crate) fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;
    use logdesk_core::ApiClient;

    /// App pointed at a port nothing listens on; requests fail fast.
    pub(crate) fn test_app() -> App {
        let mut config = Config::default();
        config.api.base_url = "http://127.0.0.1:9/api".to_string();
        config.api.timeout_secs = 1;
        let client = ApiClient::new(&config.api).unwrap();
        App::new(Arc::new(client), config).unwrap()
    }

    pub(crate) fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    #[test]
    fn test_tab_cycles_views() {
        let mut app = test_app();
        assert_eq!(app.view_mode, ViewMode::Logs);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.view_mode, ViewMode::Incidents);

        app.handle_key(key(KeyCode::BackTab));
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.view_mode, ViewMode::Check);

        app.handle_key(key(KeyCode::Char('5')));
        assert_eq!(app.view_mode, ViewMode::Generator);
    }

    #[test]
    fn test_prompt_edits_and_submits() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('s')));
        assert!(app.prompt.is_some());

        for c in "queue-svcx".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Backspace));
        // 'q' goes to the prompt, not the quit handler
        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Enter));

        assert!(app.prompt.is_none());
        assert_eq!(app.logs.query.service_name.as_deref(), Some("queue-svc"));
        assert!(app.is_loading(Channel::Logs));
    }

    #[test]
    fn test_prompt_escape_discards() {
        let mut app = test_app();
        app.open_prompt(Field::LogService, "keep");
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.prompt.is_none());
        assert_eq!(app.logs.query.service_name, None);
    }

    #[test]
    fn test_confirm_declined_runs_nothing() {
        let mut app = test_app();
        app.ask(Pending::RunScheduler, "Run the scheduler now?");
        app.handle_key(key(KeyCode::Char('n')));
        assert!(app.confirm.is_none());
        assert!(!app.is_loading(Channel::Mutation(Mutation::Scheduler)));

        app.ask(Pending::RunScheduler, "Run the scheduler now?");
        app.handle_key(key(KeyCode::Char('y')));
        assert!(app.is_loading(Channel::Mutation(Mutation::Scheduler)));
    }

    #[test]
    fn test_failed_mutation_flashes_backend_message() {
        let mut app = test_app();
        app.apply(Reply::Done(Err(logdesk_core::Error::Api {
            status: 400,
            message: "invalid status".to_string(),
        })));
        let flash = app.flash.as_ref().unwrap();
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.text, "Failed: invalid status");
    }

    #[test]
    fn test_cycle_filter_wraps_through_none() {
        let all = LogStatus::all();
        let mut current = None;
        let mut seen = Vec::new();
        for _ in 0..5 {
            current = cycle_filter(current.as_ref(), &all);
            seen.push(current.clone());
        }
        assert_eq!(seen[0], Some(LogStatus::New));
        assert_eq!(seen[3], Some(LogStatus::Ignored));
        assert_eq!(seen[4], None);

        let unknown = LogStatus::Other("ARCHIVED".to_string());
        assert_eq!(cycle_filter(Some(&unknown), &all), None);
    }

    #[test]
    fn test_selection_helpers() {
        let mut state = TableState::default();
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(0));
        select_next(&mut state, 3);
        select_next(&mut state, 3);
        select_next(&mut state, 3);
        assert_eq!(state.selected(), Some(2));
        select_prev(&mut state, 3);
        assert_eq!(state.selected(), Some(1));
        clamp_selection(&mut state, 1);
        assert_eq!(state.selected(), Some(0));
        clamp_selection(&mut state, 0);
        assert_eq!(state.selected(), None);
    }
}
