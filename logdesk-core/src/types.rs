//! Wire types for the LogCollector API
//!
//! The backend's record shapes drifted over time, so most records carry
//! several optional fields for the same concept. Each derived display value
//! is resolved in exactly one place, by a method on the record:
//!
//! | Record | Derived value | Resolution order |
//! |--------|---------------|------------------|
//! | [`LogEntry`] | id | `logId` -> `id` |
//! | [`LogEntry`] | message | `summary` -> `message` |
//! | [`LogEntry`] | time | `occurredTime` -> `createdAt` |
//! | [`Incident`] | title | `incidentTitle` -> `title` -> `logSummary` -> `summary` |
//! | [`Incident`] | linked KB | `kbArticleId` -> `kbId` -> `linkedKbId` -> `kb_article_id` |
//! | [`IncidentRank`] | count | `repeatCount` -> `count` -> `metricValue` |
//! | [`KbArticle`] | title | `title` -> `incidentTitle` |
//! | [`KbArticle`] | activity | `lastActivityAt` -> `updatedAt` -> `createdAt` |
//!
//! Enumerated values decode leniently: unknown strings land in an `Other`
//! variant instead of failing the whole response.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timestamp::ServerTimestamp;

/// Shown when no title field is populated.
pub const NO_TITLE: &str = "(No Title)";

/// Shown when a log has neither summary nor message.
pub const NO_MESSAGE: &str = "(No message)";

/// Query-string timestamp format accepted by the backend's `LocalDateTime` params.
pub const QUERY_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this client does not know about
            Other(String),
        }

        impl $name {
            /// Every known value, in display order.
            pub fn all() -> Vec<$name> {
                vec![$($name::$variant),+]
            }

            /// Wire representation
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $(
                    if trimmed.eq_ignore_ascii_case($wire) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("unknown {} value: {}", stringify!($name), s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.parse() {
                    Ok(known) => known,
                    Err(_) => $name::Other(s),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Triage state of a single collected log
    LogStatus {
        New => "NEW",
        Acknowledged => "ACKNOWLEDGED",
        Resolved => "RESOLVED",
        Ignored => "IGNORED",
    }
}

wire_enum! {
    /// Lifecycle of an incident (a group of logs sharing a hash)
    IncidentStatus {
        Open => "OPEN",
        Underway => "UNDERWAY",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
        Ignored => "IGNORED",
    }
}

wire_enum! {
    /// Knowledge-base article state
    KbStatus {
        /// Unpublished and editable
        Draft => "DRAFT",
        InProgress => "IN_PROGRESS",
        Published => "PUBLISHED",
        Archived => "ARCHIVED",
    }
}

wire_enum! {
    /// Who wrote an article or addendum
    Author {
        System => "system",
        User => "user",
        Admin => "admin",
    }
}

wire_enum! {
    /// Severity of a collected log
    LogLevel {
        Fatal => "FATAL",
        Critical => "CRITICAL",
        Error => "ERROR",
        Warn => "WARN",
        Info => "INFO",
    }
}

impl IncidentStatus {
    /// Resolved and closed incidents no longer accept new KB drafts.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Closed)
    }
}

// ============================================
// Envelopes
// ============================================

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: Option<i64>,
    pub total_pages: Option<i64>,
    /// Zero-based page index
    pub number: Option<u32>,
    pub size: Option<u32>,
    pub last: Option<bool>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Page {
            content: Vec::new(),
            total_elements: None,
            total_pages: None,
            number: None,
            size: None,
            last: None,
        }
    }
}

impl<T> Page<T> {
    /// Whether the server reported more pages after this one.
    ///
    /// Without paging metadata a full page is assumed to have a successor.
    pub fn has_next(&self, requested_size: u32) -> bool {
        match (self.last, self.number, self.total_pages) {
            (Some(last), _, _) => !last,
            (None, Some(number), Some(total)) => i64::from(number) + 1 < total,
            _ => self.content.len() as u32 >= requested_size && requested_size > 0,
        }
    }
}

/// A list endpoint that answers with either an envelope or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListPayload<T> {
    Paged(Page<T>),
    Items(Vec<T>),
}

impl<T> ListPayload<T> {
    /// Normalize into an envelope.
    pub fn into_page(self) -> Page<T> {
        match self {
            ListPayload::Paged(page) => page,
            ListPayload::Items(items) => Page {
                content: items,
                ..Page::default()
            },
        }
    }
}

// ============================================
// Logs
// ============================================

/// A collected error log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogEntry {
    pub log_id: Option<i64>,
    pub id: Option<i64>,
    pub log_hash: Option<String>,
    pub service_name: Option<String>,
    pub host_info: Option<String>,
    pub host_name: Option<String>,
    pub summary: Option<String>,
    pub message: Option<String>,
    pub stack_trace: Option<String>,
    pub error_code: Option<String>,
    pub log_level: Option<LogLevel>,
    pub status: Option<LogStatus>,
    pub repeat_count: Option<i64>,
    pub impacted_host_count: Option<i64>,
    pub occurred_time: Option<ServerTimestamp>,
    pub created_at: Option<ServerTimestamp>,
    pub first_occurred_time: Option<ServerTimestamp>,
    pub last_occurred_time: Option<ServerTimestamp>,
    #[serde(rename = "isNew", alias = "new")]
    pub is_new: Option<bool>,
    #[serde(rename = "isNewHost", alias = "newHost")]
    pub is_new_host: Option<bool>,
}

impl LogEntry {
    pub fn id(&self) -> Option<i64> {
        self.log_id.or(self.id)
    }

    pub fn display_message(&self) -> &str {
        first_present([self.summary.as_deref(), self.message.as_deref()]).unwrap_or(NO_MESSAGE)
    }

    pub fn occurred_at(&self) -> Option<&ServerTimestamp> {
        self.occurred_time.as_ref().or(self.created_at.as_ref())
    }

    pub fn host(&self) -> Option<&str> {
        first_present([self.host_info.as_deref(), self.host_name.as_deref()])
    }

    pub fn service(&self) -> &str {
        self.service_name.as_deref().unwrap_or("-")
    }

    pub fn has_stack_trace(&self) -> bool {
        self.stack_trace
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

// ============================================
// Incidents
// ============================================

/// An incident: all logs sharing one normalized hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Incident {
    pub id: Option<i64>,
    pub log_hash: Option<String>,
    pub service_name: Option<String>,
    pub status: Option<IncidentStatus>,
    pub error_level: Option<LogLevel>,
    pub repeat_count: Option<i64>,
    pub first_occurred_at: Option<ServerTimestamp>,
    pub last_occurred_at: Option<ServerTimestamp>,
    pub resolved_at: Option<ServerTimestamp>,
    pub summary: Option<String>,
    pub error_code: Option<String>,
    pub incident_title: Option<String>,
    pub title: Option<String>,
    pub log_summary: Option<String>,
    pub created_by: Option<String>,
    pub stack_trace: Option<String>,
    pub kb_article_id: Option<i64>,
    pub kb_id: Option<i64>,
    pub linked_kb_id: Option<i64>,
    #[serde(rename = "kb_article_id")]
    pub kb_article_id_legacy: Option<i64>,
}

impl Incident {
    pub fn display_title(&self) -> &str {
        first_present([
            self.incident_title.as_deref(),
            self.title.as_deref(),
            self.log_summary.as_deref(),
            self.summary.as_deref(),
        ])
        .unwrap_or(NO_TITLE)
    }

    pub fn linked_kb_id(&self) -> Option<i64> {
        self.kb_article_id
            .or(self.kb_id)
            .or(self.linked_kb_id)
            .or(self.kb_article_id_legacy)
    }

    /// Drafts can only be created from incidents that are still live.
    pub fn can_create_draft(&self) -> bool {
        !self.status.as_ref().is_some_and(IncidentStatus::is_terminal)
    }

    pub fn has_stack_trace(&self) -> bool {
        self.stack_trace
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// One row of a top-N incident ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncidentRank {
    pub metric: Option<String>,
    pub metric_value: Option<i64>,
    pub id: Option<i64>,
    pub log_hash: Option<String>,
    pub service_name: Option<String>,
    pub status: Option<IncidentStatus>,
    pub error_level: Option<LogLevel>,
    pub repeat_count: Option<i64>,
    pub count: Option<i64>,
    pub host_count: Option<i64>,
    pub first_occurred_at: Option<ServerTimestamp>,
    pub last_occurred_at: Option<ServerTimestamp>,
    pub resolved_at: Option<ServerTimestamp>,
    pub summary: Option<String>,
    pub error_code: Option<String>,
    pub title: Option<String>,
    pub incident_title: Option<String>,
    pub log_summary: Option<String>,
}

impl IncidentRank {
    /// First non-zero count field, or zero.
    pub fn count(&self) -> i64 {
        [self.repeat_count, self.count, self.metric_value]
            .into_iter()
            .flatten()
            .find(|&n| n != 0)
            .unwrap_or(0)
    }

    pub fn display_title(&self) -> &str {
        first_present([
            self.title.as_deref(),
            self.incident_title.as_deref(),
            self.log_summary.as_deref(),
            self.summary.as_deref(),
        ])
        .unwrap_or(NO_TITLE)
    }
}

/// Result of an AI root-cause analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiAnalysis {
    pub cause: Option<String>,
    pub suggestion: Option<String>,
    /// Related KB article, if the backend linked one
    pub kb_id: Option<i64>,
}

// ============================================
// Knowledge base
// ============================================

/// A knowledge-base article, with one page of addendums when fetched in detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KbArticle {
    pub id: Option<i64>,
    pub incident_id: Option<i64>,
    pub incident_title: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<KbStatus>,
    pub confidence_level: Option<i32>,
    pub created_by: Option<String>,
    pub service_name: Option<String>,
    pub error_code: Option<String>,
    pub created_at: Option<ServerTimestamp>,
    pub updated_at: Option<ServerTimestamp>,
    pub last_activity_at: Option<ServerTimestamp>,
    pub tags: Vec<String>,
    pub addendums: Vec<Addendum>,
    pub addendum_page: Option<u32>,
    pub addendum_size: Option<u32>,
    pub addendum_total: Option<i64>,
    pub addendum_has_next: Option<bool>,
}

impl KbArticle {
    pub fn display_title(&self) -> &str {
        first_present([self.title.as_deref(), self.incident_title.as_deref()]).unwrap_or(NO_TITLE)
    }

    pub fn last_activity(&self) -> Option<&ServerTimestamp> {
        self.last_activity_at
            .as_ref()
            .or(self.updated_at.as_ref())
            .or(self.created_at.as_ref())
    }

    pub fn author(&self) -> &str {
        self.created_by.as_deref().unwrap_or("Unknown")
    }

    pub fn has_more_addendums(&self) -> bool {
        self.addendum_has_next.unwrap_or(false)
    }
}

/// A supplementary note appended to an article after initial authoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Addendum {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Option<ServerTimestamp>,
}

impl Addendum {
    /// Heading for the `index`-th (zero-based) addendum in a list.
    pub fn headline(&self, index: usize) -> String {
        first_present([self.title.as_deref(), self.summary.as_deref()])
            .map(str::to_string)
            .unwrap_or_else(|| format!("Addendum #{}", index + 1))
    }

    /// First 100 characters of the body.
    pub fn preview(&self) -> String {
        self.content
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(100)
            .collect()
    }
}

// ============================================
// Queries
// ============================================

/// Query-string parameters; empty values are never sent.
pub type Params = Vec<(&'static str, String)>;

fn push_opt(params: &mut Params, key: &'static str, value: Option<&str>) {
    if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
        params.push((key, v.to_string()));
    }
}

/// `GET /logs`
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub page: u32,
    pub size: u32,
    pub service_name: Option<String>,
    pub status: Option<LogStatus>,
    pub today_only: bool,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            service_name: None,
            status: None,
            today_only: false,
        }
    }
}

impl LogQuery {
    pub fn to_params(&self) -> Params {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        push_opt(&mut params, "serviceName", self.service_name.as_deref());
        push_opt(&mut params, "status", self.status.as_ref().map(|s| s.as_str()));
        if self.today_only {
            params.push(("isToday", "true".to_string()));
        }
        params
    }
}

/// `GET /incidents/search`
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentQuery {
    pub query: Option<String>,
    pub status: Option<IncidentStatus>,
    pub service_name: Option<String>,
    pub page: u32,
    pub size: u32,
}

impl Default for IncidentQuery {
    fn default() -> Self {
        Self {
            query: None,
            status: None,
            service_name: None,
            page: 0,
            size: 20,
        }
    }
}

impl IncidentQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Vec::new();
        push_opt(&mut params, "query", self.query.as_deref());
        push_opt(&mut params, "status", self.status.as_ref().map(|s| s.as_str()));
        push_opt(&mut params, "serviceName", self.service_name.as_deref());
        params.push(("page", self.page.to_string()));
        params.push(("size", self.size.to_string()));
        params
    }
}

/// `GET /incidents/top`
#[derive(Debug, Clone, PartialEq)]
pub struct RankQuery {
    pub metric: String,
    pub limit: u32,
    pub status: Option<IncidentStatus>,
    pub service_name: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl Default for RankQuery {
    fn default() -> Self {
        Self {
            metric: "repeatCount".to_string(),
            limit: 5,
            status: None,
            service_name: None,
            from: None,
            to: None,
        }
    }
}

impl RankQuery {
    pub fn to_params(&self) -> Params {
        let mut params = vec![
            ("metric", self.metric.clone()),
            ("limit", self.limit.to_string()),
        ];
        push_opt(&mut params, "status", self.status.as_ref().map(|s| s.as_str()));
        push_opt(&mut params, "serviceName", self.service_name.as_deref());
        if let Some(from) = self.from {
            params.push(("from", from.format(QUERY_DATETIME_FORMAT).to_string()));
        }
        if let Some(to) = self.to {
            params.push(("to", to.format(QUERY_DATETIME_FORMAT).to_string()));
        }
        params
    }
}

/// `GET /kb`
#[derive(Debug, Clone, PartialEq)]
pub struct KbQuery {
    pub status: Option<KbStatus>,
    pub keyword: Option<String>,
    pub created_by: Option<Author>,
    pub page: u32,
    pub size: u32,
}

impl Default for KbQuery {
    fn default() -> Self {
        Self {
            status: None,
            keyword: None,
            created_by: None,
            page: 0,
            size: 20,
        }
    }
}

impl KbQuery {
    pub fn to_params(&self) -> Params {
        let mut params = Vec::new();
        push_opt(&mut params, "status", self.status.as_ref().map(|s| s.as_str()));
        push_opt(&mut params, "keyword", self.keyword.as_deref());
        push_opt(
            &mut params,
            "createdBy",
            self.created_by.as_ref().map(|a| a.as_str()),
        );
        params.push(("page", self.page.to_string()));
        params.push(("size", self.size.to_string()));
        params
    }
}

/// Addendum sizes offered by the article view.
pub const ADDENDUM_PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// `GET /kb/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KbDetailQuery {
    pub addendum_page: u32,
    pub addendum_size: u32,
}

impl Default for KbDetailQuery {
    fn default() -> Self {
        Self {
            addendum_page: 0,
            addendum_size: 20,
        }
    }
}

impl KbDetailQuery {
    pub fn to_params(&self) -> Params {
        vec![
            ("addendumPage", self.addendum_page.to_string()),
            ("addendumSize", self.addendum_size.to_string()),
        ]
    }

    /// Next size in [`ADDENDUM_PAGE_SIZES`], wrapping; resets to the first page.
    pub fn cycle_size(&mut self) {
        let idx = ADDENDUM_PAGE_SIZES
            .iter()
            .position(|&s| s == self.addendum_size)
            .map(|i| (i + 1) % ADDENDUM_PAGE_SIZES.len())
            .unwrap_or(0);
        self.addendum_size = ADDENDUM_PAGE_SIZES[idx];
        self.addendum_page = 0;
    }
}

/// `PATCH /incidents/{logHash}/details`; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDetailsUpdate {
    pub title: Option<String>,
    pub created_by: Option<String>,
    pub status: Option<IncidentStatus>,
}

impl IncidentDetailsUpdate {
    pub fn to_params(&self) -> Params {
        let mut params = Vec::new();
        push_opt(&mut params, "title", self.title.as_deref());
        push_opt(&mut params, "createdBy", self.created_by.as_deref());
        push_opt(&mut params, "status", self.status.as_ref().map(|s| s.as_str()));
        params
    }

    pub fn is_empty(&self) -> bool {
        self.to_params().is_empty()
    }
}

// ============================================
// Request bodies
// ============================================

/// `POST /logs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectLogRequest {
    pub service_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Absent means the server infers the level from the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_time: Option<String>,
}

/// Body for saving, appending to, or updating an article draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KbArticleWrite {
    pub title: String,
    pub content: String,
    pub created_by: Author,
}

impl Default for Author {
    fn default() -> Self {
        Author::User
    }
}

/// `POST /kb/{id}/addendums`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddendumCreate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<KbStatus>,
    pub created_by: Author,
}

/// First value that is present and not blank.
fn first_present<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}
