//! LogCollector API access
//!
//! Every console operation goes through the [`ConsoleApi`] trait so views,
//! the generator and the system check can be driven by an in-memory fake.
//!
//! ## Usage
//!
//! Point the console at a collector in `~/.config/logdesk/config.toml`:
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:8080/api"
//! timeout_secs = 30
//! ```
//!
//! The TUI talks to the API through a [`Dispatcher`]; the CLI uses
//! [`BlockingApi`].

mod blocking;
mod client;
mod dispatch;
mod endpoint;
mod sequence;

pub use blocking::BlockingApi;
pub use client::{api_error, ApiClient};
pub use dispatch::{Completion, Dispatcher};
pub use endpoint::Endpoint;
pub use sequence::{RequestSequencer, Ticket};

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    Addendum, AddendumCreate, AiAnalysis, CollectLogRequest, Incident, IncidentDetailsUpdate,
    IncidentQuery, IncidentRank, IncidentStatus, KbArticle, KbArticleWrite, KbDetailQuery,
    KbQuery, KbStatus, LogEntry, LogQuery, LogStatus, Page, RankQuery,
};

/// Operations the console performs against a LogCollector backend.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    async fn search_logs(&self, query: &LogQuery) -> Result<Page<LogEntry>>;

    async fn update_log_status(&self, log_id: i64, status: &LogStatus) -> Result<()>;

    /// AI root-cause analysis for every log sharing `log_hash`.
    ///
    /// `force` re-runs the analysis even when a cached result exists.
    async fn analyze(&self, log_hash: &str, force: bool) -> Result<AiAnalysis>;

    /// Queue one log for ingestion. The backend answers `202 Accepted`.
    async fn collect_log(&self, request: &CollectLogRequest) -> Result<()>;

    async fn search_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>>;

    async fn get_incident(&self, log_hash: &str) -> Result<Incident>;

    async fn update_incident_status(&self, log_hash: &str, status: &IncidentStatus) -> Result<()>;

    async fn update_incident_details(
        &self,
        log_hash: &str,
        update: &IncidentDetailsUpdate,
    ) -> Result<()>;

    async fn incident_top(&self, query: &RankQuery) -> Result<Vec<IncidentRank>>;

    /// Create a KB draft from an incident, returning the new article id.
    async fn create_draft(&self, incident_id: i64) -> Result<i64>;

    async fn list_kb(&self, query: &KbQuery) -> Result<Page<KbArticle>>;

    async fn get_kb(&self, id: i64, query: &KbDetailQuery) -> Result<KbArticle>;

    /// Save or append article content.
    async fn post_kb_article(&self, id: i64, article: &KbArticleWrite) -> Result<()>;

    async fn update_draft(&self, id: i64, article: &KbArticleWrite) -> Result<()>;

    async fn update_kb_status(&self, id: i64, status: &KbStatus) -> Result<()>;

    async fn list_addendums(&self, id: i64) -> Result<Vec<Addendum>>;

    async fn create_addendum(&self, id: i64, addendum: &AddendumCreate) -> Result<Addendum>;

    /// Trigger the backend's KB maintenance scheduler. Returns its text reply.
    async fn run_scheduler(&self) -> Result<String>;

    /// True when the API answered a minimal read successfully.
    async fn health_check(&self) -> Result<bool>;
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory [`ConsoleApi`] for unit tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    #[derive(Default)]
    pub struct StubApi {
        pub logs: Vec<LogEntry>,
        pub incidents: Vec<Incident>,
        pub ranks: Vec<IncidentRank>,
        pub articles: Vec<KbArticle>,
        pub addendums: Vec<Addendum>,
        /// Operation names that answer with a 500
        pub failing: HashSet<&'static str>,
        /// Fail `collect_log` after this many successful sends
        pub collect_limit: Option<usize>,
        pub calls: Mutex<Vec<String>>,
        pub collected: Mutex<Vec<CollectLogRequest>>,
        pub rank_queries: Mutex<Vec<RankQuery>>,
    }

    impl StubApi {
        fn call(&self, name: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.failing.contains(name) {
                return Err(Error::Api {
                    status: 500,
                    message: format!("{} unavailable", name),
                });
            }
            Ok(())
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn page<T: Clone>(items: &[T]) -> Page<T> {
        Page {
            content: items.to_vec(),
            total_elements: Some(items.len() as i64),
            total_pages: Some(1),
            number: Some(0),
            size: Some(items.len() as u32),
            last: Some(true),
        }
    }

    #[async_trait]
    impl ConsoleApi for StubApi {
        async fn search_logs(&self, _query: &LogQuery) -> Result<Page<LogEntry>> {
            self.call("search_logs")?;
            Ok(page(&self.logs))
        }

        async fn update_log_status(&self, _log_id: i64, _status: &LogStatus) -> Result<()> {
            self.call("update_log_status")
        }

        async fn analyze(&self, _log_hash: &str, _force: bool) -> Result<AiAnalysis> {
            self.call("analyze")?;
            Ok(AiAnalysis::default())
        }

        async fn collect_log(&self, request: &CollectLogRequest) -> Result<()> {
            self.call("collect_log")?;
            let mut collected = self.collected.lock().unwrap();
            if self.collect_limit.is_some_and(|limit| collected.len() >= limit) {
                return Err(Error::Api {
                    status: 400,
                    message: "queue full".to_string(),
                });
            }
            collected.push(request.clone());
            Ok(())
        }

        async fn search_incidents(&self, _query: &IncidentQuery) -> Result<Page<Incident>> {
            self.call("search_incidents")?;
            Ok(page(&self.incidents))
        }

        async fn get_incident(&self, log_hash: &str) -> Result<Incident> {
            self.call("get_incident")?;
            self.incidents
                .iter()
                .find(|i| i.log_hash.as_deref() == Some(log_hash))
                .cloned()
                .ok_or_else(|| Error::Api {
                    status: 404,
                    message: "incident not found".to_string(),
                })
        }

        async fn update_incident_status(
            &self,
            _log_hash: &str,
            _status: &IncidentStatus,
        ) -> Result<()> {
            self.call("update_incident_status")
        }

        async fn update_incident_details(
            &self,
            _log_hash: &str,
            _update: &IncidentDetailsUpdate,
        ) -> Result<()> {
            self.call("update_incident_details")
        }

        async fn incident_top(&self, query: &RankQuery) -> Result<Vec<IncidentRank>> {
            self.rank_queries.lock().unwrap().push(query.clone());
            let name = match (&query.status, &query.from) {
                (Some(_), _) => "incident_top_open",
                (None, Some(_)) => "incident_top_recent",
                (None, None) => "incident_top",
            };
            self.call(name)?;
            Ok(self.ranks.clone())
        }

        async fn create_draft(&self, incident_id: i64) -> Result<i64> {
            self.call("create_draft")?;
            Ok(incident_id + 1000)
        }

        async fn list_kb(&self, _query: &KbQuery) -> Result<Page<KbArticle>> {
            self.call("list_kb")?;
            Ok(page(&self.articles))
        }

        async fn get_kb(&self, id: i64, _query: &KbDetailQuery) -> Result<KbArticle> {
            self.call("get_kb")?;
            self.articles
                .iter()
                .find(|a| a.id == Some(id))
                .cloned()
                .ok_or_else(|| Error::Api {
                    status: 404,
                    message: "article not found".to_string(),
                })
        }

        async fn post_kb_article(&self, _id: i64, _article: &KbArticleWrite) -> Result<()> {
            self.call("post_kb_article")
        }

        async fn update_draft(&self, _id: i64, _article: &KbArticleWrite) -> Result<()> {
            self.call("update_draft")
        }

        async fn update_kb_status(&self, _id: i64, _status: &KbStatus) -> Result<()> {
            self.call("update_kb_status")
        }

        async fn list_addendums(&self, _id: i64) -> Result<Vec<Addendum>> {
            self.call("list_addendums")?;
            Ok(self.addendums.clone())
        }

        async fn create_addendum(&self, _id: i64, addendum: &AddendumCreate) -> Result<Addendum> {
            self.call("create_addendum")?;
            Ok(Addendum {
                id: Some(1),
                title: addendum.title.clone(),
                content: Some(addendum.content.clone()),
                ..Default::default()
            })
        }

        async fn run_scheduler(&self) -> Result<String> {
            self.call("run_scheduler")?;
            Ok("scheduler executed".to_string())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.call("health_check").is_ok())
        }
    }
}
