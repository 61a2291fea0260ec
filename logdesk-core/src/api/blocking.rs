//! Synchronous wrapper for use from non-async code
//!
//! The CLI is a plain blocking program; this owns a single-threaded runtime
//! and drives each call to completion.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{
    Addendum, AddendumCreate, AiAnalysis, CollectLogRequest, Incident, IncidentDetailsUpdate,
    IncidentQuery, IncidentRank, IncidentStatus, KbArticle, KbArticleWrite, KbDetailQuery,
    KbQuery, KbStatus, LogEntry, LogQuery, LogStatus, Page, RankQuery,
};

use super::ConsoleApi;

/// Blocking facade over any [`ConsoleApi`]
pub struct BlockingApi {
    inner: Arc<dyn ConsoleApi>,
    runtime: tokio::runtime::Runtime,
}

impl BlockingApi {
    pub fn new(inner: Arc<dyn ConsoleApi>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(format!("failed to create runtime: {}", e)))?;

        Ok(Self { inner, runtime })
    }

    /// The wrapped API, for async helpers such as the generator.
    pub fn api(&self) -> Arc<dyn ConsoleApi> {
        Arc::clone(&self.inner)
    }

    /// Run any future on the wrapped runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn search_logs(&self, query: &LogQuery) -> Result<Page<LogEntry>> {
        self.runtime.block_on(self.inner.search_logs(query))
    }

    pub fn update_log_status(&self, log_id: i64, status: &LogStatus) -> Result<()> {
        self.runtime
            .block_on(self.inner.update_log_status(log_id, status))
    }

    pub fn analyze(&self, log_hash: &str, force: bool) -> Result<AiAnalysis> {
        self.runtime.block_on(self.inner.analyze(log_hash, force))
    }

    pub fn collect_log(&self, request: &CollectLogRequest) -> Result<()> {
        self.runtime.block_on(self.inner.collect_log(request))
    }

    pub fn search_incidents(&self, query: &IncidentQuery) -> Result<Page<Incident>> {
        self.runtime.block_on(self.inner.search_incidents(query))
    }

    pub fn get_incident(&self, log_hash: &str) -> Result<Incident> {
        self.runtime.block_on(self.inner.get_incident(log_hash))
    }

    pub fn update_incident_status(&self, log_hash: &str, status: &IncidentStatus) -> Result<()> {
        self.runtime
            .block_on(self.inner.update_incident_status(log_hash, status))
    }

    pub fn update_incident_details(
        &self,
        log_hash: &str,
        update: &IncidentDetailsUpdate,
    ) -> Result<()> {
        self.runtime
            .block_on(self.inner.update_incident_details(log_hash, update))
    }

    pub fn incident_top(&self, query: &RankQuery) -> Result<Vec<IncidentRank>> {
        self.runtime.block_on(self.inner.incident_top(query))
    }

    pub fn create_draft(&self, incident_id: i64) -> Result<i64> {
        self.runtime.block_on(self.inner.create_draft(incident_id))
    }

    pub fn list_kb(&self, query: &KbQuery) -> Result<Page<KbArticle>> {
        self.runtime.block_on(self.inner.list_kb(query))
    }

    pub fn get_kb(&self, id: i64, query: &KbDetailQuery) -> Result<KbArticle> {
        self.runtime.block_on(self.inner.get_kb(id, query))
    }

    pub fn post_kb_article(&self, id: i64, article: &KbArticleWrite) -> Result<()> {
        self.runtime.block_on(self.inner.post_kb_article(id, article))
    }

    pub fn update_draft(&self, id: i64, article: &KbArticleWrite) -> Result<()> {
        self.runtime.block_on(self.inner.update_draft(id, article))
    }

    pub fn update_kb_status(&self, id: i64, status: &KbStatus) -> Result<()> {
        self.runtime.block_on(self.inner.update_kb_status(id, status))
    }

    pub fn list_addendums(&self, id: i64) -> Result<Vec<Addendum>> {
        self.runtime.block_on(self.inner.list_addendums(id))
    }

    pub fn create_addendum(&self, id: i64, addendum: &AddendumCreate) -> Result<Addendum> {
        self.runtime
            .block_on(self.inner.create_addendum(id, addendum))
    }

    pub fn run_scheduler(&self) -> Result<String> {
        self.runtime.block_on(self.inner.run_scheduler())
    }

    pub fn health_check(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.health_check())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubApi;

    #[test]
    fn test_blocking_calls_reach_inner_api() {
        let stub = Arc::new(StubApi {
            logs: vec![LogEntry::default(), LogEntry::default()],
            ..Default::default()
        });
        let api = BlockingApi::new(stub.clone()).unwrap();

        let page = api.search_logs(&LogQuery::default()).unwrap();
        assert_eq!(page.content.len(), 2);
        assert!(api.health_check().unwrap());
        assert_eq!(stub.calls(), vec!["search_logs", "health_check"]);
    }

    #[test]
    fn test_blocking_propagates_errors() {
        let mut stub = StubApi::default();
        stub.failing.insert("run_scheduler");
        let api = BlockingApi::new(Arc::new(stub)).unwrap();

        let err = api.run_scheduler().unwrap_err();
        assert_eq!(err.user_message(), "run_scheduler unavailable");
    }
}
