//! Request descriptions for every LogCollector operation
//!
//! An [`Endpoint`] is the method, path and query string of one call, built
//! without touching the network. The client turns it into a request.

use reqwest::Method;

use crate::types::{
    IncidentDetailsUpdate, IncidentQuery, IncidentStatus, KbDetailQuery, KbQuery, KbStatus,
    LogQuery, LogStatus, Params, RankQuery,
};

/// One API call, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub method: Method,
    /// Path starting with `/`, segments already percent-encoded
    pub path: String,
    pub params: Params,
}

impl Endpoint {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
        }
    }

    fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    fn param(mut self, key: &'static str, value: impl ToString) -> Self {
        self.params.push((key, value.to_string()));
        self
    }

    /// Full URL with the query string, for logging and tests.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}{}", base_url, self.path);
        for (i, (key, value)) in self.params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    pub fn search_logs(query: &LogQuery) -> Self {
        Self::new(Method::GET, "/logs").with_params(query.to_params())
    }

    pub fn update_log_status(log_id: i64, status: &LogStatus) -> Self {
        Self::new(Method::PATCH, format!("/logs/{}/status", log_id))
            .param("newStatus", status.as_str())
    }

    pub fn analyze(log_hash: &str, force: bool) -> Self {
        Self::new(Method::POST, format!("/logs/analyze/{}", segment(log_hash)))
            .param("force", force)
    }

    pub fn collect_log() -> Self {
        Self::new(Method::POST, "/logs")
    }

    pub fn search_incidents(query: &IncidentQuery) -> Self {
        Self::new(Method::GET, "/incidents/search").with_params(query.to_params())
    }

    pub fn get_incident(log_hash: &str) -> Self {
        Self::new(Method::GET, format!("/incidents/{}", segment(log_hash)))
    }

    pub fn update_incident_status(log_hash: &str, status: &IncidentStatus) -> Self {
        Self::new(
            Method::PATCH,
            format!("/incidents/{}/status", segment(log_hash)),
        )
        .param("newStatus", status.as_str())
    }

    pub fn update_incident_details(log_hash: &str, update: &IncidentDetailsUpdate) -> Self {
        Self::new(
            Method::PATCH,
            format!("/incidents/{}/details", segment(log_hash)),
        )
        .with_params(update.to_params())
    }

    pub fn incident_top(query: &RankQuery) -> Self {
        Self::new(Method::GET, "/incidents/top").with_params(query.to_params())
    }

    pub fn create_draft(incident_id: i64) -> Self {
        Self::new(Method::POST, "/kb/draft").param("incidentId", incident_id)
    }

    pub fn list_kb(query: &KbQuery) -> Self {
        Self::new(Method::GET, "/kb").with_params(query.to_params())
    }

    pub fn get_kb(id: i64, query: &KbDetailQuery) -> Self {
        Self::new(Method::GET, format!("/kb/{}", id)).with_params(query.to_params())
    }

    pub fn post_kb_article(id: i64) -> Self {
        Self::new(Method::POST, format!("/kb/articles/{}", id))
    }

    pub fn update_draft(id: i64) -> Self {
        Self::new(Method::POST, format!("/kb/draft/{}/update", id))
    }

    pub fn update_kb_status(id: i64, status: &KbStatus) -> Self {
        Self::new(Method::PATCH, format!("/kb/articles/{}/status", id))
            .param("status", status.as_str())
    }

    pub fn list_addendums(id: i64) -> Self {
        Self::new(Method::GET, format!("/kb/articles/{}/addendums", id))
    }

    pub fn create_addendum(id: i64) -> Self {
        Self::new(Method::POST, format!("/kb/{}/addendums", id))
    }

    pub fn run_scheduler() -> Self {
        Self::new(Method::POST, "/test/scheduler/run")
    }

    /// Cheapest read that proves the API is up.
    pub fn health_check() -> Self {
        Self::search_logs(&LogQuery {
            page: 0,
            size: 1,
            ..Default::default()
        })
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8080/api";

    #[test]
    fn test_log_endpoints() {
        let ep = Endpoint::search_logs(&LogQuery::default());
        assert_eq!(ep.method, Method::GET);
        assert_eq!(ep.url(BASE), "http://localhost:8080/api/logs?page=0&size=20");

        let ep = Endpoint::update_log_status(42, &LogStatus::Acknowledged);
        assert_eq!(ep.method, Method::PATCH);
        assert_eq!(
            ep.url(BASE),
            "http://localhost:8080/api/logs/42/status?newStatus=ACKNOWLEDGED"
        );

        let ep = Endpoint::analyze("abc123", true);
        assert_eq!(ep.method, Method::POST);
        assert_eq!(ep.url(BASE), "http://localhost:8080/api/logs/analyze/abc123?force=true");

        assert_eq!(
            Endpoint::health_check().url(BASE),
            "http://localhost:8080/api/logs?page=0&size=1"
        );
    }

    #[test]
    fn test_incident_endpoints() {
        let ep = Endpoint::search_incidents(&IncidentQuery {
            query: Some("pool exhaustion".to_string()),
            ..Default::default()
        });
        assert_eq!(
            ep.url(BASE),
            "http://localhost:8080/api/incidents/search?query=pool%20exhaustion&page=0&size=20"
        );

        assert_eq!(
            Endpoint::get_incident("a/b").path,
            "/incidents/a%2Fb",
            "path segments are percent-encoded"
        );

        let ep = Endpoint::update_incident_details(
            "h1",
            &IncidentDetailsUpdate {
                created_by: Some("kim".to_string()),
                status: Some(IncidentStatus::Underway),
                ..Default::default()
            },
        );
        assert_eq!(
            ep.url(BASE),
            "http://localhost:8080/api/incidents/h1/details?createdBy=kim&status=UNDERWAY"
        );

        let ep = Endpoint::incident_top(&RankQuery {
            limit: 3,
            ..Default::default()
        });
        assert_eq!(
            ep.url(BASE),
            "http://localhost:8080/api/incidents/top?metric=repeatCount&limit=3"
        );
    }

    #[test]
    fn test_kb_endpoints() {
        assert_eq!(
            Endpoint::create_draft(9).url(BASE),
            "http://localhost:8080/api/kb/draft?incidentId=9"
        );
        assert_eq!(
            Endpoint::get_kb(5, &KbDetailQuery::default()).url(BASE),
            "http://localhost:8080/api/kb/5?addendumPage=0&addendumSize=20"
        );
        assert_eq!(Endpoint::post_kb_article(5).path, "/kb/articles/5");
        assert_eq!(Endpoint::update_draft(5).path, "/kb/draft/5/update");
        assert_eq!(
            Endpoint::update_kb_status(5, &KbStatus::Published).url(BASE),
            "http://localhost:8080/api/kb/articles/5/status?status=PUBLISHED"
        );
        assert_eq!(Endpoint::list_addendums(5).path, "/kb/articles/5/addendums");
        assert_eq!(Endpoint::create_addendum(5).path, "/kb/5/addendums");
        assert_eq!(Endpoint::run_scheduler().method, Method::POST);
    }
}
