//! End-to-end API smoke check
//!
//! Exercises the main read endpoints in a fixed order. Detail checks reuse
//! the first row of the preceding list and are skipped when it was empty.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::api::ConsoleApi;
use crate::error::Error;
use crate::types::{IncidentQuery, KbDetailQuery, KbQuery, LogQuery, RankQuery};

/// Rows requested by each list check.
const SAMPLE_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckId {
    Logs,
    Incidents,
    IncidentDetail,
    IncidentTop,
    KbList,
    KbDetail,
}

impl CheckId {
    pub const ALL: [CheckId; 6] = [
        CheckId::Logs,
        CheckId::Incidents,
        CheckId::IncidentDetail,
        CheckId::IncidentTop,
        CheckId::KbList,
        CheckId::KbDetail,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CheckId::Logs => "Logs (/logs)",
            CheckId::Incidents => "Incident search (/incidents/search)",
            CheckId::IncidentDetail => "Incident detail (/incidents/{logHash})",
            CheckId::IncidentTop => "Incident ranking (/incidents/top)",
            CheckId::KbList => "KB list (/kb)",
            CheckId::KbDetail => "KB detail (/kb/{id})",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skip => "SKIP",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub id: CheckId,
    pub status: CheckStatus,
    pub message: String,
}

impl CheckResult {
    fn pass(id: CheckId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: CheckStatus::Pass,
            message: message.into(),
        }
    }

    fn fail(id: CheckId, err: &Error) -> Self {
        Self {
            id,
            status: CheckStatus::Fail,
            message: err.user_message(),
        }
    }

    fn skip(id: CheckId, message: impl Into<String>) -> Self {
        Self {
            id,
            status: CheckStatus::Skip,
            message: message.into(),
        }
    }
}

/// A complete run.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == CheckStatus::Fail)
            .count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn get(&self, id: CheckId) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

fn loaded(count: usize) -> String {
    format!("{} loaded", count)
}

/// Run every check in order. Never returns early.
pub async fn run_checks(api: &dyn ConsoleApi) -> CheckReport {
    let started_at = Utc::now();
    let mut results = Vec::with_capacity(CheckId::ALL.len());

    let logs = api
        .search_logs(&LogQuery {
            page: 0,
            size: SAMPLE_SIZE,
            ..Default::default()
        })
        .await;
    results.push(match logs {
        Ok(page) => CheckResult::pass(CheckId::Logs, loaded(page.content.len())),
        Err(err) => CheckResult::fail(CheckId::Logs, &err),
    });

    let incidents = match api
        .search_incidents(&IncidentQuery {
            size: SAMPLE_SIZE,
            ..Default::default()
        })
        .await
    {
        Ok(page) => {
            results.push(CheckResult::pass(
                CheckId::Incidents,
                loaded(page.content.len()),
            ));
            page.content
        }
        Err(err) => {
            results.push(CheckResult::fail(CheckId::Incidents, &err));
            Vec::new()
        }
    };

    let target_hash = incidents
        .first()
        .and_then(|i| i.log_hash.as_deref())
        .filter(|h| !h.is_empty());
    results.push(match target_hash {
        None => CheckResult::skip(CheckId::IncidentDetail, "no incident data"),
        Some(hash) => match api.get_incident(hash).await {
            Ok(_) => CheckResult::pass(CheckId::IncidentDetail, format!("logHash={}", hash)),
            Err(err) => CheckResult::fail(CheckId::IncidentDetail, &err),
        },
    });

    let top = api
        .incident_top(&RankQuery {
            limit: SAMPLE_SIZE,
            ..Default::default()
        })
        .await;
    results.push(match top {
        Ok(entries) => CheckResult::pass(CheckId::IncidentTop, loaded(entries.len())),
        Err(err) => CheckResult::fail(CheckId::IncidentTop, &err),
    });

    let articles = match api
        .list_kb(&KbQuery {
            size: SAMPLE_SIZE,
            ..Default::default()
        })
        .await
    {
        Ok(page) => {
            results.push(CheckResult::pass(CheckId::KbList, loaded(page.content.len())));
            page.content
        }
        Err(err) => {
            results.push(CheckResult::fail(CheckId::KbList, &err));
            Vec::new()
        }
    };

    let target_id = articles.first().and_then(|a| a.id);
    results.push(match target_id {
        None => CheckResult::skip(CheckId::KbDetail, "no KB data"),
        Some(id) => {
            let query = KbDetailQuery {
                addendum_page: 0,
                addendum_size: SAMPLE_SIZE,
            };
            match api.get_kb(id, &query).await {
                Ok(_) => CheckResult::pass(CheckId::KbDetail, format!("id={}", id)),
                Err(err) => CheckResult::fail(CheckId::KbDetail, &err),
            }
        }
    });

    let report = CheckReport {
        started_at,
        results,
    };
    tracing::info!(failed = report.failed(), "System check finished");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubApi;
    use crate::types::{Incident, KbArticle, LogEntry};

    fn populated() -> StubApi {
        StubApi {
            logs: vec![LogEntry::default(); 3],
            incidents: vec![Incident {
                log_hash: Some("abc".to_string()),
                ..Default::default()
            }],
            articles: vec![KbArticle {
                id: Some(7),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let api = populated();
        let report = run_checks(&api).await;

        assert_eq!(report.results.len(), 6);
        assert!(report.all_passed());
        assert_eq!(report.get(CheckId::Logs).unwrap().message, "3 loaded");
        assert_eq!(
            report.get(CheckId::IncidentDetail).unwrap().message,
            "logHash=abc"
        );
        assert_eq!(report.get(CheckId::KbDetail).unwrap().message, "id=7");
        let order: Vec<CheckId> = report.results.iter().map(|r| r.id).collect();
        assert_eq!(order, CheckId::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_empty_lists_skip_detail_checks() {
        let api = StubApi::default();
        let report = run_checks(&api).await;

        let detail = report.get(CheckId::IncidentDetail).unwrap();
        assert_eq!(detail.status, CheckStatus::Skip);
        assert_eq!(detail.message, "no incident data");
        assert_eq!(
            report.get(CheckId::KbDetail).unwrap().status,
            CheckStatus::Skip
        );
        assert!(report.all_passed());
        assert!(!api.calls().contains(&"get_incident".to_string()));
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let mut api = populated();
        api.failing.insert("search_incidents");
        api.failing.insert("get_kb");

        let report = run_checks(&api).await;

        assert_eq!(report.failed(), 2);
        let incidents = report.get(CheckId::Incidents).unwrap();
        assert_eq!(incidents.status, CheckStatus::Fail);
        assert_eq!(incidents.message, "search_incidents unavailable");
        // Failed list means nothing to look up
        assert_eq!(
            report.get(CheckId::IncidentDetail).unwrap().status,
            CheckStatus::Skip
        );
        assert_eq!(report.get(CheckId::KbDetail).unwrap().status, CheckStatus::Fail);
        assert_eq!(report.get(CheckId::IncidentTop).unwrap().status, CheckStatus::Pass);
    }
}
