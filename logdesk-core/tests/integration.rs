//! Integration tests for logdesk-core wire decoding and console workflows
//!
//! Fixtures in `tests/fixtures/api/` are captured LogCollector responses,
//! including the mixed timestamp shapes the backend emits. Workflows run
//! against an in-memory API built from those fixtures.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use logdesk_core::api::ConsoleApi;
use logdesk_core::checks::{run_checks, CheckId, CheckStatus};
use logdesk_core::generator::{self, Preset, RunSettings};
use logdesk_core::logging;
use logdesk_core::ranking::{load_boards_at, Board};
use logdesk_core::timestamp::{format_server_time_in, kst};
use logdesk_core::types::*;
use logdesk_core::{Error, Result};

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/api")
        .join(name)
}

fn load_fixture<T: serde::de::DeserializeOwned>(name: &str) -> T {
    let content = std::fs::read_to_string(fixture_path(name)).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn render(ts: Option<&logdesk_core::ServerTimestamp>) -> String {
    format_server_time_in(ts, &kst())
}

const SAMPLE_RENDERED: &str = "2026. 1. 20. 오후 6:41:09";

// ============================================
// Wire decoding
// ============================================

#[test]
fn test_logs_page_decodes_mixed_shapes() {
    let payload: ListPayload<LogEntry> = load_fixture("logs_page.json");
    let page = payload.into_page();

    assert_eq!(page.content.len(), 3);
    assert!(!page.has_next(20));

    let first = &page.content[0];
    assert_eq!(first.id(), Some(101));
    assert_eq!(first.status, Some(LogStatus::New));
    assert_eq!(first.log_level, Some(LogLevel::Error));
    assert_eq!(first.host(), Some("db-master-01"));
    assert_eq!(first.is_new, Some(true));
    assert!(first.has_stack_trace());

    // Spaced string, epoch millis and tuple all mean the same wall clock
    assert_eq!(render(first.occurred_at()), SAMPLE_RENDERED);
    assert_eq!(render(first.last_occurred_time.as_ref()), SAMPLE_RENDERED);
    assert_eq!(
        render(first.first_occurred_time.as_ref()),
        "2026. 1. 20. 오후 6:30:00"
    );

    let second = &page.content[1];
    assert_eq!(second.id(), Some(102));
    assert_eq!(second.status, Some(LogStatus::Other("ESCALATED".to_string())));
    assert_eq!(render(second.occurred_at()), SAMPLE_RENDERED);
    assert_eq!(second.host(), Some("payment-api-02"));

    let third = &page.content[2];
    assert_eq!(third.display_message(), NO_MESSAGE);
    assert_eq!(render(third.occurred_at()), "-");
}

#[test]
fn test_incident_fixture_fallbacks() {
    let incident: Incident = load_fixture("incident.json");

    assert_eq!(incident.display_title(), "ConnectionRefused");
    assert_eq!(incident.linked_kb_id(), Some(31));
    assert_eq!(incident.status, Some(IncidentStatus::Underway));
    assert!(incident.can_create_draft());
    assert!(incident.resolved_at.is_none());

    // `Z` suffix is UTC; the zone-less string is KST
    assert_eq!(render(incident.last_occurred_at.as_ref()), SAMPLE_RENDERED);
    assert_eq!(
        render(incident.first_occurred_at.as_ref()),
        "2026. 1. 20. 오후 6:30:00"
    );
}

#[test]
fn test_rank_fixture_counts() {
    let ranks: Vec<IncidentRank> = load_fixture("rank_top.json");
    let counts: Vec<i64> = ranks.iter().map(IncidentRank::count).collect();
    assert_eq!(counts, vec![240, 60, 0]);

    let titles: Vec<&str> = ranks.iter().map(IncidentRank::display_title).collect();
    assert_eq!(
        titles,
        vec!["DB pool exhaustion", "Gateway timeout", "OutOfMemoryError"]
    );
}

#[test]
fn test_kb_detail_fixture() {
    let kb: KbArticle = load_fixture("kb_detail.json");

    assert_eq!(kb.display_title(), "Database connection pool exhaustion");
    assert_eq!(kb.status, Some(KbStatus::InProgress));
    assert_eq!(kb.tags, vec!["db", "hikari"]);
    assert!(kb.has_more_addendums());
    assert_eq!(kb.addendums[0].headline(0), "Restart workaround");
    assert_eq!(kb.addendums[1].headline(1), "Addendum #2");
    assert_eq!(
        render(kb.last_activity()),
        "2026. 1. 21. 오전 10:00:00"
    );

    let created = kb.created_at.as_ref().and_then(|ts| ts.instant()).unwrap();
    assert_eq!(created.timestamp_millis(), 1_768_902_069_500);
}

#[test]
fn test_kb_list_accepts_bare_array() {
    let payload: ListPayload<KbArticle> = load_fixture("kb_list_bare.json");
    let page = payload.into_page();

    assert_eq!(page.content.len(), 2);
    assert_eq!(page.content[0].display_title(), "Database connection pool exhaustion");
    assert_eq!(page.content[1].display_title(), "Gateway timeout playbook");
    assert_eq!(page.content[1].author(), "Unknown");
    assert_eq!(render(page.content[1].last_activity()), "-");
}

// ============================================
// Workflows against a fixture-backed API
// ============================================

#[derive(Default)]
struct FixtureApi {
    fail_recent_board: bool,
    reject_after: Option<usize>,
    collected: Mutex<Vec<serde_json::Value>>,
    rank_calls: AtomicUsize,
}

fn server_error(what: &str) -> Error {
    Error::Api {
        status: 500,
        message: format!("{} failed", what),
    }
}

#[async_trait]
impl ConsoleApi for FixtureApi {
    async fn search_logs(&self, _query: &LogQuery) -> Result<Page<LogEntry>> {
        Ok(load_fixture::<ListPayload<LogEntry>>("logs_page.json").into_page())
    }

    async fn update_log_status(&self, _log_id: i64, _status: &LogStatus) -> Result<()> {
        Ok(())
    }

    async fn analyze(&self, _log_hash: &str, _force: bool) -> Result<AiAnalysis> {
        Ok(AiAnalysis::default())
    }

    async fn collect_log(&self, request: &CollectLogRequest) -> Result<()> {
        let mut collected = self.collected.lock().unwrap();
        if self.reject_after.is_some_and(|n| collected.len() >= n) {
            return Err(Error::Api {
                status: 400,
                message: "INVALID_LOG_LEVEL".to_string(),
            });
        }
        collected.push(serde_json::to_value(request)?);
        Ok(())
    }

    async fn search_incidents(&self, _query: &IncidentQuery) -> Result<Page<Incident>> {
        Ok(ListPayload::Items(vec![load_fixture("incident.json")]).into_page())
    }

    async fn get_incident(&self, log_hash: &str) -> Result<Incident> {
        let incident: Incident = load_fixture("incident.json");
        if incident.log_hash.as_deref() == Some(log_hash) {
            Ok(incident)
        } else {
            Err(Error::Api {
                status: 404,
                message: "not found".to_string(),
            })
        }
    }

    async fn update_incident_status(&self, _log_hash: &str, _status: &IncidentStatus) -> Result<()> {
        Ok(())
    }

    async fn update_incident_details(
        &self,
        _log_hash: &str,
        _update: &IncidentDetailsUpdate,
    ) -> Result<()> {
        Ok(())
    }

    async fn incident_top(&self, query: &RankQuery) -> Result<Vec<IncidentRank>> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_recent_board && query.from.is_some() {
            return Err(server_error("ranking"));
        }
        Ok(load_fixture("rank_top.json"))
    }

    async fn create_draft(&self, _incident_id: i64) -> Result<i64> {
        Ok(31)
    }

    async fn list_kb(&self, _query: &KbQuery) -> Result<Page<KbArticle>> {
        Ok(load_fixture::<ListPayload<KbArticle>>("kb_list_bare.json").into_page())
    }

    async fn get_kb(&self, id: i64, _query: &KbDetailQuery) -> Result<KbArticle> {
        let kb: KbArticle = load_fixture("kb_detail.json");
        if kb.id == Some(id) {
            Ok(kb)
        } else {
            Err(server_error("kb detail"))
        }
    }

    async fn post_kb_article(&self, _id: i64, _article: &KbArticleWrite) -> Result<()> {
        Ok(())
    }

    async fn update_draft(&self, _id: i64, _article: &KbArticleWrite) -> Result<()> {
        Ok(())
    }

    async fn update_kb_status(&self, _id: i64, _status: &KbStatus) -> Result<()> {
        Ok(())
    }

    async fn list_addendums(&self, _id: i64) -> Result<Vec<Addendum>> {
        Ok(load_fixture::<KbArticle>("kb_detail.json").addendums)
    }

    async fn create_addendum(&self, _id: i64, _addendum: &AddendumCreate) -> Result<Addendum> {
        Ok(Addendum::default())
    }

    async fn run_scheduler(&self) -> Result<String> {
        Ok("ok".to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[tokio::test]
async fn test_system_check_against_fixtures() {
    logging::init_test();
    let api = FixtureApi::default();
    let report = run_checks(&api).await;

    assert!(report.all_passed(), "{:?}", report.results);
    assert_eq!(report.get(CheckId::Logs).unwrap().message, "3 loaded");
    assert_eq!(
        report.get(CheckId::IncidentDetail).unwrap().message,
        "logHash=9f2c1e7a4b3d5e6f"
    );
    assert_eq!(report.get(CheckId::IncidentTop).unwrap().message, "3 loaded");
    assert_eq!(report.get(CheckId::KbList).unwrap().message, "2 loaded");
    assert_eq!(report.get(CheckId::KbDetail).unwrap().status, CheckStatus::Pass);
}

#[tokio::test]
async fn test_ranking_boards_fail_independently() {
    logging::init_test();
    let api = FixtureApi {
        fail_recent_board: true,
        ..Default::default()
    };
    let now = NaiveDate::from_ymd_opt(2026, 1, 20)
        .unwrap()
        .and_hms_opt(18, 41, 9)
        .unwrap();

    let boards = load_boards_at(&api, 5, None, now).await;

    assert_eq!(api.rank_calls.load(Ordering::SeqCst), 3);
    let open = &boards[0];
    assert_eq!(open.board, Board::Open);
    let ratios: Vec<f64> = open.bars().into_iter().map(|(_, r)| r).collect();
    assert_eq!(ratios, vec![1.0, 0.25, 0.0]);

    assert_eq!(boards[1].board, Board::Recent);
    assert!(boards[1].entries.is_empty());
    assert_eq!(boards[1].error.as_deref(), Some("ranking failed"));

    assert_eq!(boards[2].entries.len(), 3);
}

#[tokio::test]
async fn test_generator_sends_preset_body() {
    logging::init_test();
    let api = FixtureApi::default();
    let settings = RunSettings {
        repeat: 2,
        delay: Duration::from_millis(1),
    };

    let report = generator::run(&api, &Preset::Payment.template(), settings, None, |_| {}).await;

    assert!(report.is_complete());
    let collected = api.collected.lock().unwrap();
    assert_eq!(collected.len(), 2);
    assert_eq!(collected[0]["serviceName"], "Payment-Gateway");
    assert_eq!(collected[0]["hostName"], "payment-api-02");
    assert_eq!(collected[0]["logLevel"], "FATAL");
}

#[tokio::test]
async fn test_generator_surfaces_backend_message() {
    logging::init_test();
    let api = FixtureApi {
        reject_after: Some(1),
        ..Default::default()
    };
    let settings = RunSettings {
        repeat: 4,
        delay: Duration::ZERO,
    };
    let mut progress = Vec::new();

    let report = generator::run(&api, &Preset::Db.template(), settings, None, |p| {
        progress.push(p.percent())
    })
    .await;

    assert_eq!(report.sent, 1);
    assert_eq!(progress, vec![25]);
    assert_eq!(
        report.failure.as_ref().map(Error::user_message).as_deref(),
        Some("INVALID_LOG_LEVEL")
    );
}
