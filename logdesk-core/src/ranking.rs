//! Top-N incident boards
//!
//! Three boards over the same ranking endpoint: open incidents, the last
//! seven days, and all time. Each board loads independently; one failing
//! leaves that board empty and the others untouched.

use chrono::{Duration, Local, NaiveDateTime};

use crate::api::ConsoleApi;
use crate::types::{IncidentRank, IncidentStatus, RankQuery};

/// Window for the "recent" board.
pub const RECENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    Open,
    Recent,
    AllTime,
}

impl Board {
    pub const ALL: [Board; 3] = [Board::Open, Board::Recent, Board::AllTime];

    pub fn title(self) -> &'static str {
        match self {
            Board::Open => "Critical Issues (OPEN)",
            Board::Recent => "Recent Trends (7 days)",
            Board::AllTime => "All-Time High",
        }
    }

    /// Query for this board as of `now` (host local wall clock).
    pub fn query(self, limit: u32, service_name: Option<&str>, now: NaiveDateTime) -> RankQuery {
        let mut query = RankQuery {
            limit,
            service_name: service_name.map(str::to_string),
            ..Default::default()
        };
        match self {
            Board::Open => query.status = Some(IncidentStatus::Open),
            Board::Recent => query.from = Some(now - Duration::days(RECENT_DAYS)),
            Board::AllTime => {}
        }
        query
    }
}

/// One loaded board.
#[derive(Debug, Clone)]
pub struct BoardResult {
    pub board: Board,
    pub entries: Vec<IncidentRank>,
    /// Why the board is empty, when it failed to load
    pub error: Option<String>,
}

impl BoardResult {
    /// Largest count on the board.
    pub fn max_count(&self) -> i64 {
        self.entries
            .iter()
            .map(IncidentRank::count)
            .max()
            .unwrap_or(0)
    }

    /// Entries paired with their bar ratio in `0.0..=1.0`.
    pub fn bars(&self) -> Vec<(&IncidentRank, f64)> {
        let max = self.max_count();
        self.entries
            .iter()
            .map(|entry| (entry, bar_ratio(entry.count(), max)))
            .collect()
    }
}

/// Bar length relative to the board's maximum. Zero when nothing has a count.
pub fn bar_ratio(count: i64, max: i64) -> f64 {
    if max <= 0 || count <= 0 {
        return 0.0;
    }
    (count as f64 / max as f64).min(1.0)
}

/// Load all three boards concurrently.
pub async fn load_boards(
    api: &dyn ConsoleApi,
    limit: u32,
    service_name: Option<&str>,
) -> Vec<BoardResult> {
    load_boards_at(api, limit, service_name, Local::now().naive_local()).await
}

/// [`load_boards`] with an explicit clock.
pub async fn load_boards_at(
    api: &dyn ConsoleApi,
    limit: u32,
    service_name: Option<&str>,
    now: NaiveDateTime,
) -> Vec<BoardResult> {
    let service_name = service_name.map(str::trim).filter(|s| !s.is_empty());

    let (open, recent, all_time) = tokio::join!(
        load_board(api, Board::Open, limit, service_name, now),
        load_board(api, Board::Recent, limit, service_name, now),
        load_board(api, Board::AllTime, limit, service_name, now),
    );
    vec![open, recent, all_time]
}

async fn load_board(
    api: &dyn ConsoleApi,
    board: Board,
    limit: u32,
    service_name: Option<&str>,
    now: NaiveDateTime,
) -> BoardResult {
    match api.incident_top(&board.query(limit, service_name, now)).await {
        Ok(entries) => BoardResult {
            board,
            entries,
            error: None,
        },
        Err(err) => {
            tracing::warn!(board = board.title(), error = %err, "Failed to load ranking board");
            BoardResult {
                board,
                entries: Vec::new(),
                error: Some(err.user_message()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::stub::StubApi;
    use crate::types::QUERY_DATETIME_FORMAT;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 20)
            .unwrap()
            .and_hms_opt(18, 41, 9)
            .unwrap()
    }

    fn rank(repeat: i64) -> IncidentRank {
        IncidentRank {
            repeat_count: Some(repeat),
            ..Default::default()
        }
    }

    #[test]
    fn test_board_queries() {
        let open = Board::Open.query(5, None, now());
        assert_eq!(open.status, Some(IncidentStatus::Open));
        assert_eq!(open.from, None);

        let recent = Board::Recent.query(5, Some("Order-Service"), now());
        assert_eq!(
            recent.from.unwrap().format(QUERY_DATETIME_FORMAT).to_string(),
            "2026-01-13T18:41:09"
        );
        assert_eq!(recent.service_name.as_deref(), Some("Order-Service"));

        let all = Board::AllTime.query(5, None, now());
        assert_eq!(all.status, None);
        assert_eq!(all.from, None);
    }

    #[test]
    fn test_bar_ratio() {
        assert_eq!(bar_ratio(50, 100), 0.5);
        assert_eq!(bar_ratio(100, 100), 1.0);
        assert_eq!(bar_ratio(0, 0), 0.0);
        assert_eq!(bar_ratio(5, 0), 0.0);
    }

    #[test]
    fn test_bars_relative_to_board_max() {
        let result = BoardResult {
            board: Board::AllTime,
            entries: vec![rank(200), rank(50), rank(0)],
            error: None,
        };
        let ratios: Vec<f64> = result.bars().into_iter().map(|(_, r)| r).collect();
        assert_eq!(ratios, vec![1.0, 0.25, 0.0]);
    }

    #[tokio::test]
    async fn test_one_failing_board_leaves_others() {
        let mut api = StubApi {
            ranks: vec![rank(10), rank(3)],
            ..Default::default()
        };
        api.failing.insert("incident_top_recent");

        let boards = load_boards_at(&api, 5, Some("  "), now()).await;

        assert_eq!(boards.len(), 3);
        assert_eq!(boards[0].board, Board::Open);
        assert_eq!(boards[0].entries.len(), 2);
        assert!(boards[1].entries.is_empty());
        assert_eq!(
            boards[1].error.as_deref(),
            Some("incident_top_recent unavailable")
        );
        assert_eq!(boards[2].entries.len(), 2);

        // Blank service filter is not sent
        let queries = api.rank_queries.lock().unwrap();
        assert!(queries.iter().all(|q| q.service_name.is_none()));
    }
}
