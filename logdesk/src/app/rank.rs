use chrono::{DateTime, Local};
use logdesk_core::ranking;

use super::*;

/// The three ranking boards.
#[derive(Default)]
pub struct RankState {
    pub boards: Vec<BoardResult>,
    /// Empty means every service
    pub service: String,
    pub loaded_at: Option<DateTime<Local>>,
}

impl App {
    // ========== Ranking Methods ==========

    pub(super) fn load_boards(&mut self) {
        let limit = self.config.console.rank_limit;
        let service = self.rank.service.clone();
        self.submit(Channel::Ranking, move |api| async move {
            let service = Some(service.as_str()).filter(|s| !s.is_empty());
            Reply::Boards(ranking::load_boards(api.as_ref(), limit, service).await)
        });
    }

    pub(super) fn apply_boards(&mut self, boards: Vec<BoardResult>) {
        self.rank.boards = boards;
        self.rank.loaded_at = Some(Local::now());
    }

    /// Handle keyboard input on the ranking tab.
    pub(super) fn handle_rank_key(&mut self, key: KeyEvent) {
        if self.handle_global_key(key) {
            return;
        }
        match key.code {
            KeyCode::Char('s') | KeyCode::Char('/') => {
                let current = self.rank.service.clone();
                self.open_prompt(Field::RankService, &current);
            }
            KeyCode::Char('x') => {
                self.rank.service.clear();
                self.load_boards();
            }
            KeyCode::Char('r') => self.load_boards(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{key, test_app};
    use super::*;

    #[test]
    fn test_service_filter_reloads() {
        let mut app = test_app();
        app.switch_tab(3);
        assert_eq!(app.view_mode, ViewMode::Ranking);

        app.handle_key(key(KeyCode::Char('s')));
        for c in "auth".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.rank.service, "auth");
        assert!(app.is_loading(Channel::Ranking));

        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.rank.service.is_empty());
    }
}
