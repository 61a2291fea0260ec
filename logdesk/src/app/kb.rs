use logdesk_core::{AddendumCreate, Author, KbArticleWrite, KbDetailQuery, KbQuery, KbStatus};

use super::*;

pub struct KbState {
    pub rows: Vec<KbArticle>,
    pub table_state: TableState,
    pub query: KbQuery,
    pub has_next: bool,
    pub total: Option<i64>,
    pub error: Option<String>,
}

impl KbState {
    pub fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            table_state: TableState::default(),
            query: KbQuery {
                size: page_size,
                ..Default::default()
            },
            has_next: false,
            total: None,
            error: None,
        }
    }

    pub fn selected(&self) -> Option<&KbArticle> {
        self.table_state.selected().and_then(|i| self.rows.get(i))
    }
}

/// One article with its addendum page and edit form.
pub struct KbDetailState {
    pub id: i64,
    pub article: Option<KbArticle>,
    pub error: Option<String>,
    pub query: KbDetailQuery,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub scroll: u16,
    return_to: ViewMode,
}

impl KbDetailState {
    fn new(id: i64, return_to: ViewMode) -> Self {
        Self {
            id,
            article: None,
            error: None,
            query: KbDetailQuery::default(),
            title: String::new(),
            content: String::new(),
            author: Author::default(),
            scroll: 0,
            return_to,
        }
    }

    fn fill_form(&mut self, article: &KbArticle) {
        self.title = article
            .incident_title
            .clone()
            .or_else(|| article.title.clone())
            .unwrap_or_default();
        self.content = article.content.clone().unwrap_or_default();
    }

    fn write_body(&self) -> KbArticleWrite {
        KbArticleWrite {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            created_by: self.author.clone(),
        }
    }

    pub fn has_next_addendums(&self) -> bool {
        self.article
            .as_ref()
            .is_some_and(KbArticle::has_more_addendums)
    }

    pub fn is_published(&self) -> bool {
        self.article
            .as_ref()
            .and_then(|a| a.status.as_ref())
            .is_some_and(|s| *s == KbStatus::Published)
    }
}

impl App {
    // ========== KB List Methods ==========

    pub(super) fn load_kb_list(&mut self) {
        let query = self.kb.query.clone();
        self.submit(Channel::KbList, move |api| async move {
            Reply::KbList(api.list_kb(&query).await)
        });
    }

    pub(super) fn apply_kb_list(&mut self, result: ApiResult<Page<KbArticle>>) {
        match result {
            Ok(page) => {
                self.kb.has_next = page.has_next(self.kb.query.size);
                self.kb.total = page.total_elements;
                self.kb.rows = page.content;
                self.kb.error = None;
                clamp_selection(&mut self.kb.table_state, self.kb.rows.len());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load KB articles");
                self.kb.error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the KB list.
    pub(super) fn handle_kb_key(&mut self, key: KeyEvent) {
        if self.handle_global_key(key) {
            return;
        }
        let len = self.kb.rows.len();
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.kb.table_state, len),
            KeyCode::Up | KeyCode::Char('k') => select_prev(&mut self.kb.table_state, len),
            KeyCode::Char('g') => self.kb.table_state.select((len > 0).then_some(0)),
            KeyCode::Char('G') => self.kb.table_state.select(len.checked_sub(1)),
            KeyCode::Enter => {
                if let Some(id) = self.kb.selected().and_then(|a| a.id) {
                    self.open_kb_detail(id);
                }
            }
            KeyCode::Char('/') => {
                let current = self.kb.query.keyword.clone().unwrap_or_default();
                self.open_prompt(Field::KbKeyword, &current);
            }
            KeyCode::Char('f') => {
                self.kb.query.status = cycle_filter(self.kb.query.status.as_ref(), &KbStatus::all());
                self.kb.query.page = 0;
                self.load_kb_list();
            }
            KeyCode::Char('w') => {
                self.kb.query.created_by =
                    cycle_filter(self.kb.query.created_by.as_ref(), &Author::all());
                self.kb.query.page = 0;
                self.load_kb_list();
            }
            KeyCode::Char('n') if self.kb.has_next => {
                self.kb.query.page += 1;
                self.load_kb_list();
            }
            KeyCode::Char('p') if self.kb.query.page > 0 => {
                self.kb.query.page -= 1;
                self.load_kb_list();
            }
            KeyCode::Char('x') => {
                self.kb.query = KbQuery {
                    size: self.kb.query.size,
                    ..Default::default()
                };
                self.load_kb_list();
            }
            KeyCode::Char('S') => self.ask(
                Pending::RunScheduler,
                "Run the KB draft scheduler now?",
            ),
            KeyCode::Char('r') => self.load_kb_list(),
            _ => {}
        }
    }

    pub(super) fn run_scheduler(&mut self) {
        self.submit(Channel::Mutation(Mutation::Scheduler), |api| async move {
            Reply::Done(api.run_scheduler().await.map(Done::Scheduler))
        });
    }

    // ========== KB Detail Methods ==========

    pub(super) fn open_kb_detail(&mut self, id: i64) {
        let return_to = match (self.view_mode, self.kb_detail.as_ref()) {
            (ViewMode::KbDetail, Some(current)) => current.return_to,
            (ViewMode::KbDetail, None) => ViewMode::Kb,
            (mode, _) => mode,
        };
        self.kb_detail = Some(KbDetailState::new(id, return_to));
        self.view_mode = ViewMode::KbDetail;
        self.reload_kb_detail();
    }

    pub(super) fn reload_kb_detail(&mut self) {
        let Some(detail) = self.kb_detail.as_ref() else {
            return;
        };
        let id = detail.id;
        let query = detail.query;
        self.submit(Channel::KbDetail, move |api| async move {
            Reply::KbDetail(api.get_kb(id, &query).await)
        });
    }

    pub(super) fn apply_kb_detail(&mut self, result: ApiResult<KbArticle>) {
        let Some(detail) = self.kb_detail.as_mut() else {
            return;
        };
        match result {
            Ok(article) => {
                detail.fill_form(&article);
                detail.article = Some(article);
                detail.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, id = detail.id, "Failed to load KB article");
                detail.error = Some(e.user_message());
            }
        }
    }

    /// Handle keyboard input in the article view.
    pub(super) fn handle_kb_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.kb_detail.as_mut() else {
            self.view_mode = ViewMode::Kb;
            return;
        };
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                let back = detail.return_to;
                self.dispatcher.cancel(Channel::KbDetail);
                self.kb_detail = None;
                self.view_mode = back;
                if back == ViewMode::Kb {
                    self.load_kb_list();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => detail.scroll = detail.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => detail.scroll = detail.scroll.saturating_sub(1),
            KeyCode::Char('e') => {
                let current = detail.title.clone();
                self.open_prompt(Field::KbTitle, &current);
            }
            KeyCode::Char('c') => {
                let current = detail.content.clone();
                self.open_prompt(Field::KbContent, &current);
            }
            KeyCode::Char('w') => {
                let all = Author::all();
                let next = all
                    .iter()
                    .position(|a| *a == detail.author)
                    .map(|i| (i + 1) % all.len())
                    .unwrap_or(0);
                detail.author = all[next].clone();
            }
            KeyCode::Char('s') => self.save_article(Mutation::SaveArticle),
            KeyCode::Char('U') => self.save_article(Mutation::UpdateDraft),
            KeyCode::Char('P') => {
                if detail.is_published() {
                    self.flash_info("Already PUBLISHED");
                    return;
                }
                let id = detail.id;
                self.ask(Pending::Publish { id }, "Publish this article?");
            }
            KeyCode::Char('A') => self.open_prompt(Field::AddendumContent, ""),
            KeyCode::Char(']') if detail.has_next_addendums() => {
                detail.query.addendum_page += 1;
                self.reload_kb_detail();
            }
            KeyCode::Char('[') if detail.query.addendum_page > 0 => {
                detail.query.addendum_page -= 1;
                self.reload_kb_detail();
            }
            KeyCode::Char('z') => {
                detail.query.cycle_size();
                self.reload_kb_detail();
            }
            KeyCode::Char('r') => self.reload_kb_detail(),
            _ => {}
        }
    }

    /// Save/append (`post_kb_article`) or overwrite the draft (`update_draft`).
    fn save_article(&mut self, mutation: Mutation) {
        let Some(detail) = self.kb_detail.as_ref() else {
            return;
        };
        if detail.content.trim().is_empty() {
            self.flash_error("Content is empty");
            return;
        }
        let id = detail.id;
        let body = detail.write_body();
        self.submit(Channel::Mutation(mutation), move |api| async move {
            let result = if mutation == Mutation::UpdateDraft {
                api.update_draft(id, &body).await.map(|()| Done::DraftUpdated)
            } else {
                api.post_kb_article(id, &body).await.map(|()| Done::ArticleSaved)
            };
            Reply::Done(result)
        });
    }

    pub(super) fn publish_article(&mut self, id: i64) {
        self.submit(Channel::Mutation(Mutation::Publish), move |api| async move {
            let result = api.update_kb_status(id, &KbStatus::Published).await;
            Reply::Done(result.map(|()| Done::Published))
        });
    }

    pub(super) fn add_addendum(&mut self, content: String) {
        let Some(detail) = self.kb_detail.as_ref() else {
            return;
        };
        if content.trim().is_empty() {
            self.flash_error("Addendum is empty");
            return;
        }
        let id = detail.id;
        let body = AddendumCreate {
            content,
            created_by: detail.author.clone(),
            ..Default::default()
        };
        self.submit(Channel::Mutation(Mutation::AddAddendum), move |api| async move {
            let result = api.create_addendum(id, &body).await;
            Reply::Done(result.map(|_| Done::AddendumAdded))
        });
    }
}
