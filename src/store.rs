use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::warn;

use crate::config::FRESHNESS_WINDOW;
use crate::models::{Article, ArticleFilters, FilterUpdate, PaginatedArticles, Pagination, SortBy, SortOrder};

pub type SharedStore = Arc<RwLock<ArticleStore>>;

/// Which admin screen is showing. `Edit` always names an article.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArticleView {
    #[default]
    List,
    Create,
    Edit { article_id: String },
}

/// Published after every store action so readers can watch a slice.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    ArticlesReplaced { count: usize },
    ArticleAdded(String),
    ArticleUpdated(String),
    ArticleRemoved(String),
    SelectionChanged(Option<String>),
    Loading(bool),
    Creating(bool),
    Updating(bool),
    Deleting(bool),
    Error(Option<String>),
    FiltersChanged,
    ViewChanged(ArticleView),
    MarkedFresh,
    Reset,
}

/// In-memory cache of the admin article list and everything the
/// article screens derive from it. Actions never fail.
pub struct ArticleStore {
    articles: Vec<Article>,
    pagination: Option<Pagination>,
    selected: Option<Article>,
    filters: ArticleFilters,
    view: ArticleView,
    loading: bool,
    creating: bool,
    updating: bool,
    deleting: bool,
    error: Option<String>,
    last_fetched: Option<DateTime<Utc>>,
    freshness_window: Duration,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ArticleStore {
    fn default() -> Self {
        Self::new(FRESHNESS_WINDOW)
    }
}

impl ArticleStore {
    pub fn new(freshness_window: Duration) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            articles: Vec::new(),
            pagination: None,
            selected: None,
            filters: ArticleFilters::default(),
            view: ArticleView::List,
            loading: false,
            creating: false,
            updating: false,
            deleting: false,
            error: None,
            last_fetched: None,
            freshness_window,
            events,
        }
    }

    pub fn shared(freshness_window: Duration) -> SharedStore {
        Arc::new(RwLock::new(Self::new(freshness_window)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.selected.as_ref()
    }

    pub fn filters(&self) -> &ArticleFilters {
        &self.filters
    }

    pub fn current_view(&self) -> &ArticleView {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched
    }

    /// Replaces the list and pagination wholesale, stamps freshness and
    /// clears the error slot.
    pub fn set_articles(&mut self, page: PaginatedArticles) {
        self.set_articles_at(page, Utc::now());
    }

    pub fn set_articles_at(&mut self, page: PaginatedArticles, fetched_at: DateTime<Utc>) {
        let count = page.data.len();
        self.articles = page.data;
        self.pagination = Some(page.pagination);
        self.last_fetched = Some(fetched_at);
        self.error = None;
        self.emit(StoreEvent::ArticlesReplaced { count });
    }

    pub fn add_article(&mut self, article: Article) {
        let id = article.id.clone();
        self.articles.insert(0, article);
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.total += 1;
        }
        self.emit(StoreEvent::ArticleAdded(id));
    }

    /// Replaces the entry with the same id. Unknown ids are ignored.
    pub fn update_article(&mut self, article: Article) {
        let Some(slot) = self.articles.iter_mut().find(|a| a.id == article.id) else {
            return;
        };
        *slot = article.clone();
        if self.selected.as_ref().is_some_and(|s| s.id == article.id) {
            self.selected = Some(article.clone());
        }
        self.emit(StoreEvent::ArticleUpdated(article.id));
    }

    pub fn remove_article(&mut self, id: &str) {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != id);
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.total = pagination.total.saturating_sub(1);
        }
        if self.selected.as_ref().is_some_and(|s| s.id == id) {
            self.selected = None;
            self.emit(StoreEvent::SelectionChanged(None));
        }
        if matches!(&self.view, ArticleView::Edit { article_id } if article_id == id) {
            self.view = ArticleView::List;
            self.emit(StoreEvent::ViewChanged(ArticleView::List));
        }
        if self.articles.len() != before {
            self.emit(StoreEvent::ArticleRemoved(id.to_string()));
        }
    }

    pub fn set_selected_article(&mut self, article: Option<Article>) {
        let id = article.as_ref().map(|a| a.id.clone());
        self.selected = article;
        self.emit(StoreEvent::SelectionChanged(id));
    }

    /// List fetch in flight. The four flags are independent of each other.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.emit(StoreEvent::Loading(loading));
    }

    /// Create request in flight.
    pub fn set_creating(&mut self, creating: bool) {
        self.creating = creating;
        self.emit(StoreEvent::Creating(creating));
    }

    /// Update or featured toggle in flight.
    pub fn set_updating(&mut self, updating: bool) {
        self.updating = updating;
        self.emit(StoreEvent::Updating(updating));
    }

    /// Single or bulk delete in flight.
    pub fn set_deleting(&mut self, deleting: bool) {
        self.deleting = deleting;
        self.emit(StoreEvent::Deleting(deleting));
    }

    /// Single slot: a new error overwrites the previous one.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error.clone();
        self.emit(StoreEvent::Error(error));
    }

    pub fn clear_error(&mut self) {
        self.set_error(None);
    }

    /// Merges a partial update into the current filters. Does not refetch;
    /// the manager decides when the list is reloaded.
    pub fn set_filters(&mut self, update: FilterUpdate) {
        self.filters.merge(update);
        self.emit(StoreEvent::FiltersChanged);
    }

    /// Back to an empty search, all statuses, newest first.
    pub fn reset_filters(&mut self) {
        self.filters = ArticleFilters::default();
        self.emit(StoreEvent::FiltersChanged);
    }

    /// Moves to another screen. Allowed: list to create, list to edit of a
    /// listed article, and create or edit back to list. Returns `false` and
    /// leaves the state alone otherwise.
    pub fn set_current_view(&mut self, view: ArticleView) -> bool {
        if view == self.view {
            return true;
        }

        match (&self.view, &view) {
            (ArticleView::List, ArticleView::Create) => {
                self.selected = None;
            }
            (ArticleView::List, ArticleView::Edit { article_id }) => {
                let Some(article) = self.articles.iter().find(|a| &a.id == article_id) else {
                    warn!("Cannot edit article {}: not in the current list", article_id);
                    return false;
                };
                self.selected = Some(article.clone());
            }
            (ArticleView::Create | ArticleView::Edit { .. }, ArticleView::List) => {
                self.selected = None;
            }
            (from, to) => {
                warn!("Rejected view transition {:?} -> {:?}", from, to);
                return false;
            }
        }

        self.view = view.clone();
        self.emit(StoreEvent::SelectionChanged(
            self.selected.as_ref().map(|a| a.id.clone()),
        ));
        self.emit(StoreEvent::ViewChanged(view));
        true
    }

    pub fn mark_data_as_fresh(&mut self) {
        self.mark_data_as_fresh_at(Utc::now());
    }

    pub fn mark_data_as_fresh_at(&mut self, at: DateTime<Utc>) {
        self.last_fetched = Some(at);
        self.emit(StoreEvent::MarkedFresh);
    }

    pub fn is_data_fresh(&self) -> bool {
        self.is_data_fresh_at(Utc::now())
    }

    pub fn is_data_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let Some(last_fetched) = self.last_fetched else {
            return false;
        };
        match (now - last_fetched).to_std() {
            Ok(age) => age < self.freshness_window,
            // Stamp in the future: clock went backwards, treat as just fetched
            Err(_) => true,
        }
    }

    pub fn reset(&mut self) {
        let events = self.events.clone();
        *self = Self::new(self.freshness_window);
        self.events = events;
        self.emit(StoreEvent::Reset);
    }

    /// The cached page narrowed and ordered by the current filters.
    pub fn visible_articles(&self) -> Vec<&Article> {
        let search = self.filters.search.trim().to_lowercase();
        let category = self.filters.category.trim();

        let mut visible: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| self.filters.status.matches(&a.status))
            .filter(|a| category.is_empty() || a.category.eq_ignore_ascii_case(category))
            .filter(|a| {
                search.is_empty()
                    || a.title.to_lowercase().contains(&search)
                    || a.description.to_lowercase().contains(&search)
                    || a.content.to_lowercase().contains(&search)
            })
            .collect();

        visible.sort_by(|a, b| {
            let ordering = match self.filters.sort_by {
                SortBy::CreatedAt => a
                    .created_at
                    .unwrap_or(a.published_at)
                    .cmp(&b.created_at.unwrap_or(b.published_at)),
                SortBy::PublishedAt => a.published_at.cmp(&b.published_at),
                SortBy::Views => a.views.cmp(&b.views),
                SortBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            };
            match self.filters.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        visible
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
