use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::form::ArticleForm;
use crate::models::{Article, FilterUpdate, GetArticlesRequest};
use crate::repository::ArticleRepository;
use crate::stats::ArticleStats;
use crate::store::{ArticleStore, ArticleView, SharedStore};
use crate::use_cases::{non_blank_ids, ArticleUseCases, DEFAULT_CATEGORIES};

pub const LOAD_FAILED: &str = "Failed to load articles";

/// Categories and tags shown next to the article list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub categories: Vec<String>,
    pub popular_tags: Vec<String>,
}

impl Default for ArticleMetadata {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            popular_tags: Vec::new(),
        }
    }
}

/// Binds the article store to the use cases for a UI: decides when the
/// list needs fetching, tracks the per-operation flags and writes failures
/// into the store's error slot.
#[derive(Clone)]
pub struct ArticleManager {
    store: SharedStore,
    use_cases: ArticleUseCases,
    metadata: Arc<RwLock<ArticleMetadata>>,
    generation: Arc<AtomicU64>,
    page_limit: u32,
    popular_tags_limit: usize,
}

/// Returned by [`ArticleManager::mount`]. Dropping it, or calling
/// [`unmount`](Self::unmount), stops the mount load from committing.
pub struct MountHandle {
    cancelled: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl MountHandle {
    pub fn unmount(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Waits for the list and metadata loads started at mount.
    pub async fn wait(mut self) {
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!("Mount task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl ArticleManager {
    pub fn new(config: &Config, repository: Arc<dyn ArticleRepository>) -> Self {
        Self::with_store(
            config,
            ArticleStore::shared(config.freshness_window),
            ArticleUseCases::new(repository),
        )
    }

    pub fn with_store(config: &Config, store: SharedStore, use_cases: ArticleUseCases) -> Self {
        Self {
            store,
            use_cases,
            metadata: Arc::new(RwLock::new(ArticleMetadata::default())),
            generation: Arc::new(AtomicU64::new(0)),
            page_limit: config.page_limit,
            popular_tags_limit: config.popular_tags_limit,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn use_cases(&self) -> &ArticleUseCases {
        &self.use_cases
    }

    pub fn read<T>(&self, f: impl FnOnce(&ArticleStore) -> T) -> T {
        f(&self.store.read())
    }

    pub fn metadata(&self) -> ArticleMetadata {
        self.metadata.read().clone()
    }

    pub fn stats(&self) -> ArticleStats {
        ArticleStats::from_articles(self.store.read().articles())
    }

    /// Starts the initial list load and the metadata load.
    pub fn mount(&self, force_refresh: bool) -> MountHandle {
        let cancelled = Arc::new(AtomicBool::new(false));

        let list_task = {
            let manager = self.clone();
            let cancelled = cancelled.clone();
            tokio::spawn(async move {
                manager.load(force_refresh, None, Some(cancelled.as_ref())).await;
            })
        };
        let metadata_task = {
            let manager = self.clone();
            tokio::spawn(async move {
                manager.load_metadata().await;
            })
        };

        MountHandle {
            cancelled,
            tasks: vec![list_task, metadata_task],
        }
    }

    /// Fetches the current page unless the cached list is fresh and
    /// non-empty. Call again to retry after a failure.
    pub async fn load_articles(&self, force_refresh: bool) {
        self.load(force_refresh, None, None).await;
    }

    pub async fn load_page(&self, page: u32) {
        self.load(true, Some(page.max(1)), None).await;
    }

    pub async fn apply_filters(&self, update: FilterUpdate) {
        self.store.write().set_filters(update);
        self.load(true, Some(1), None).await;
    }

    pub async fn reset_filters(&self) {
        self.store.write().reset_filters();
        self.load(true, Some(1), None).await;
    }

    async fn load(&self, force_refresh: bool, page: Option<u32>, cancelled: Option<&AtomicBool>) {
        let request = {
            let store = self.store.read();
            let needs_fetch =
                force_refresh || !store.is_data_fresh() || store.articles().is_empty();
            if !needs_fetch {
                debug!("Article list is fresh, skipping fetch");
                return;
            }
            self.build_request(&store, page)
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut store = self.store.write();
            store.clear_error();
            store.set_loading(true);
        }

        let result = self.use_cases.get_articles(Some(request)).await;

        if cancelled.is_some_and(|c| c.load(Ordering::SeqCst)) {
            debug!("Unmounted before the article list arrived, dropping it");
            // Data is dropped but the flag this fetch raised must come down
            if self.generation.load(Ordering::SeqCst) == generation {
                self.store.write().set_loading(false);
            }
            return;
        }
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded article list response #{}", generation);
            return;
        }

        let mut store = self.store.write();
        match result {
            Some(page) => {
                debug!("Loaded {} articles", page.data.len());
                store.set_articles(page);
            }
            None => {
                error!("{}", LOAD_FAILED);
                store.set_error(Some(LOAD_FAILED.to_string()));
            }
        }
        store.set_loading(false);
    }

    fn build_request(&self, store: &ArticleStore, page: Option<u32>) -> GetArticlesRequest {
        let filters = store.filters();
        let page = page
            .or_else(|| store.pagination().map(|p| p.page))
            .unwrap_or(1);

        GetArticlesRequest {
            page: Some(page),
            limit: Some(self.page_limit),
            search: Some(filters.search.trim().to_string()).filter(|s| !s.is_empty()),
            status: filters.status.as_request(),
            category: Some(filters.category.trim().to_string()).filter(|c| !c.is_empty()),
            author: None,
            sort_by: Some(filters.sort_by),
            sort_order: Some(filters.sort_order),
        }
    }

    /// Refreshes categories and popular tags. Never reports an error;
    /// the defaults stay in place when nothing can be fetched.
    pub async fn load_metadata(&self) {
        let (categories, popular_tags) = tokio::join!(
            self.use_cases.get_categories(),
            self.use_cases.get_popular_tags(self.popular_tags_limit)
        );
        let mut metadata = self.metadata.write();
        metadata.categories = categories;
        metadata.popular_tags = popular_tags;
    }

    pub fn open_create(&self) -> bool {
        self.store.write().set_current_view(ArticleView::Create)
    }

    pub fn open_edit(&self, article_id: &str) -> bool {
        self.store.write().set_current_view(ArticleView::Edit {
            article_id: article_id.to_string(),
        })
    }

    pub fn back_to_list(&self) -> bool {
        self.store.write().set_current_view(ArticleView::List)
    }

    /// Creates or updates depending on the current view, then returns to
    /// the list on success.
    pub async fn handle_save(&self, form: &ArticleForm) -> bool {
        let view = self.read(|store| store.current_view().clone());
        match view {
            ArticleView::Create => {
                self.store.write().set_creating(true);
                let result = self.use_cases.create_article(form.to_create_request()).await;

                let mut store = self.store.write();
                store.set_creating(false);
                match result {
                    Ok(article) => {
                        info!("Created article {}", article.id);
                        store.add_article(article);
                        store.set_current_view(ArticleView::List);
                        true
                    }
                    Err(e) => {
                        store.set_error(Some(e.to_string()));
                        false
                    }
                }
            }
            ArticleView::Edit { article_id } => {
                self.store.write().set_updating(true);
                let result = self
                    .use_cases
                    .update_article(form.to_update_request(&article_id))
                    .await;

                let mut store = self.store.write();
                store.set_updating(false);
                match result {
                    Ok(article) => {
                        info!("Updated article {}", article.id);
                        store.update_article(article);
                        store.set_current_view(ArticleView::List);
                        true
                    }
                    Err(e) => {
                        store.set_error(Some(e.to_string()));
                        false
                    }
                }
            }
            ArticleView::List => {
                warn!("Save requested while on the list view");
                false
            }
        }
    }

    pub async fn handle_delete(&self, id: &str) -> bool {
        self.store.write().set_deleting(true);
        let result = self.use_cases.delete_article(id).await;

        let mut store = self.store.write();
        store.set_deleting(false);
        match result {
            Ok(true) => {
                info!("Deleted article {}", id);
                store.remove_article(id);
                true
            }
            Ok(false) => {
                store.set_error(Some("Failed to delete article".to_string()));
                false
            }
            Err(e) => {
                store.set_error(Some(e.to_string()));
                false
            }
        }
    }

    pub async fn handle_toggle_featured(&self, id: &str) -> bool {
        match self.use_cases.toggle_featured(id).await {
            Some(article) => {
                self.store.write().update_article(article);
                true
            }
            None => {
                self.store
                    .write()
                    .set_error(Some("Failed to update featured status".to_string()));
                false
            }
        }
    }

    pub async fn handle_duplicate(&self, id: &str) -> Option<Article> {
        self.store.write().set_creating(true);
        let duplicated = self.use_cases.duplicate_article(id).await;

        let mut store = self.store.write();
        store.set_creating(false);
        match &duplicated {
            Some(article) => store.add_article(article.clone()),
            None => store.set_error(Some("Failed to duplicate article".to_string())),
        }
        duplicated
    }

    /// Returns how many articles the server removed.
    pub async fn handle_bulk_delete(&self, ids: &[String]) -> u64 {
        let ids = non_blank_ids(ids);
        self.store.write().set_deleting(true);
        let result = self.use_cases.bulk_delete_articles(&ids).await;
        self.store.write().set_deleting(false);

        let deleted = match result {
            Ok(count) => count,
            Err(e) => {
                self.store.write().set_error(Some(e.to_string()));
                return 0;
            }
        };

        if deleted == ids.len() as u64 {
            let mut store = self.store.write();
            for id in &ids {
                store.remove_article(id);
            }
        } else if deleted > 0 {
            // Partial success: we cannot tell which ones went
            self.load_articles(true).await;
        } else {
            self.store
                .write()
                .set_error(Some("Failed to delete articles".to_string()));
        }
        deleted
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
