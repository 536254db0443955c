use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use crate::models::{
    Article, ArticleStatus, BulkDeleteResult, CreateArticleRequest, DeleteResult,
    GetArticlesRequest, PaginatedArticles, Pagination, UpdateArticleRequest,
};
use crate::repository::{ArticleRepository, RepositoryError};

pub fn article(id: &str, title: &str) -> Article {
    Article {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        content: format!("{} content", title),
        image: String::new(),
        author: "Takmir Masjid".to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        status: ArticleStatus::Published,
        category: "Kajian".to_string(),
        tags: Vec::new(),
        views: 0,
        featured: false,
        slug: None,
        created_at: None,
        updated_at: None,
        allow_comments: None,
    }
}

pub fn page_of(articles: Vec<Article>) -> PaginatedArticles {
    let total = articles.len() as u64;
    PaginatedArticles {
        data: articles,
        pagination: Pagination {
            page: 1,
            limit: 10,
            total,
            total_pages: 1,
            has_next_page: false,
            has_prev_page: false,
        },
    }
}

#[derive(Default)]
pub struct MockState {
    pub articles: Vec<Article>,
    /// Queued list responses, each served after its delay.
    pub scripted_lists: VecDeque<(Duration, Vec<Article>)>,
    pub fail: bool,
    /// When set, the fallback path fails too.
    pub no_fallback: bool,
    pub list_calls: usize,
    pub list_requests: Vec<GetArticlesRequest>,
    pub bulk_requests: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct MockRepository {
    pub state: Mutex<MockState>,
}

impl MockRepository {
    pub fn with_articles(articles: Vec<Article>) -> Self {
        let repo = Self::default();
        repo.state.lock().articles = articles;
        repo
    }

    pub fn failing() -> Self {
        let repo = Self::default();
        {
            let mut state = repo.state.lock();
            state.fail = true;
            state.no_fallback = true;
        }
        repo
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.state.lock().fail {
            Err(RepositoryError::Rejected("backend down".to_string()))
        } else {
            Ok(())
        }
    }

    fn find(&self, id: &str) -> Result<Article, RepositoryError> {
        self.check()?;
        self.state
            .lock()
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::Api {
                status: 404,
                message: "Article not found".to_string(),
            })
    }
}

#[async_trait]
impl ArticleRepository for MockRepository {
    async fn get_articles(
        &self,
        request: &GetArticlesRequest,
    ) -> Result<PaginatedArticles, RepositoryError> {
        let (delay, data) = {
            let mut state = self.state.lock();
            state.list_calls += 1;
            state.list_requests.push(request.clone());
            match state.scripted_lists.pop_front() {
                Some(scripted) => scripted,
                None => (Duration::ZERO, state.articles.clone()),
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        Ok(page_of(data))
    }

    async fn get_articles_with_fallback(
        &self,
        request: &GetArticlesRequest,
    ) -> Result<PaginatedArticles, RepositoryError> {
        match self.get_articles(request).await {
            Ok(page) => Ok(page),
            Err(e) if self.state.lock().no_fallback => Err(e),
            Err(_) => Ok(crate::fallback::fallback_page(request)),
        }
    }

    async fn get_article(&self, id: &str) -> Result<Article, RepositoryError> {
        self.find(id)
    }

    async fn create_article(
        &self,
        request: &CreateArticleRequest,
    ) -> Result<Article, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock();
        let mut created = article(&format!("srv-{}", state.articles.len() + 1), &request.title);
        created.description = request.description.clone();
        created.content = request.content.clone();
        created.status = request.status.clone();
        created.category = request.category.clone();
        created.tags = request.tags.clone();
        state.articles.insert(0, created.clone());
        Ok(created)
    }

    async fn update_article(
        &self,
        request: &UpdateArticleRequest,
    ) -> Result<Article, RepositoryError> {
        let mut updated = self.find(&request.id)?;
        if let Some(title) = &request.title {
            updated.title = title.clone();
        }
        if let Some(status) = &request.status {
            updated.status = status.clone();
        }
        let mut state = self.state.lock();
        if let Some(slot) = state.articles.iter_mut().find(|a| a.id == updated.id) {
            *slot = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_article(&self, id: &str) -> Result<DeleteResult, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock();
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        Ok(DeleteResult {
            deleted: state.articles.len() != before,
        })
    }

    async fn toggle_featured(&self, id: &str) -> Result<Article, RepositoryError> {
        let mut toggled = self.find(id)?;
        toggled.featured = !toggled.featured;
        let mut state = self.state.lock();
        if let Some(slot) = state.articles.iter_mut().find(|a| a.id == id) {
            *slot = toggled.clone();
        }
        Ok(toggled)
    }

    async fn duplicate_article(&self, id: &str) -> Result<Article, RepositoryError> {
        let mut copy = self.find(id)?;
        copy.id = format!("{}-copy", id);
        copy.title = format!("{} (Copy)", copy.title);
        self.state.lock().articles.insert(0, copy.clone());
        Ok(copy)
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteResult, RepositoryError> {
        self.check()?;
        let mut state = self.state.lock();
        state.bulk_requests.push(ids.to_vec());
        let before = state.articles.len();
        state.articles.retain(|a| !ids.contains(&a.id));
        Ok(BulkDeleteResult {
            deleted_count: (before - state.articles.len()) as u64,
        })
    }
}
