use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::METADATA_BATCH_LIMIT;
use crate::display::{validate_article_data, ArticleInput};
use crate::models::{
    Article, CreateArticleRequest, GetArticlesRequest, PaginatedArticles, UpdateArticleRequest,
};
use crate::repository::ArticleRepository;
use crate::stats::ArticleStats;

pub const DEFAULT_CATEGORIES: [&str; 5] = ["Kajian", "Pengumuman", "Kegiatan", "Berita", "Program"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UseCaseError {
    /// Input rejected before any network call.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// A call that needs an id was made without one.
    #[error("{0} is required")]
    NotFoundLocal(String),

    #[error("{0}")]
    Remote(String),
}

/// Validation and error normalisation between the store and the CMS.
///
/// Each operation has its own failure contract: some return `Err`, some
/// collapse remote failures to `None`, `false` or `0`. Callers rely on the
/// difference.
#[derive(Clone)]
pub struct ArticleUseCases {
    repository: Arc<dyn ArticleRepository>,
}

impl ArticleUseCases {
    pub fn new(repository: Arc<dyn ArticleRepository>) -> Self {
        Self { repository }
    }

    /// `None` means no data could be produced at all, which is not the
    /// same as an empty page.
    pub async fn get_articles(&self, request: Option<GetArticlesRequest>) -> Option<PaginatedArticles> {
        let request = request.unwrap_or_default();
        match self.repository.get_articles_with_fallback(&request).await {
            Ok(page) => Some(page),
            Err(e) => {
                error!("Failed to get articles: {}", e);
                None
            }
        }
    }

    pub async fn get_article(&self, id: &str) -> Result<Option<Article>, UseCaseError> {
        require_id(id)?;
        match self.repository.get_article(id).await {
            Ok(article) => Ok(Some(article)),
            Err(e) => {
                error!("Failed to get article {}: {}", id, e);
                Ok(None)
            }
        }
    }

    pub async fn create_article(&self, request: CreateArticleRequest) -> Result<Article, UseCaseError> {
        let report = validate_article_data(&ArticleInput {
            title: &request.title,
            description: &request.description,
            content: &request.content,
            image: request.image.as_deref(),
        });
        if !report.is_valid {
            return Err(UseCaseError::Validation(report.errors));
        }

        self.repository.create_article(&request).await.map_err(|e| {
            error!("Failed to create article: {}", e);
            UseCaseError::Remote(e.to_string())
        })
    }

    pub async fn update_article(&self, request: UpdateArticleRequest) -> Result<Article, UseCaseError> {
        require_id(&request.id)?;

        // Partial update: only the fields being changed are checked
        let errors: Vec<String> = validate_article_data(&ArticleInput {
            title: request.title.as_deref().unwrap_or("-"),
            description: request.description.as_deref().unwrap_or("-"),
            content: request.content.as_deref().unwrap_or("-"),
            image: request.image.as_deref(),
        })
        .errors;
        if !errors.is_empty() {
            return Err(UseCaseError::Validation(errors));
        }

        self.repository.update_article(&request).await.map_err(|e| {
            error!("Failed to update article {}: {}", request.id, e);
            UseCaseError::Remote(e.to_string())
        })
    }

    pub async fn delete_article(&self, id: &str) -> Result<bool, UseCaseError> {
        require_id(id)?;
        match self.repository.delete_article(id).await {
            Ok(result) => Ok(result.deleted),
            Err(e) => {
                error!("Failed to delete article {}: {}", id, e);
                Ok(false)
            }
        }
    }

    pub async fn toggle_featured(&self, id: &str) -> Option<Article> {
        if id.trim().is_empty() {
            warn!("toggle_featured called without an article id");
            return None;
        }
        match self.repository.toggle_featured(id).await {
            Ok(article) => Some(article),
            Err(e) => {
                error!("Failed to toggle featured for {}: {}", id, e);
                None
            }
        }
    }

    pub async fn duplicate_article(&self, id: &str) -> Option<Article> {
        if id.trim().is_empty() {
            warn!("duplicate_article called without an article id");
            return None;
        }
        match self.repository.duplicate_article(id).await {
            Ok(article) => Some(article),
            Err(e) => {
                error!("Failed to duplicate article {}: {}", id, e);
                None
            }
        }
    }

    /// Deletes the non-blank ids in one request. Blank entries are dropped
    /// before sending; the count reported is against the ids actually sent.
    pub async fn bulk_delete_articles(&self, ids: &[String]) -> Result<u64, UseCaseError> {
        let ids = non_blank_ids(ids);
        if ids.is_empty() {
            return Err(UseCaseError::Validation(vec![
                "At least one article id is required".to_string(),
            ]));
        }
        match self.repository.bulk_delete(&ids).await {
            Ok(result) => Ok(result.deleted_count),
            Err(e) => {
                error!("Failed to bulk delete {} articles: {}", ids.len(), e);
                Ok(0)
            }
        }
    }

    /// Distinct categories in first-seen order, or the default set when
    /// nothing could be fetched.
    pub async fn get_categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for article in self.metadata_batch().await {
            let category = article.category.trim();
            if !category.is_empty() && !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }

        if categories.is_empty() {
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
        } else {
            categories
        }
    }

    /// The `limit` most used tags, most frequent first. Equal counts keep
    /// the order in which the tags were first seen.
    pub async fn get_popular_tags(&self, limit: usize) -> Vec<String> {
        popular_tags(&self.metadata_batch().await, limit)
    }

    pub async fn get_stats(&self) -> ArticleStats {
        ArticleStats::from_articles(&self.metadata_batch().await)
    }

    async fn metadata_batch(&self) -> Vec<Article> {
        let request = GetArticlesRequest {
            page: Some(1),
            limit: Some(METADATA_BATCH_LIMIT),
            ..Default::default()
        };
        match self.repository.get_articles(&request).await {
            Ok(page) => page.data,
            Err(e) => {
                warn!("Failed to fetch articles for metadata: {}", e);
                Vec::new()
            }
        }
    }
}

/// The ids a bulk delete will send, in order.
pub fn non_blank_ids(ids: &[String]) -> Vec<String> {
    ids.iter().filter(|id| !id.trim().is_empty()).cloned().collect()
}

fn require_id(id: &str) -> Result<(), UseCaseError> {
    if id.trim().is_empty() {
        Err(UseCaseError::NotFoundLocal("Article ID".to_string()))
    } else {
        Ok(())
    }
}

pub fn popular_tags(articles: &[Article], limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut next_index = 0;
    for tag in articles.iter().flat_map(|a| a.tags.iter()) {
        let entry = counts.entry(tag.as_str()).or_insert_with(|| {
            next_index += 1;
            (0, next_index)
        });
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked
        .into_iter()
        .take(limit)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

#[cfg(test)]
#[path = "use_cases_tests.rs"]
mod tests;
