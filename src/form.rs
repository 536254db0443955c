use crate::display::{validate_article_data, ArticleInput, ValidationReport};
use crate::models::{Article, ArticleStatus, CreateArticleRequest, UpdateArticleRequest};

/// Editable buffer behind the create and edit screens.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleForm {
    pub title: String,
    pub description: String,
    pub content: String,
    pub image: String,
    pub author: String,
    pub status: ArticleStatus,
    pub category: String,
    pub tags: Vec<String>,
    pub featured: bool,
    pub allow_comments: bool,
}

impl Default for ArticleForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            content: String::new(),
            image: String::new(),
            author: String::new(),
            status: ArticleStatus::Draft,
            category: String::new(),
            tags: Vec::new(),
            featured: false,
            allow_comments: true,
        }
    }
}

impl ArticleForm {
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            description: article.description.clone(),
            content: article.content.clone(),
            image: article.image.clone(),
            author: article.author.clone(),
            status: article.status.clone(),
            category: article.category.clone(),
            tags: article.tags.clone(),
            featured: article.featured,
            allow_comments: article.allow_comments.unwrap_or(true),
        }
    }

    /// Parses a comma separated tag list, dropping blanks and repeats.
    pub fn set_tags_from_str(&mut self, raw: &str) {
        self.tags.clear();
        for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.to_string());
            }
        }
    }

    pub fn validate(&self) -> ValidationReport {
        validate_article_data(&ArticleInput {
            title: &self.title,
            description: &self.description,
            content: &self.content,
            image: Some(&self.image),
        })
    }

    pub fn to_create_request(&self) -> CreateArticleRequest {
        CreateArticleRequest {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            content: self.content.clone(),
            image: non_blank(&self.image),
            author: non_blank(&self.author),
            status: self.status.clone(),
            category: self.category.trim().to_string(),
            tags: self.tags.clone(),
            featured: self.featured,
            slug: None,
            allow_comments: Some(self.allow_comments),
        }
    }

    pub fn to_update_request(&self, id: &str) -> UpdateArticleRequest {
        UpdateArticleRequest {
            id: id.to_string(),
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            content: Some(self.content.clone()),
            image: non_blank(&self.image),
            author: non_blank(&self.author),
            status: Some(self.status.clone()),
            category: Some(self.category.trim().to_string()),
            tags: Some(self.tags.clone()),
            featured: Some(self.featured),
            slug: None,
            allow_comments: Some(self.allow_comments),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
