//! Pure helpers shared by the create and edit forms and the list screen:
//! input validation and the display projection of an article.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::models::{Article, ArticleStatus};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const EXCERPT_CHARS: usize = 100;
pub const WORDS_PER_MINUTE: usize = 200;

const MONTHS_ID: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// Fields checked by [`validate_article_data`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ArticleInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub content: &'a str,
    pub image: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_article_data(input: &ArticleInput<'_>) -> ValidationReport {
    let mut errors = Vec::new();

    if input.title.trim().is_empty() {
        errors.push("Title is required".to_string());
    } else if input.title.chars().count() > TITLE_MAX_CHARS {
        errors.push(format!("Title must be at most {} characters", TITLE_MAX_CHARS));
    }

    if input.description.trim().is_empty() {
        errors.push("Description is required".to_string());
    } else if input.description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(format!(
            "Description must be at most {} characters",
            DESCRIPTION_MAX_CHARS
        ));
    }

    if input.content.trim().is_empty() {
        errors.push("Content is required".to_string());
    }

    if let Some(image) = input.image.map(str::trim).filter(|i| !i.is_empty()) {
        if url::Url::parse(image).is_err() {
            errors.push("Image must be a valid URL".to_string());
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayArticle {
    #[serde(flatten)]
    pub article: Article,
    pub formatted_date: String,
    pub short_description: String,
    pub read_time: usize,
    pub status_color: &'static str,
    pub status_label: String,
}

pub fn format_article_for_display(article: &Article) -> DisplayArticle {
    let (status_color, status_label) = status_badge(&article.status);
    DisplayArticle {
        formatted_date: format_date_id(&article.published_at),
        short_description: truncate(&article.description, EXCERPT_CHARS),
        read_time: read_time_minutes(&article.content),
        status_color,
        status_label: status_label.to_string(),
        article: article.clone(),
    }
}

/// Colour and label for a status. Unknown states show gray with the raw value.
pub fn status_badge(status: &ArticleStatus) -> (&'static str, &str) {
    match status {
        ArticleStatus::Published => ("green", "Dipublikasi"),
        ArticleStatus::Draft => ("amber", "Draft"),
        ArticleStatus::Pending => ("red", "Menunggu Review"),
        ArticleStatus::Other(raw) => ("gray", raw),
    }
}

pub fn status_badge_for(raw: &str) -> (&'static str, String) {
    let status = ArticleStatus::from(raw.to_string());
    let (color, label) = status_badge(&status);
    (color, label.to_string())
}

/// Long Indonesian date, e.g. `19 Oktober 2026`.
pub fn format_date_id(date: &DateTime<Utc>) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

pub fn read_time_minutes(content: &str) -> usize {
    content.split_whitespace().count().div_ceil(WORDS_PER_MINUTE)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
