use serde::Serialize;

use crate::models::{Article, ArticleStatus};

/// Dashboard counters derived from a list of articles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleStats {
    pub total: usize,
    pub published: usize,
    pub draft: usize,
    pub pending: usize,
    /// Articles in a state the CMS added that has no dedicated counter.
    pub other: usize,
    pub featured: usize,
    pub total_views: u64,
}

impl ArticleStats {
    pub fn from_articles(articles: &[Article]) -> Self {
        articles.iter().fold(Self::default(), |mut stats, article| {
            stats.total += 1;
            match article.status {
                ArticleStatus::Published => stats.published += 1,
                ArticleStatus::Draft => stats.draft += 1,
                ArticleStatus::Pending => stats.pending += 1,
                ArticleStatus::Other(_) => stats.other += 1,
            }
            if article.featured {
                stats.featured += 1;
            }
            stats.total_views += article.views;
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::article;

    #[test]
    fn test_counts_by_status() {
        let mut draft = article("2", "Draft");
        draft.status = ArticleStatus::Draft;
        let mut featured = article("1", "Featured");
        featured.featured = true;
        featured.views = 10;
        let mut pending = article("3", "Pending");
        pending.status = ArticleStatus::Pending;
        pending.views = 5;

        let stats = ArticleStats::from_articles(&[featured, draft, pending]);

        assert_eq!(
            stats,
            ArticleStats {
                total: 3,
                published: 1,
                draft: 1,
                pending: 1,
                other: 0,
                featured: 1,
                total_views: 15,
            }
        );
        assert_eq!(ArticleStats::from_articles(&[]), ArticleStats::default());
    }

    #[test]
    fn test_unknown_status_is_counted_separately() {
        let mut archived = article("4", "Arsip");
        archived.status = ArticleStatus::Other("archived".to_string());

        let stats = ArticleStats::from_articles(&[article("1", "Terbit"), archived]);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.other, 1);
        assert_eq!(stats.draft + stats.pending, 0);
    }
}
