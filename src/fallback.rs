use chrono::{TimeZone, Utc};

use crate::config::DEFAULT_PAGE_LIMIT;
use crate::models::{Article, ArticleStatus, GetArticlesRequest, PaginatedArticles, Pagination};

/// Small fixed article set shown while the CMS is unreachable.
pub fn fallback_articles() -> Vec<Article> {
    let entry = |id: &str,
                 title: &str,
                 description: &str,
                 category: &str,
                 tags: &[&str],
                 status: ArticleStatus,
                 day: u32,
                 views: u64,
                 featured: bool| {
        let published_at = Utc
            .with_ymd_and_hms(2024, 1, day, 7, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            content: format!("{}\n\n{}", title, description),
            image: String::new(),
            author: "Admin Masjid".to_string(),
            published_at,
            status,
            category: category.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            views,
            featured,
            slug: Some(id.trim_start_matches("fallback-").to_string()),
            created_at: Some(published_at),
            updated_at: None,
            allow_comments: Some(true),
        }
    };

    vec![
        entry(
            "fallback-kajian-rutin",
            "Kajian Rutin Ba'da Maghrib",
            "Kajian kitab setiap malam Selasa dan Kamis bersama ustadz tamu.",
            "Kajian",
            &["kajian", "rutin"],
            ArticleStatus::Published,
            15,
            120,
            true,
        ),
        entry(
            "fallback-jadwal-jumat",
            "Jadwal Khatib Shalat Jumat",
            "Daftar khatib dan imam shalat Jumat untuk bulan ini.",
            "Pengumuman",
            &["jumat", "jadwal"],
            ArticleStatus::Published,
            10,
            85,
            false,
        ),
        entry(
            "fallback-kerja-bakti",
            "Kerja Bakti Membersihkan Masjid",
            "Ajakan kepada jamaah untuk bergotong royong membersihkan area masjid.",
            "Kegiatan",
            &["kegiatan", "jamaah"],
            ArticleStatus::Draft,
            5,
            12,
            false,
        ),
    ]
}

/// Applies the request's filters and paging to [`fallback_articles`].
pub fn fallback_page(request: &GetArticlesRequest) -> PaginatedArticles {
    let search = request.search.as_deref().unwrap_or("").trim().to_lowercase();
    let category = request.category.as_deref().unwrap_or("").trim();

    let matching: Vec<Article> = fallback_articles()
        .into_iter()
        .filter(|a| request.status.as_ref().map_or(true, |s| &a.status == s))
        .filter(|a| category.is_empty() || a.category.eq_ignore_ascii_case(category))
        .filter(|a| {
            search.is_empty()
                || a.title.to_lowercase().contains(&search)
                || a.description.to_lowercase().contains(&search)
        })
        .collect();

    let limit = request.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let page = request.page.unwrap_or(1).max(1);
    let total = matching.len() as u64;
    let total_pages = (matching.len() as u32).div_ceil(limit).max(1);
    let start = (page as usize - 1).saturating_mul(limit as usize);

    PaginatedArticles {
        data: matching.into_iter().skip(start).take(limit as usize).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        },
    }
}
