use masjid_articles::config::Config;
use masjid_articles::credentials::StaticToken;
use masjid_articles::models::{ArticleStatus, GetArticlesRequest, UpdateArticleRequest};
use masjid_articles::repository::{ArticleRepository, HttpArticleRepository, RepositoryError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_json(id: &str, title: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": "Informasi kegiatan masjid",
        "content": "Isi artikel",
        "image": "",
        "author": "Admin",
        "publishedAt": "2024-03-01T08:00:00Z",
        "status": "published",
        "category": "Kajian",
        "tags": ["kajian"],
        "views": 5,
        "featured": false
    })
}

fn envelope(data: Value) -> Value {
    json!({
        "success": true,
        "message": "OK",
        "data": data,
        "timestamp": "2024-03-01T08:00:00Z"
    })
}

fn list_body(articles: Vec<Value>) -> Value {
    let total = articles.len();
    envelope(json!({
        "data": articles,
        "pagination": {
            "page": 1,
            "limit": 10,
            "total": total,
            "totalPages": 1,
            "hasNextPage": false,
            "hasPrevPage": false
        }
    }))
}

fn repository(server: &MockServer, token: Option<&str>) -> HttpArticleRepository {
    let config = Config {
        api_base: server.uri(),
        request_timeout: Duration::from_millis(500),
        ..Config::default()
    };
    HttpArticleRepository::new(&config, Arc::new(StaticToken(token.map(str::to_string)))).unwrap()
}

#[tokio::test]
async fn test_list_sends_query_and_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .and(query_param("page", "2"))
        .and(query_param("status", "draft"))
        .and(query_param("sortBy", "views"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(vec![article_json(
            "a1",
            "Kajian Subuh",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = repository(&server, Some("s3cret"));
    let page = repo
        .get_articles(&GetArticlesRequest {
            page: Some(2),
            status: Some(ArticleStatus::Draft),
            sort_by: Some(masjid_articles::models::SortBy::Views),
            search: Some(String::new()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, "a1");
    assert_eq!(page.data[0].tags, vec!["kajian".to_string()]);
    assert_eq!(page.pagination.total, 1);

    // Blank search is not sent
    let received = server.received_requests().await.unwrap();
    assert!(!received[0].url.query().unwrap_or("").contains("search"));
}

#[tokio::test]
async fn test_missing_token_omits_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(vec![])))
        .mount(&server)
        .await;

    repository(&server, None)
        .get_articles(&GetArticlesRequest::default())
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_error_message_from_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Article not found" })),
        )
        .mount(&server)
        .await;

    let err = repository(&server, None).get_article("missing").await.unwrap_err();
    match err {
        RepositoryError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Article not found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_error_message_from_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/articles/a1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = repository(&server, None).delete_article("a1").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error 500: upstream exploded");
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/articles/a1/featured"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Featured limit reached",
            "data": null,
            "timestamp": "2024-03-01T08:00:00Z"
        })))
        .mount(&server)
        .await;

    let err = repository(&server, None).toggle_featured("a1").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Rejected(ref m) if m == "Featured limit reached"));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(list_body(vec![]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = repository(&server, None)
        .get_articles(&GetArticlesRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Timeout { .. }));
}

#[tokio::test]
async fn test_list_failure_falls_back_to_builtin_articles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let page = repository(&server, None)
        .get_articles_with_fallback(&GetArticlesRequest::default())
        .await
        .unwrap();
    assert!(!page.data.is_empty());
    assert!(page.data.iter().all(|a| a.id.starts_with("fallback-")));
}

#[tokio::test]
async fn test_mutation_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/articles/a1"))
        .and(body_json(json!({ "title": "Baru" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(article_json("a1", "Baru"))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/articles/a1/duplicate"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(envelope(article_json("a2", "Baru (Copy)"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/articles/bulk-delete"))
        .and(body_json(json!({ "ids": ["a1", "a2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "deletedCount": 2 }))))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/articles/a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "deleted": true }))))
        .mount(&server)
        .await;

    let repo = repository(&server, Some("t"));

    let updated = repo
        .update_article(&UpdateArticleRequest {
            id: "a1".to_string(),
            title: Some("Baru".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.title, "Baru");

    let copy = repo.duplicate_article("a1").await.unwrap();
    assert_eq!(copy.id, "a2");

    assert!(repo.delete_article("a2").await.unwrap().deleted);

    let result = repo
        .bulk_delete(&["a1".to_string(), "a2".to_string()])
        .await
        .unwrap();
    assert_eq!(result.deleted_count, 2);
}

#[tokio::test]
async fn test_unrecognised_status_keeps_real_list() {
    let server = MockServer::start().await;
    let mut archived = article_json("real2", "Kajian Lama");
    archived["status"] = json!("archived");
    Mock::given(method("GET"))
        .and(path("/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(list_body(vec![
            article_json("real1", "Kajian Subuh"),
            archived,
        ])))
        .mount(&server)
        .await;

    let page = repository(&server, None)
        .get_articles_with_fallback(&GetArticlesRequest::default())
        .await
        .unwrap();

    let ids: Vec<&str> = page.data.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["real1", "real2"]);
    assert_eq!(page.data[0].status, ArticleStatus::Published);
    assert_eq!(page.data[1].status, ArticleStatus::Other("archived".to_string()));
}
