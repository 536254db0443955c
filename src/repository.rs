use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::credentials::CredentialProvider;
use crate::fallback;
use crate::models::{
    ApiResponse, Article, BulkDeleteResult, CreateArticleRequest, DeleteResult,
    GetArticlesRequest, PaginatedArticles, UpdateArticleRequest,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Network error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Decode(String),
}

/// The remote article CMS.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn get_articles(
        &self,
        request: &GetArticlesRequest,
    ) -> Result<PaginatedArticles, RepositoryError>;

    /// Like [`get_articles`](Self::get_articles), but serves the built-in
    /// fallback set when the remote call fails.
    async fn get_articles_with_fallback(
        &self,
        request: &GetArticlesRequest,
    ) -> Result<PaginatedArticles, RepositoryError> {
        match self.get_articles(request).await {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!("Article list unavailable, serving fallback data: {}", e);
                Ok(fallback::fallback_page(request))
            }
        }
    }

    async fn get_article(&self, id: &str) -> Result<Article, RepositoryError>;

    async fn create_article(
        &self,
        request: &CreateArticleRequest,
    ) -> Result<Article, RepositoryError>;

    async fn update_article(
        &self,
        request: &UpdateArticleRequest,
    ) -> Result<Article, RepositoryError>;

    async fn delete_article(&self, id: &str) -> Result<DeleteResult, RepositoryError>;

    async fn toggle_featured(&self, id: &str) -> Result<Article, RepositoryError>;

    async fn duplicate_article(&self, id: &str) -> Result<Article, RepositoryError>;

    async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteResult, RepositoryError>;
}

/// Talks to the CMS admin API over HTTP.
pub struct HttpArticleRepository {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpArticleRepository {
    /// Builds the client with the configured timeout. `api_base` may end
    /// with a slash.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Http`] if the TLS backend cannot start.
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("masjid-admin/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(RepositoryError::Http)?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            timeout_secs: config.request_timeout.as_secs(),
            credentials,
        })
    }

    /// Request to `base_url + path`, with a bearer header when a token exists.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        // Token is read per request
        match self.credentials.current_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends and unwraps the `{ success, message, data }` envelope. Non-2xx
    /// becomes `Api`, `success: false` becomes `Rejected`, and a missing or
    /// malformed body becomes `Decode`.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RepositoryError> {
        let response = builder.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let text = response.text().await.map_err(|e| self.map_transport(e))?;
        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| RepositoryError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(RepositoryError::Rejected(non_empty_or(
                envelope.message,
                "Request was not successful",
            )));
        }

        envelope
            .data
            .ok_or_else(|| RepositoryError::Decode("response has no data".to_string()))
    }

    /// [`send`](Self::send) with a JSON body.
    async fn send_json<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, RepositoryError> {
        self.send(self.request(method, path).json(body)).await
    }

    /// Client timeouts map to `Timeout`; everything else stays `Http`.
    fn map_transport(&self, e: reqwest::Error) -> RepositoryError {
        if e.is_timeout() {
            RepositoryError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            RepositoryError::Http(e)
        }
    }
}

/// Uses the body's `message` field when there is one, else the raw text.
async fn error_from_response(response: Response) -> RepositoryError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|body| body.get("message")?.as_str().map(str::to_string))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error {}: {}", status.as_u16(), text));

    RepositoryError::Api {
        status: status.as_u16(),
        message,
    }
}

fn non_empty_or(message: String, default: &str) -> String {
    if message.trim().is_empty() {
        default.to_string()
    } else {
        message
    }
}

fn article_path(id: &str) -> String {
    format!("/articles/{}", urlencode(id))
}

fn urlencode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

#[async_trait]
impl ArticleRepository for HttpArticleRepository {
    async fn get_articles(
        &self,
        request: &GetArticlesRequest,
    ) -> Result<PaginatedArticles, RepositoryError> {
        let query = request.query_pairs();
        debug!("GET /articles {:?}", query);
        self.send(self.request(Method::GET, "/articles").query(&query))
            .await
    }

    async fn get_article(&self, id: &str) -> Result<Article, RepositoryError> {
        self.send(self.request(Method::GET, &article_path(id))).await
    }

    async fn create_article(
        &self,
        request: &CreateArticleRequest,
    ) -> Result<Article, RepositoryError> {
        self.send_json(Method::POST, "/articles", request).await
    }

    async fn update_article(
        &self,
        request: &UpdateArticleRequest,
    ) -> Result<Article, RepositoryError> {
        self.send_json(Method::PUT, &article_path(&request.id), request)
            .await
    }

    async fn delete_article(&self, id: &str) -> Result<DeleteResult, RepositoryError> {
        self.send(self.request(Method::DELETE, &article_path(id)))
            .await
    }

    async fn toggle_featured(&self, id: &str) -> Result<Article, RepositoryError> {
        let path = format!("{}/featured", article_path(id));
        self.send(self.request(Method::PATCH, &path)).await
    }

    async fn duplicate_article(&self, id: &str) -> Result<Article, RepositoryError> {
        let path = format!("{}/duplicate", article_path(id));
        self.send(self.request(Method::POST, &path)).await
    }

    async fn bulk_delete(&self, ids: &[String]) -> Result<BulkDeleteResult, RepositoryError> {
        let body = serde_json::json!({ "ids": ids });
        self.send_json(Method::POST, "/articles/bulk-delete", &body)
            .await
    }
}
