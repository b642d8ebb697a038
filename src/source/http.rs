//! Mastodon-flavoured HTTP implementation of [`ItemSource`].
//!
//! Listing endpoints paginate via the RFC 5988 `Link` header; the stream
//! follows `rel="next"` until the server stops advertising one. Rate-limit
//! waits and transient retries happen here so the executor never sees them.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::{
    Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, LINK},
};
use serde_json::Value;

use crate::{
    credentials::Credentials,
    models::{Account, Item, ItemKind, LikedItem, Post},
    source::{
        ItemSource, ItemStream, SourceError,
        retry::{RetryConfig, with_retry},
    },
};

/// Tuning knobs for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Items requested per page. The server may return fewer.
    pub page_size: u32,
    /// Retry behaviour for transient failures.
    pub retry: RetryConfig,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            page_size: 40,
            retry: RetryConfig::default(),
        }
    }
}

/// Bearer-token client against a Mastodon-compatible server.
pub struct HttpItemSource {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
    retry: RetryConfig,
    page_size: u32,
}

impl HttpItemSource {
    pub fn new(credentials: Credentials, config: HttpSourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: credentials.server.as_str().trim_end_matches('/').to_string(),
            access_token: credentials.access_token,
            timeout: Duration::from_secs(config.timeout_secs),
            retry: config.retry,
            page_size: config.page_size,
        }
    }

    /// Attach auth header and timeout to a request.
    fn build_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .timeout(self.timeout)
    }

    /// GET with retry, then map non-2xx statuses to source errors.
    async fn get(&self, url: &str, operation: &str) -> Result<Response, SourceError> {
        let response = with_retry(&self.retry, operation, || async {
            self.build_request(self.client.get(url)).send().await
        })
        .await?;

        check_response(response).await
    }

    fn first_page_url(&self, kind: ItemKind, account: &Account) -> String {
        match kind {
            ItemKind::Post => format!(
                "{}/api/v1/accounts/{}/statuses?limit={}",
                self.base_url, account.id, self.page_size
            ),
            ItemKind::Liked => {
                format!("{}/api/v1/favourites?limit={}", self.base_url, self.page_size)
            }
        }
    }

    /// Fetch one page of the listing plus the link to the next one.
    async fn fetch_page(
        &self,
        kind: ItemKind,
        url: String,
    ) -> Result<(Vec<Item>, Option<String>), SourceError> {
        tracing::debug!(kind = %kind, url = %url, "Fetching page");

        let response = self.get(&url, "list").await?;
        let next = next_page_url(response.headers());

        let items: Vec<Item> = match kind {
            ItemKind::Post => response
                .json::<Vec<Post>>()
                .await?
                .into_iter()
                .map(Item::Post)
                .collect(),
            ItemKind::Liked => response
                .json::<Vec<LikedItem>>()
                .await?
                .into_iter()
                .map(Item::Liked)
                .collect(),
        };

        Ok((items, next))
    }
}

#[async_trait]
impl ItemSource for HttpItemSource {
    async fn current_account(&self) -> Result<Account, SourceError> {
        let url = format!("{}/api/v1/accounts/verify_credentials", self.base_url);
        let response = self.get(&url, "verify_credentials").await?;
        Ok(response.json().await?)
    }

    fn items<'a>(&'a self, kind: ItemKind, account: &'a Account) -> ItemStream<'a> {
        let first = self.first_page_url(kind, account);

        stream::try_unfold(Some(first), move |state| async move {
            let Some(url) = state else {
                return Ok::<_, SourceError>(None);
            };

            let (items, next) = self.fetch_page(kind, url).await?;
            // An empty page terminates the stream even if the server still
            // advertises a next link.
            let next = if items.is_empty() { None } else { next };

            Ok(Some((
                stream::iter(items.into_iter().map(Ok::<_, SourceError>)),
                next,
            )))
        })
        .try_flatten()
        .boxed()
    }

    async fn delete(&self, kind: ItemKind, id: &str) -> Result<(), SourceError> {
        let response = match kind {
            ItemKind::Post => {
                let url = format!("{}/api/v1/statuses/{id}", self.base_url);
                with_retry(&self.retry, "delete_post", || async {
                    self.build_request(self.client.delete(url.as_str())).send().await
                })
                .await?
            }
            ItemKind::Liked => {
                let url = format!("{}/api/v1/statuses/{id}/unfavourite", self.base_url);
                with_retry(&self.retry, "unfavourite", || async {
                    self.build_request(self.client.post(url.as_str())).send().await
                })
                .await?
            }
        };

        check_response(response).await?;
        Ok(())
    }
}

/// Check status and extract the server's error message on failure.
///
/// Mastodon returns errors as `{"error": "..."}`. Without this check,
/// `response.json::<T>()` fails with an unhelpful "error decoding response
/// body" when the status is non-2xx.
async fn check_response(response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(empty body)"));

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(String::from))
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(SourceError::Authentication(message))
        }
        StatusCode::NOT_FOUND => Err(SourceError::NotFound),
        _ => Err(SourceError::Api {
            status: status.as_u16(),
            message,
        }),
    }
}

/// Extract the `rel="next"` target from an RFC 5988 `Link` header.
fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;

        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });

        is_next.then(|| target.to_string())
    })
}
