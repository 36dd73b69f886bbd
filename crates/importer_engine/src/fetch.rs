use std::future::Future;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use importer_core::{Block, RemoteEntry};
use importer_logging::{importer_debug, importer_warn};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ImportConfig;
use crate::parse::{parse_block_kind, parse_entry, RawBlock, RawPage, ResultPage};
use crate::{FailureKind, FetchError};

/// Largest page size the API accepts.
pub const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Cursor-paginated access to a Notion workspace.
#[async_trait::async_trait]
pub trait NotionSource: Send + Sync {
    async fn query_database(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<ResultPage<RawPage>, FetchError>;

    async fn block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<ResultPage<RawBlock>, FetchError>;
}

#[derive(Clone)]
pub struct NotionHttpClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
    notion_version: String,
    settings: FetchSettings,
}

impl NotionHttpClient {
    pub fn new(config: &ImportConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.fetch.connect_timeout)
            .timeout(config.fetch.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            notion_version: config.notion_version.clone(),
            settings: config.fetch.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Url::parse(&format!("{}/{}", self.api_base, path))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FetchError> {
        let response = request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.notion_version)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let kind = match status.as_u16() {
                401 | 403 => FailureKind::Unauthorized,
                429 => FailureKind::RateLimited,
                code => FailureKind::HttpStatus(code),
            };
            return Err(FetchError::new(kind, status.to_string()));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl NotionSource for NotionHttpClient {
    async fn query_database(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<ResultPage<RawPage>, FetchError> {
        let url = self.endpoint(&format!("databases/{database_id}/query"))?;
        let mut body = serde_json::json!({ "page_size": PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = cursor.into();
        }
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body.to_string());
        self.send(request).await
    }

    async fn block_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<ResultPage<RawBlock>, FetchError> {
        let mut url = self.endpoint(&format!("blocks/{block_id}/children"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page_size", &PAGE_SIZE.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("start_cursor", cursor);
            }
        }
        self.send(self.client.get(url)).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return FetchError::new(FailureKind::Decode, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

/// Follow `next_cursor` until the listing is exhausted. Nothing is returned
/// unless every page was fetched.
async fn collect_all<T, F, Fut>(mut next_page: F) -> Result<Vec<T>, FetchError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ResultPage<T>, FetchError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = next_page(cursor.take()).await?;
        items.extend(page.results);
        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            (true, None) => {
                importer_warn!("listing reports more results but no cursor; stopping");
                break;
            }
            (false, _) => break,
        }
    }
    Ok(items)
}

/// Every row of the database, in the order the API returns them.
pub async fn fetch_all_entries(
    source: &dyn NotionSource,
    database_id: &str,
) -> Result<Vec<RemoteEntry>, FetchError> {
    let pages = collect_all(move |cursor| async move {
        source.query_database(database_id, cursor.as_deref()).await
    })
    .await?;
    Ok(pages.into_iter().map(parse_entry).collect())
}

/// Resolve the complete block tree below `block_id`, depth first, siblings in order.
pub fn fetch_block_tree<'a>(
    source: &'a dyn NotionSource,
    block_id: &'a str,
) -> BoxFuture<'a, Result<Vec<Block>, FetchError>> {
    async move {
        let raw_blocks = collect_all(move |cursor| async move {
            source.block_children(block_id, cursor.as_deref()).await
        })
        .await?;

        let mut blocks = Vec::with_capacity(raw_blocks.len());
        for raw in raw_blocks {
            let kind = parse_block_kind(&raw);
            let children = if raw.owns_children() {
                fetch_block_tree(source, &raw.id).await?
            } else {
                Vec::new()
            };
            importer_debug!(
                "resolved block {} ({}) with {} children",
                raw.id,
                raw.kind,
                children.len()
            );
            blocks.push(Block {
                id: raw.id,
                kind,
                children,
            });
        }
        Ok(blocks)
    }
    .boxed()
}
