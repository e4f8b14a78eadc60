use crate::error::Result;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::debug;
use url::{form_urlencoded, Url};

/// Offset pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Anything that can be encoded into list query parameters.
pub trait QueryOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

impl QueryOptions for PageOptions {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// Appends the encoded options to `path` as a query string.
pub fn add_options<O: QueryOptions + ?Sized>(path: &str, options: &O) -> String {
    let pairs = options.query_pairs();
    if pairs.is_empty() {
        return path.to_string();
    }

    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{query}")
}

/// Pagination metadata found at the top level of list responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub previous_page: Option<String>,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.next_page.as_deref().is_some_and(|s| !s.is_empty())
    }

    pub fn has_prev(&self) -> bool {
        self.previous_page.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Page number encoded in the `next_page` URL, if any.
    pub fn next_page_number(&self) -> Option<u32> {
        if !self.has_next() {
            return None;
        }
        Self::page_param(self.next_page.as_deref()?)
    }

    fn page_param(raw: &str) -> Option<u32> {
        let url = Url::parse(raw).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    }
}

#[derive(Debug, Clone)]
pub struct PagedResponse<T> {
    pub items: Vec<T>,
    pub page: Page,
}

impl<T> PagedResponse<T> {
    pub fn has_next(&self) -> bool {
        self.page.has_next()
    }

    pub fn next_page(&self, current: u32) -> Option<u32> {
        if !self.has_next() {
            return None;
        }
        Some(self.page.next_page_number().unwrap_or(current + 1))
    }
}

#[async_trait]
pub trait Paginator<T>: Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<PagedResponse<T>>;

    async fn fetch_all(&self, per_page: u32) -> Result<Vec<T>>
    where
        T: Send,
    {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            debug!(page, per_page, "Fetching page");
            let response = self.fetch_page(page, per_page).await?;
            let item_count = response.items.len();
            let next = response.next_page(page);

            all_items.extend(response.items);

            match next {
                Some(next) if item_count > 0 => page = next,
                _ => {
                    debug!(total_items = all_items.len(), "Finished pagination");
                    break;
                }
            }
        }

        Ok(all_items)
    }

    fn stream<'a>(&'a self, per_page: u32) -> Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>
    where
        T: Send + 'a,
    {
        Box::pin(async_stream::stream! {
            let mut page = 1;

            loop {
                debug!(page, per_page, "Fetching page in stream");
                match self.fetch_page(page, per_page).await {
                    Ok(response) => {
                        let item_count = response.items.len();
                        let next = response.next_page(page);

                        yield Ok(response.items);

                        match next {
                            Some(next) if item_count > 0 => page = next,
                            _ => break,
                        }
                    }
                    Err(err) => {
                        yield Err(err);
                        break;
                    }
                }
            }
        })
    }
}

pub async fn collect_pages<T, P: Paginator<T>>(
    paginator: &P,
    per_page: u32,
    limit: Option<usize>,
) -> Result<Vec<T>>
where
    T: Send,
{
    let mut stream = paginator.stream(per_page);
    let mut all_items = Vec::new();

    while let Some(result) = stream.next().await {
        let items = result?;
        all_items.extend(items);

        if let Some(limit) = limit {
            if all_items.len() >= limit {
                all_items.truncate(limit);
                break;
            }
        }
    }

    Ok(all_items)
}
