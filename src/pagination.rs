//! Page-number pagination for list endpoints.

use crate::app_config::PaginationConfig;
use crate::error::ApiError;
use actix_web::HttpRequest;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};
use serde::{Deserialize, Serialize};
use url::Url;

/// Raw `page` / `limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// A validated page request. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageParams {
    pub fn resolve(&self, config: &PaginationConfig) -> PageRequest {
        let limit = match self.limit {
            Some(0) | None => config.page_size,
            Some(limit) => limit.min(config.max_page_size),
        };
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            limit: limit.max(1),
        }
    }
}

/// Envelope returned by every paginated endpoint.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(results: Vec<T>, count: u64, req: PageRequest, url: &Url) -> Self {
        let last_page = count.div_ceil(req.limit).max(1);
        let next = (req.page < last_page).then(|| page_url(url, req.page + 1));
        let previous = (req.page > 1).then(|| page_url(url, req.page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rebuilds `url` pointing at `page`. Page 1 drops the parameter.
fn page_url(url: &Url, page: u64) -> String {
    let mut url = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if !pairs.is_empty() || page > 1 {
        let mut query = url.query_pairs_mut();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
        }
    }
    url.to_string()
}

/// Absolute URL of the current request, as the client addressed it.
pub fn request_url(req: &HttpRequest) -> Url {
    let info = req.connection_info();
    let raw = format!("{}://{}{}", info.scheme(), info.host(), req.uri());
    Url::parse(&raw).unwrap_or_else(|e| {
        log::warn!("Could not parse request URL {:?}: {}", raw, e);
        Url::parse("http://localhost/").expect("static URL parses")
    })
}

/// Runs `select` for one page and also returns the total row count.
///
/// Pages past the end are NotFound; page 1 of an empty set is not.
pub async fn fetch_page<E, C>(
    select: Select<E>,
    db: &C,
    req: PageRequest,
) -> Result<(Vec<E::Model>, u64), ApiError>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let paginator = select.paginate(db, req.limit);
    let count = paginator.num_items().await?;
    if req.page > 1 {
        match (req.page - 1).checked_mul(req.limit) {
            Some(offset) if offset < count => {}
            _ => return Err(ApiError::NotFound("Invalid page.".to_owned())),
        }
    }
    let rows = paginator.fetch_page(req.page - 1).await?;
    Ok((rows, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            page_size: 6,
            max_page_size: 100,
        }
    }

    #[test]
    fn test_resolve_defaults_and_caps() {
        let params = PageParams::default();
        assert_eq!(params.resolve(&config()), PageRequest { page: 1, limit: 6 });

        let params = PageParams {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(
            params.resolve(&config()),
            PageRequest {
                page: 1,
                limit: 100
            }
        );
    }

    #[test]
    fn test_links_on_middle_page() {
        let url = Url::parse("http://testserver/api/recipes/?tags=lunch&page=2&limit=2").unwrap();
        let page = Page::new(vec![1, 2], 5, PageRequest { page: 2, limit: 2 }, &url);
        assert_eq!(
            page.next.as_deref(),
            Some("http://testserver/api/recipes/?tags=lunch&limit=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("http://testserver/api/recipes/?tags=lunch&limit=2")
        );
    }

    #[test]
    fn test_no_links_on_single_page() {
        let url = Url::parse("http://testserver/api/users/").unwrap();
        let page = Page::new(vec!["a"], 1, PageRequest { page: 1, limit: 6 }, &url);
        assert!(page.next.is_none());
        assert!(page.previous.is_none());
        assert_eq!(page.count, 1);
    }

    #[test]
    fn test_previous_to_first_page_drops_query() {
        let url = Url::parse("http://testserver/api/users/?page=2").unwrap();
        let page = Page::new(vec![0], 7, PageRequest { page: 2, limit: 6 }, &url);
        assert_eq!(page.previous.as_deref(), Some("http://testserver/api/users/"));
        assert!(page.next.is_none());
    }
}
