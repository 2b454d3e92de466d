use crate::core::{CallMethod, Record, RecordTransport, Token};
use crate::utils::error::{MigrationError, Result};
use reqwest::header::{HeaderMap, LINK};
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 100_000;

/// 取出第一個 `<` 與其後第一個 `>` 之間的字串。
///
/// `Link: <https://host/sensors?pageSize=1000&nextPageId=42>; rel="next"`
/// 會得到 `https://host/sensors?pageSize=1000&nextPageId=42`。
/// 缺少任一括號或括號內為空時回傳 `None`。
pub fn parse_next_link(header_value: &str) -> Option<String> {
    let start = header_value.find('<')? + 1;
    let len = header_value[start..].find('>')?;
    let link = &header_value[start..start + len];
    if link.is_empty() {
        None
    } else {
        Some(link.to_string())
    }
}

/// 有 `Link` 但無法讀取時視為錯誤，不能當成最後一頁
fn next_link(headers: &HeaderMap, url: &str) -> Result<Option<String>> {
    match headers.get(LINK) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(parse_next_link)
            .map_err(|e| MigrationError::transport("GET", url, format!("unreadable Link header: {}", e))),
    }
}

/// 相對連結以目前頁面的 URL 為基準
fn resolve_link(current: &str, link: &str) -> Result<String> {
    Url::parse(current)
        .and_then(|base| base.join(link))
        .map(String::from)
        .map_err(|e| MigrationError::transport("GET", current, format!("bad continuation link '{}': {}", link, e)))
}

pub(crate) fn records_from_body(body: Option<serde_json::Value>, url: &str) -> Result<Vec<Record>> {
    match body {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::Object(obj) => Ok(Record::from(obj)),
                other => Err(MigrationError::transport(
                    "GET",
                    url,
                    format!("expected a JSON object per record, got {}", other),
                )),
            })
            .collect(),
        Some(_) => Err(MigrationError::transport(
            "GET",
            url,
            "expected a JSON array of records",
        )),
    }
}

/// Follows continuation links until a page comes back without one.
pub struct Paginator<'a, T: RecordTransport + ?Sized> {
    transport: &'a T,
    max_pages: usize,
}

impl<'a, T: RecordTransport + ?Sized> Paginator<'a, T> {
    pub fn new(transport: &'a T, max_pages: usize) -> Self {
        Self {
            transport,
            max_pages,
        }
    }

    pub async fn fetch_all(
        &self,
        start_url: &str,
        token: &Token,
        expected_count: u64,
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut next = Some(start_url.to_string());
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            if pages >= self.max_pages {
                return Err(MigrationError::PaginationLimitError {
                    url: start_url.to_string(),
                    max_pages: self.max_pages,
                });
            }

            let response = self
                .transport
                .call(&url, token, CallMethod::Get, None)
                .await?;
            pages += 1;

            records.extend(records_from_body(response.body, &url)?);
            tracing::info!(
                "📥 Fetched {}/{} domain object instances (page {})",
                records.len(),
                expected_count,
                pages
            );

            next = match next_link(&response.headers, &url)? {
                Some(link) => Some(resolve_link(&url, &link)?),
                None => None,
            };
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{page, token, ScriptedTransport};
    use reqwest::header::HeaderValue;

    #[test]
    fn test_parse_next_link_standard_header() {
        let value = r#"<https://asset.example.com/sensors?pageSize=1000&nextPageId=abc>; rel="next""#;
        assert_eq!(
            parse_next_link(value).as_deref(),
            Some("https://asset.example.com/sensors?pageSize=1000&nextPageId=abc")
        );
    }

    #[test]
    fn test_parse_next_link_uses_first_brackets_only() {
        let value = r#"<http://a/1>; rel="next", <http://a/9>; rel="last""#;
        assert_eq!(parse_next_link(value).as_deref(), Some("http://a/1"));
    }

    #[test]
    fn test_parse_next_link_malformed() {
        assert_eq!(parse_next_link(""), None);
        assert_eq!(parse_next_link("http://a/1"), None);
        assert_eq!(parse_next_link("<http://a/1"), None);
        assert_eq!(parse_next_link("http://a/1>"), None);
        assert_eq!(parse_next_link("<>; rel=\"next\""), None);
        // `>` before `<` is ignored
        assert_eq!(parse_next_link("> <http://a/2>").as_deref(), Some("http://a/2"));
    }

    #[tokio::test]
    async fn test_fetch_all_rejects_non_ascii_link_header() {
        let transport = ScriptedTransport::new();
        let mut response = page(0..2, None);
        response.headers.insert(
            LINK,
            HeaderValue::from_bytes(b"<http://src/s/p2?cursor=\xe9>; rel=\"next\"").unwrap(),
        );
        transport.respond("http://src/s", response).await;

        let paginator = Paginator::new(&transport, DEFAULT_MAX_PAGES);
        let result = paginator.fetch_all("http://src/s", &token(), 4).await;

        match result {
            Err(MigrationError::TransportError { reason, .. }) => assert!(reason.contains("Link")),
            other => panic!("expected transport error, got {:?}", other.map(|r| r.len())),
        }
        assert_eq!(transport.gets().await.len(), 1);
    }

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve_link("http://host/sensors?pageSize=2", "/sensors?page=2").unwrap();
        assert_eq!(resolved, "http://host/sensors?page=2");
    }

    #[test]
    fn test_records_from_body_rejects_non_array() {
        assert!(records_from_body(None, "u").unwrap().is_empty());
        assert!(records_from_body(Some(serde_json::json!({"a": 1})), "u").is_err());
        assert!(records_from_body(Some(serde_json::json!([1, 2])), "u").is_err());
    }

    #[tokio::test]
    async fn test_fetch_all_follows_links_in_order() {
        let transport = ScriptedTransport::new();
        transport
            .respond("http://src/sensors", page(0..3, Some("http://src/sensors/p2")))
            .await;
        transport
            .respond("http://src/sensors/p2", page(3..6, Some("http://src/sensors/p3")))
            .await;
        transport.respond("http://src/sensors/p3", page(6..7, None)).await;

        let paginator = Paginator::new(&transport, DEFAULT_MAX_PAGES);
        let records = paginator
            .fetch_all("http://src/sensors", &token(), 7)
            .await
            .unwrap();

        let ids: Vec<i64> = records
            .iter()
            .map(|r| r.data["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(transport.gets().await.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_aborts_on_page_failure() {
        let transport = ScriptedTransport::new();
        transport
            .respond("http://src/b", page(0..2, Some("http://src/b/p2")))
            .await;
        transport.fail("http://src/b/p2").await;

        let paginator = Paginator::new(&transport, DEFAULT_MAX_PAGES);
        let result = paginator.fetch_all("http://src/b", &token(), 4).await;

        assert!(matches!(result, Err(MigrationError::TransportError { .. })));
    }

    #[tokio::test]
    async fn test_fetch_all_stops_at_page_cap() {
        let transport = ScriptedTransport::new();
        // 永遠指回自己的連結
        transport
            .respond("http://src/loop", page(0..1, Some("http://src/loop")))
            .await;

        let paginator = Paginator::new(&transport, 5);
        let result = paginator.fetch_all("http://src/loop", &token(), 1).await;

        match result {
            Err(MigrationError::PaginationLimitError { max_pages, .. }) => assert_eq!(max_pages, 5),
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
        assert_eq!(transport.gets().await.len(), 5);
    }
}
