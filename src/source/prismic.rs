//! Prismic REST API client

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{ContentSource, FetchError, PublicationOrder};
use crate::config::CmsConfig;
use crate::content::{
    timestamp, ContentSection, Cursor, PageResult, PostDetail, PostSummary, RichTextFragment,
};

/// Content source backed by a Prismic repository
pub struct PrismicSource {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
    document_type: String,
}

impl PrismicSource {
    /// Create a client for the API root `endpoint` (e.g. `https://repo.cdn.prismic.io/api/v2`)
    pub fn new(endpoint: &str, access_token: Option<String>, document_type: &str) -> Self {
        Self::with_client(Client::new(), endpoint, access_token, document_type)
    }

    fn with_client(
        client: Client,
        endpoint: &str,
        access_token: Option<String>,
        document_type: &str,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|token| !token.is_empty()),
            document_type: document_type.to_string(),
        }
    }

    pub fn from_config(config: &CmsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;
        Ok(Self::with_client(
            client,
            &config.endpoint,
            config.access_token.clone(),
            &config.document_type,
        ))
    }

    /// The ref to query: the preview ref when given, the master ref otherwise
    async fn resolve_ref(&self, preview: Option<&str>) -> Result<String, FetchError> {
        if let Some(preview) = preview {
            return Ok(preview.to_string());
        }

        let mut request = self.client.get(&self.endpoint);
        if let Some(token) = &self.access_token {
            request = request.query(&[("access_token", token)]);
        }

        let api: ApiRoot = self.send(request, &self.endpoint).await?;
        api.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(FetchError::MissingRef)
    }

    /// The `q` parameter: the document type filter followed by `predicates`
    fn query(&self, predicates: &[String]) -> String {
        let mut q = format!("[[at(document.type,\"{}\")]", self.document_type);
        for predicate in predicates {
            q.push('[');
            q.push_str(predicate);
            q.push(']');
        }
        q.push(']');
        q
    }

    /// Query `documents/search` restricted to the post document type
    async fn search(
        &self,
        preview: Option<&str>,
        predicates: &[String],
        params: &[(&str, String)],
    ) -> Result<SearchResponse, FetchError> {
        let reference = self.resolve_ref(preview).await?;
        let url = format!("{}/documents/search", self.endpoint);

        let mut query: Vec<(&str, String)> =
            vec![("ref", reference), ("q", self.query(predicates))];
        query.extend(params.iter().cloned());
        if let Some(token) = &self.access_token {
            query.push(("access_token", token.clone()));
        }

        tracing::debug!("Querying {} with {:?}", url, params);
        self.send(self.client.get(&url).query(&query), &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, FetchError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Content API answered {} for {}", status, url);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn fetch_fields(&self, fields: &[&str]) -> String {
        fields
            .iter()
            .map(|field| format!("{}.{}", self.document_type, field))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[async_trait]
impl ContentSource for PrismicSource {
    fn name(&self) -> &'static str {
        "prismic"
    }

    async fn first_page(
        &self,
        page_size: usize,
        preview: Option<&str>,
    ) -> Result<PageResult, FetchError> {
        let response = self
            .search(
                preview,
                &[],
                &[
                    ("pageSize", page_size.to_string()),
                    (
                        "orderings",
                        PublicationOrder::Descending.as_orderings().to_string(),
                    ),
                    ("fetch", self.fetch_fields(&["title", "subtitle", "author"])),
                ],
            )
            .await?;
        Ok(response.into_page())
    }

    async fn fetch_cursor(&self, cursor: &Cursor) -> Result<PageResult, FetchError> {
        let url = reqwest::Url::parse(cursor.as_str())
            .map_err(|e| FetchError::InvalidCursor(format!("{}: {}", cursor, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidCursor(cursor.to_string()));
        }

        let response: SearchResponse = self.send(self.client.get(url), cursor.as_str()).await?;
        Ok(response.into_page())
    }

    async fn get_post(
        &self,
        uid: &str,
        preview: Option<&str>,
    ) -> Result<Option<PostDetail>, FetchError> {
        // Anything outside the uid alphabet cannot match and would break the predicate
        if uid.is_empty() || uid.contains(['"', '[', ']', '\\']) {
            return Ok(None);
        }

        let response = self
            .search(
                preview,
                &[format!("at(my.{}.uid,\"{}\")", self.document_type, uid)],
                &[("pageSize", "1".to_string())],
            )
            .await?;

        Ok(response.results.into_iter().next().map(Document::into_detail))
    }

    async fn adjacent_post(
        &self,
        document_id: &str,
        order: PublicationOrder,
        preview: Option<&str>,
    ) -> Result<Option<PostSummary>, FetchError> {
        let response = self
            .search(
                preview,
                &[],
                &[
                    ("pageSize", "1".to_string()),
                    ("after", document_id.to_string()),
                    ("orderings", order.as_orderings().to_string()),
                    ("fetch", self.fetch_fields(&["title"])),
                ],
            )
            .await?;

        Ok(response
            .results
            .into_iter()
            .next()
            .map(Document::into_summary))
    }
}

#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Document>,
    next_page: Option<String>,
}

impl SearchResponse {
    fn into_page(self) -> PageResult {
        PageResult {
            results: self.results.into_iter().map(Document::into_summary).collect(),
            next_page: self.next_page.filter(|s| !s.is_empty()).map(Cursor::new),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    id: String,
    uid: Option<String>,
    #[serde(default, with = "timestamp::option")]
    first_publication_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    last_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    data: DocumentData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DocumentData {
    title: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
    banner: Option<Banner>,
    content: Option<Vec<Section>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Banner {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Section {
    heading: Option<String>,
    body: Option<Vec<RichTextFragment>>,
}

impl Document {
    fn uid(&self) -> String {
        self.uid.clone().unwrap_or_else(|| self.id.clone())
    }

    fn into_summary(self) -> PostSummary {
        PostSummary {
            uid: self.uid(),
            first_publication_date: self.first_publication_date,
            title: self.data.title.unwrap_or_default(),
            subtitle: self.data.subtitle.unwrap_or_default(),
            author: self.data.author.unwrap_or_default(),
        }
    }

    fn into_detail(self) -> PostDetail {
        let uid = self.uid();
        let data = self.data;
        PostDetail {
            id: self.id,
            uid,
            first_publication_date: self.first_publication_date,
            last_publication_date: self.last_publication_date,
            title: data.title.unwrap_or_default(),
            subtitle: data.subtitle.unwrap_or_default(),
            banner: data.banner.and_then(|banner| banner.url),
            author: data.author.unwrap_or_default(),
            content: data
                .content
                .unwrap_or_default()
                .into_iter()
                .map(|section| ContentSection {
                    heading: section.heading.unwrap_or_default(),
                    body: section.body.unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "page": 1,
            "results_per_page": 1,
            "next_page": "https://repo.cdn.prismic.io/api/v2/documents/search?ref=X&page=2&pageSize=1",
            "results": [{
                "id": "YFzR",
                "uid": "como-utilizar-hooks",
                "type": "posts",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": "2021-03-25T19:25:28+0000",
                "data": {
                    "title": "Como utilizar Hooks",
                    "subtitle": "Pensando em sincronização em vez de ciclos de vida",
                    "author": "Joseph Oliveira",
                    "banner": {"url": "https://images.prismic.io/banner.png"},
                    "content": [
                        {"heading": "Proin et varius", "body": [{"type": "paragraph", "text": "Lorem ipsum", "spans": []}]},
                        {"heading": null, "body": null}
                    ]
                }
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let detail = response.results.into_iter().next().unwrap().into_detail();
        assert_eq!(detail.id, "YFzR");
        assert_eq!(detail.uid, "como-utilizar-hooks");
        assert_eq!(
            detail.banner.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
        assert_eq!(detail.content.len(), 2);
        assert_eq!(detail.content[0].body[0].text, "Lorem ipsum");
        assert!(detail.content[1].heading.is_empty());
        assert!(detail.last_publication_date.is_some());
    }

    #[test]
    fn test_into_page_keeps_order_and_cursor() {
        let json = r#"{
            "next_page": null,
            "results": [
                {"id": "2", "uid": "newer", "first_publication_date": null, "data": {"title": "Newer"}},
                {"id": "1", "uid": "older", "first_publication_date": null, "data": {"title": "Older"}}
            ]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        let page = response.into_page();
        let uids: Vec<_> = page.results.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["newer", "older"]);
        assert!(page.next_page.is_none());
    }

    #[test]
    fn test_query_predicates() {
        let source = PrismicSource::new("https://repo.cdn.prismic.io/api/v2", None, "posts");
        assert_eq!(source.query(&[]), "[[at(document.type,\"posts\")]]");
        assert_eq!(
            source.query(&["at(my.posts.uid,\"hooks\")".to_string()]),
            "[[at(document.type,\"posts\")][at(my.posts.uid,\"hooks\")]]"
        );
    }

    #[test]
    fn test_fetch_fields() {
        let source = PrismicSource::new("https://repo.cdn.prismic.io/api/v2/", None, "posts");
        assert_eq!(
            source.fetch_fields(&["title", "author"]),
            "posts.title,posts.author"
        );
        assert_eq!(source.endpoint, "https://repo.cdn.prismic.io/api/v2");
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let source = PrismicSource::new("https://repo.cdn.prismic.io/api/v2", None, "posts");
        let err = source
            .fetch_cursor(&Cursor::new("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_uid_outside_alphabet_is_not_found() {
        let source = PrismicSource::new("https://repo.cdn.prismic.io/api/v2", None, "posts");
        let post = source.get_post("bad\"]]", None).await.unwrap();
        assert!(post.is_none());
    }
}
