// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::SourceError;
use crate::http::HttpClient;
use crate::model::{EpisodeInfo, Link};

use super::RemoteSource;

const LINKS_ENDPOINT: &str = "episodes/links";

/// Options for an HTTP link source
#[derive(Debug, Clone)]
pub struct HttpSourceOptions {
    pub id: i64,
    pub name: String,
    /// API root; relative endpoints are joined onto it, so it should end with '/'
    pub base_url: Url,
    /// Tag used for links the server returns without a quality label
    pub default_tag: String,
}

impl HttpSourceOptions {
    pub fn new(id: i64, name: impl Into<String>, base_url: Url) -> Self {
        Self {
            id,
            name: name.into(),
            base_url,
            default_tag: "default".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinkList {
    links: Vec<RemoteLink>,
}

#[derive(Debug, Deserialize)]
struct RemoteLink {
    url: String,
    #[serde(default)]
    quality: Option<String>,
}

/// Remote source talking to a JSON link API
///
/// Issues `GET {base_url}episodes/links?url=<episode url>&number=<episode number>`
/// and expects `{"links": [{"url": "...", "quality": "..."}]}`.
#[derive(Debug, Clone)]
pub struct HttpSource<C> {
    client: C,
    options: HttpSourceOptions,
}

impl<C: HttpClient> HttpSource<C> {
    pub fn new(client: C, options: HttpSourceOptions) -> Self {
        Self { client, options }
    }

    /// Build the request URL for an episode
    pub fn links_url(&self, episode: &EpisodeInfo) -> Result<Url, SourceError> {
        let mut url = self.options.base_url.join(LINKS_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("url", &episode.url)
            .append_pair("number", &episode.episode_number.to_string());
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient + 'static> RemoteSource for HttpSource<C> {
    fn id(&self) -> i64 {
        self.options.id
    }

    fn name(&self) -> &str {
        &self.options.name
    }

    async fn fetch_links(&self, episode: &EpisodeInfo) -> Result<Vec<Link>, SourceError> {
        let url = self.links_url(episode)?;
        let url = url.as_str();

        let response = self
            .client
            .get_bytes(url)
            .await
            .map_err(|e| SourceError::HttpFailed {
                url: url.to_string(),
                source: e,
            })?;

        if response.status >= 400 {
            return Err(SourceError::HttpStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        let list: LinkList =
            serde_json::from_slice(&response.body).map_err(|e| SourceError::InvalidResponse {
                url: url.to_string(),
                source: e,
            })?;

        debug!(source = %self.options.name, count = list.links.len(), "fetched remote links");

        Ok(list
            .links
            .into_iter()
            .map(|link| {
                let tag = link
                    .quality
                    .filter(|q| !q.is_empty())
                    .unwrap_or_else(|| self.options.default_tag.clone());
                Link::new(link.url, tag)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use bytes::Bytes;
    use std::sync::Mutex;

    struct MockHttpClient {
        status: u16,
        body: String,
        requested: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from(self.body.clone()),
            })
        }
    }

    fn make_source(client: MockHttpClient) -> HttpSource<MockHttpClient> {
        HttpSource::new(
            client,
            HttpSourceOptions::new(
                1001,
                "Streamy",
                Url::parse("https://api.example.com/v1/").unwrap(),
            ),
        )
    }

    fn make_info() -> EpisodeInfo {
        EpisodeInfo {
            url: "/watch/bebop 5".to_string(),
            name: "Ballad of Fallen Angels".to_string(),
            date_upload: None,
            episode_number: 5.0,
            scanlator: None,
        }
    }

    #[tokio::test]
    async fn fetch_preserves_server_order() {
        let source = make_source(MockHttpClient::new(
            200,
            r#"{"links": [
                {"url": "https://cdn/x.m3u8", "quality": "1080p"},
                {"url": "https://cdn/y.m3u8", "quality": "480p"}
            ]}"#,
        ));

        let links = source.fetch_links(&make_info()).await.unwrap();

        assert_eq!(
            links,
            vec![
                Link::new("https://cdn/x.m3u8", "1080p"),
                Link::new("https://cdn/y.m3u8", "480p"),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_requests_episode_endpoint() {
        let source = make_source(MockHttpClient::new(200, r#"{"links": []}"#));

        source.fetch_links(&make_info()).await.unwrap();

        let requested = source.client.requested.lock().unwrap().clone();
        let expected = "https://api.example.com/v1/episodes/links?url=%2Fwatch%2Fbebop+5&number=5";
        assert_eq!(requested, vec![expected.to_string()]);
    }

    #[tokio::test]
    async fn fetch_returns_empty_list_when_nothing_found() {
        let source = make_source(MockHttpClient::new(200, r#"{"links": []}"#));
        let links = source.fetch_links(&make_info()).await.unwrap();
        assert!(links.is_empty());
    }

    #[tokio::test]
    async fn missing_quality_uses_default_tag() {
        let source = make_source(MockHttpClient::new(
            200,
            r#"{"links": [
                {"url": "https://cdn/z.mp4"},
                {"url": "https://cdn/w.mp4", "quality": ""}
            ]}"#,
        ));

        let links = source.fetch_links(&make_info()).await.unwrap();

        assert_eq!(links[0].tag, "default");
        assert_eq!(links[1].tag, "default");
    }

    #[tokio::test]
    async fn fetch_fails_on_http_error() {
        let source = make_source(MockHttpClient::new(503, "unavailable"));

        let result = source.fetch_links(&make_info()).await;

        match result.unwrap_err() {
            SourceError::HttpStatus { status, .. } => assert_eq!(status, 503),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_fails_on_malformed_json() {
        let source = make_source(MockHttpClient::new(200, "<html>nope</html>"));

        let result = source.fetch_links(&make_info()).await;

        assert!(matches!(
            result.unwrap_err(),
            SourceError::InvalidResponse { .. }
        ));
    }
}
