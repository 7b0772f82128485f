//! HTTP client for Elasticsearch and OpenSearch clusters.
//!
//! Only the handful of endpoints the converter needs are implemented:
//! cluster info, `_count`, and the scroll API for streaming a whole index.

use async_stream::stream;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::stream::BoxStream;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::backend::{Auth, ConnectionConfig, SearchBackend};
use super::error::{SourceError, SourceResult};
use super::query::SearchQuery;
use super::record::SourceRecord;
use super::SourceIndex;

/// Cluster identity returned by `GET /`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: String,
    /// `opensearch` for OpenSearch clusters, absent on Elasticsearch
    pub distribution: Option<String>,
}

#[derive(Deserialize)]
struct ScrollResponse {
    #[serde(rename = "_scroll_id")]
    scroll_id: Option<String>,
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<SourceRecord>,
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

/// Client handle for one source cluster.
pub struct SearchClient {
    backend: SearchBackend,
    nodes: Vec<Url>,
    auth: Auth,
    http: reqwest::Client,
    page_size: usize,
    keep_alive: String,
}

impl SearchClient {
    /// Build a client from connection settings.
    ///
    /// No request is sent here; connectivity problems surface on the first call.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::Config` for inconsistent hosts/ports, half-set API
    /// keys or an unusable CA bundle, and `SourceError::Io` if the CA bundle
    /// cannot be read.
    pub fn connect(backend: SearchBackend, config: &ConnectionConfig) -> SourceResult<Self> {
        let nodes = config.node_urls()?;
        let auth = config.credentials.resolve()?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_certs);

        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(path) = &config.ca_certs {
            let pem = std::fs::read(path)?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                SourceError::config(format!("invalid CA bundle {}: {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|e| SourceError::config(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            backend = %backend,
            nodes = ?nodes.iter().map(Url::as_str).collect::<Vec<_>>(),
            auth = ?auth,
            verify_certs = config.verify_certs,
            timeout_secs = config.timeout.as_secs(),
            "Search client configured"
        );

        Ok(Self {
            backend,
            nodes,
            auth,
            http,
            page_size: config.scroll_page_size.max(1),
            keep_alive: config.scroll_keep_alive.clone(),
        })
    }

    pub fn backend(&self) -> SearchBackend {
        self.backend
    }

    pub fn nodes(&self) -> &[Url] {
        &self.nodes
    }

    /// Fetch cluster name and version.
    pub async fn ping(&self) -> SourceResult<ClusterInfo> {
        let info = self.send(Method::GET, "", None).await?;
        let cluster_name = info
            .get("cluster_name")
            .and_then(Value::as_str)
            .ok_or_else(|| SourceError::invalid_response("missing cluster_name"))?
            .to_string();
        let version = info
            .pointer("/version/number")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let distribution = info
            .pointer("/version/distribution")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(ClusterInfo {
            cluster_name,
            version,
            distribution,
        })
    }

    async fn open_scroll(&self, index: &str, query: &SearchQuery) -> SourceResult<ScrollResponse> {
        let mut body = query.to_body();
        body["size"] = json!(self.page_size);
        body["sort"] = json!(["_doc"]);

        let path = format!(
            "{}/_search?scroll={}",
            urlencoding::encode(index),
            self.keep_alive
        );
        let response = self.send(Method::POST, &path, Some(&body)).await?;
        parse_scroll(response)
    }

    async fn continue_scroll(&self, scroll_id: &str) -> SourceResult<ScrollResponse> {
        let body = json!({ "scroll": self.keep_alive, "scroll_id": scroll_id });
        let response = self
            .send(Method::POST, "_search/scroll", Some(&body))
            .await?;
        parse_scroll(response)
    }

    /// Release the scroll context. Failures are logged, not returned.
    async fn clear_scroll(&self, scroll_id: &str) {
        let body = json!({ "scroll_id": [scroll_id] });
        if let Err(e) = self
            .send(Method::DELETE, "_search/scroll", Some(&body))
            .await
        {
            tracing::warn!(error = %e, "Failed to clear scroll context");
        }
    }

    /// Send a request, trying each node in order on transport failures.
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> SourceResult<Value> {
        let mut last_error = None;

        for node in &self.nodes {
            let url = node
                .join(path)
                .map_err(|e| SourceError::config(format!("invalid request path '{}': {}", path, e)))?;

            let mut request = self
                .http
                .request(method.clone(), url)
                .header(CONTENT_TYPE, "application/json");
            request = self.authorize(request);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => return read_json(response).await,
                Err(e) => {
                    let err = SourceError::from(e);
                    if !err.is_transport() {
                        return Err(err);
                    }
                    tracing::warn!(node = %node, error = %err, "Node unreachable");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::connection("no nodes configured")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::ApiKey { id, key } => request.header(
                AUTHORIZATION,
                format!("ApiKey {}", BASE64.encode(format!("{}:{}", id, key))),
            ),
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }
}

#[async_trait]
impl SourceIndex for SearchClient {
    async fn count(&self, index: &str, query: &SearchQuery) -> SourceResult<u64> {
        let path = format!("{}/_count", urlencoding::encode(index));
        let response = self
            .send(Method::POST, &path, Some(&query.to_body()))
            .await?;
        let parsed: CountResponse = serde_json::from_value(response)
            .map_err(|e| SourceError::invalid_response(format!("count response: {}", e)))?;
        Ok(parsed.count)
    }

    fn scan<'a>(
        &'a self,
        index: &'a str,
        query: &'a SearchQuery,
    ) -> BoxStream<'a, SourceResult<SourceRecord>> {
        Box::pin(stream! {
            let mut scroll_id: Option<String> = None;
            let mut next = self.open_scroll(index, query).await;

            loop {
                let page = match next {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                if page.scroll_id.is_some() {
                    scroll_id = page.scroll_id;
                }
                if page.hits.hits.is_empty() {
                    break;
                }

                tracing::trace!(hits = page.hits.hits.len(), "Scroll page received");
                for hit in page.hits.hits {
                    yield Ok(hit);
                }

                let Some(id) = scroll_id.clone() else {
                    break;
                };
                next = self.continue_scroll(&id).await;
            }

            if let Some(id) = scroll_id {
                self.clear_scroll(&id).await;
            }
        })
    }
}

async fn read_json(response: Response) -> SourceResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(status.as_u16(), body));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| SourceError::invalid_response(e.to_string()))
}

fn parse_scroll(response: Value) -> SourceResult<ScrollResponse> {
    serde_json::from_value(response)
        .map_err(|e| SourceError::invalid_response(format!("search response: {}", e)))
}
