//! Submission client for the similarity service
//!
//! One multipart POST per payload, no retries. The response is a JSON object whose
//! `top_k_results` key holds the ordered matches (paths or absolute URLs).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ResultExt, SubmissionError};
use crate::services::{ImagePayload, ServiceConfig};

pub const FILE_FIELD: &str = "file";
pub const RESULT_COUNT_FIELD: &str = "top_k";

/// 相似度服务返回的一条结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultRef {
    /// 可直接渲染的绝对地址
    pub url: String,
    pub category: Option<String>,
    /// 相似度，期望在 [0,1]
    pub score: Option<f64>,
}

impl SearchResultRef {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let category = category_from_url(&url);
        Self {
            url,
            category,
            score: None,
        }
    }

    /// 展示用的类别名，`_` 替换为空格
    pub fn display_category(&self) -> Option<String> {
        self.category.as_ref().map(|c| c.replace('_', " "))
    }
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Send the payload and return the ordered matches.
    ///
    /// `Ok(vec![])` is a valid "no matches" answer, not a failure.
    async fn submit(
        &self,
        payload: ImagePayload,
        result_count: u32,
    ) -> Result<Vec<SearchResultRef>, SubmissionError>;
}

pub struct SearchClient {
    client: Client,
    endpoint: String,
    base_url: String,
}

impl SearchClient {
    pub fn new(config: &ServiceConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .config_err("创建 HTTP 客户端失败")?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Submitter for SearchClient {
    async fn submit(
        &self,
        payload: ImagePayload,
        result_count: u32,
    ) -> Result<Vec<SearchResultRef>, SubmissionError> {
        let origin = payload.origin();
        let fingerprint = payload.fingerprint().to_string();
        let file_name = payload.file_name().to_string();
        let media_type = payload.media_type().to_string();

        let part = Part::bytes(payload.into_bytes())
            .file_name(file_name)
            .mime_str(&media_type)
            .map_err(|e| SubmissionError::Network(format!("invalid media type {media_type}: {e}")))?;
        let form = Form::new()
            .part(FILE_FIELD, part)
            .text(RESULT_COUNT_FIELD, result_count.to_string());

        tracing::debug!(
            endpoint = %self.endpoint,
            origin = ?origin,
            %fingerprint,
            result_count,
            "Submitting image search"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Network(format!("{status} {body}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let results = decode_response(&body, &self.base_url)?;
        tracing::info!(%fingerprint, count = results.len(), "Search results received");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    top_k_results: Option<Vec<RawResult>>,
    #[serde(default)]
    error: Option<String>,
}

/// 结果项既可以是路径字符串，也可以是带类别/分数的对象
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResult {
    Path(String),
    Detailed {
        #[serde(alias = "path")]
        url: String,
        #[serde(default)]
        category: Option<String>,
        #[serde(default, alias = "similarity")]
        score: Option<f64>,
    },
}

pub(crate) fn decode_response(
    body: &[u8],
    base_url: &str,
) -> Result<Vec<SearchResultRef>, SubmissionError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| SubmissionError::Malformed(e.to_string()))?;

    let raw = response.top_k_results.unwrap_or_default();
    if raw.is_empty() {
        if let Some(message) = response.error {
            return Err(SubmissionError::Service(message));
        }
    }

    let results = raw
        .into_iter()
        .map(|item| match item {
            RawResult::Path(path) => SearchResultRef::from_url(resolve_url(base_url, &path)),
            RawResult::Detailed {
                url,
                category,
                score,
            } => {
                let mut result = SearchResultRef::from_url(resolve_url(base_url, &url));
                if category.is_some() {
                    result.category = category;
                }
                result.score = score.filter(|s| s.is_finite());
                result
            }
        })
        .collect();

    Ok(results)
}

/// 相对路径拼接到服务的 origin（scheme://host[:port]）上；已是 http(s) 地址则原样返回
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", origin_of(base_url), path.trim_start_matches('/'))
}

// 去掉 base_url 中 host 之后的路径部分
fn origin_of(base_url: &str) -> &str {
    let authority_start = base_url.find("://").map(|i| i + 3).unwrap_or(0);
    match base_url[authority_start..].find(['/', '?', '#']) {
        Some(end) => &base_url[..authority_start + end],
        None => base_url,
    }
}

// 服务端把图片按 /images/<category>/<file> 存放
fn category_from_url(url: &str) -> Option<String> {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => url,
    };
    let path = path.split(['?', '#']).next().unwrap_or("");

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    let parent = segments[segments.len() - 2];
    if parent == "images" {
        None
    } else {
        Some(parent.to_string())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;
    use crate::services::MediaOrigin;

    const BASE: &str = "http://localhost:8000";

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(end) = find(&buf, b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());
            match content_length {
                Some(len) if buf.len() >= end + 4 + len => break,
                Some(_) => continue,
                None if head.contains("transfer-encoding: chunked") => {
                    if buf.ends_with(b"0\r\n\r\n") {
                        break;
                    }
                }
                None => break,
            }
        }
        buf
    }

    /// Answers exactly one request and hands back what it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).to_string()
        });

        (address, handle)
    }

    fn client_for(base_url: &str) -> SearchClient {
        SearchClient::new(&ServiceConfig {
            base_url: base_url.to_string(),
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    fn jpeg_payload() -> ImagePayload {
        ImagePayload::new(vec![0xFF; 64], "image/jpeg", MediaOrigin::Browsed, "shoe.jpg").unwrap()
    }

    #[tokio::test]
    async fn sends_multipart_and_resolves_paths() {
        let (address, server) = serve_once(
            "200 OK",
            r#"{"top_k_results":["/images/sneakers/1.jpg","https://cdn.example.com/x/2.jpg"]}"#,
        )
        .await;
        let client = client_for(&address);

        let results = client.submit(jpeg_payload(), 20).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, format!("{}/images/sneakers/1.jpg", address));
        assert_eq!(results[0].category.as_deref(), Some("sneakers"));
        assert_eq!(results[1].url, "https://cdn.example.com/x/2.jpg");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /search/ http/1.1"));
        assert!(request.contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="file"; filename="shoe.jpg""#));
        assert!(request.contains("content-type: image/jpeg"));
        assert!(request.contains(r#"name="top_k""#));
        assert!(request.contains("\r\n\r\n20\r\n"));
    }

    #[tokio::test]
    async fn missing_results_key_is_empty() {
        let (address, _server) = serve_once("200 OK", "{}").await;
        let results = client_for(&address).submit(jpeg_payload(), 20).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (address, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let err = client_for(&address).submit(jpeg_payload(), 20).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Malformed(_)));
    }

    #[tokio::test]
    async fn error_status_is_network_failure() {
        let (address, _server) = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;
        let err = client_for(&address).submit(jpeg_payload(), 20).await.unwrap_err();
        match err {
            SubmissionError::Network(message) => assert!(message.starts_with("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let err = client_for(&address).submit(jpeg_payload(), 20).await.unwrap_err();
        assert!(matches!(err, SubmissionError::Network(_)));
    }

    #[test]
    fn decode_service_error_body() {
        let err = decode_response(br#"{"error":"cannot identify image file"}"#, BASE).unwrap_err();
        assert_eq!(
            err,
            SubmissionError::Service("cannot identify image file".to_string())
        );
    }

    #[test]
    fn decode_null_and_empty_results() {
        assert!(decode_response(br#"{"top_k_results":null}"#, BASE).unwrap().is_empty());
        assert!(decode_response(br#"{"top_k_results":[]}"#, BASE).unwrap().is_empty());
    }

    #[test]
    fn decode_wrong_shape_is_malformed() {
        assert!(matches!(
            decode_response(br#"{"top_k_results":"nope"}"#, BASE),
            Err(SubmissionError::Malformed(_))
        ));
        assert!(matches!(
            decode_response(b"[1,2,3]", BASE),
            Err(SubmissionError::Malformed(_))
        ));
    }

    #[test]
    fn decode_detailed_results() {
        let body = br#"{"top_k_results":[
            {"path":"/images/bags/7.jpg","similarity":0.93},
            {"url":"/images/hats/1.jpg","category":"summer_hats","score":0.5}
        ]}"#;
        let results = decode_response(body, BASE).unwrap();

        assert_eq!(results[0].url, "http://localhost:8000/images/bags/7.jpg");
        assert_eq!(results[0].category.as_deref(), Some("bags"));
        assert_eq!(results[0].score, Some(0.93));
        assert_eq!(results[1].category.as_deref(), Some("summer_hats"));
        assert_eq!(results[1].display_category().as_deref(), Some("summer hats"));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(resolve_url(BASE, "/images/a.jpg"), "http://localhost:8000/images/a.jpg");
        assert_eq!(resolve_url("http://h/", "images/a.jpg"), "http://h/images/a.jpg");
        assert_eq!(resolve_url(BASE, "http://other/a.jpg"), "http://other/a.jpg");
    }

    #[test]
    fn test_resolve_url_ignores_base_path() {
        assert_eq!(
            resolve_url("http://h/api", "/images/shoes/1.jpg"),
            "http://h/images/shoes/1.jpg"
        );
        assert_eq!(
            resolve_url("https://search.local:9000/v1/search/", "images/a.jpg"),
            "https://search.local:9000/images/a.jpg"
        );
    }

    #[test]
    fn test_category_from_url() {
        assert_eq!(category_from_url("http://h/images/a.jpg"), None);
        assert_eq!(
            category_from_url("http://h/images/t_shirts/a.jpg?x=1").as_deref(),
            Some("t_shirts")
        );
        assert_eq!(category_from_url("/images/dress/a.jpg").as_deref(), Some("dress"));
        assert_eq!(category_from_url("a.jpg"), None);
    }
}
