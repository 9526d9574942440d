//! HTTP transport for origin requests.
//!
//! ### Behaviour
//! - Every response that arrives is returned, whatever its status
//! - Transport failures (DNS, connect, timeout, reset) map to `Error::Network`
//! - `CacheMode::Reload` sends `Cache-Control: no-cache` and `Pragma: no-cache`
//! - Bodies larger than `max_bytes` are rejected with `Error::FetchTooLarge`

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, header};

use shellcache_core::{AppConfig, CacheMode, Error, Network, Request, Response};

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: FetchConfig,
}

impl HttpNetwork {
    /// Create a new transport with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let mut builder = self.http.request(method, request.url.as_str());
        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await.map_err(|e| network_error(&request.url, &e))?;

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        let body = response.bytes().await.map_err(|e| network_error(&request.url, &e))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            url = %request.url,
            status,
            bytes = body.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched from origin"
        );

        Ok(Response { url: final_url, status, headers, body })
    }
}

fn network_error(url: &str, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Network(format!("{url}: timed out"))
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

/// Flatten a header map, joining repeated headers with ", ".
fn collect_headers(map: &header::HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let Ok(value) = value.to_str() else {
            continue;
        };
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP/1.1 response and hand back the raw request.
    async fn serve_once(raw_response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw_response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "shellcache/0.1");
        assert_eq!(config.max_bytes, 50 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "shop/2".into(), timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "shop/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = header::HeaderMap::new();
        map.append(header::VARY, "accept".parse().unwrap());
        map.append(header::VARY, "origin".parse().unwrap());
        map.insert(header::CONTENT_TYPE, "text/html".parse().unwrap());

        let headers = collect_headers(&map);
        assert_eq!(headers.get("vary").map(String::as_str), Some("accept, origin"));
        assert_eq!(headers.get("content-type").map(String::as_str), Some("text/html"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_a_response() {
        let (base, server) =
            serve_once("HTTP/1.1 404 Not Found\r\ncontent-type: text/plain\r\ncontent-length: 4\r\nconnection: close\r\n\r\nnope")
                .await;
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let response = network.fetch(&Request::get(format!("{base}/missing.js"))).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.ok());
        assert_eq!(&response.body[..], b"nope");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_reload_sends_no_cache() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok").await;
        let network = HttpNetwork::new(FetchConfig::default()).unwrap();

        let request = Request::get(format!("{base}/main.dart.js")).with_cache_mode(CacheMode::Reload);
        let response = network.fetch(&request).await.unwrap();
        assert!(response.ok());

        let raw = server.await.unwrap().to_ascii_lowercase();
        assert!(raw.contains("cache-control: no-cache"));
        assert!(raw.contains("pragma: no-cache"));
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let (base, server) =
            serve_once("HTTP/1.1 200 OK\r\ncontent-length: 10\r\nconnection: close\r\n\r\n0123456789").await;
        let network = HttpNetwork::new(FetchConfig { max_bytes: 4, ..Default::default() }).unwrap();

        let result = network.fetch(&Request::get(format!("{base}/big.bin"))).await;
        assert!(matches!(result, Err(Error::FetchTooLarge(_))));
        server.abort();
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let network = HttpNetwork::new(FetchConfig::default()).unwrap();
        let result = network.fetch(&Request::get(format!("http://{addr}/"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
