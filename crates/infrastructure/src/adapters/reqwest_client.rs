//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! TLS, pooling and redirects are reqwest's; this module only translates
//! a [`RequestSpec`] into a reqwest request and the outcome back.

use std::collections::BTreeMap;
use std::error::Error as _;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use apix_application::ports::{HttpClient, HttpClientError};
use apix_domain::{HttpMethod, RequestSpec, ResponseSpec};
use reqwest::{Client, Method, RequestBuilder, Url};

use crate::http::{BuiltBody, build_body};

/// Default redirect limit.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("apix/", env!("CARGO_PKG_VERSION"));

/// HTTP client implementation using reqwest.
pub struct ReqwestHttpClient {
    client: Client,
    max_redirects: usize,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        Self::with_options(DEFAULT_USER_AGENT, DEFAULT_MAX_REDIRECTS)
    }

    /// Creates a client with the given user agent and redirect limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn with_options(user_agent: &str, max_redirects: usize) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(max_redirects))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self {
            client,
            max_redirects,
        })
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Parses the URL and appends the query parameters.
    fn build_url(request: &RequestSpec) -> Result<Url, HttpClientError> {
        let mut url = Url::parse(&request.url)
            .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;
        if !request.query_params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query_params.iter());
        }
        Ok(url)
    }

    /// Joins cookies into a single `Cookie` header value.
    fn cookie_header(cookies: &BTreeMap<String, String>) -> Option<String> {
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn apply_body(builder: RequestBuilder, body: BuiltBody, has_content_type: bool) -> RequestBuilder {
        let builder = match body.content_type() {
            Some(content_type) if !has_content_type => {
                builder.header(reqwest::header::CONTENT_TYPE, content_type)
            }
            _ => builder,
        };
        match body {
            BuiltBody::None => builder,
            BuiltBody::Text { content, .. } => builder.body(content),
            BuiltBody::Multipart(form) => builder.multipart(form),
        }
    }

    /// Maps reqwest errors to domain `HttpClientError`.
    fn map_error(&self, error: &reqwest::Error, timeout_ms: u64) -> HttpClientError {
        if error.is_timeout() {
            return HttpClientError::Timeout { timeout_ms };
        }

        let message = error_chain(error);
        let host = error
            .url()
            .and_then(|u| u.host_str())
            .unwrap_or("unknown")
            .to_string();

        if error.is_connect() {
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError { host, message };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects {
                max: self.max_redirects,
            };
        }

        HttpClientError::Other(message)
    }
}

/// Renders an error with all of its sources.
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &RequestSpec,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<ResponseSpec, HttpClientError>> + Send + '_>> {
        // Clone what we need to move into the async block
        let request = request.clone();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        Box::pin(async move {
            let url = Self::build_url(&request)?;
            let body = build_body(&request).await?;

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(request.method), url)
                .timeout(timeout);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(cookie) = Self::cookie_header(&request.cookies) {
                builder = builder.header(reqwest::header::COOKIE, cookie);
            }
            if let Some(credentials) = &request.basic_auth {
                builder = builder.basic_auth(&credentials.username, Some(&credentials.password));
            }

            let has_content_type = request
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("content-type"));
            builder = Self::apply_body(builder, body, has_content_type);

            // Start timing
            let start = Instant::now();

            let response = builder
                .send()
                .await
                .map_err(|e| self.map_error(&e, timeout_ms))?;

            let status = response.status().as_u16();

            let response_headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("<binary>").to_string()))
                .collect();

            let body_bytes = response
                .bytes()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        HttpClientError::Timeout { timeout_ms }
                    } else {
                        HttpClientError::Other(format!("Failed to read body: {e}"))
                    }
                })?
                .to_vec();

            let duration = start.elapsed();

            Ok(ResponseSpec::new(
                status,
                response_headers,
                body_bytes,
                duration,
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use apix_domain::{AuthRef, RequestBody};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Accepts one connection, answers with `response` and reports the raw
    /// request text.
    fn serve_once(response: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                    let len = head
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + len {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(String::from_utf8_lossy(&buf).into_owned()).unwrap();
        });
        (base, rx)
    }

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_client_creation() {
        let client = ReqwestHttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_url_appends_query() {
        let spec = RequestSpec::get("https://a.test/search?x=1")
            .with_query("q", "a b")
            .with_query("page", "2");
        let url = ReqwestHttpClient::build_url(&spec).unwrap();
        assert_eq!(url.as_str(), "https://a.test/search?x=1&page=2&q=a+b");
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        let spec = RequestSpec::get("not a url");
        assert!(matches!(
            ReqwestHttpClient::build_url(&spec),
            Err(HttpClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_cookie_header() {
        let spec = RequestSpec::get("https://a.test")
            .with_cookie("session", "abc")
            .with_cookie("theme", "dark");
        assert_eq!(
            ReqwestHttpClient::cookie_header(&spec.cookies).as_deref(),
            Some("session=abc; theme=dark")
        );
        assert_eq!(ReqwestHttpClient::cookie_header(&BTreeMap::new()), None);
    }

    #[tokio::test]
    async fn test_execute_sends_request_parts() {
        let (base, rx) = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}",
        );
        let mut spec = RequestSpec::new(HttpMethod::Post, format!("{base}/users"))
            .with_query("page", "2")
            .with_header("X-Trace", "t-1")
            .with_cookie("session", "abc")
            .with_body(RequestBody::json(json!({"name": "ana"})));
        if let Ok(Some(credential)) = AuthRef::basic("ana", "pw").explicit_credential() {
            credential.apply_to(&mut spec);
        }

        let client = ReqwestHttpClient::new().unwrap();
        let response = client.execute(&spec, Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.status.as_u16(), 201);
        assert_eq!(response.json(), Some(json!({"ok": true})));

        let raw = rx.recv().unwrap().to_lowercase();
        assert!(raw.starts_with("post /users?page=2 http/1.1"));
        assert!(raw.contains("x-trace: t-1"));
        assert!(raw.contains("cookie: session=abc"));
        assert!(raw.contains("authorization: basic "));
        assert!(raw.contains("content-type: application/json"));
        assert!(raw.contains("user-agent: apix/"));
        assert!(raw.ends_with(r#"{"name":"ana"}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let (base, _rx) = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let client = ReqwestHttpClient::new().unwrap();
        let response = client
            .execute(&RequestSpec::get(base), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(response.status.is_client_error());
    }

    #[tokio::test]
    async fn test_closed_port_is_connection_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = ReqwestHttpClient::new().unwrap();
        let result = client
            .execute(
                &RequestSpec::get(format!("http://127.0.0.1:{port}/")),
                Duration::from_secs(5),
            )
            .await;
        assert!(matches!(
            result,
            Err(HttpClientError::ConnectionRefused { .. } | HttpClientError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_attachment_fails_before_sending() {
        let client = ReqwestHttpClient::new().unwrap();
        let spec = RequestSpec::new(HttpMethod::Post, "http://127.0.0.1:9/")
            .with_file("doc", "/no/such/file.pdf");
        let result = client.execute(&spec, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(HttpClientError::FileRead { .. })));
    }
}
