//! Transport boundary for all upstream HTTP I/O.
//!
//! The crawler only ever issues GET requests, so the seam is a single method.
//! Production uses [`ReqwestTransport`]; tests substitute scripted
//! implementations so no sockets are involved.

use async_trait::async_trait;
use thiserror::Error;

/// HTTP headers represented as key/value pairs.
///
/// Header names are treated case-insensitively by helper functions.
pub type HttpHeaders = Vec<(String, String)>;

/// A minimal HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Network(String),
}

/// Transport boundary for upstream GET requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, headers: &[(String, String)])
    -> Result<HttpResponse, TransportError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A real HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(url);
        for (k, v) in headers {
            builder = builder.header(k, v);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let mut out_headers: HttpHeaders = Vec::new();
        for (name, value) in resp.headers().iter() {
            out_headers.push((
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers: out_headers,
            body,
        })
    }
}

// ---------- Test-only scripted transport ----------


#[cfg(test)]
mod tests {
    use super::mock::{MockTransport, json_response};
    use super::*;

    #[test]
    fn test_header_get_is_case_insensitive() {
        let headers: HttpHeaders = vec![
            ("ETag".to_string(), "W/\"abc\"".to_string()),
            ("etag".to_string(), "W/\"def\"".to_string()),
        ];
        assert_eq!(header_get(&headers, "etag"), Some("W/\"abc\""));
        assert_eq!(header_get(&headers, "ETAG"), Some("W/\"abc\""));
        assert_eq!(header_get(&headers, "missing"), None);
    }

    #[test]
    fn test_is_success() {
        let mut resp = json_response("[]", None, None);
        assert!(resp.is_success());
        resp.status = 304;
        assert!(!resp.is_success());
        resp.status = 500;
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn test_mock_transport_serves_fifo_then_repeats_last() {
        let transport = MockTransport::new();
        let url = "https://example.test/api";
        transport.push_response(url, json_response("[1]", None, None));
        transport.push_response(url, json_response("[2]", None, None));

        let first = transport.get(url, &[]).await.unwrap();
        assert_eq!(first.body, b"[1]".to_vec());
        let second = transport.get(url, &[]).await.unwrap();
        assert_eq!(second.body, b"[2]".to_vec());
        let third = transport.get(url, &[]).await.unwrap();
        assert_eq!(third.body, b"[2]".to_vec());

        assert_eq!(transport.requests_for(url), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_errors_without_script() {
        let transport = MockTransport::new();
        let err = transport
            .get("https://example.test/missing", &[])
            .await
            .expect_err("unscripted url should error");
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn test_reqwest_transport_with_timeout_builds() {
        let transport = ReqwestTransport::with_timeout(std::time::Duration::from_secs(1));
        assert!(transport.is_ok());
    }
}
