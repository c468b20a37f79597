// Minimal REST client for the upstream broker
//
// Requests are built by appending path segments to the configured base URL.
// Non-2xx answers are turned into `HttpError`s, 2xx bodies can be decoded
// into any deserializable type.

use crate::core::errors::ProxyError;
use crate::core::http_error::HttpError;
use crate::proxy::{forwardable_headers, ForwardedResponse};
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    /// Create a client for `base_url`
    ///
    /// The client is shared by all in-flight requests; `timeout_secs` bounds
    /// each upstream call.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        accept_invalid_certs: bool,
    ) -> Result<Self, ProxyError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| {
                ProxyError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get(&self) -> RestRequest<'_> {
        RestRequest::new(self, Method::GET, None)
    }

    pub fn delete(&self) -> RestRequest<'_> {
        RestRequest::new(self, Method::DELETE, None)
    }

    pub fn put<T: Serialize>(&self, body: &T) -> RestRequest<'_> {
        RestRequest::new(self, Method::PUT, Some(encode(body)))
    }

    pub fn post<T: Serialize>(&self, body: &T) -> RestRequest<'_> {
        RestRequest::new(self, Method::POST, Some(encode(body)))
    }

    /// Send `body` to `path_and_query` and return whatever comes back
    pub async fn forward(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse, ProxyError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        debug!(method = %method, url = %url, "Forwarding request");

        let response = self
            .http
            .request(method, &url)
            .headers(forwardable_headers(headers))
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        let headers = forwardable_headers(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;

        Ok(ForwardedResponse {
            status,
            headers,
            body,
        })
    }
}

fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, String> {
    serde_json::to_vec(body).map_err(|e| e.to_string())
}

fn transport_error(url: &str, e: reqwest::Error) -> ProxyError {
    let reason = if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    error!(url = %url, error = %reason, "Upstream request failed");
    ProxyError::Transport {
        url: url.to_string(),
        reason,
    }
}

pub struct RestRequest<'a> {
    client: &'a RestClient,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Option<Result<Vec<u8>, String>>,
}

impl<'a> RestRequest<'a> {
    fn new(client: &'a RestClient, method: Method, body: Option<Result<Vec<u8>, String>>) -> Self {
        Self {
            client,
            method,
            path: String::new(),
            query: None,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn append_path(mut self, segment: &str) -> Self {
        let segment = segment.trim_start_matches('/');
        if !self.path.ends_with('/') {
            self.path.push('/');
        }
        self.path.push_str(segment);
        self
    }

    pub fn query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    /// Copy inbound headers, except those describing the inbound body
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        let mut headers = forwardable_headers(headers);
        headers.remove(header::CONTENT_TYPE);
        headers.remove(header::ACCEPT_ENCODING);
        self.headers = headers;
        self
    }

    pub fn url(&self) -> String {
        match &self.query {
            Some(query) => format!("{}{}?{}", self.client.base_url, self.path, query),
            None => format!("{}{}", self.client.base_url, self.path),
        }
    }

    pub async fn send(self) -> Result<RestResponse, ProxyError> {
        let url = self.url();
        let mut request = self
            .client
            .http
            .request(self.method.clone(), &url)
            .headers(self.headers);

        if let Some(body) = self.body {
            let body = body.map_err(|e| {
                ProxyError::InvalidRequest(format!("Cannot encode request body: {}", e))
            })?;
            request = request
                .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        debug!(method = %self.method, url = %url, "Calling upstream broker");
        let response = request.send().await.map_err(|e| transport_error(&url, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&url, e))?;

        if let Some(err) = HttpError::from_response(status.as_u16(), &body, &url, self.method.as_str()) {
            debug!(status = status.as_u16(), url = %url, "Upstream returned an error");
            return Err(ProxyError::Upstream(err));
        }

        Ok(RestResponse { status, url, body })
    }
}

/// Successful upstream answer
#[derive(Debug, Clone)]
pub struct RestResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: Bytes,
}

impl RestResponse {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ProxyError> {
        serde_json::from_slice(&self.body).map_err(|e| ProxyError::Unmarshal {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}
