//! Requests that can be sent more than once
//!
//! A [`ReplayableRequest`] captures method, URL, headers and a buffered body
//! up front. Each call to [`ReplayableRequest::build`] produces a fresh
//! `reqwest::Request`, so a retry after a session refresh sends exactly what
//! the first attempt sent.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request, Url};
use serde::Serialize;

use super::gateway::GatewayError;

/// Fully materialized outbound request
#[derive(Debug, Clone)]
pub struct ReplayableRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl ReplayableRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    /// Parse `url` and start a request
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidRequest`] when `url` is not absolute.
    pub fn parse(method: Method, url: &str) -> Result<Self, GatewayError> {
        let url = Url::parse(url)
            .map_err(|err| GatewayError::InvalidRequest(format!("invalid URL {url}: {err}")))?;
        Ok(Self::new(method, url))
    }

    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidRequest`] when serialization fails.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, GatewayError> {
        let body = serde_json::to_vec(value)
            .map_err(|err| GatewayError::InvalidRequest(format!("invalid JSON body: {err}")))?;
        Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")).body(body))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Produce a new request for one send attempt
    pub fn build(&self) -> Request {
        let mut request = Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        request
    }
}

impl TryFrom<Request> for ReplayableRequest {
    type Error = GatewayError;

    /// Capture an already built request
    ///
    /// Streaming bodies cannot be buffered without consuming them and are
    /// rejected.
    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let body = match request.body() {
            None => None,
            Some(body) => Some(Bytes::copy_from_slice(body.as_bytes().ok_or_else(|| {
                GatewayError::InvalidRequest("streaming request bodies cannot be replayed".into())
            })?)),
        };

        Ok(Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_produces_identical_requests() {
        let replayable = ReplayableRequest::parse(Method::PUT, "http://localhost/buckets/a")
            .unwrap()
            .header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"))
            .body("payload");

        for _ in 0..2 {
            let request = replayable.build();
            assert_eq!(request.method(), Method::PUT);
            assert_eq!(request.url().path(), "/buckets/a");
            assert_eq!(request.headers()["x-trace"], "abc");
            assert_eq!(request.body().and_then(reqwest::Body::as_bytes), Some(&b"payload"[..]));
        }
    }

    #[test]
    fn json_sets_content_type() {
        let replayable = ReplayableRequest::parse(Method::POST, "http://localhost/api")
            .unwrap()
            .json(&serde_json::json!({ "name": "report.pdf" }))
            .unwrap();

        assert_eq!(replayable.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            replayable.body_bytes().map(|b| b.as_ref()),
            Some(&br#"{"name":"report.pdf"}"#[..])
        );
    }

    #[test]
    fn captures_buffered_reqwest_request() {
        let client = reqwest::Client::new();
        let request = client.post("http://localhost/upload").body("abc").build().unwrap();

        let replayable = ReplayableRequest::try_from(request).unwrap();
        assert_eq!(replayable.method(), Method::POST);
        assert_eq!(replayable.body_bytes().map(|b| b.as_ref()), Some(&b"abc"[..]));
    }

    #[test]
    fn rejects_relative_url() {
        assert!(matches!(
            ReplayableRequest::parse(Method::GET, "/auth/user"),
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
