//! Outbound request description

use crate::error::{QianfanError, QianfanResult};
use reqwest::{Method, Url};
use serde_json::Value;
use std::collections::BTreeMap;

/// A fully described HTTP call, signed in place before it is sent
///
/// The query is kept apart from `url` so that signing and the wire
/// encoding see exactly the same key/value pairs.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl PreparedRequest {
    /// Create a request; a query string inside `url` is moved into `query`
    pub fn new(method: Method, url: impl AsRef<str>) -> QianfanResult<Self> {
        let parsed = parse_url(url.as_ref())?;
        let query = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut base = parsed;
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self {
            method,
            url: base.to_string(),
            query,
            headers: BTreeMap::new(),
            body: None,
        })
    }

    pub fn get(url: impl AsRef<str>) -> QianfanResult<Self> {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl AsRef<str>) -> QianfanResult<Self> {
        Self::new(Method::POST, url)
    }

    /// Append a query parameter
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a query parameter, replacing any existing value for `key`
    pub fn set_query(&mut self, key: &str, value: impl Into<String>) {
        self.query.retain(|(k, _)| k != key);
        self.query.push((key.to_string(), value.into()));
    }

    /// Set a header, replacing any existing header with the same name in
    /// any letter case
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn parsed_url(&self) -> QianfanResult<Url> {
        parse_url(&self.url)
    }

    /// `host[:port]` as sent in the `Host` header
    pub fn host(&self) -> QianfanResult<String> {
        let url = self.parsed_url()?;
        let host = url
            .host_str()
            .ok_or_else(|| QianfanError::validation_field("URL has no host", "url"))?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    /// URL as sent on the wire, query encoded the same way it is signed
    pub fn full_url(&self) -> QianfanResult<Url> {
        if self.query.is_empty() {
            return self.parsed_url();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        parse_url(&format!("{}?{}", self.url, query))
    }

    pub(crate) fn to_reqwest(&self, client: &reqwest::Client) -> QianfanResult<reqwest::RequestBuilder> {
        let mut builder = client.request(self.method.clone(), self.full_url()?);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &self.body {
            builder = builder.json(body);
        }
        Ok(builder)
    }
}

fn parse_url(raw: &str) -> QianfanResult<Url> {
    let url = Url::parse(raw).map_err(|e| {
        QianfanError::validation_field(format!("malformed URL '{}': {}", raw, e), "url")
    })?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(QianfanError::validation_field(
            format!("URL '{}' must be an absolute http(s) URL", raw),
            "url",
        ));
    }
    Ok(url)
}
