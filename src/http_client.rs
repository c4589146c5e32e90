use anyhow::{Context, Result, anyhow, ensure};
use log::debug;
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::fmt;
use trait_variant::make;

/// Form-encoded request body as ordered name/value pairs
pub type FormBody = Vec<(String, String)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Expected shape of a response body
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// Parsed response body
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// Parse a raw body in the declared format
    pub fn parse(body: String, format: ResponseFormat) -> Result<Self> {
        match format {
            ResponseFormat::Text => Ok(Payload::Text(body)),
            ResponseFormat::Json => serde_json::from_str(&body)
                .map(Payload::Json)
                .context("failed to parse JSON response"),
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(anyhow!("expected JSON payload, got text")),
        }
    }

    pub fn into_text(self) -> Result<String> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Json(_) => Err(anyhow!("expected text payload, got JSON")),
        }
    }
}

/// Access to the HTTP API exposed by the device firmware.
///
/// Callers only distinguish success from failure; the error carries context
/// for logging, nothing a caller is expected to match on.
#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait DeviceClient {
    async fn fetch(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<FormBody>,
        format: ResponseFormat,
    ) -> Result<Payload>;

    /// Absolute URL of a device path, e.g. for file downloads
    fn url_for(&self, path: &str) -> String;
}

/// reqwest based client talking to one device
#[derive(Clone)]
pub struct HttpDeviceClient {
    client: Client,
    base_url: String,
}

impl HttpDeviceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to create device HTTP client")?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpDeviceClient { client, base_url }
    }

    fn build_url(&self, path: &str) -> String {
        // Normalize path to always start with a single "/"
        let normalized_path = path.trim_start_matches('/');
        format!("{}/{normalized_path}", self.base_url)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        }
    }
}

impl DeviceClient for HttpDeviceClient {
    async fn fetch(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<FormBody>,
        format: ResponseFormat,
    ) -> Result<Payload> {
        let url = self.build_url(endpoint);
        debug!("{method} {url}");

        let mut request = self.request(method, &url);
        if let Some(form) = &body {
            request = request.form(form);
        }

        let res = request
            .send()
            .await
            .context(format!("failed to send {method} request to {url}"))?;

        let body = handle_http_response(res, &format!("{method} {url}")).await?;
        Payload::parse(body, format).context(format!("{method} {url}"))
    }

    fn url_for(&self, path: &str) -> String {
        self.build_url(path)
    }
}

/// Check the response status and extract the body text
///
/// # Returns
/// * `Ok(String)` - The response body if the status is successful
/// * `Err` - If the status is not successful or reading the body fails
pub async fn handle_http_response(res: Response, context_msg: &str) -> Result<String> {
    let status = res.status();
    let body = res.text().await.context("failed to read response body")?;

    ensure!(
        status.is_success(),
        "{context_msg} failed with status {status} and body: {body}"
    );

    Ok(body)
}
