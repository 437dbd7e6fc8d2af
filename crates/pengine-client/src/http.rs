//! HTTP transport.

use async_trait::async_trait;
use pengine_core::{CreateOptions, Format, Transport, TransportError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, StatusCode, Url};

const PROLOG_CONTENT_TYPE: &str = "application/x-prolog; charset=utf-8";

/// Talks to a Pengines server at a base URL such as
/// `http://localhost:4242/pengine`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    #[must_use]
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Use a preconfigured reqwest client, e.g. one with timeouts set.
    #[must_use]
    pub fn with_client<S: Into<String>>(client: Client, url: S) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        Self { client, url }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TransportError> {
        let base = format!("{}/{path}", self.url);
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        };
        url.map_err(|e| TransportError::Request(e.to_string()))
    }
}

/// Send `request` and return the body of a 200 reply.
async fn execute(request: RequestBuilder) -> Result<String, TransportError> {
    let response = request
        .send()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(TransportError::Status(status.as_u16()));
    }
    response
        .text()
        .await
        .map_err(|e| TransportError::Request(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn create(&self, options: &CreateOptions) -> Result<String, TransportError> {
        let url = match options.format {
            Format::Json => self.endpoint("create", &[])?,
            Format::Prolog => self.endpoint("create", &[("format", "prolog")])?,
        };
        execute(self.client.post(url).json(options)).await
    }

    async fn send(&self, id: &str, format: Format, body: &str) -> Result<String, TransportError> {
        let url = self.endpoint("send", &[("format", format.as_str()), ("id", id)])?;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, PROLOG_CONTENT_TYPE)
            .body(format!("{body}\n."));
        execute(request).await
    }

    async fn ping(&self, id: &str, format: Format) -> Result<String, TransportError> {
        let url = self.endpoint("ping", &[("id", id), ("format", format.as_str())])?;
        execute(self.client.get(url)).await
    }
}
