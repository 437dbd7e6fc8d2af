//! Client configuration.

use pengine_core::{CreateOptions, Format};
use serde::{Deserialize, Serialize};

/// Where and how to create sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://localhost:4242/pengine`.
    pub url: String,
    /// Application namespace on the server.
    pub application: Option<String>,
    /// Results per response. 0 leaves it to the server.
    pub chunk: usize,
    /// Source text to load into each session.
    pub src_text: Option<String>,
    /// URL of source to load into each session.
    pub src_url: Option<String>,
}

impl ClientConfig {
    /// Create a configuration for the server at `url`.
    #[must_use]
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the application namespace.
    #[must_use]
    pub fn with_application<S: Into<String>>(mut self, application: S) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Set the number of results per response.
    #[must_use]
    pub const fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    /// Load `text` into every session.
    #[must_use]
    pub fn with_src_text<S: Into<String>>(mut self, text: S) -> Self {
        self.src_text = Some(text.into());
        self
    }

    /// Load the source at `url` into every session.
    #[must_use]
    pub fn with_src_url<S: Into<String>>(mut self, url: S) -> Self {
        self.src_url = Some(url.into());
        self
    }

    pub(crate) fn create_options(&self, format: Format, destroy: bool) -> CreateOptions {
        CreateOptions {
            format,
            destroy,
            application: self.application.clone(),
            chunk: (self.chunk > 0).then_some(self.chunk),
            ask: None,
            template: None,
            source_text: self.src_text.clone(),
            source_url: self.src_url.clone(),
        }
    }
}
