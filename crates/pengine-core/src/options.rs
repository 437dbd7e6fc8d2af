//! Creation and ask options.

use serde::{Deserialize, Serialize};

use crate::write::quote_atom;

/// Wire encoding of a session's responses. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Structured-data (JSON) encoding.
    #[default]
    Json,
    /// Text (Prolog term) encoding.
    Prolog,
}

impl Format {
    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Prolog => "prolog",
        }
    }
}

/// Options sent with a creation request, or rendered into an `ask/2` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateOptions {
    pub format: Format,
    /// Destroy the session once its first query completes.
    pub destroy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "src_text")]
    pub source_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "src_url")]
    pub source_url: Option<String>,
}

impl CreateOptions {
    /// Render as a Prolog option list, e.g. `[destroy(false),chunk(5)]`.
    ///
    /// `src_text` has no list form and is left out.
    #[must_use]
    pub fn to_prolog(&self) -> String {
        let mut items: Vec<String> = Vec::new();
        if !self.destroy {
            items.push("destroy(false)".to_string());
        }
        if let Some(app) = &self.application {
            items.push(format!("application({})", quote_atom(app)));
        }
        if let Some(chunk) = self.chunk {
            items.push(format!("chunk({chunk})"));
        }
        if let Some(ask) = &self.ask {
            items.push(format!("ask({ask})"));
        }
        if let Some(template) = &self.template {
            items.push(format!("template({template})"));
        }
        if let Some(url) = &self.source_url {
            items.push(format!("src_url({})", quote_atom(url)));
        }
        format!("[{}]", items.join(","))
    }
}
