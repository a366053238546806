use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use rust_embed::RustEmbed;
use serde::Deserialize;
use toml_edit::DocumentMut;

const STREAMLIT_TEMPLATE: &str = "streamlit/config.toml";

#[derive(RustEmbed)]
#[folder = "templates"]
struct Templates;

static STREAMLIT: OnceLock<ConfigPayload> = OnceLock::new();

/// Immutable contents of a config file that gets written verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigPayload {
    text: String,
}

impl ConfigPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The Streamlit settings embedded at build time, loaded once per process.
    pub fn streamlit() -> Result<&'static ConfigPayload> {
        if let Some(payload) = STREAMLIT.get() {
            return Ok(payload);
        }
        let text = get_string(STREAMLIT_TEMPLATE)?;
        Ok(STREAMLIT.get_or_init(|| ConfigPayload::new(text)))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Top-level table names in document order.
    pub fn sections(&self) -> Result<Vec<String>> {
        let doc: DocumentMut = self.text.parse().context("parsing config payload")?;
        Ok(doc
            .iter()
            .filter(|(_, item)| item.is_table())
            .map(|(key, _)| key.to_owned())
            .collect())
    }

    /// Typed view of the handful of settings worth echoing back to the user.
    pub fn settings(&self) -> Result<StreamlitSettings> {
        toml::from_str(&self.text).context("reading settings from config payload")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StreamlitSettings {
    pub theme: ThemeSettings,
    pub server: ServerSettings,
    pub browser: BrowserSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeSettings {
    pub primary_color: Option<String>,
    pub font: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerSettings {
    pub max_upload_size: Option<u32>,
    pub max_message_size: Option<u32>,
    pub enable_xsrf_protection: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserSettings {
    pub gather_usage_stats: Option<bool>,
    pub show_error_details: Option<bool>,
}

fn get_string(path: &str) -> Result<String> {
    let file = Templates::get(path).ok_or_else(|| anyhow!("embedded template `{}` missing", path))?;
    std::str::from_utf8(file.data.as_ref())
        .with_context(|| format!("decoding embedded template `{}`", path))
        .map(|value| value.to_owned())
}
