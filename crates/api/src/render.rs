//! Page rendering from a named template registry.

use std::collections::HashMap;

use domain::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::templates;

/// Errors raised while rendering a page.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No template is registered under this name.
    #[error("Template {0:?} is not registered")]
    TemplateUnavailable(String),

    /// The template needs a data entry the handler did not provide.
    #[error("Template data {0:?} is missing")]
    MissingData(String),

    /// A data entry does not have the shape the template expects.
    #[error("Template data {key:?} is malformed: {source}")]
    MalformedData {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a page can show.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub string_map: HashMap<String, String>,
    pub data: Map<String, Value>,
    pub form: Form,
    pub flash: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub csrf_token: String,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.string_map.insert(key.to_string(), value.into());
        self
    }

    /// Adds a serializable value to the data bag.
    pub fn with_data<T: Serialize>(mut self, key: &str, value: &T) -> Result<Self, RenderError> {
        let value = serde_json::to_value(value).map_err(|source| RenderError::MalformedData {
            key: key.to_string(),
            source,
        })?;
        self.data.insert(key.to_string(), value);
        Ok(self)
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    /// Returns a string entry, or `""` when absent.
    pub fn string(&self, key: &str) -> &str {
        self.string_map.get(key).map(String::as_str).unwrap_or("")
    }

    /// Decodes a data bag entry.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T, RenderError> {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| RenderError::MissingData(key.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|source| RenderError::MalformedData {
            key: key.to_string(),
            source,
        })
    }
}

/// A rendered page body and its title.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    pub body: String,
}

/// Builds a page from template data.
pub type PageFn = fn(&TemplateData) -> Result<Page, RenderError>;

/// Registry of pages by name.
#[derive(Clone, Default)]
pub struct Templates {
    pages: HashMap<&'static str, PageFn>,
}

impl Templates {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every page the site serves.
    pub fn builtin() -> Self {
        let mut templates = Self::new();
        templates.register(templates::HOME, templates::home);
        templates.register(templates::ABOUT, templates::about);
        templates.register(templates::CONTACT, templates::contact);
        templates.register(templates::MODEL, templates::model);
        templates.register(templates::CHECK_AVAILABILITY, templates::check_availability);
        templates.register(templates::CHOOSE_MODEL, templates::choose_model);
        templates.register(templates::RENT, templates::rent);
        templates.register(templates::RENT_SUMMARY, templates::rent_summary);
        templates
    }

    pub fn register(&mut self, name: &'static str, page: PageFn) {
        self.pages.insert(name, page);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    /// Renders a registered page inside the site layout.
    pub fn render(&self, name: &str, data: &TemplateData) -> Result<String, RenderError> {
        let page = self
            .pages
            .get(name)
            .ok_or_else(|| RenderError::TemplateUnavailable(name.to_string()))?;
        let page = page(data)?;
        Ok(templates::layout(&page, data))
    }
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.pages.keys().collect();
        names.sort();
        f.debug_struct("Templates").field("pages", &names).finish()
    }
}

/// Escapes text for use in HTML content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
