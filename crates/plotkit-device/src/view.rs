//! Configuration editor views.
//!
//! A declaration does not render UI. It carries a factory that produces a
//! [`ConfigView`], and the host's UI layer turns the view's layout into
//! widgets. The generic view mirrors the shape of the config mapping:
//! one group per nested table and one typed field per scalar.

use plotkit_core::ConfigMap;
use serde::Serialize;
use std::sync::Arc;
use toml::Value;

/// Factory producing a configuration view.
pub type ConfigViewFactory = Arc<dyn Fn() -> Box<dyn ConfigView> + Send + Sync>;

/// Describes how to edit a configuration mapping.
pub trait ConfigView: Send + Sync {
    fn title(&self) -> &str;

    /// Build the layout for `config`.
    fn layout(&self, config: &ConfigMap) -> Vec<UiElement>;
}

/// Input widget kind for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Toggle,
    List,
    DateTime,
}

impl FieldKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::Text,
            Value::Integer(_) => Self::Integer,
            Value::Float(_) => Self::Float,
            Value::Boolean(_) => Self::Toggle,
            Value::Array(_) => Self::List,
            Value::Datetime(_) => Self::DateTime,
            // Tables become groups and never reach here.
            Value::Table(_) => Self::Text,
        }
    }
}

/// UI layout elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum UiElement {
    #[serde(rename = "group")]
    Group(UiGroup),
    #[serde(rename = "field")]
    Field(UiField),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiGroup {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub children: Vec<UiElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiField {
    /// Dotted path from the root of the mapping (e.g. `connection.serial.baudrate`)
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    /// Current value rendered for display
    pub value: String,
}

/// Key/value editor used when a declaration supplies no view of its own.
#[derive(Debug, Clone)]
pub struct GenericConfigView {
    title: String,
}

impl GenericConfigView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for GenericConfigView {
    fn default() -> Self {
        Self::new("Settings")
    }
}

impl ConfigView for GenericConfigView {
    fn title(&self) -> &str {
        &self.title
    }

    fn layout(&self, config: &ConfigMap) -> Vec<UiElement> {
        build_layout(config, "")
    }
}

fn build_layout(config: &ConfigMap, prefix: &str) -> Vec<UiElement> {
    config
        .iter()
        .map(|(key, value)| {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match value {
                Value::Table(table) => UiElement::Group(UiGroup {
                    label: humanize(key),
                    children: build_layout(table, &path),
                    key: path,
                }),
                other => UiElement::Field(UiField {
                    label: humanize(key),
                    kind: FieldKind::of(other),
                    value: render(other),
                    key: path,
                }),
            }
        })
        .collect()
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `baud_rate` -> `Baud rate`
fn humanize(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Factory for the generic view; the default for every declaration.
pub fn default_config_view_factory() -> ConfigViewFactory {
    Arc::new(|| -> Box<dyn ConfigView> { Box::new(GenericConfigView::default()) })
}
