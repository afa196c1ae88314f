//! Prop values and patch classification.
//!
//! The reconciler hands over an open set of props; only two keys mean
//! anything to a terminal element. Everything else is classified away once.

use tracing::{trace, warn};

use crate::dom::Transform;
use crate::layout::StyleMap;

/// A prop value as handed over by the reconciler.
#[derive(Debug, Clone)]
pub enum PropValue {
    Style(StyleMap),
    Transform(Transform),
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl From<StyleMap> for PropValue {
    fn from(value: StyleMap) -> Self {
        PropValue::Style(value)
    }
}

impl From<Transform> for PropValue {
    fn from(value: Transform) -> Self {
        PropValue::Transform(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

/// What a single prop patch does to an element.
#[derive(Debug, Clone)]
pub enum PropPatch {
    /// Replace (or clear) the element's style.
    Style(Option<StyleMap>),
    /// Replace (or clear) the element's paint-time transform.
    Transform(Option<Transform>),
    /// No effect on terminal output.
    Ignored,
}

impl PropPatch {
    pub fn classify(key: &str, next: Option<&PropValue>) -> Self {
        match (key, next) {
            ("style", None | Some(PropValue::Null)) => PropPatch::Style(None),
            ("style", Some(PropValue::Style(style))) => PropPatch::Style(Some(style.clone())),
            ("transform", None | Some(PropValue::Null)) => PropPatch::Transform(None),
            ("transform", Some(PropValue::Transform(f))) => PropPatch::Transform(Some(f.clone())),
            ("style" | "transform", Some(other)) => {
                warn!(key, value = ?other, "prop value has the wrong shape; ignored");
                PropPatch::Ignored
            }
            _ => {
                trace!(key, "prop has no terminal meaning");
                PropPatch::Ignored
            }
        }
    }
}
