//! Layout Module
//!
//! Flexbox layout for the node tree using Taffy.
//!
//! # Architecture
//!
//! The layout tree is a projection of the layout-participating elements of
//! the node tree (`root`, `box`, `text`). The bridge:
//!
//! 1. Creates and frees Taffy nodes as the node tree changes
//! 2. Mirrors child order into Taffy
//! 3. Converts style maps to Taffy styles
//! 4. Hands a measure callback to Taffy for text leaves
//!
//! The node tree ([`crate::dom::NodeTree`]) is the only caller that mutates
//! topology, so both trees change together.

mod bridge;
mod style;
mod text_measure;

pub use bridge::{measure_text, ComputedBox, LayoutBridge, LayoutId, MeasureContext};
pub use style::{build_style, default_style, Edges, StyleKey, StyleMap, StyleValue};
pub use text_measure::{char_width, string_width, wrap_text};
