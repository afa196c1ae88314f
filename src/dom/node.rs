//! Node types stored in the node tree arena.

use std::fmt;
use std::sync::Arc;

use crate::layout::{LayoutId, StyleMap};
use crate::types::Tag;

/// Handle to a node in a [`NodeTree`](super::NodeTree).
///
/// Copyable and cheap. A handle whose node has been removed is stale: every
/// tree operation treats it as "no node" instead of reaching a reused slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot of this handle.
    #[inline]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}v{}", self.index, self.generation)
    }
}

/// The three node variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// Paint-time post-processing of rendered text.
///
/// Called with each output line and its index within the element.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(&str, usize) -> String + Send + Sync>);

impl Transform {
    pub fn new(f: impl Fn(&str, usize) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn apply(&self, line: &str, index: usize) -> String {
        (self.0)(line, index)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

#[derive(Debug)]
pub(crate) struct ElementData {
    pub tag: Tag,
    pub children: Vec<NodeId>,
    pub style: Option<StyleMap>,
    pub transform: Option<Transform>,
    pub layout: Option<LayoutId>,
}

impl ElementData {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            children: Vec::new(),
            style: None,
            transform: None,
            layout: None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
    Comment(String),
}

#[derive(Debug)]
pub(crate) struct Node {
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self { parent: None, data }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
        }
    }

    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element(el) => &el.children,
            _ => &[],
        }
    }
}
