//! Renderer host adapter.
//!
//! [`RendererHost`] is the contract a reconciler drives. [`TermHost`]
//! implements it over a [`NodeTree`]. Every call is synchronous, none of
//! them repaint, and malformed calls are logged and degrade instead of
//! panicking.

use tracing::{debug, error, trace};

use crate::dom::{NodeId, NodeTree};
use crate::pipeline::Dirty;
use crate::types::Tag;

use super::props::{PropPatch, PropValue};

/// Tree-mutation interface consumed by a reconciliation engine.
pub trait RendererHost {
    fn create_element(&mut self, tag: Tag) -> NodeId;
    fn create_text(&mut self, value: &str) -> NodeId;
    fn create_comment(&mut self, value: &str) -> NodeId;

    /// Insert `node` under `parent` before `anchor` (appends when `anchor`
    /// is absent or not a child of `parent`).
    fn insert(&mut self, node: NodeId, parent: NodeId, anchor: Option<NodeId>);
    fn remove(&mut self, node: NodeId);

    fn patch_prop(
        &mut self,
        node: NodeId,
        key: &str,
        prev: Option<&PropValue>,
        next: Option<&PropValue>,
    );

    fn set_element_text(&mut self, node: NodeId, text: &str);
    fn set_text(&mut self, node: NodeId, text: &str);

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Node cloning is not supported; implementations return `node`.
    fn clone_node(&mut self, node: NodeId) -> NodeId;
}

/// Terminal host: the node tree plus what changed since the last paint.
pub struct TermHost {
    tree: NodeTree,
    dirty: Dirty,
}

impl TermHost {
    pub fn new() -> Self {
        Self {
            tree: NodeTree::new(),
            dirty: Dirty::empty(),
        }
    }

    /// Create an element from a tag name.
    ///
    /// Unknown names are a caller error; they are logged and a `box` is
    /// created in their place.
    pub fn create_element_named(&mut self, name: &str) -> NodeId {
        let tag = match name.parse::<Tag>() {
            Ok(tag) => tag,
            Err(err) => {
                error!(%err, "falling back to box");
                Tag::Box
            }
        };
        self.create_element(tag)
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    /// What the mutations since the last call invalidated, clearing it.
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }

    fn touch(&mut self, dirty: Dirty) {
        self.dirty |= dirty;
    }
}

impl Default for TermHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererHost for TermHost {
    fn create_element(&mut self, tag: Tag) -> NodeId {
        let node = self.tree.create_element(tag);
        trace!(%node, %tag, "create_element");
        node
    }

    fn create_text(&mut self, value: &str) -> NodeId {
        self.tree.create_text(value)
    }

    fn create_comment(&mut self, value: &str) -> NodeId {
        self.tree.create_comment(value)
    }

    fn insert(&mut self, node: NodeId, parent: NodeId, anchor: Option<NodeId>) {
        trace!(%node, %parent, anchor = ?anchor, "insert");
        self.tree.insert(node, parent, anchor);
        self.touch(Dirty::ALL);
    }

    fn remove(&mut self, node: NodeId) {
        trace!(%node, "remove");
        self.tree.remove(node);
        self.touch(Dirty::ALL);
    }

    fn patch_prop(
        &mut self,
        node: NodeId,
        key: &str,
        _prev: Option<&PropValue>,
        next: Option<&PropValue>,
    ) {
        let dirty = match PropPatch::classify(key, next) {
            PropPatch::Style(style) => {
                self.tree.set_style(node, style);
                Dirty::ALL
            }
            // Line transforms run at paint time; span transforms change
            // the measured text.
            PropPatch::Transform(transform) => {
                let paint_only = self.tree.tag(node) == Some(Tag::Text);
                self.tree.set_transform(node, transform);
                if paint_only { Dirty::PAINT } else { Dirty::ALL }
            }
            PropPatch::Ignored => return,
        };
        self.touch(dirty);
    }

    fn set_element_text(&mut self, node: NodeId, text: &str) {
        self.tree.set_element_text(node, text);
        self.touch(Dirty::ALL);
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.tree.set_text(node, text);
        self.touch(Dirty::ALL);
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.next_sibling(node)
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        debug!(%node, "clone_node is unsupported; returning the original");
        node
    }
}
