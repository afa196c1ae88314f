//! NodeTree - the node arena and its layout mirror.
//!
//! Manages the lifecycle of nodes:
//! - Generational slots with a free list for O(1) reuse
//! - Parent/child bookkeeping with DOM `insertBefore` semantics
//! - Layout nodes created lazily and kept in the same relative order as
//!   their owners
//! - Post-order destruction that frees layout subtrees with their owners

use tracing::{debug, error, trace, warn};

use crate::error::LayoutResult;
use crate::layout::{measure_text, LayoutBridge, LayoutId, MeasureContext, StyleMap};
use crate::types::Tag;

use super::node::{ElementData, Node, NodeData, NodeId, NodeKind, Transform};

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// The node tree plus the layout tree that mirrors it.
pub struct NodeTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    layout: LayoutBridge,
}

fn log_layout(result: LayoutResult<()>) {
    if let Err(err) = result {
        error!(%err, "layout bridge operation failed");
    }
}

fn node_in(slots: &[Slot], id: NodeId) -> Option<&Node> {
    let slot = slots.get(id.index())?;
    if slot.generation != id.generation() {
        return None;
    }
    slot.node.as_ref()
}

/// Flattened text below `id`: text values, spans with their transforms
/// applied, `newline` elements as `\n`. Comments contribute nothing.
fn text_content_in(slots: &[Slot], id: NodeId, out: &mut String) {
    let Some(node) = node_in(slots, id) else {
        return;
    };
    match &node.data {
        NodeData::Text(value) => out.push_str(value),
        NodeData::Comment(_) => {}
        NodeData::Element(el) => match el.tag {
            Tag::Newline => out.push('\n'),
            _ => {
                let mut inner = String::new();
                for &child in &el.children {
                    text_content_in(slots, child, &mut inner);
                }
                match (&el.transform, el.tag) {
                    (Some(transform), Tag::Span) => out.push_str(&transform.apply(&inner, 0)),
                    _ => out.push_str(&inner),
                }
            }
        },
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            layout: LayoutBridge::new(),
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    fn allocate(&mut self, data: NodeData) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(Node::new(data));
            return NodeId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(Node::new(data)),
        });
        NodeId::new(index, 0)
    }

    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return;
        };
        if slot.generation != id.generation() || slot.node.take().is_none() {
            return;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        self.live -= 1;
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: Tag) -> NodeId {
        self.allocate(NodeData::Element(ElementData::new(tag)))
    }

    /// Create the root element. The root always owns a layout node.
    pub fn create_root(&mut self) -> NodeId {
        let root = self.create_element(Tag::Root);
        self.ensure_layout(root);
        root
    }

    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.allocate(NodeData::Text(value.into()))
    }

    pub fn create_comment(&mut self, value: impl Into<String>) -> NodeId {
        self.allocate(NodeData::Comment(value.into()))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    fn get(&self, id: NodeId) -> Option<&Node> {
        node_in(&self.slots, id)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.element()
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        self.element(id).map(|el| el.tag)
    }

    /// Value of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.get(id)?.data {
            NodeData::Text(value) | NodeData::Comment(value) => Some(value),
            NodeData::Element(_) => None,
        }
    }

    /// Children of `id` (empty for non-elements and stale handles).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// The child following `id` in its parent, if any.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|&c| c == id)?;
        siblings.get(position + 1).copied()
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleMap> {
        self.element(id)?.style.as_ref()
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.element(id)?.transform.as_ref()
    }

    pub fn layout_id(&self, id: NodeId) -> Option<LayoutId> {
        self.element(id)?.layout
    }

    pub fn layout(&self) -> &LayoutBridge {
        &self.layout
    }

    /// Flattened text content below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        text_content_in(&self.slots, id, &mut out);
        out
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.parent(node) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Insert `node` under `parent`, before `anchor` when it is a child of
    /// `parent`, otherwise last.
    ///
    /// An attached node is moved: it is unlinked from its old position first.
    pub fn insert(&mut self, node: NodeId, parent: NodeId, anchor: Option<NodeId>) {
        if !self.contains(node) || !self.contains(parent) {
            debug!(%node, %parent, "insert with stale handle ignored");
            return;
        }
        if self.element(parent).is_none() {
            warn!(%node, %parent, "insert into a node that cannot hold children ignored");
            return;
        }
        if node == parent || self.is_ancestor(node, parent) {
            warn!(%node, %parent, "insert would create a cycle; ignored");
            return;
        }
        if anchor == Some(node) && self.parent(node) == Some(parent) {
            trace!(%node, "insert before itself is a no-op");
            return;
        }

        self.unlink(node);

        let index = {
            let siblings = self.children(parent);
            anchor
                .and_then(|a| siblings.iter().position(|&c| c == a))
                .unwrap_or(siblings.len())
        };
        if let Some(el) = self.get_mut(parent).and_then(Node::element_mut) {
            el.children.insert(index, node);
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = Some(parent);
        }

        if self.ensure_layout(node).is_some() {
            self.attach_layout(node);
        }
        self.mark_measure_dirty(parent);
    }

    /// Destroy `node` and its subtree, children before parents.
    ///
    /// Removing a detached node still destroys its descendants. Removing a
    /// stale handle does nothing.
    pub fn remove(&mut self, node: NodeId) {
        if !self.contains(node) {
            debug!(%node, "remove of a stale node ignored");
            return;
        }

        let children = self.children(node).to_vec();
        for child in children {
            self.remove(child);
        }

        self.detach(node);
        self.release(node);
    }

    /// Unlink `node` from its parent in both trees without freeing anything.
    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.excise(parent, node);
        if let Some(child_layout) = self.layout_id(node) {
            if let Some(parent_layout) = self.layout.parent(child_layout) {
                log_layout(self.layout.remove_child(parent_layout, child_layout));
            }
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = None;
        }
        self.mark_measure_dirty(parent);
    }

    /// Unlink `node` and free its layout subtree as one step.
    fn detach(&mut self, node: NodeId) {
        let parent = self.parent(node);
        if let Some(parent) = parent {
            self.excise(parent, node);
        }

        let layout = self
            .get_mut(node)
            .and_then(Node::element_mut)
            .and_then(|el| el.layout.take());
        if let Some(child_layout) = layout {
            if let Some(parent_layout) = self.layout.parent(child_layout) {
                log_layout(self.layout.remove_child(parent_layout, child_layout));
            }
            log_layout(self.layout.unset_measure_func(child_layout));
            log_layout(self.layout.free_recursive(child_layout));
        }

        if let Some(n) = self.get_mut(node) {
            n.parent = None;
        }
        if let Some(parent) = parent {
            self.mark_measure_dirty(parent);
        }
    }

    fn excise(&mut self, parent: NodeId, node: NodeId) {
        let Some(el) = self.get_mut(parent).and_then(Node::element_mut) else {
            return;
        };
        match el.children.iter().position(|&c| c == node) {
            Some(index) => {
                el.children.remove(index);
            }
            None => trace!(%parent, %node, "node missing from parent's children"),
        }
    }

    // =========================================================================
    // Layout mirror
    // =========================================================================

    /// Create the element's layout node if its tag participates in layout.
    fn ensure_layout(&mut self, id: NodeId) -> Option<LayoutId> {
        let (tag, existing, style) = {
            let el = self.element(id)?;
            (el.tag, el.layout, el.style.clone())
        };
        if !tag.participates_in_layout() {
            return None;
        }
        if existing.is_some() {
            return existing;
        }

        let layout = match self.layout.create_layout_node(tag) {
            Ok(layout) => layout,
            Err(err) => {
                error!(node = %id, %err, "failed to create layout node");
                return None;
            }
        };
        if let Some(style) = &style {
            log_layout(self.layout.apply_style(layout, tag, style));
        }
        if tag.is_measured() {
            log_layout(self.layout.set_measure_func(layout, MeasureContext { node: id }));
        }
        if let Some(el) = self.get_mut(id).and_then(Node::element_mut) {
            el.layout = Some(layout);
        }
        Some(layout)
    }

    /// Link the element's layout node under its parent's layout node at the
    /// position matching its DOM position among layout-owning siblings.
    fn attach_layout(&mut self, id: NodeId) {
        let Some(child_layout) = self.layout_id(id) else {
            return;
        };
        let Some(parent) = self.parent(id) else {
            return;
        };
        if self.layout.parent(child_layout).is_some() {
            return;
        }

        let Some(parent_tag) = self.tag(parent) else {
            return;
        };
        if !parent_tag.participates_in_layout() || parent_tag.is_measured() {
            warn!(node = %id, parent = %parent, tag = %parent_tag, "layout element under inline content left unlinked");
            return;
        }
        let Some(parent_layout) = self.ensure_layout(parent) else {
            return;
        };
        if self.layout.parent(parent_layout).is_none() {
            self.attach_layout(parent);
        }

        let index = self
            .children(parent)
            .iter()
            .take_while(|&&c| c != id)
            .filter(|&&c| self.layout_id(c).is_some())
            .count();
        log_layout(self.layout.insert_child(parent_layout, child_layout, index));
    }

    /// Invalidate the measured text element that owns content at `from`.
    fn mark_measure_dirty(&mut self, from: NodeId) {
        let mut current = Some(from);
        while let Some(id) = current {
            let Some(el) = self.element(id) else {
                current = self.parent(id);
                continue;
            };
            if el.tag.is_measured() {
                if let Some(layout) = el.layout {
                    log_layout(self.layout.mark_dirty(layout));
                }
                return;
            }
            if el.tag.participates_in_layout() {
                return;
            }
            current = self.parent(id);
        }
    }

    /// Compute layout for the subtree at `root`, `width` columns wide.
    pub fn compute_layout(&mut self, root: NodeId, width: u16) -> LayoutResult<()> {
        let Some(root_layout) = self.layout_id(root) else {
            return Err(crate::error::LayoutError::Detached);
        };
        let slots = &self.slots;
        self.layout.compute(root_layout, width, |ctx, known, available| {
            let mut text = String::new();
            text_content_in(slots, ctx.node, &mut text);
            measure_text(&text, known, available)
        })
    }

    // =========================================================================
    // Content
    // =========================================================================

    /// Set the value of a text/comment node, or the text of an element.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        match self.kind(node) {
            Some(NodeKind::Text | NodeKind::Comment) => {
                if let Some(n) = self.get_mut(node) {
                    if let NodeData::Text(value) | NodeData::Comment(value) = &mut n.data {
                        value.clear();
                        value.push_str(text);
                    }
                }
                if let Some(parent) = self.parent(node) {
                    self.mark_measure_dirty(parent);
                }
            }
            Some(NodeKind::Element) => {
                debug!(%node, "set_text on an element redirected to its text child");
                self.set_element_text(node, text);
            }
            None => debug!(%node, "set_text on a stale node ignored"),
        }
    }

    /// Replace the element's single direct text child's value, creating the
    /// child if needed. Extra direct text children are collapsed away.
    pub fn set_element_text(&mut self, node: NodeId, text: &str) {
        if self.element(node).is_none() {
            warn!(%node, "set_element_text on a non-element; treating as set_text");
            if self.contains(node) {
                self.set_text(node, text);
            }
            return;
        }

        let text_children: Vec<NodeId> = self
            .children(node)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == Some(NodeKind::Text))
            .collect();

        match text_children.split_first() {
            Some((&first, rest)) => {
                for &extra in rest {
                    debug!(%node, extra = %extra, "collapsing extra text child");
                    self.remove(extra);
                }
                self.set_text(first, text);
            }
            None => {
                let child = self.create_text(text);
                self.insert(child, node, None);
            }
        }
    }

    /// Replace the element's style and push it to its layout node.
    pub fn set_style(&mut self, node: NodeId, style: Option<StyleMap>) {
        let Some(el) = self.get_mut(node).and_then(Node::element_mut) else {
            warn!(%node, "style patch on a non-element ignored");
            return;
        };
        el.style = style;
        let tag = el.tag;
        if !tag.participates_in_layout() {
            trace!(%node, %tag, "style stored on an inline element");
            return;
        }

        match self.layout_id(node) {
            Some(layout) => {
                let style = self.style(node).cloned().unwrap_or_default();
                log_layout(self.layout.apply_style(layout, tag, &style));
            }
            None => {
                // ensure_layout applies the stored style
                if self.ensure_layout(node).is_some() {
                    self.attach_layout(node);
                }
            }
        }
    }

    pub fn set_transform(&mut self, node: NodeId, transform: Option<Transform>) {
        let Some(el) = self.get_mut(node).and_then(Node::element_mut) else {
            warn!(%node, "transform patch on a non-element ignored");
            return;
        };
        el.transform = transform;
        if let Some(parent) = self.parent(node) {
            self.mark_measure_dirty(parent);
        }
    }

    // =========================================================================
    // Invariants
    // =========================================================================

    /// Verify parent/child bookkeeping and the layout mirror.
    ///
    /// Returns a description of the first violation found.
    pub fn check_consistency(&self) -> Result<(), String> {
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(node) = &slot.node else { continue };
            let id = NodeId::new(index as u32, slot.generation);

            if let Some(parent) = node.parent {
                let count = self.children(parent).iter().filter(|&&c| c == id).count();
                if count != 1 {
                    return Err(format!("{id} appears {count} times in its parent {parent}"));
                }
            }

            let Some(el) = node.element() else { continue };
            for &child in &el.children {
                if self.parent(child) != Some(id) {
                    return Err(format!("{child} is a child of {id} but points elsewhere"));
                }
            }

            if let Some(layout) = el.layout {
                // Measured leaves never hold layout children.
                let expected: Vec<LayoutId> = if el.tag.is_measured() {
                    Vec::new()
                } else {
                    el.children.iter().filter_map(|&c| self.layout_id(c)).collect()
                };
                let actual = self.layout.children(layout).map_err(|e| e.to_string())?;
                if expected != actual {
                    return Err(format!("layout children of {id} diverge from its element children"));
                }
            }
        }
        Ok(())
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}
