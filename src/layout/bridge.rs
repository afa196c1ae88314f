//! Layout Bridge - the Taffy collaborator interface.
//!
//! Owns the `TaffyTree` that mirrors the layout-participating elements of the
//! node tree. The node tree drives topology through this bridge; the bridge
//! never reads the node tree except through the measure callback handed to
//! [`LayoutBridge::compute`].

use taffy::{AvailableSpace, Dimension as TaffyDimension, Size, Style, TaffyTree};

use crate::dom::NodeId;
use crate::error::{LayoutError, LayoutResult};
use crate::types::Tag;

use super::style::{build_style, default_style, StyleMap};
use super::text_measure::{string_width, wrap_text};

/// Handle of a node inside the layout engine.
pub type LayoutId = taffy::NodeId;

/// Context attached to measured leaves: the element whose text is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureContext {
    pub node: NodeId,
}

/// Computed geometry of one layout node, relative to its layout parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComputedBox {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    /// Offset of the content box (padding + border) from `x`.
    pub content_x: u16,
    /// Offset of the content box (padding + border) from `y`.
    pub content_y: u16,
    pub content_width: u16,
    pub content_height: u16,
}

/// Thin wrapper over `TaffyTree` exposing only topology and attribute plumbing.
pub struct LayoutBridge {
    tree: TaffyTree<MeasureContext>,
}

impl LayoutBridge {
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
        }
    }

    /// Create a detached layout node with the tag's default style.
    pub fn create_layout_node(&mut self, tag: Tag) -> LayoutResult<LayoutId> {
        Ok(self.tree.new_leaf(default_style(tag))?)
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: LayoutId, child: LayoutId, index: usize) -> LayoutResult<()> {
        let len = self.tree.children(parent)?.len();
        self.tree.insert_child_at_index(parent, index.min(len), child)?;
        Ok(())
    }

    pub fn remove_child(&mut self, parent: LayoutId, child: LayoutId) -> LayoutResult<()> {
        self.tree.remove_child(parent, child)?;
        Ok(())
    }

    pub fn set_measure_func(&mut self, node: LayoutId, context: MeasureContext) -> LayoutResult<()> {
        self.tree.set_node_context(node, Some(context))?;
        Ok(())
    }

    pub fn unset_measure_func(&mut self, node: LayoutId) -> LayoutResult<()> {
        self.tree.set_node_context(node, None)?;
        Ok(())
    }

    /// Free `node` and every layout node below it.
    ///
    /// Children are freed before their parent.
    pub fn free_recursive(&mut self, node: LayoutId) -> LayoutResult<()> {
        for child in self.tree.children(node)? {
            self.free_recursive(child)?;
        }
        self.tree.remove(node)?;
        Ok(())
    }

    /// Replace the node's style with the tag default plus `map`.
    pub fn apply_style(&mut self, node: LayoutId, tag: Tag, map: &StyleMap) -> LayoutResult<()> {
        self.tree.set_style(node, build_style(tag, map))?;
        Ok(())
    }

    /// Invalidate cached measurements (text content changed).
    pub fn mark_dirty(&mut self, node: LayoutId) -> LayoutResult<()> {
        self.tree.mark_dirty(node)?;
        Ok(())
    }

    pub fn children(&self, node: LayoutId) -> LayoutResult<Vec<LayoutId>> {
        Ok(self.tree.children(node)?)
    }

    pub fn parent(&self, node: LayoutId) -> Option<LayoutId> {
        self.tree.parent(node)
    }

    /// Number of live layout nodes (leak checks).
    pub fn node_count(&self) -> usize {
        self.tree.total_node_count()
    }

    /// Compute layout for the tree rooted at `root`, `width` columns wide.
    ///
    /// Height is unconstrained: inline output grows with its content.
    pub fn compute<F>(&mut self, root: LayoutId, width: u16, mut measure: F) -> LayoutResult<()>
    where
        F: FnMut(MeasureContext, Size<Option<f32>>, Size<AvailableSpace>) -> Size<f32>,
    {
        let mut style: Style = self.tree.style(root)?.clone();
        style.size.width = TaffyDimension::Length(f32::from(width));
        self.tree.set_style(root, style)?;

        let available = Size {
            width: AvailableSpace::Definite(f32::from(width)),
            height: AvailableSpace::MaxContent,
        };

        self.tree.compute_layout_with_measure(
            root,
            available,
            |known_dimensions, available_space, _node_id, context, _style| match context {
                Some(&mut ctx) => measure(ctx, known_dimensions, available_space),
                None => Size::ZERO,
            },
        )?;
        Ok(())
    }

    /// Geometry from the last [`compute`](Self::compute).
    pub fn layout(&self, node: LayoutId) -> LayoutResult<ComputedBox> {
        let layout = self.tree.layout(node).map_err(LayoutError::from)?;
        let round = |v: f32| v.max(0.0).round() as u16;

        let content_x = layout.padding.left + layout.border.left;
        let content_y = layout.padding.top + layout.border.top;
        let horizontal = content_x + layout.padding.right + layout.border.right;
        let vertical = content_y + layout.padding.bottom + layout.border.bottom;

        Ok(ComputedBox {
            x: round(layout.location.x),
            y: round(layout.location.y),
            width: round(layout.size.width),
            height: round(layout.size.height),
            content_x: round(content_x),
            content_y: round(content_y),
            content_width: round(layout.size.width - horizontal),
            content_height: round(layout.size.height - vertical),
        })
    }
}

impl Default for LayoutBridge {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TEXT MEASUREMENT
// =============================================================================

/// Intrinsic size of `text` under the layout engine's constraints.
///
/// Wraps with the same rules the painter uses.
pub fn measure_text(
    text: &str,
    known_dimensions: Size<Option<f32>>,
    available_space: Size<AvailableSpace>,
) -> Size<f32> {
    if text.is_empty() {
        return Size::ZERO;
    }

    let wrap_width = match (known_dimensions.width, available_space.width) {
        (Some(w), _) => w.max(1.0) as u16,
        (None, AvailableSpace::Definite(w)) => w.max(1.0) as u16,
        // 0 disables wrapping
        (None, AvailableSpace::MinContent | AvailableSpace::MaxContent) => 0,
    };

    let lines = wrap_text(text, wrap_width);
    let text_width = lines.iter().map(|line| string_width(line)).max().unwrap_or(0);

    Size {
        width: known_dimensions.width.unwrap_or(f32::from(text_width)),
        height: known_dimensions.height.unwrap_or(lines.len() as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;

    fn sized(bridge: &mut LayoutBridge, width: u16, height: u16) -> LayoutId {
        let node = bridge.create_layout_node(Tag::Box).unwrap();
        let style = StyleMap::new().with("width", width).with("height", height);
        bridge.apply_style(node, Tag::Box, &style).unwrap();
        node
    }

    #[test]
    fn test_insert_child_clamps_index() {
        let mut bridge = LayoutBridge::new();
        let parent = bridge.create_layout_node(Tag::Box).unwrap();
        let a = bridge.create_layout_node(Tag::Box).unwrap();
        let b = bridge.create_layout_node(Tag::Box).unwrap();

        bridge.insert_child(parent, a, 10).unwrap();
        bridge.insert_child(parent, b, 0).unwrap();

        assert_eq!(bridge.children(parent).unwrap(), vec![b, a]);
        assert_eq!(bridge.parent(a), Some(parent));
    }

    #[test]
    fn test_free_recursive_releases_subtree() {
        let mut bridge = LayoutBridge::new();
        let parent = bridge.create_layout_node(Tag::Box).unwrap();
        let child = bridge.create_layout_node(Tag::Box).unwrap();
        let grandchild = bridge.create_layout_node(Tag::Text).unwrap();
        bridge.insert_child(parent, child, 0).unwrap();
        bridge.insert_child(child, grandchild, 0).unwrap();
        assert_eq!(bridge.node_count(), 3);

        bridge.remove_child(parent, child).unwrap();
        bridge.free_recursive(child).unwrap();

        assert_eq!(bridge.node_count(), 1);
        assert!(bridge.children(parent).unwrap().is_empty());
    }

    #[test]
    fn test_compute_row_layout() {
        let mut bridge = LayoutBridge::new();
        let root = bridge.create_layout_node(Tag::Box).unwrap();
        let a = sized(&mut bridge, 10, 2);
        let b = sized(&mut bridge, 5, 1);
        bridge.insert_child(root, a, 0).unwrap();
        bridge.insert_child(root, b, 1).unwrap();

        bridge.compute(root, 80, |_, _, _| Size::ZERO).unwrap();

        let root_box = bridge.layout(root).unwrap();
        assert_eq!(root_box.width, 80);
        assert_eq!(root_box.height, 2);
        assert_eq!(bridge.layout(b).unwrap().x, 10);
    }

    #[test]
    fn test_compute_uses_measure_context() {
        let mut bridge = LayoutBridge::new();
        // Row root: the text keeps its intrinsic width instead of stretching.
        let root = bridge.create_layout_node(Tag::Box).unwrap();
        let text = bridge.create_layout_node(Tag::Text).unwrap();
        bridge.insert_child(root, text, 0).unwrap();
        let owner = NodeId::new(7, 0);
        bridge.set_measure_func(text, MeasureContext { node: owner }).unwrap();

        let mut seen = Vec::new();
        bridge
            .compute(root, 20, |ctx, known, avail| {
                seen.push(ctx.node);
                measure_text("hello", known, avail)
            })
            .unwrap();

        assert!(seen.contains(&owner));
        let measured = bridge.layout(text).unwrap();
        assert_eq!(measured.width, 5);
        assert_eq!(measured.height, 1);
    }

    #[test]
    fn test_padding_offsets_content_box() {
        let mut bridge = LayoutBridge::new();
        let root = bridge.create_layout_node(Tag::Root).unwrap();
        let boxed = bridge.create_layout_node(Tag::Box).unwrap();
        let style = StyleMap::new().with("paddingLeft", 2u16).with("paddingTop", 1u16);
        bridge.apply_style(boxed, Tag::Box, &style).unwrap();
        bridge.insert_child(root, boxed, 0).unwrap();

        bridge.compute(root, 40, |_, _, _| Size::ZERO).unwrap();

        let computed = bridge.layout(boxed).unwrap();
        assert_eq!(computed.content_x, 2);
        assert_eq!(computed.content_y, 1);
    }

    #[test]
    fn test_measure_text_wraps_to_available_width() {
        let size = measure_text(
            "hello world",
            Size { width: None, height: None },
            Size {
                width: AvailableSpace::Definite(5.0),
                height: AvailableSpace::MaxContent,
            },
        );
        assert_eq!(size.width, 5.0);
        assert_eq!(size.height, 3.0);
    }
}
