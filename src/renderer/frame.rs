//! Frame painting: node tree + computed layout -> frame string.

use tracing::trace;

use crate::dom::{NodeId, NodeTree};
use crate::error::LayoutResult;
use crate::layout::wrap_text;
use crate::types::Tag;

use super::canvas::{Canvas, ClipRect};

/// Lay out `root` at `width` columns and paint it.
///
/// Text elements are painted at their absolute content position, wrapped
/// to their content width. A text element's transform is applied to each
/// wrapped line. Comments and bare text outside a `text` element never
/// paint.
pub fn render_frame(tree: &mut NodeTree, root: NodeId, width: u16) -> LayoutResult<String> {
    tree.compute_layout(root, width)?;
    paint_frame(tree, root, width)
}

/// Paint `root` using the layout computed by the last [`render_frame`].
pub fn paint_frame(tree: &NodeTree, root: NodeId, width: u16) -> LayoutResult<String> {
    let Some(root_layout) = tree.layout_id(root) else {
        return Ok(String::new());
    };
    let root_box = tree.layout().layout(root_layout)?;

    let mut canvas = Canvas::new(width, root_box.height);
    paint(tree, root, 0, 0, &mut canvas)?;
    Ok(canvas.to_frame())
}

fn paint(tree: &NodeTree, node: NodeId, origin_x: u16, origin_y: u16, canvas: &mut Canvas) -> LayoutResult<()> {
    let Some(layout) = tree.layout_id(node) else {
        trace!(%node, "no layout node; not painted");
        return Ok(());
    };
    let computed = tree.layout().layout(layout)?;
    let x = origin_x.saturating_add(computed.x);
    let y = origin_y.saturating_add(computed.y);

    if tree.tag(node) == Some(Tag::Text) {
        if computed.content_width == 0 || computed.content_height == 0 {
            return Ok(());
        }
        let content_x = x.saturating_add(computed.content_x);
        let content_y = y.saturating_add(computed.content_y);
        let clip = ClipRect::new(content_x, content_y, computed.content_width, computed.content_height);

        let text = tree.text_content(node);
        let transform = tree.transform(node);
        for (index, line) in wrap_text(&text, computed.content_width).iter().enumerate() {
            let row = content_y.saturating_add(index as u16);
            match transform {
                Some(f) => canvas.draw_text(content_x, row, &f.apply(line, index), Some(&clip)),
                None => canvas.draw_text(content_x, row, line, Some(&clip)),
            };
        }
        return Ok(());
    }

    for &child in tree.children(node) {
        paint(tree, child, x, y, canvas)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Transform;
    use crate::layout::StyleMap;

    fn text(tree: &mut NodeTree, parent: NodeId, value: &str) -> NodeId {
        let label = tree.create_element(Tag::Text);
        tree.insert(label, parent, None);
        tree.set_element_text(label, value);
        label
    }

    #[test]
    fn test_single_text() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        text(&mut tree, root, "hi");

        assert_eq!(render_frame(&mut tree, root, 80).unwrap(), "hi");
    }

    #[test]
    fn test_empty_root_is_empty_frame() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        assert_eq!(render_frame(&mut tree, root, 80).unwrap(), "");
    }

    #[test]
    fn test_column_stacks_and_row_places_side_by_side() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        text(&mut tree, root, "top");
        let row = tree.create_element(Tag::Box);
        tree.insert(row, root, None);
        text(&mut tree, row, "left");
        text(&mut tree, row, "right");

        assert_eq!(render_frame(&mut tree, root, 80).unwrap(), "top\nleftright");
    }

    #[test]
    fn test_padding_offsets_text() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        let padded = tree.create_element(Tag::Box);
        tree.set_style(padded, Some(StyleMap::new().with("paddingLeft", 2u16).with("paddingTop", 1u16)));
        tree.insert(padded, root, None);
        text(&mut tree, padded, "x");

        assert_eq!(render_frame(&mut tree, root, 20).unwrap(), "\n  x");
    }

    #[test]
    fn test_wraps_to_width() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        text(&mut tree, root, "abcdef");

        assert_eq!(render_frame(&mut tree, root, 4).unwrap(), "abcd\nef");
    }

    #[test]
    fn test_line_transform_and_comments() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        let comment = tree.create_comment("hidden");
        tree.insert(comment, root, None);
        let label = text(&mut tree, root, "a\nb");
        tree.set_transform(label, Some(Transform::new(|line, i| format!("{i}{line}"))));

        assert_eq!(render_frame(&mut tree, root, 80).unwrap(), "0a\n1b");
    }

    #[test]
    fn test_repaint_reuses_layout() {
        let mut tree = NodeTree::new();
        let root = tree.create_root();
        let label = text(&mut tree, root, "ab");
        assert_eq!(render_frame(&mut tree, root, 80).unwrap(), "ab");

        tree.set_transform(label, Some(Transform::new(|line, _| format!(">{line}"))));
        assert_eq!(paint_frame(&tree, root, 80).unwrap(), ">ab");
    }
}
