//! Node Tree Model
//!
//! The in-memory tree the reconciler mutates: elements, text and comments
//! in a generational arena, with the layout tree kept in lockstep.
//!
//! ```text
//! root ─ box ─┬─ text ─ "hi"      layout:  root ─ box ─ text
//!             └─ <!-- comment -->
//! ```

mod node;
mod tree;

pub use node::{NodeId, NodeKind, Transform};
pub use tree::NodeTree;
