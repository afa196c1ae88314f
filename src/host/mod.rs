//! Renderer host adapter: the surface a reconciler drives.

mod adapter;
mod props;

pub use adapter::{RendererHost, TermHost};
pub use props::{PropPatch, PropValue};
