//! # spark-tui-host
//!
//! Terminal renderer host for declarative component trees.
//!
//! A reconciliation engine drives fine-grained tree mutations through
//! [`RendererHost`]. The host keeps a node tree and a Taffy layout tree in
//! lockstep, paints the tree to a plain-text frame and repaints the terminal
//! in place, log-update style.
//!
//! ## Architecture
//!
//! ```text
//! Reconciler -> TermHost -> NodeTree + LayoutBridge -> render_frame -> LogUpdate -> terminal
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Element tags and flex keyword enums
//! - [`dom`] - Node tree model (arena + layout mirror)
//! - [`layout`] - Taffy bridge, style maps, text measurement
//! - [`host`] - Renderer host adapter
//! - [`renderer`] - Frame painting and inline repaint
//! - [`terminal`] - Output streams
//! - [`pipeline`] - Mount/unmount lifecycle and the exit-wait handle
//! - [`logging`] - Tracing subscriber setup

pub mod dom;
pub mod error;
pub mod host;
pub mod layout;
pub mod logging;
pub mod pipeline;
pub mod renderer;
pub mod terminal;
pub mod types;

pub use types::*;

pub use dom::{NodeId, NodeKind, NodeTree, Transform};
pub use error::{ExitError, LayoutError, LoggingError, TagError};
pub use host::{PropPatch, PropValue, RendererHost, TermHost};
pub use layout::{LayoutBridge, StyleMap, StyleValue};
pub use pipeline::{
    App, AppHandle, AppOptions, ExitHandle, ExitSignal, ManualLifecycle, MountContext,
    ProcessLifecycle, Reconciler, SignalHookLifecycle, Termination,
};
pub use renderer::{render_frame, LogUpdate};
pub use terminal::{BufferStream, OutputStream, StdoutStream};
