//! Lifecycle Pipeline
//!
//! Connects the node tree to the terminal and to the life of the process.
//!
//! # Pipeline Architecture
//!
//! ```text
//! reconciler -> TermHost -> FrameScheduler (dirty) -> flush -> render_frame -> LogUpdate
//!                                   ^                                 |
//!                           resize listener              termination handler -> ExitHandle
//! ```
//!
//! ## Key Design Principles
//!
//! - **Mutations never paint**: they mark the scheduler; `flush` paints once
//! - **One termination slot**: registered at mount, released at unmount
//! - **Idempotent teardown**: `unmount` may be called from any path, any number of times

mod exit;
pub mod lifecycle;
mod mount;
mod scheduler;

pub(crate) use lifecycle::lock_or_recover;

pub use exit::ExitHandle;
pub use lifecycle::{
    ExitNotifier, ExitSignal, ManualLifecycle, ProcessLifecycle, SignalHookLifecycle, Termination,
    TerminationHandler, TerminationRegistration,
};
pub use mount::{App, AppHandle, AppOptions, MountContext, Reconciler};
pub use scheduler::{Dirty, FrameScheduler};
