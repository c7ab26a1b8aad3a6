//! # spark-fiber
//!
//! Incremental, interruptible tree reconciler for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for
//! commit notifications, [taffy](https://docs.rs/taffy) for laying out the
//! host tree and [crossterm](https://docs.rs/crossterm) for pointer input.
//!
//! ## Architecture
//!
//! Every position in the rendered tree is backed by a *fiber* stored in an
//! arena. A render builds a work-in-progress tree next to the committed one,
//! one unit of work at a time, so a pass can yield to a deadline between units
//! and resume later. Host mutations are collected as flags on the fibers and
//! applied in a single commit:
//!
//! ```text
//! render(element)
//!     → begin_work / complete_work      (interruptible, no host writes)
//!     → commit_root                     (atomic: deletions, placements, updates)
//!     → current ↔ work-in-progress swap
//! ```
//!
//! Handler props (`onClick`, ...) never reach the host. One listener per
//! event type sits on the container and routes native events back through
//! the fiber tree.
//!
//! ## Modules
//!
//! - [`types`] - Props, children, keys, refs, handlers
//! - [`element`] - Element descriptions and `create_element`
//! - [`component`] - Function and class components, state updates
//! - [`fiber`] - Fiber arena, effect flags, lanes, update queues
//! - [`reconciler`] - Begin/complete phases and the keyed child diff
//! - [`scheduler`] - Deadline-driven work loop
//! - [`commit`] - Applying a finished tree to the host
//! - [`events`] - Synthetic events and delegation
//! - [`host`] - The host adapter trait and an in-memory host
//! - [`root`] - Root handles: render, flush, dispatch, unmount
//! - [`layout`] - Flexbox layout of the in-memory host tree
//! - [`input`] - Terminal pointer input as native events

pub mod commit;
pub mod component;
pub mod config;
pub mod element;
pub mod error;
pub mod events;
pub mod fiber;
pub mod host;
pub mod input;
pub mod layout;
pub mod reconciler;
pub mod root;
pub mod scheduler;
pub mod types;

// Re-export commonly used items
pub use types::{
    Child, Children, EventHandler, Key, NodeRef, PropValue, Props, StateMap, Style,
};

pub use element::{create_element, h, Element, ElementType};

pub use component::{ClassComponent, Component, FunctionComponent, RenderContext, Updater};

pub use fiber::{FiberId, FiberTag, Flags, Lanes};

pub use root::{create_root, create_root_with_config, DispatchResult, Root};

pub use config::{EventSystem, RootConfig};

pub use error::{FiberError, Result};

pub use scheduler::{Deadline, StepBudget, TimeSlice, Unbounded, WorkStatus};

pub use commit::CommitSummary;

pub use events::{EventDetail, Modifiers, MouseButton, NativeEvent, SyntheticEvent};

pub use host::{HostAdapter, HostNodeId, HostOp, MemoryHost};

pub use layout::{compute_layout, ComputedLayout, LayoutRect};
