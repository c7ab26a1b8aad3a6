//! Reconciler - the two-phase walk that diffs descriptions and builds host nodes.
//!
//! # Architecture
//!
//! ```text
//! begin_work (pre-order)      decide a fiber's children, diff them against
//!        │                    the current children (child.rs)
//!        ▼
//! complete_work (post-order)  create host nodes on mount, prepare property
//!                             deltas on update, bubble flags and lanes
//! ```
//!
//! Neither phase touches a host node that is already attached. Everything
//! visible happens later, in [`crate::commit`].

mod begin;
mod child;
mod complete;
pub mod props_diff;

pub(crate) use begin::begin_work;
pub(crate) use complete::complete_work;
pub use props_diff::{diff_properties, ListenerChange, UpdatePayload};
