//! Layout - flexbox over a memory host tree, for terminal hosts.
//!
//! Uses [Taffy](https://github.com/DioxusLabs/taffy) for W3C-compliant
//! flexbox computation. The bridge:
//!
//! 1. Converts each element's style map → Taffy style
//! 2. Builds the Taffy tree from the host tree
//! 3. Measures text leaves in terminal cells
//! 4. Flattens the result into absolute boxes and a hit grid
//!
//! Pointer input uses the result to find the node under the cursor
//! (see [`crate::input`]).
//!
//! # Example
//!
//! ```ignore
//! use spark_fiber::layout::compute_layout;
//!
//! let layout = compute_layout(&host, container, 80, 24);
//! let target = layout.hit_test(10, 3);
//! ```

mod taffy_bridge;
mod text_measure;
mod types;

pub use taffy_bridge::compute_layout;
pub use text_measure::{measure_text_height, string_width};
pub use types::{ComputedLayout, Dimension, FlexDirection, HitGrid, LayoutRect};
