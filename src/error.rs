//! Errors returned by root entry points.

use std::fmt;

use crate::fiber::FiberId;

pub type Result<T> = std::result::Result<T, FiberError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberError {
    /// The root was unmounted; it accepts no more work.
    Unmounted,
    /// Called while the root is already busy, e.g. `render` from inside a
    /// handler that runs during commit.
    Reentrant,
    /// The fiber is not (or no longer) part of this root.
    UnknownFiber(FiberId),
}

impl fmt::Display for FiberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberError::Unmounted => write!(f, "root has been unmounted"),
            FiberError::Reentrant => write!(f, "root is already borrowed by a running pass"),
            FiberError::UnknownFiber(id) => write!(f, "unknown fiber {:?}", id),
        }
    }
}

impl std::error::Error for FiberError {}
