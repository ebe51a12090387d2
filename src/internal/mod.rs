//! Internal implementation details.

pub(crate) mod circular;

pub(crate) use circular::{argument_key, FrameKind, StackGuard, DEFAULT_MAX_DEPTH};
