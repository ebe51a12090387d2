//! Cycle detection for nested resolutions.

use std::cell::RefCell;

use crate::error::{DiError, DiResult};

pub(crate) const DEFAULT_MAX_DEPTH: usize = 1024;

// Thread-local resolution state for cycle detection
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

/// What a frame on the resolution stack is resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// A bound identifier being produced by its lifecycle entry
    Binding,
    /// A class being constructed
    Class,
    /// One named plan argument of a class being resolved
    Argument,
}

/// Stack key of plan argument `name` of the class keyed `class`.
pub(crate) fn argument_key(class: &str, name: &str) -> String {
    format!("{class}\0{name}")
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    key: String,
    display: String,
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<Frame>,
}

/// Guard for one frame of the thread-local resolution stack.
///
/// Entering an identifier already on the stack (with the same kind) fails with
/// [`DiError::CyclicDependency`] instead of recursing. The frame is popped when
/// the guard drops, including on early return through `?`.
pub(crate) struct StackGuard {
    depth: usize,
}

impl StackGuard {
    pub(crate) fn enter(kind: FrameKind, key: &str, display: &str, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();

            if tls.stack.iter().any(|f| f.kind == kind && f.key == key) {
                let mut path: Vec<String> = tls
                    .stack
                    .iter()
                    .skip_while(|f| !(f.kind == kind && f.key == key))
                    .filter(|f| f.kind != FrameKind::Binding || !path_has_class(&tls.stack, &f.key))
                    .map(|f| f.display.clone())
                    .collect();
                path.push(display.to_string());
                tracing::debug!(path = %path.join(" -> "), "cyclic dependency detected");
                return Err(DiError::CyclicDependency(path));
            }

            if tls.stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(tls.stack.len()));
            }

            tls.stack.push(Frame {
                kind,
                key: key.to_string(),
                display: display.to_string(),
            });
            Ok(Self { depth: tls.stack.len() })
        })
    }
}

// A binding that simply constructs its own class shows up twice on the stack;
// keep only the class frame in reported paths.
fn path_has_class(stack: &[Frame], key: &str) -> bool {
    stack.iter().any(|f| f.kind == FrameKind::Class && f.key == key)
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            debug_assert_eq!(tls.stack.len(), self.depth);
            tls.stack.pop();
        });
    }
}

/// Current nesting depth on this thread.
#[cfg(test)]
pub(crate) fn current_depth() -> usize {
    RESOLUTION_TLS.with(|tls| tls.borrow().stack.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentry_reports_path() {
        let _a = StackGuard::enter(FrameKind::Class, "a", "A", DEFAULT_MAX_DEPTH).unwrap();
        let _b = StackGuard::enter(FrameKind::Class, "b", "B", DEFAULT_MAX_DEPTH).unwrap();
        match StackGuard::enter(FrameKind::Class, "a", "A", DEFAULT_MAX_DEPTH) {
            Err(DiError::CyclicDependency(path)) => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn kinds_do_not_collide() {
        let _binding = StackGuard::enter(FrameKind::Binding, "w", "W", DEFAULT_MAX_DEPTH).unwrap();
        assert!(StackGuard::enter(FrameKind::Class, "w", "W", DEFAULT_MAX_DEPTH).is_ok());
    }

    #[test]
    fn arguments_are_keyed_per_name() {
        let _class = StackGuard::enter(FrameKind::Class, "w", "W", DEFAULT_MAX_DEPTH).unwrap();
        let _n = StackGuard::enter(FrameKind::Argument, &argument_key("w", "n"), "W.n", DEFAULT_MAX_DEPTH).unwrap();
        assert!(StackGuard::enter(FrameKind::Argument, &argument_key("w", "m"), "W.m", DEFAULT_MAX_DEPTH).is_ok());
        match StackGuard::enter(FrameKind::Argument, &argument_key("w", "n"), "W.n", DEFAULT_MAX_DEPTH) {
            Err(DiError::CyclicDependency(path)) => assert_eq!(path, vec!["W.n", "W.n"]),
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn guards_pop_on_drop() {
        {
            let _g = StackGuard::enter(FrameKind::Class, "x", "X", DEFAULT_MAX_DEPTH).unwrap();
            assert_eq!(current_depth(), 1);
        }
        assert_eq!(current_depth(), 0);
    }

    #[test]
    fn depth_limit() {
        let _a = StackGuard::enter(FrameKind::Class, "a", "A", 1).unwrap();
        assert!(matches!(
            StackGuard::enter(FrameKind::Class, "b", "B", 1),
            Err(DiError::DepthExceeded(1))
        ));
    }
}
