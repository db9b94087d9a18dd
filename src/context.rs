//! Structural path tracking for read/write buffers.
//!
//! Generated parse/serialize routines bracket every message, field and array element
//! with [`Contextual::push_context`] / [`Contextual::pop_context`]. The labels are kept
//! only for diagnostics: every [`CodecError`] raised by a buffer carries the path
//! (`Message/field/element`) that was active when it failed.
//!
//! Prefer [`Contextual::with_context`] over manual push/pop: it restores the exact
//! prior depth even when the enclosed read or write fails.

use crate::codec::CodecError;

/// Path rendered for an empty stack.
pub const ROOT_PATH: &str = "<root>";

/// Stack of named context labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextStack {
    labels: Vec<String>,
}

impl ContextStack {
    pub fn new() -> Self {
        ContextStack { labels: Vec::new() }
    }

    pub fn push(&mut self, name: &str) {
        log::debug!("push context {} (depth {})", name, self.labels.len() + 1);
        self.labels.push(name.to_string());
    }

    /// Pop `name`, which must be the innermost label.
    pub fn pop(&mut self, name: &str) -> Result<(), CodecError> {
        match self.labels.last() {
            Some(top) if top == name => {
                self.labels.pop();
                log::debug!("pop context {} (depth {})", name, self.labels.len());
                Ok(())
            }
            top => Err(CodecError::ContextMismatch {
                expected: name.to_string(),
                found: top.cloned(),
            }),
        }
    }

    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Drop every label above `depth`. Used to unwind after a failed region.
    pub fn truncate(&mut self, depth: usize) {
        if self.labels.len() > depth {
            log::debug!("unwind context {} -> depth {}", self.path(), depth);
            self.labels.truncate(depth);
        }
    }

    /// Labels joined with `/`, or [`ROOT_PATH`] when empty.
    pub fn path(&self) -> String {
        if self.labels.is_empty() {
            ROOT_PATH.to_string()
        } else {
            self.labels.join("/")
        }
    }
}

/// A buffer that tracks a [`ContextStack`].
///
/// Implemented by [`ReadBuffer`](crate::codec::ReadBuffer) and
/// [`WriteBuffer`](crate::codec::WriteBuffer) so generated code can bracket regions
/// the same way in both directions.
pub trait Contextual {
    fn context(&self) -> &ContextStack;

    fn context_mut(&mut self) -> &mut ContextStack;

    fn push_context(&mut self, name: &str) {
        self.context_mut().push(name);
    }

    fn pop_context(&mut self, name: &str) -> Result<(), CodecError> {
        self.context_mut().pop(name)
    }

    /// Current structural path, for diagnostics.
    fn context_path(&self) -> String {
        self.context().path()
    }

    /// Run `f` inside a `name` region. On success the region must be balanced;
    /// on failure the stack is unwound to the depth it had before the call.
    fn with_context<T, F>(&mut self, name: &str, f: F) -> Result<T, CodecError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, CodecError>,
    {
        let depth = self.context().depth();
        self.push_context(name);
        match f(self) {
            Ok(value) => {
                self.pop_context(name)?;
                Ok(value)
            }
            Err(e) => {
                self.context_mut().truncate(depth);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tracker {
        context: ContextStack,
    }

    impl Contextual for Tracker {
        fn context(&self) -> &ContextStack {
            &self.context
        }
        fn context_mut(&mut self) -> &mut ContextStack {
            &mut self.context
        }
    }

    #[test]
    fn empty_stack_renders_root() {
        let stack = ContextStack::new();
        assert_eq!(stack.path(), ROOT_PATH);
        assert!(stack.is_empty());
    }

    #[test]
    fn path_joins_labels() {
        let mut stack = ContextStack::new();
        stack.push("S7Message");
        stack.push("parameter");
        stack.push("items[2]");
        assert_eq!(stack.path(), "S7Message/parameter/items[2]");
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn pop_must_match_top() {
        let mut stack = ContextStack::new();
        stack.push("a");
        stack.push("b");
        let err = stack.pop("a").unwrap_err();
        match err {
            CodecError::ContextMismatch { expected, found } => {
                assert_eq!(expected, "a");
                assert_eq!(found.as_deref(), Some("b"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(stack.depth(), 2, "failed pop must not change the stack");
        stack.pop("b").expect("pop b");
        stack.pop("a").expect("pop a");
        assert!(stack.pop("a").is_err(), "pop on empty stack");
    }

    #[test]
    fn with_context_unwinds_on_error() {
        let mut tracker = Tracker::default();
        tracker.push_context("outer");
        let result: Result<(), CodecError> = tracker.with_context("inner", |p| {
            p.push_context("leaked");
            Err(CodecError::NotImplemented {
                operation: "test",
                path: p.context_path(),
            })
        });
        match result {
            Err(CodecError::NotImplemented { path, .. }) => assert_eq!(path, "outer/inner/leaked"),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(tracker.context().labels(), ["outer".to_string()]);
    }

    #[test]
    fn with_context_detects_unbalanced_success() {
        let mut tracker = Tracker::default();
        let result = tracker.with_context("region", |p| {
            p.push_context("left-open");
            Ok(())
        });
        assert!(matches!(result, Err(CodecError::ContextMismatch { .. })));
    }
}
