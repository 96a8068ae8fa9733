//! Errors.

use crate::backend::ToolkitType;
use crate::view::Lifecycle;

/// Errors raised by the toolkit-neutral layer and its backends.
///
/// Most of these are contract violations by the caller (unbalanced `restore`, a relative path
/// operation without a current point, an attribute range outside the text); they are returned
/// rather than ignored so the caller finds out where the contract was broken.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// `restore` was called without a matching `save`.
    #[error("restore called without a matching save")]
    UnbalancedRestore,

    /// A relative path operation was issued before the path had a current point.
    #[error("relative path operation without a current point")]
    NoCurrentPoint,

    /// A text attribute range does not fit into the text.
    #[error("range {start}+{length} is out of bounds for a text of {len} characters")]
    InvalidRange {
        start: usize,
        length: usize,
        len: usize,
    },

    /// A view backend was used in a lifecycle state that does not allow the operation.
    #[error("cannot {operation} a view backend that is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: Lifecycle,
    },

    /// The view is not a child of the container it was passed to.
    #[error("view is not a child of this container")]
    NotAChild,

    /// A size query was issued while the view was being allocated.
    #[error("size query issued during an allocation pass")]
    ReentrantSizeQuery,

    /// The drawing context has already been disposed.
    #[error("drawing context has been disposed")]
    Disposed,

    /// The backend does not implement this operation.
    #[error("{operation} is not implemented by the {toolkit:?} backend")]
    NotImplemented {
        operation: &'static str,
        toolkit: ToolkitType,
    },

    /// No factory is registered for the requested toolkit.
    #[error("no backend registered for toolkit {0:?}")]
    UnknownToolkit(ToolkitType),

    /// UI operations must run on the UI thread.
    #[error("called from a thread other than the UI thread")]
    WrongThread,

    /// The UI-thread queue is gone (the application was dropped).
    #[error("the application is no longer running")]
    Disconnected,

    /// A draw handler panicked.
    #[error("draw handler panicked: {0}")]
    DrawPanicked(String),

    /// The native layer reported a failure.
    #[error("native error: {0}")]
    Native(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
