//! The stack-trace carrier and its read accessors.

use std::{borrow::Cow, error::Error, fmt, iter::FusedIterator};

use crate::{
    BoxError,
    frame::{DEFAULT_FRAME_LIMIT, StackTrace},
    unwrap::{Carrier, MAX_UNWRAP_DEPTH, UnwrapIter},
};

/// A plain message error, used as the leaf of traces created from a
/// string rather than an existing error.
#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for MessageError {}

/// An error carrying the stack trace captured when it was first wrapped.
///
/// A `Traced` owns exactly one wrapped cause and one [`StackTrace`]; it
/// forwards its message to the cause unchanged and exposes the cause via
/// [`Error::source`]. Carriers are immutable after construction.
///
/// A chain contains at most one effective `Traced`: re-wrapping through
/// [`wrap`](crate::wrap) is idempotent, so helper layers can wrap
/// unconditionally without burying the original capture site under
/// newer, less useful ones.
///
/// # Examples
///
/// ```
/// use backtrail::Traced;
///
/// let err = Traced::new("configuration missing");
/// assert_eq!(err.to_string(), "configuration missing");
/// println!("{}", err.trace());
/// ```
#[derive(Debug)]
pub struct Traced {
    inner: BoxError,
    trace: StackTrace,
}

impl Traced {
    /// Creates a new leaf error with the given message and the stack
    /// trace of the call site.
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_parts(
            Box::new(MessageError(message.into())),
            StackTrace::capture(DEFAULT_FRAME_LIMIT),
        )
    }

    pub(crate) fn from_parts(inner: BoxError, trace: StackTrace) -> Self {
        Self { inner, trace }
    }

    /// The stack trace captured when this carrier was created.
    pub fn trace(&self) -> &StackTrace {
        &self.trace
    }

    /// The error this carrier wraps.
    pub fn cause(&self) -> &(dyn Error + 'static) {
        &*self.inner
    }
}

impl fmt::Display for Traced {
    /// Forwards to the wrapped error; attaching a trace never alters the
    /// message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for Traced {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause())
    }
}

impl Carrier for Traced {
    // Each trace carrier is an independent unit: traversal does not look
    // for further carriers beneath one that already matched.
    const UNWRAP_SELF: bool = false;

    fn match_node<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Self> {
        err.downcast_ref::<Self>()
    }

    fn cause(&self) -> &(dyn Error + 'static) {
        Traced::cause(self)
    }
}

/// Returns the stack trace attached somewhere in `err`'s chain, if any.
///
/// This is a deep search: it follows single-cause [`Error::source`]
/// relations through the whole chain (it does not descend into joined
/// multi-cause collections). The search is depth-bounded, so a cyclic
/// chain ends in `None` rather than looping.
///
/// # Examples
///
/// ```
/// let err = backtrail::new("boom");
/// let trace = backtrail::attached_trace(err.as_ref()).expect("wrapped above");
/// println!("{trace}");
/// ```
pub fn attached_trace<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a StackTrace> {
    let mut next = Some(err);
    let mut depth = 0;
    while let Some(err) = next {
        depth += 1;
        if depth > MAX_UNWRAP_DEPTH {
            return None;
        }
        if let Some(traced) = err.downcast_ref::<Traced>() {
            return Some(traced.trace());
        }
        next = err.source();
    }
    None
}

/// Returns a stack trace for `err`, attached or fresh.
///
/// If a trace is attached anywhere in `err`'s single-cause chain it is
/// borrowed unchanged; otherwise the current stack trace is captured as
/// of this call site. This function never fails and never returns an
/// unusable result, which makes it the accessor of choice for logging
/// adapters that must always have something to print.
pub fn stack_trace<'a>(err: &'a (dyn Error + 'static)) -> Cow<'a, StackTrace> {
    match attached_trace(err) {
        Some(trace) => Cow::Borrowed(trace),
        None => Cow::Owned(StackTrace::capture(DEFAULT_FRAME_LIMIT)),
    }
}

/// Returns a lazy iterator over every stack trace reachable from `err`.
///
/// For each [`Traced`] carrier reachable through single- or multi-cause
/// relations, the iterator yields the error the carrier directly wraps
/// paired with its trace. Joined causes are visited left to right, and a
/// matched carrier terminates its own branch.
///
/// The traversal is performed on demand: dropping the iterator after the
/// first pair means no further nodes are visited or compared. Each call
/// starts a fresh traversal, bounded by both the real graph size and the
/// per-traversal depth ceiling.
///
/// # Examples
///
/// ```
/// use backtrail::Joined;
///
/// let joined = Joined::new(vec![
///     Some(backtrail::new("disk full")),
///     Some(backtrail::new("network down")),
/// ]);
///
/// let messages: Vec<String> = backtrail::stack_traces(&joined)
///     .map(|(err, _trace)| err.to_string())
///     .collect();
/// assert_eq!(messages, ["disk full", "network down"]);
/// ```
pub fn stack_traces<'a>(err: &'a (dyn Error + 'static)) -> StackTraces<'a> {
    StackTraces {
        inner: UnwrapIter::new(err),
    }
}

/// Iterator returned by [`stack_traces`].
#[must_use]
pub struct StackTraces<'a> {
    inner: UnwrapIter<'a, Traced>,
}

impl<'a> Iterator for StackTraces<'a> {
    type Item = (&'a (dyn Error + 'static), &'a StackTrace);

    fn next(&mut self) -> Option<Self::Item> {
        let traced = self.inner.next()?;
        Some((traced.cause(), traced.trace()))
    }
}

impl FusedIterator for StackTraces<'_> {}
