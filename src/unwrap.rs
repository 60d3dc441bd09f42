//! The generic unwrap traversal engine.
//!
//! [`UnwrapIter`] walks an arbitrarily shaped error graph depth-first and
//! lazily yields every reachable carrier of one concrete kind. Both public
//! accessors ([`stack_traces`](crate::stack_traces) and
//! [`attrs`](crate::attrs)) are thin adapters over this iterator.

use std::{error::Error, iter::FusedIterator, marker::PhantomData};

use crate::joined::Joined;

/// Ceiling on the total number of nodes visited by a single traversal.
///
/// Exceeding the ceiling silently truncates the traversal; it is not a
/// failure. A cyclic graph degrades to hitting the ceiling instead of
/// looping forever, so no separate cycle detection is needed.
pub(crate) const MAX_UNWRAP_DEPTH: usize = 256;

/// A metadata carrier the engine can match on.
///
/// Matching is an exact dynamic-type check on the node itself, never a
/// search through the node's causes.
pub(crate) trait Carrier: Sized + 'static {
    /// Whether traversal continues into a matched carrier's own cause.
    ///
    /// Attribute traversal sets this to `true` so that nested carriers
    /// deeper in the chain are surfaced as well; stack-trace traversal
    /// sets it to `false`, making every matched carrier a terminal
    /// boundary for its branch.
    const UNWRAP_SELF: bool;

    /// Returns the node as a carrier if its dynamic type matches.
    fn match_node<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Self>;

    /// The error this carrier directly wraps.
    fn cause(&self) -> &(dyn Error + 'static);
}

/// Lazy depth-first iterator over every reachable carrier of kind `C`.
///
/// Nodes are processed with the following priority:
///
/// 1. the node is a `C`: yield it (and, iff [`Carrier::UNWRAP_SELF`],
///    descend into its own cause afterwards);
/// 2. the node exposes a single cause via [`Error::source`]: descend;
/// 3. the node is a [`Joined`] multi-cause collection: descend into each
///    present cause, left to right;
/// 4. the node is an opaque leaf: the branch contributes nothing.
///
/// Absent causes are skipped silently at every depth. The visit counter
/// is owned by the iterator, so concurrent traversals never observe each
/// other's progress, and dropping the iterator cancels all remaining work
/// immediately.
#[must_use]
pub(crate) struct UnwrapIter<'a, C> {
    stack: Vec<&'a (dyn Error + 'static)>,
    visited: usize,
    _carrier: PhantomData<fn() -> C>,
}

impl<'a, C: Carrier> UnwrapIter<'a, C> {
    pub(crate) fn new(root: &'a (dyn Error + 'static)) -> Self {
        Self {
            stack: vec![root],
            visited: 0,
            _carrier: PhantomData,
        }
    }
}

impl<'a, C: Carrier> Iterator for UnwrapIter<'a, C> {
    type Item = &'a C;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(err) = self.stack.pop() {
            self.visited += 1;
            if self.visited > MAX_UNWRAP_DEPTH {
                self.stack.clear();
                return None;
            }

            if let Some(carrier) = C::match_node(err) {
                if C::UNWRAP_SELF {
                    self.stack.push(carrier.cause());
                }
                return Some(carrier);
            }

            if let Some(source) = err.source() {
                self.stack.push(source);
            } else if let Some(joined) = err.downcast_ref::<Joined>() {
                // Reversed so the leftmost cause is popped first.
                self.stack.extend(joined.causes().rev());
            }
        }
        None
    }
}

impl<C: Carrier> FusedIterator for UnwrapIter<'_, C> {}
