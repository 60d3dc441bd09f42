#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Stack traces and structured attributes for errors, recoverable from
//! arbitrarily wrapped error graphs.
//!
//! ## Overview
//!
//! This crate enriches errors with out-of-band diagnostic metadata: a
//! stack trace captured at the point of origin, and ordered key/value
//! attributes describing the context each layer had at hand. Any
//! consumer — typically a logging adapter far away from where the error
//! was produced — can recover that metadata later by walking the error
//! graph, no matter how many times the error was wrapped or joined with
//! others along the way.
//!
//! ## Quick Example
//!
//! ```
//! use backtrail::{Attr, BoxError};
//!
//! fn load_config() -> Result<(), BoxError> {
//!     Err(backtrail::new_with(
//!         "failed to load configuration",
//!         [Attr::new("path", "/etc/app.toml")],
//!     ))
//! }
//!
//! let err = load_config().unwrap_err();
//!
//! // Somewhere else entirely, recover the capture site and the context.
//! let trace = backtrail::stack_trace(err.as_ref());
//! println!("{trace}");
//! for (cause, attr) in backtrail::attrs(err.as_ref()) {
//!     println!("{cause}: {attr}");
//! }
//! ```
//!
//! ## Core Concepts
//!
//! Metadata travels in **carriers**: error wrappers that attach either a
//! [`StackTrace`] ([`Traced`]) or a list of [`Attr`]s ([`Attributed`])
//! to an underlying error without altering its message.
//!
//! The two carriers have deliberately different attachment semantics:
//!
//! - Trace attachment through [`wrap`] is **idempotent**. The first
//!   capture site is the interesting one, so re-wrapping an error that
//!   already carries a trace returns it unchanged instead of burying the
//!   original site under helper-layer noise.
//! - Attribute attachment is **accumulating**. Context is additive, so
//!   every layer's attributes are preserved, ordered outermost first.
//!
//! Retrieval walks the whole error graph: single-cause wrappers are
//! followed through [`source`](std::error::Error::source), multi-cause
//! [`Joined`] collections fan out left to right, absent causes are
//! skipped silently, and a per-call depth ceiling turns pathologically
//! deep (or cyclic) graphs into silent truncation rather than a hang.
//! The accessors [`stack_traces`] and [`attrs`] are lazy, single-pass
//! iterators: dropping one stops all remaining traversal work at once.
//!
//! Nothing in this crate fails. Absence of metadata is reported as
//! `None` or an empty sequence, and [`stack_trace`] degrades to
//! capturing a fresh trace at its own call site.

mod attr;
mod frame;
mod joined;
mod macros;
mod traced;
mod unwrap;

pub use attr::{Attr, AttrValue, Attributed, Attrs, attrs};
pub use frame::{Frame, StackTrace};
pub use joined::Joined;
pub use traced::{StackTraces, Traced, attached_trace, stack_trace, stack_traces};

use crate::frame::DEFAULT_FRAME_LIMIT;

/// A type-erased, thread-safe error.
///
/// All construction functions in this crate hand out `BoxError`, and any
/// error convertible into one can be wrapped.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Creates a new leaf error with the given message and the stack trace
/// of the call site attached.
///
/// # Examples
///
/// ```
/// let err = backtrail::new("disk full");
/// assert_eq!(err.to_string(), "disk full");
/// assert!(backtrail::attached_trace(err.as_ref()).is_some());
/// ```
pub fn new(message: impl Into<String>) -> BoxError {
    Box::new(Traced::new(message))
}

/// Creates a new leaf error with the given message, the stack trace of
/// the call site, and the given attributes.
///
/// If `attrs` is empty, this is equivalent to [`new`]: no attribute
/// carrier is created.
///
/// # Examples
///
/// ```
/// use backtrail::Attr;
///
/// let err = backtrail::new_with("db timeout", [Attr::new("host", "db-1")]);
/// assert_eq!(backtrail::attrs(err.as_ref()).count(), 1);
/// ```
pub fn new_with(message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) -> BoxError {
    with_attrs(new(message), attrs)
}

/// Attaches the stack trace of the call site to `err`.
///
/// Attachment is idempotent: if the error itself is already a trace
/// carrier, it is returned unchanged, so wrapping repeatedly through
/// helper layers neither nests carriers nor replaces the original
/// capture site. The check is on the immediate value only; use
/// [`attached_trace`] for a deep search.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// let err = backtrail::wrap(io::Error::other("connection reset"));
/// let again = backtrail::wrap(err);
/// assert!(again.is::<backtrail::Traced>());
/// ```
pub fn wrap(err: impl Into<BoxError>) -> BoxError {
    let err = err.into();
    if err.is::<Traced>() {
        return err;
    }
    Box::new(Traced::from_parts(
        err,
        StackTrace::capture(DEFAULT_FRAME_LIMIT),
    ))
}

/// Attaches the stack trace of the call site (idempotently) and the
/// given attributes to `err`.
///
/// If `attrs` is empty, this is equivalent to [`wrap`]: no attribute
/// carrier is created.
///
/// # Examples
///
/// ```
/// use std::io;
///
/// use backtrail::Attr;
///
/// let err = backtrail::wrap_with(
///     io::Error::other("write failed"),
///     [Attr::new("device", "/dev/sda1")],
/// );
/// assert!(backtrail::attached_trace(err.as_ref()).is_some());
/// ```
pub fn wrap_with(err: impl Into<BoxError>, attrs: impl IntoIterator<Item = Attr>) -> BoxError {
    with_attrs(wrap(err), attrs)
}

fn with_attrs(err: BoxError, attrs: impl IntoIterator<Item = Attr>) -> BoxError {
    let attrs: Vec<Attr> = attrs.into_iter().collect();
    if attrs.is_empty() {
        err
    } else {
        Box::new(Attributed::new(err, attrs))
    }
}
