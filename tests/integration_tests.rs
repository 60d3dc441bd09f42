//! Integration tests for the public surface: construction, carrier
//! semantics, graph traversal, and rendering.

use std::{
    borrow::Cow,
    error::Error,
    fmt, io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use backtrail::{Attr, Attributed, BoxError, Frame, Joined, StackTrace, Traced};
use static_assertions::assert_impl_all;

assert_impl_all!(Traced: Send, Sync, Error);
assert_impl_all!(Attributed: Send, Sync, Error);
assert_impl_all!(Joined: Send, Sync, Error);
assert_impl_all!(Frame: Send, Sync);
assert_impl_all!(StackTrace: Send, Sync);
assert_impl_all!(Attr: Send, Sync);

/// A single-cause wrapper that is not a metadata carrier.
#[derive(Debug, thiserror::Error)]
#[error("{context}: {source}")]
struct ContextError {
    context: String,
    #[source]
    source: BoxError,
}

fn context(context: &str, source: BoxError) -> BoxError {
    Box::new(ContextError {
        context: context.to_string(),
        source,
    })
}

/// A single-cause wrapper that counts how often traversal asks for its
/// cause, to observe which nodes a traversal actually visits.
#[derive(Debug)]
struct CountingError {
    inner: BoxError,
    visits: Arc<AtomicUsize>,
}

impl fmt::Display for CountingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for CountingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.visits.fetch_add(1, Ordering::Relaxed);
        let inner: &(dyn Error + 'static) = self.inner.as_ref();
        Some(inner)
    }
}

fn counting(inner: BoxError, visits: &Arc<AtomicUsize>) -> Option<BoxError> {
    Some(Box::new(CountingError {
        inner,
        visits: Arc::clone(visits),
    }))
}

fn count_traced_in_chain(err: &(dyn Error + 'static)) -> usize {
    let mut count = 0;
    let mut next = Some(err);
    while let Some(err) = next {
        if err.downcast_ref::<Traced>().is_some() {
            count += 1;
        }
        next = err.source();
    }
    count
}

#[test]
fn new_attaches_current_trace() {
    let err = backtrail::new("boom");
    assert_eq!(err.to_string(), "boom");
    assert!(backtrail::attached_trace(err.as_ref()).is_some());
}

#[test]
fn traced_macro_formats_message() {
    let err = backtrail::traced!("failed after {} attempts", 3);
    assert_eq!(err.to_string(), "failed after 3 attempts");
    assert!(backtrail::attached_trace(err.as_ref()).is_some());
}

#[test]
fn wrap_is_idempotent() {
    let first = backtrail::wrap(io::Error::other("reset"));
    let original_trace = backtrail::attached_trace(first.as_ref())
        .expect("wrap attached a trace")
        .clone();
    let first_ptr: *const (dyn Error + Send + Sync) = &*first;

    let second = backtrail::wrap(first);
    let second_ptr: *const (dyn Error + Send + Sync) = &*second;

    assert!(std::ptr::eq(first_ptr, second_ptr), "no double wrap");
    assert_eq!(count_traced_in_chain(second.as_ref()), 1);
    assert_eq!(
        backtrail::attached_trace(second.as_ref()),
        Some(&original_trace),
    );
}

#[test]
fn wrap_does_not_alter_message() {
    let err = backtrail::wrap(io::Error::other("permission denied"));
    assert_eq!(err.to_string(), "permission denied");
}

#[test]
fn deep_find_through_intermediate_wrapper() {
    let inner = backtrail::new("root cause");
    let original_trace = backtrail::attached_trace(inner.as_ref())
        .expect("new attached a trace")
        .clone();

    let outer = context("while syncing", context("while flushing", inner));

    assert_eq!(outer.to_string(), "while syncing: while flushing: root cause");
    assert_eq!(
        backtrail::attached_trace(outer.as_ref()),
        Some(&original_trace),
    );
}

#[test]
fn deep_find_passes_through_attribute_carriers() {
    let err = backtrail::wrap_with(io::Error::other("no space"), [Attr::new("disk", "sda")]);
    assert!(backtrail::attached_trace(err.as_ref()).is_some());
}

#[test]
fn resolve_borrows_attached_trace() {
    let err = backtrail::new("boom");
    let attached = backtrail::attached_trace(err.as_ref()).unwrap().clone();
    match backtrail::stack_trace(err.as_ref()) {
        Cow::Borrowed(trace) => assert_eq!(*trace, attached),
        Cow::Owned(_) => panic!("attached trace should be borrowed"),
    }
}

#[test]
fn resolve_synthesizes_fresh_trace_when_absent() {
    let plain = io::Error::other("plain");
    let trace = backtrail::stack_trace(&plain);
    assert!(matches!(trace, Cow::Owned(_)));
}

#[test]
fn wrap_with_empty_attrs_adds_no_carrier() {
    let err = backtrail::wrap_with(io::Error::other("x"), []);
    assert!(err.is::<Traced>());
    assert_eq!(backtrail::attrs(err.as_ref()).count(), 0);

    let err = backtrail::new_with("y", []);
    assert!(err.is::<Traced>());
}

#[test]
fn multi_cause_fan_out_in_join_order() {
    let joined = Joined::new([
        Some(backtrail::new("e1")),
        Some(backtrail::new("e2")),
        Some(backtrail::new("e3")),
        Some(Box::new(io::Error::other("untraced")) as BoxError),
    ]);

    let messages: Vec<String> = backtrail::stack_traces(&joined)
        .map(|(err, _)| err.to_string())
        .collect();
    assert_eq!(messages, ["e1", "e2", "e3"]);
}

#[test]
fn absent_joined_slots_are_skipped() {
    let joined = Joined::new([Some(backtrail::new("e1")), None, Some(backtrail::new("e2"))]);

    let messages: Vec<String> = backtrail::stack_traces(&joined)
        .map(|(err, _)| err.to_string())
        .collect();
    assert_eq!(messages, ["e1", "e2"]);
    assert_eq!(joined.to_string(), "e1\ne2");
}

#[test]
fn matched_trace_carrier_terminates_its_branch() {
    // Traced(ContextError(Traced("inner"))): only the outer carrier is
    // reported, the one beneath it is shadowed.
    let inner = backtrail::new("inner");
    let outer = backtrail::wrap(context("ctx", inner));

    let pairs: Vec<String> = backtrail::stack_traces(outer.as_ref())
        .map(|(err, _)| err.to_string())
        .collect();
    assert_eq!(pairs, ["ctx: inner"]);
}

#[test]
fn attribute_attachment_accumulates() {
    let base = backtrail::new("base");
    let inner = Attributed::new(base, [Attr::new("k1", "v1")]);
    let outer = Attributed::new(inner, [Attr::new("k2", 2), Attr::new("k3", true)]);

    let pairs: Vec<(String, String)> = backtrail::attrs(&outer)
        .map(|(err, attr)| (err.to_string(), attr.to_string()))
        .collect();

    // Outer carrier's attributes first, each paired with the error the
    // carrier directly wraps.
    assert_eq!(
        pairs,
        [
            ("base".to_string(), "k2=2".to_string()),
            ("base".to_string(), "k3=true".to_string()),
            ("base".to_string(), "k1=v1".to_string()),
        ]
    );

    // The first two pairs point at the inner carrier itself, the last at
    // the leaf.
    let causes: Vec<_> = backtrail::attrs(&outer).map(|(err, _)| err).collect();
    assert!(causes[0].downcast_ref::<Attributed>().is_some());
    assert!(causes[1].downcast_ref::<Attributed>().is_some());
    assert!(causes[2].downcast_ref::<Attributed>().is_none());
}

#[test]
fn attrs_fan_out_over_joined_causes() {
    let err1 = Attributed::new(backtrail::new("base1"), [Attr::new("k1", "v1")]);
    let err2 = Attributed::new(backtrail::new("base2"), [Attr::new("k2", 2_i64)]);
    let joined = Joined::new([
        Some(Box::new(err1) as BoxError),
        Some(Box::new(err2) as BoxError),
    ]);

    let keys: Vec<&str> = backtrail::attrs(&joined).map(|(_, attr)| attr.key()).collect();
    assert_eq!(keys, ["k1", "k2"]);
}

#[test]
fn attrs_on_plain_error_is_empty() {
    let plain = io::Error::other("plain");
    assert_eq!(backtrail::attrs(&plain).count(), 0);
}

#[test]
fn depth_ceiling_truncates_attribute_traversal() {
    let mut err: BoxError = backtrail::new("base");
    for depth in 0..300_i64 {
        err = Box::new(Attributed::new(err, [Attr::new("depth", depth)]));
    }
    // 300 carriers are reachable, but only the first 256 visited nodes
    // are reported; truncation is silent.
    assert_eq!(backtrail::attrs(err.as_ref()).count(), 256);
}

#[test]
fn depth_ceiling_truncates_trace_traversal() {
    let mut err: BoxError = backtrail::new("root");
    for _ in 0..300 {
        err = context("layer", err);
    }
    // The only carrier sits below the ceiling, so nothing is reported,
    // and iteration still terminates normally.
    assert_eq!(backtrail::stack_traces(err.as_ref()).count(), 0);

    let mut err: BoxError = backtrail::new("root");
    for _ in 0..100 {
        err = context("layer", err);
    }
    assert_eq!(backtrail::stack_traces(err.as_ref()).count(), 1);
}

#[test]
fn early_stop_visits_no_further_nodes() {
    let visits = Arc::new(AtomicUsize::new(0));
    let joined = Joined::new([
        counting(backtrail::new("e1"), &visits),
        counting(backtrail::new("e2"), &visits),
        counting(backtrail::new("e3"), &visits),
    ]);

    let mut traces = backtrail::stack_traces(&joined);
    let (err, _) = traces.next().expect("three carriers are reachable");
    assert_eq!(err.to_string(), "e1");
    drop(traces);

    assert_eq!(visits.load(Ordering::Relaxed), 1);
}

#[test]
fn frame_and_trace_render() {
    let frame = Frame {
        function: "f".to_string(),
        file: "file.go".to_string(),
        line: 1,
    };
    assert_eq!(frame.to_string(), "f (file.go:1)");

    let trace: StackTrace = vec![
        frame.clone(),
        Frame {
            function: "g".to_string(),
            file: "other.go".to_string(),
            line: 42,
        },
    ]
    .into();
    assert_eq!(trace.to_string(), "f (file.go:1)\ng (other.go:42)");
}

#[test]
fn attr_value_rendering() {
    assert_eq!(Attr::new("s", "v").to_string(), "s=v");
    assert_eq!(Attr::new("i", -7_i64).to_string(), "i=-7");
    assert_eq!(Attr::new("u", 7_u64).to_string(), "u=7");
    assert_eq!(Attr::new("f", 0.5_f64).to_string(), "f=0.5");
    assert_eq!(Attr::new("b", false).to_string(), "b=false");
    assert_eq!(Attr::new("owned", String::from("x")).to_string(), "owned=x");
}

#[test]
fn current_trace_capture_is_usable() {
    let trace = StackTrace::current();
    for frame in trace.frames() {
        assert!(!frame.function.starts_with("backtrace::"));
        assert!(!frame.function.starts_with("backtrail::"));
    }
    // Rendering never fails, whatever was resolved.
    let _ = trace.to_string();
}
