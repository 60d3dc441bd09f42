//! Stack frame and stack trace value types, plus the capture walker.

use std::fmt;

/// Maximum number of frames captured per trace unless a caller asks for
/// a different limit.
pub(crate) const DEFAULT_FRAME_LIMIT: usize = 64;

/// Symbol prefixes whose frames are dropped from the start of a capture,
/// so that the first reported frame is the logical caller's site rather
/// than capture plumbing.
const PLUMBING_PREFIXES: &[&str] = &["backtrace::", "backtrail::", "<backtrail::"];

/// A single resolved call-stack frame.
///
/// Frames are immutable values produced only by trace capture; the fields
/// are public so that consumers (and tests) can destructure or construct
/// them freely.
///
/// # Examples
///
/// ```
/// use backtrail::Frame;
///
/// let frame = Frame {
///     function: "f".to_string(),
///     file: "file.go".to_string(),
///     line: 1,
/// };
/// assert_eq!(frame.to_string(), "f (file.go:1)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    /// The demangled name of the function.
    pub function: String,
    /// The source file where the function is defined.
    pub file: String,
    /// The line number in that file.
    pub line: u32,
}

impl fmt::Display for Frame {
    /// Formats the frame as `"<function> (<file>:<line>)"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}

/// An ordered, immutable sequence of [`Frame`]s, innermost frame first.
///
/// # Examples
///
/// ```
/// use backtrail::StackTrace;
///
/// let trace = StackTrace::current();
/// for frame in trace.frames() {
///     println!("{frame}");
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackTrace {
    frames: Vec<Frame>,
}

impl StackTrace {
    /// Captures the stack trace of the current thread, starting at the
    /// immediate caller.
    ///
    /// Capture never fails: frames that cannot be resolved to a symbol
    /// name and file location are omitted, and in the worst case the
    /// returned trace is empty.
    pub fn current() -> Self {
        Self::capture(DEFAULT_FRAME_LIMIT)
    }

    /// The frames of this trace, innermost first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Returns the number of frames in this trace.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if this trace contains no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Walks the current call stack and resolves up to `limit` frames,
    /// innermost first.
    ///
    /// Frames belonging to the capture plumbing itself (the `backtrace`
    /// crate and this crate) are filtered from the start of the walk, so
    /// the first resolved frame is the call site that asked for the
    /// capture. Frames without symbol information are skipped.
    pub(crate) fn capture(limit: usize) -> Self {
        let mut frames: Vec<Frame> = Vec::new();
        let mut in_plumbing = true;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                if frames.len() >= limit {
                    return;
                }
                // An unresolvable frame is omitted rather than reported.
                let (Some(name), Some(file), Some(line)) =
                    (symbol.name(), symbol.filename(), symbol.lineno())
                else {
                    return;
                };
                let function = format!("{name:#}");
                if in_plumbing {
                    if PLUMBING_PREFIXES.iter().any(|p| function.starts_with(p)) {
                        return;
                    }
                    in_plumbing = false;
                }
                frames.push(Frame {
                    function,
                    file: file.to_string_lossy().into_owned(),
                    line,
                });
            });
            frames.len() < limit
        });

        Self { frames }
    }
}

impl From<Vec<Frame>> for StackTrace {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl FromIterator<Frame> for StackTrace {
    fn from_iter<I: IntoIterator<Item = Frame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StackTrace {
    type Item = &'a Frame;
    type IntoIter = core::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl fmt::Display for StackTrace {
    /// Formats the trace as the per-frame renderings joined by `"\n"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write!(f, "{frame}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: &str, file: &str, line: u32) -> Frame {
        Frame {
            function: function.to_string(),
            file: file.to_string(),
            line,
        }
    }

    #[test]
    fn frame_render() {
        assert_eq!(frame("f", "file.go", 1).to_string(), "f (file.go:1)");
    }

    #[test]
    fn stack_trace_render_joins_with_newline() {
        let trace: StackTrace = vec![frame("a", "a.rs", 1), frame("b", "b.rs", 2)].into();
        assert_eq!(trace.to_string(), "a (a.rs:1)\nb (b.rs:2)");
    }

    #[test]
    fn empty_stack_trace_renders_empty() {
        assert_eq!(StackTrace::default().to_string(), "");
    }

    #[test]
    fn capture_respects_limit() {
        let trace = StackTrace::capture(2);
        assert!(trace.len() <= 2);
    }

    #[test]
    fn capture_filters_plumbing_frames() {
        let trace = StackTrace::current();
        if let Some(first) = trace.frames().first() {
            assert!(!first.function.starts_with("backtrace::"));
            assert!(!first.function.starts_with("backtrail::"));
        }
    }
}
