//! Joining multiple errors into a single multi-cause node.

use std::{error::Error, fmt};

use crate::BoxError;

/// An error node that owns any number of causes.
///
/// `Joined` is the multi-cause relation of the error graph: traversal
/// visits its causes left to right. Absent slots (`None`) are legal and
/// are treated as if the cause did not exist — they are skipped silently
/// by every traversal and contribute nothing to the rendered message.
/// This makes it convenient to join the outcomes of a batch of
/// operations where only some of them failed:
///
/// ```
/// use backtrail::Joined;
///
/// let outcomes: Vec<Result<(), backtrail::BoxError>> = vec![
///     Ok(()),
///     Err(backtrail::new("second step failed")),
///     Err(backtrail::new("third step failed")),
/// ];
/// let joined = Joined::new(outcomes.into_iter().map(Result::err));
///
/// assert_eq!(backtrail::stack_traces(&joined).count(), 2);
/// ```
#[derive(Debug)]
pub struct Joined {
    errors: Vec<Option<BoxError>>,
}

impl Joined {
    /// Creates a new multi-cause node from the given causes, preserving
    /// both their order and any absent slots.
    pub fn new<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = Option<BoxError>>,
    {
        Self {
            errors: errors.into_iter().collect(),
        }
    }

    /// Iterates over the present causes, left to right.
    pub fn causes(&self) -> impl DoubleEndedIterator<Item = &(dyn Error + 'static)> {
        self.errors
            .iter()
            .flatten()
            .map(|err| &**err as &(dyn Error + 'static))
    }
}

impl fmt::Display for Joined {
    /// Formats the present causes' messages joined by `"\n"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.causes().enumerate() {
            if i != 0 {
                f.write_str("\n")?;
            }
            write!(f, "{cause}")?;
        }
        Ok(())
    }
}

impl Error for Joined {
    // A multi-cause node intentionally exposes no single cause; the
    // causes are reachable through the traversal accessors instead.
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
