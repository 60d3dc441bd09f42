//! The attribute carrier: ordered key/value context for errors.

use std::{borrow::Cow, error::Error, fmt, iter::FusedIterator};

use crate::{
    BoxError,
    unwrap::{Carrier, UnwrapIter},
};

/// A single structured key/value attribute.
///
/// Attributes are ordered, duplicates are allowed, and they are never
/// deduplicated or merged: each wrapping layer contributes its own
/// attributes verbatim.
///
/// # Examples
///
/// ```
/// use backtrail::Attr;
///
/// let attr = Attr::new("table", "users");
/// assert_eq!(attr.to_string(), "table=users");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    key: Cow<'static, str>,
    value: AttrValue,
}

impl Attr {
    /// Creates a new attribute.
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The attribute key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The attribute value.
    pub fn value(&self) -> &AttrValue {
        &self.value
    }
}

impl fmt::Display for Attr {
    /// Formats the attribute as `"<key>=<value>"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// The value of an [`Attr`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// A string value.
    Str(Cow<'static, str>),
    /// A signed integer value.
    I64(i64),
    /// An unsigned integer value.
    U64(u64),
    /// A floating point value.
    F64(f64),
    /// A boolean value.
    Bool(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(v) => f.write_str(v),
            AttrValue::I64(v) => write!(f, "{v}"),
            AttrValue::U64(v) => write!(f, "{v}"),
            AttrValue::F64(v) => write!(f, "{v}"),
            AttrValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<&'static str> for AttrValue {
    fn from(v: &'static str) -> Self {
        AttrValue::Str(Cow::Borrowed(v))
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(Cow::Owned(v))
    }
}

impl From<Cow<'static, str>> for AttrValue {
    fn from(v: Cow<'static, str>) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        AttrValue::I64(v.into())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::I64(v)
    }
}

impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        AttrValue::U64(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::F64(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

/// An error carrying an ordered list of [`Attr`]s.
///
/// Unlike the stack-trace carrier, wrapping in `Attributed` is never
/// idempotent: attributes are additive context, so every wrap creates a
/// new carrier and every nesting level's attributes are preserved. The
/// message is forwarded to the wrapped error unchanged.
///
/// # Examples
///
/// ```
/// use backtrail::{Attr, Attributed};
///
/// let err = Attributed::new(
///     backtrail::new("query failed"),
///     [Attr::new("table", "users"), Attr::new("attempt", 3)],
/// );
/// assert_eq!(err.to_string(), "query failed");
/// assert_eq!(err.attrs().len(), 2);
/// ```
#[derive(Debug)]
pub struct Attributed {
    inner: BoxError,
    attrs: Vec<Attr>,
}

impl Attributed {
    /// Wraps `err` with the given ordered attributes.
    pub fn new(err: impl Into<BoxError>, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Self {
            inner: err.into(),
            attrs: attrs.into_iter().collect(),
        }
    }

    /// The attributes of this carrier, in attachment order.
    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// The error this carrier wraps.
    pub fn cause(&self) -> &(dyn Error + 'static) {
        &*self.inner
    }
}

impl fmt::Display for Attributed {
    /// Forwards to the wrapped error; attaching attributes never alters
    /// the message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for Attributed {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause())
    }
}

impl Carrier for Attributed {
    // Attribute carriers nest, so traversal continues into the cause of
    // a matched carrier to surface the deeper levels as well.
    const UNWRAP_SELF: bool = true;

    fn match_node<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a Self> {
        err.downcast_ref::<Self>()
    }

    fn cause(&self) -> &(dyn Error + 'static) {
        Attributed::cause(self)
    }
}

/// Returns a lazy iterator over every attribute reachable from `err`.
///
/// For each [`Attributed`] carrier reachable through single- or
/// multi-cause relations, the iterator yields each of that carrier's own
/// attributes paired with the error the carrier directly wraps. A
/// carrier's attributes come before those of any carrier nested beneath
/// it, and joined causes are visited left to right.
///
/// The traversal is lazy and cancellable: dropping the iterator stops
/// all remaining work immediately.
///
/// # Examples
///
/// ```
/// use backtrail::{Attr, Attributed};
///
/// let inner = Attributed::new(backtrail::new("io failure"), [Attr::new("path", "/etc/app")]);
/// let outer = Attributed::new(inner, [Attr::new("stage", "startup")]);
///
/// let keys: Vec<&str> = backtrail::attrs(&outer).map(|(_, attr)| attr.key()).collect();
/// assert_eq!(keys, ["stage", "path"]);
/// ```
pub fn attrs<'a>(err: &'a (dyn Error + 'static)) -> Attrs<'a> {
    Attrs {
        inner: UnwrapIter::new(err),
        current: None,
    }
}

/// Iterator returned by [`attrs`].
#[must_use]
pub struct Attrs<'a> {
    inner: UnwrapIter<'a, Attributed>,
    current: Option<(&'a (dyn Error + 'static), core::slice::Iter<'a, Attr>)>,
}

impl<'a> Iterator for Attrs<'a> {
    type Item = (&'a (dyn Error + 'static), &'a Attr);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((cause, attrs)) = &mut self.current
                && let Some(attr) = attrs.next()
            {
                return Some((*cause, attr));
            }
            let carrier = self.inner.next()?;
            self.current = Some((carrier.cause(), carrier.attrs().iter()));
        }
    }
}

impl FusedIterator for Attrs<'_> {}
