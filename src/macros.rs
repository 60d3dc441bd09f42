/// Creates a traced error from a format string.
///
/// The arguments are interpreted and evaluated the same way as by
/// [`format!()`], and the resulting string becomes the message of a new
/// leaf error with the stack trace of the call site attached. This is
/// shorthand for [`new`](crate::new) with a formatted message.
///
/// # Examples
///
/// ```
/// let missing = "/etc/app.toml";
/// let err = backtrail::traced!("configuration file {missing} not found");
///
/// assert_eq!(
///     err.to_string(),
///     "configuration file /etc/app.toml not found"
/// );
/// assert!(backtrail::attached_trace(err.as_ref()).is_some());
/// ```
///
/// [`format!()`]: std::format
#[macro_export]
macro_rules! traced {
    ($($arg:tt)*) => {
        $crate::new(::std::format!($($arg)*))
    };
}
