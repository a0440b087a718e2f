//! Utility macros used internally by the crate.

/// Returns early with an error if a condition is not met.
///
/// Like `assert!`, but returns `Err($error)` instead of panicking. Used for the
/// framing checks of the multipart scanner and the size checks of the payload
/// encoders.
///
/// ```ignore
/// ensure!(c == LF, ParseError::MalformedHeaderEnding);
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
