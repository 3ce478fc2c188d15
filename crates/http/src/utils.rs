//! Internal helper macros.

/// Returns early with `$error` when `$predicate` does not hold.
///
/// Behaves like `assert!`, but produces an `Err` instead of panicking, which is what the
/// decoders want when a limit is exceeded.
///
/// ```ignore
/// ensure!(headers.len() <= MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
