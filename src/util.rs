//! Helpers for polling the radio without interrupts


/// Blocks on a non-blocking operation until it completes or the attempts run
/// out
///
/// Expects three arguments:
/// - The maximum number of times the operation is tried
/// - An expression that is evaluated between two attempts, usually a delay
/// - An expression that evaluates to `nb::Result<T, E>` (the operation)
///
/// Evaluates to `Result<T, TimeoutError<E>>`. The pause is not evaluated
/// after the last attempt.
#[macro_export]
macro_rules! block_timeout {
    ($attempts:expr, $pause:expr, $op:expr) => {
        {
            let attempts: u32 = $attempts;
            let mut attempt: u32 = 0;

            loop {
                match $op {
                    Ok(result) =>
                        break Ok(result),
                    Err(::nb::Error::Other(error)) =>
                        break Err($crate::util::TimeoutError::Other(error)),
                    Err(::nb::Error::WouldBlock) =>
                        (),
                }

                attempt += 1;
                if attempt >= attempts {
                    break Err($crate::util::TimeoutError::Timeout);
                }

                $pause;
            }
        }
    }
}


/// An error that can occur when using `block_timeout!`
#[derive(Debug, Eq, PartialEq)]
pub enum TimeoutError<T> {
    /// The operation didn't complete within the given number of attempts
    Timeout,

    /// The operation failed
    Other(T),
}
