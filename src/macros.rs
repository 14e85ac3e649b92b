// Logging forwards to the `log` facade when the feature is enabled and
// otherwise only type checks its arguments.

#[cfg(feature = "log")]
macro_rules! debug {
    ($($arg:tt)*) => (log::debug!($($arg)*));
}

#[cfg(not(feature = "log"))]
macro_rules! debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "log")]
macro_rules! warn {
    ($($arg:tt)*) => (log::warn!($($arg)*));
}

#[cfg(not(feature = "log"))]
macro_rules! warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}
