//! Diagnostic sink.
//!
//! Hardware builds log through defmt, host builds through `tracing`. With
//! neither feature enabled the arguments are only type-checked, so the driver
//! stays usable on targets without any logger.
//!
//! Only `{}` placeholders with integers or `&str` are used at call sites so
//! the same format string is valid for both backends.

#[allow(unused_macros)]
macro_rules! trace {
    ($($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($($args)*);
        #[cfg(feature = "tracing")]
        tracing::trace!($($args)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($args)*);
    }};
}

#[allow(unused_macros)]
macro_rules! debug {
    ($($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($args)*);
        #[cfg(feature = "tracing")]
        tracing::debug!($($args)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($args)*);
    }};
}

#[allow(unused_macros)]
macro_rules! info {
    ($($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::info!($($args)*);
        #[cfg(feature = "tracing")]
        tracing::info!($($args)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($args)*);
    }};
}

#[allow(unused_macros)]
macro_rules! warn {
    ($($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::warn!($($args)*);
        #[cfg(feature = "tracing")]
        tracing::warn!($($args)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($args)*);
    }};
}

#[allow(unused_macros)]
macro_rules! error {
    ($($args:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::error!($($args)*);
        #[cfg(feature = "tracing")]
        tracing::error!($($args)*);
        #[cfg(not(any(feature = "defmt", feature = "tracing")))]
        let _ = format_args!($($args)*);
    }};
}
