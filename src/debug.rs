//! Lifecycle tracing, enabled with `HEADLESS_GLES_DEBUG=1`.

use std::sync::OnceLock;

pub(crate) fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var_os("HEADLESS_GLES_DEBUG").is_some_and(|v| v != "0"))
}

macro_rules! trace {
    ($($arg:tt)*) => {
        if $crate::debug::enabled() {
            eprintln!("[headless-gles] {}", format_args!($($arg)*));
        }
    };
}

pub(crate) use trace;
