use std::sync::atomic::{AtomicBool, Ordering};

static ENABLED: AtomicBool = AtomicBool::new(true);

#[inline(always)]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::SeqCst)
}

/// Mute pipeline logging, operator messages are not affected (`dslaunch resolve --quiet`).
pub fn disable() {
    ENABLED.store(false, Ordering::SeqCst)
}

#[macro_export]
macro_rules! dl_info {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::info!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::info!(target: "launch", $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! dl_warn {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::warn!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::warn!(target: "launch", $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! dl_error {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::error!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::error!(target: "launch", $($arg)+)
        }
    };
}

#[macro_export]
macro_rules! dl_debug {
    (target: $target:expr, $($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::debug!(target: $target, $($arg)+)
        }
    };
    ($($arg:tt)+) => {
        if $crate::log::is_enabled() {
            ::log::debug!(target: "launch", $($arg)+)
        }
    };
}
