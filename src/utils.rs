//! 浏览器控制台日志与 panic hook。

/// 写入浏览器控制台；非 wasm32 目标（例如原生测试）下不输出。
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::utils::log(&format!($($arg)*))
    };
}

macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::utils::warn(&format!($($arg)*))
    };
}

pub(crate) use console_log;
pub(crate) use console_warn;

#[cfg(target_arch = "wasm32")]
pub(crate) fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn log(_message: &str) {}

#[cfg(target_arch = "wasm32")]
pub(crate) fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn warn(_message: &str) {}

#[cfg(feature = "console_error_panic_hook")]
pub(crate) fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub(crate) fn set_panic_hook() {}
