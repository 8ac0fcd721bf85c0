//! 平台钩子实现
//!
//! Windows 使用 `WH_KEYBOARD_LL`，其他平台不安装任何钩子。

mod unsupported;
#[cfg(windows)]
mod win32;

pub use unsupported::UnsupportedPlatform;
#[cfg(windows)]
pub use win32::WindowsHookPlatform;

use crate::hook::HookPlatform;

/// 当前编译目标对应的平台实现
pub fn native() -> &'static dyn HookPlatform {
    #[cfg(windows)]
    {
        &WindowsHookPlatform
    }
    #[cfg(not(windows))]
    {
        &UnsupportedPlatform
    }
}
