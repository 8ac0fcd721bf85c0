//! 修饰键状态
//!
//! 修饰键不从钩子结构体中读取，而是在回调触发的瞬间查询系统的实时键盘状态。
//! 因此 [`ModifierSet::query`] 反映的是“调用时”的状态，不是事件发生时的状态，
//! 也不做任何缓存。

use std::fmt;

/// 虚拟键码：Shift
pub const VK_SHIFT: u32 = 0x10;
/// 虚拟键码：Ctrl
pub const VK_CONTROL: u32 = 0x11;
/// 虚拟键码：Alt（Menu）
pub const VK_MENU: u32 = 0x12;
/// 虚拟键码：左 Win 键
pub const VK_LWIN: u32 = 0x5B;
/// 虚拟键码：右 Win 键
pub const VK_RWIN: u32 = 0x5C;

/// 没有任何修饰键按下时的显示文本
pub const NO_MODIFIERS: &str = "(none)";

/// 实时键盘状态查询
///
/// 每次调用都会读取系统当前状态（有副作用，不可缓存）。
pub trait KeyboardState: Send + Sync {
    /// 指定虚拟键当前是否处于按下状态
    fn is_key_down(&self, virtual_key: u32) -> bool;
}

/// 当前按下的修饰键集合
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierSet {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// 左右任意一个 Win 键按下即视为 Meta
    pub meta: bool,
}

impl ModifierSet {
    /// 从实时键盘状态计算修饰键集合
    pub fn query(state: &dyn KeyboardState) -> Self {
        Self {
            shift: state.is_key_down(VK_SHIFT),
            ctrl: state.is_key_down(VK_CONTROL),
            alt: state.is_key_down(VK_MENU),
            meta: state.is_key_down(VK_LWIN) || state.is_key_down(VK_RWIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }
}

impl fmt::Display for ModifierSet {
    /// 固定顺序 Shift、Ctrl、Alt、Meta，用 '+' 连接
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(NO_MODIFIERS);
        }

        let names = [
            (self.shift, "Shift"),
            (self.ctrl, "Ctrl"),
            (self.alt, "Alt"),
            (self.meta, "Meta"),
        ];
        let mut first = true;
        for (_, name) in names.iter().filter(|(held, _)| *held) {
            if !first {
                f.write_str("+")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}
