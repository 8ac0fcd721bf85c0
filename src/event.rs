//! 按键事件类型
//!
//! 钩子回调拿到的原始结构体是 [`RawKeyboardEvent`]，分类和补充信息之后
//! 得到发布给订阅者的 [`GlobalKeyEvent`]。

use std::fmt;

use chrono::{DateTime, Local};

use crate::modifiers::ModifierSet;

/// 消息标识：普通按键按下
pub const WM_KEYDOWN: u32 = 0x0100;
/// 消息标识：普通按键释放
pub const WM_KEYUP: u32 = 0x0101;
/// 消息标识：系统按键按下（例如按住 Alt 时）
pub const WM_SYSKEYDOWN: u32 = 0x0104;
/// 消息标识：系统按键释放
pub const WM_SYSKEYUP: u32 = 0x0105;

/// LLKHF_INJECTED 标志值 (0x10)，表示软件注入的事件
pub const INJECTED_FLAG: u32 = 0x10;

/// 按键状态变化类型
///
/// System 变体单独保留，不能合并到 KeyDown/KeyUp，
/// 订阅者可能需要区分系统保留的组合键和普通输入。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTransition {
    KeyDown,
    KeyUp,
    SystemKeyDown,
    SystemKeyUp,
    Unknown,
}

impl KeyTransition {
    /// 把消息标识映射为按键状态变化
    pub fn from_message(message: u32) -> Self {
        match message {
            WM_KEYDOWN => Self::KeyDown,
            WM_KEYUP => Self::KeyUp,
            WM_SYSKEYDOWN => Self::SystemKeyDown,
            WM_SYSKEYUP => Self::SystemKeyUp,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyDown => "KeyDown",
            Self::KeyUp => "KeyUp",
            Self::SystemKeyDown => "SystemKeyDown",
            Self::SystemKeyUp => "SystemKeyUp",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for KeyTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 系统传给钩子回调的原始按键结构
///
/// 所有字段由系统定义，原样透传。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawKeyboardEvent {
    pub vk_code: u32,
    pub scan_code: u32,
    pub flags: u32,
    /// 系统消息时间戳（毫秒，开机以来）
    pub time: u32,
    pub extra_info: usize,
}

impl RawKeyboardEvent {
    pub fn is_injected(&self) -> bool {
        self.flags & INJECTED_FLAG != 0
    }
}

/// 按键的简短可打印表示
///
/// 只有虚拟键码落在可打印 ASCII 范围 [0x20, 0x7E] 内时才非空。
/// 这只是尽力而为的提示，不考虑键盘布局。
pub fn key_text(vk_code: u32) -> String {
    match u8::try_from(vk_code) {
        Ok(byte @ 0x20..=0x7E) => char::from(byte).to_string(),
        _ => String::new(),
    }
}

/// 发布给订阅者的按键事件
///
/// 构造之后不可变，每个订阅者拿到自己的一份拷贝。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalKeyEvent {
    timestamp: DateTime<Local>,
    vk_code: u32,
    scan_code: u32,
    flags: u32,
    transition: KeyTransition,
    modifiers: String,
    key_text: String,
}

impl GlobalKeyEvent {
    pub fn new(
        timestamp: DateTime<Local>,
        raw: &RawKeyboardEvent,
        transition: KeyTransition,
        modifiers: ModifierSet,
    ) -> Self {
        Self {
            timestamp,
            vk_code: raw.vk_code,
            scan_code: raw.scan_code,
            flags: raw.flags,
            transition,
            modifiers: modifiers.to_string(),
            key_text: key_text(raw.vk_code),
        }
    }

    /// 捕获时刻的本地时间
    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn vk_code(&self) -> u32 {
        self.vk_code
    }

    pub fn scan_code(&self) -> u32 {
        self.scan_code
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn transition(&self) -> KeyTransition {
        self.transition
    }

    /// 修饰键文本，例如 "Shift+Ctrl" 或 "(none)"
    pub fn modifiers(&self) -> &str {
        &self.modifiers
    }

    pub fn key_text(&self) -> &str {
        &self.key_text
    }
}

impl fmt::Display for GlobalKeyEvent {
    /// 单行格式：
    /// `[HH:mm:ss.fff] KeyDown VK=0x41 ('A') Scan=0x1E Flags=0x00 Mods=Shift`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} VK=0x{:02X}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.transition,
            self.vk_code
        )?;
        if !self.key_text.is_empty() {
            write!(f, " ('{}')", self.key_text)?;
        }
        write!(
            f,
            " Scan=0x{:02X} Flags=0x{:02X} Mods={}",
            self.scan_code, self.flags, self.modifiers
        )
    }
}
