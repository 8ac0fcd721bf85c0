//! keyhook - 系统级低级键盘钩子
//!
//! 安装进程级的全局键盘钩子，接收系统中的每一次按键，
//! 分类并补充修饰键、可打印文本和时间戳后发布给订阅者。
//!
//! # 模块说明
//! - `hook`: 钩子生命周期、回调处理、订阅接口（核心模块）
//! - `event`: 原始按键结构和发布的事件记录
//! - `modifiers`: 实时修饰键状态
//! - `subscribers`: 写时复制的订阅者列表
//! - `platform`: Windows 实现与其他平台的惰性实现
//! - `config`: 配置项
//! - `error`: 错误类型

pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod modifiers;
pub mod platform;
pub mod subscribers;

// 重新导出常用类型
pub use config::HookConfig;
pub use error::HookError;
pub use event::{GlobalKeyEvent, KeyTransition, RawKeyboardEvent};
pub use hook::{HookDispatch, HookManager, HookPlatform, HookRegistration};
pub use modifiers::{KeyboardState, ModifierSet};
pub use subscribers::SubscriptionId;
