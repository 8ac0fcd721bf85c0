//! 配置模块
//!
//! 钩子线程名称、注入事件过滤、慢回调告警阈值。
//! 默认值可以通过环境变量覆盖。

use std::env;
use std::time::Duration;

/// 钩子线程默认名称
pub const DEFAULT_THREAD_NAME: &str = "keyhook";

/// 发布耗时超过这个时间就记录警告，系统对低级钩子有响应时间限制
pub const DEFAULT_SLOW_PUBLISH_THRESHOLD: Duration = Duration::from_millis(10);

pub const ENV_THREAD_NAME: &str = "KEYHOOK_THREAD_NAME";
pub const ENV_IGNORE_INJECTED: &str = "KEYHOOK_IGNORE_INJECTED";
pub const ENV_SLOW_PUBLISH_MS: &str = "KEYHOOK_SLOW_PUBLISH_MS";

/// 应用版本
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 钩子配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// 运行消息循环的钩子线程名称
    pub thread_name: String,
    /// 跳过带 LLKHF_INJECTED 标志的事件（仍然转发给下一个钩子）
    pub ignore_injected: bool,
    pub slow_publish_threshold: Duration,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            ignore_injected: false,
            slow_publish_threshold: DEFAULT_SLOW_PUBLISH_THRESHOLD,
        }
    }
}

impl HookConfig {
    /// 从环境变量加载，未设置或无法解析的项使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_THREAD_NAME).filter(|n| !n.trim().is_empty()) {
            config.thread_name = name.trim().to_string();
        }
        if let Some(value) = lookup(ENV_IGNORE_INJECTED) {
            config.ignore_injected = parse_flag(&value);
        }
        if let Some(ms) = lookup(ENV_SLOW_PUBLISH_MS).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.slow_publish_threshold = Duration::from_millis(ms);
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
