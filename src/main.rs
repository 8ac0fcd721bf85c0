//! keyhook 控制台程序
//!
//! 安装全局键盘钩子，把每个按键事件以单行格式输出到标准输出。
//! 按 Esc 退出。

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyhook::{config, HookConfig, HookManager, KeyTransition};

/// Esc 的虚拟键码
const VK_ESCAPE: u32 = 0x1B;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(version = config::APP_VERSION, "keyhook 正在启动");

    let hook_config = HookConfig::from_env();
    info!(?hook_config, "配置已加载");

    let mut manager = HookManager::with_config(hook_config)?;
    if !manager.is_installed() {
        warn!("没有安装键盘钩子，程序退出");
        return Ok(());
    }

    // 订阅者只负责把事件转交给主线程，钩子线程不做输出
    let (_subscription, events) = manager.subscribe_channel();

    info!("键盘钩子运行中，按 Esc 退出");

    for event in events.iter() {
        println!("{event}");

        if event.transition() == KeyTransition::KeyDown && event.vk_code() == VK_ESCAPE {
            info!("收到 Esc，正在退出");
            break;
        }
    }

    manager.release();
    info!("keyhook 已停止");

    Ok(())
}
