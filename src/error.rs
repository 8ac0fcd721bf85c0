//! 错误类型
//!
//! 平台不支持不算错误（钩子管理器进入惰性模式），
//! 只有真正的安装失败才会在构造时返回。

/// 钩子安装过程中可能出现的错误
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// 无法获取当前进程主模块句柄
    #[error("无法获取模块句柄: {0}")]
    ModuleHandle(String),

    /// 系统拒绝注册低级键盘钩子
    #[error("无法安装键盘钩子: {0}")]
    RegistrationFailed(String),

    /// 无法启动钩子线程
    #[error("无法启动钩子线程: {0}")]
    ThreadSpawn(String),

    /// 钩子线程在报告安装结果之前退出
    #[error("钩子线程在安装完成前退出")]
    StartupLost,
}
