//! 全局键盘钩子管理
//!
//! 核心设计：
//! 1. 系统在钩子线程上同步调用回调，回调必须快速返回
//! 2. 任何路径都要调用下一个钩子，否则会破坏整个钩子链
//! 3. 钩子句柄和回调引用由同一个注册对象持有，一起释放
//! 4. 释放是幂等的，Drop 只是兜底

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossbeam_channel::Receiver;
use tracing::{debug, error, info, warn};

use crate::config::HookConfig;
use crate::error::HookError;
use crate::event::{GlobalKeyEvent, KeyTransition, RawKeyboardEvent};
use crate::modifiers::{KeyboardState, ModifierSet};
use crate::platform;
use crate::subscribers::{Subscribers, SubscriptionId};

/// 系统钩子的注册句柄
///
/// 不可复制，`unregister` 消耗自身，所以只能注销一次。
pub trait HookRegistration: Send {
    /// 从系统注销钩子，并释放回调持有的 [`HookDispatch`]
    fn unregister(self: Box<Self>);
}

/// 平台钩子接口
pub trait HookPlatform: Send + Sync {
    /// 实时键盘状态查询
    fn keyboard_state(&self) -> Arc<dyn KeyboardState>;

    /// 注册系统级低级键盘钩子
    ///
    /// 返回 `Ok(None)` 表示平台没有这种能力，管理器进入惰性模式。
    fn register(
        &self,
        dispatch: Arc<HookDispatch>,
        config: &HookConfig,
    ) -> Result<Option<Box<dyn HookRegistration>>, HookError>;
}

/// 钩子回调的处理逻辑
///
/// 平台回调把系统参数交给 [`HookDispatch::handle`]，由它分类、发布并转发。
pub struct HookDispatch {
    subscribers: Arc<Subscribers>,
    keyboard: Arc<dyn KeyboardState>,
    ignore_injected: bool,
    slow_publish_threshold: Duration,
    active: AtomicBool,
}

impl HookDispatch {
    pub fn new(
        subscribers: Arc<Subscribers>,
        keyboard: Arc<dyn KeyboardState>,
        config: &HookConfig,
    ) -> Self {
        Self {
            subscribers,
            keyboard,
            ignore_injected: config.ignore_injected,
            slow_publish_threshold: config.slow_publish_threshold,
            active: AtomicBool::new(true),
        }
    }

    /// 处理一次系统回调
    ///
    /// `forward` 调用钩子链中的下一个钩子，在每条路径上恰好调用一次，
    /// 其返回值就是本次回调的返回值。
    pub fn handle<F>(
        &self,
        code: i32,
        message: u32,
        raw: Option<&RawKeyboardEvent>,
        forward: F,
    ) -> isize
    where
        F: FnOnce() -> isize,
    {
        // code 为负时不能处理，只转发
        if code >= 0 {
            if let Some(raw) = raw {
                self.process(message, raw);
            }
        }
        forward()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// 停止发布事件，回调仍然会转发
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn process(&self, message: u32, raw: &RawKeyboardEvent) {
        if !self.is_active() {
            return;
        }

        let transition = KeyTransition::from_message(message);
        if !transition.is_known() {
            return;
        }

        if self.ignore_injected && raw.is_injected() {
            return;
        }

        let start = Instant::now();
        let modifiers = ModifierSet::query(self.keyboard.as_ref());
        let event = GlobalKeyEvent::new(Local::now(), raw, transition, modifiers);
        self.subscribers.publish(&event);

        let elapsed = start.elapsed();
        if elapsed > self.slow_publish_threshold {
            warn!(
                ?elapsed,
                vk_code = raw.vk_code,
                "钩子回调耗时过长，系统可能会跳过或移除钩子"
            );
        }
    }
}

/// 全局键盘钩子管理器
///
/// 构造时安装钩子，`release` 或 Drop 时卸载。卸载之后不会重新安装。
pub struct HookManager {
    subscribers: Arc<Subscribers>,
    dispatch: Arc<HookDispatch>,
    registration: Option<Box<dyn HookRegistration>>,
    released: bool,
}

impl HookManager {
    /// 使用当前平台和默认配置安装钩子
    pub fn new() -> Result<Self, HookError> {
        Self::with_config(HookConfig::default())
    }

    pub fn with_config(config: HookConfig) -> Result<Self, HookError> {
        Self::with_platform(platform::native(), config)
    }

    /// 通过指定的平台接口安装钩子
    pub fn with_platform(platform: &dyn HookPlatform, config: HookConfig) -> Result<Self, HookError> {
        let subscribers = Arc::new(Subscribers::new());
        let dispatch = Arc::new(HookDispatch::new(
            Arc::clone(&subscribers),
            platform.keyboard_state(),
            &config,
        ));

        let registration = match platform.register(Arc::clone(&dispatch), &config) {
            Ok(Some(registration)) => {
                info!(thread = %config.thread_name, "键盘钩子已安装");
                Some(registration)
            }
            Ok(None) => {
                info!("当前平台不支持全局键盘钩子，不会产生任何事件");
                dispatch.deactivate();
                None
            }
            Err(e) => {
                error!(error = %e, "键盘钩子安装失败");
                dispatch.deactivate();
                return Err(e);
            }
        };

        Ok(Self {
            subscribers,
            dispatch,
            registration,
            released: false,
        })
    }

    /// 钩子是否已安装且尚未释放
    pub fn is_installed(&self) -> bool {
        self.registration.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// 订阅按键事件
    ///
    /// 回调在钩子线程上同步执行，不能阻塞。
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&GlobalKeyEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// 订阅一个 channel，适合把事件交给其他线程处理
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<GlobalKeyEvent>) {
        self.subscribers.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// 卸载钩子
    ///
    /// 重复调用是空操作。
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.dispatch.deactivate();

        if let Some(registration) = self.registration.take() {
            registration.unregister();
            info!("键盘钩子已卸载");
        } else {
            debug!("没有已安装的键盘钩子，无需卸载");
        }
    }
}

impl Drop for HookManager {
    fn drop(&mut self) {
        self.release();
    }
}
