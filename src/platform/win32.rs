//! Windows 原生键盘钩子
//!
//! 使用 `SetWindowsHookExW(WH_KEYBOARD_LL)` 安装全局键盘钩子。
//!
//! 核心设计：
//! - 钩子在专用线程上安装，该线程运行 GetMessage 消息循环，系统在这个线程上调用回调
//! - 回调读取的 [`HookDispatch`] 存放在钩子线程的 thread_local 中，随线程一起释放
//! - 卸载时向钩子线程投递 WM_QUIT，线程退出消息循环后调用 UnhookWindowsHookEx

use std::cell::RefCell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use tracing::{debug, error, warn};

use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT, MSG,
    PM_NOREMOVE, WH_KEYBOARD_LL, WM_QUIT, WM_USER,
};

use crate::config::HookConfig;
use crate::error::HookError;
use crate::event::RawKeyboardEvent;
use crate::hook::{HookDispatch, HookPlatform, HookRegistration};
use crate::modifiers::KeyboardState;

thread_local! {
    /// 当前线程上钩子回调使用的处理器
    static DISPATCH: RefCell<Option<Arc<HookDispatch>>> = const { RefCell::new(None) };
}

/// Windows 低级键盘钩子平台
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsHookPlatform;

/// 通过 GetAsyncKeyState 读取实时按键状态
struct AsyncKeyState;

impl KeyboardState for AsyncKeyState {
    fn is_key_down(&self, virtual_key: u32) -> bool {
        // 最高位为 1 表示按下
        unsafe { GetAsyncKeyState(virtual_key as i32) < 0 }
    }
}

impl HookPlatform for WindowsHookPlatform {
    fn keyboard_state(&self) -> Arc<dyn KeyboardState> {
        Arc::new(AsyncKeyState)
    }

    fn register(
        &self,
        dispatch: Arc<HookDispatch>,
        config: &HookConfig,
    ) -> Result<Option<Box<dyn HookRegistration>>, HookError> {
        let (ready_tx, ready_rx) = bounded(1);

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || run_hook_thread(dispatch, ready_tx))
            .map_err(|e| HookError::ThreadSpawn(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Some(Box::new(WindowsRegistration { thread_id, thread }))),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(HookError::StartupLost)
            }
        }
    }
}

/// 已安装的钩子：钩子线程持有 HHOOK 和回调处理器
struct WindowsRegistration {
    thread_id: u32,
    thread: JoinHandle<()>,
}

impl HookRegistration for WindowsRegistration {
    fn unregister(self: Box<Self>) {
        let WindowsRegistration { thread_id, thread } = *self;

        if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            error!(thread_id, error = ?e, "无法通知钩子线程退出");
            return;
        }

        // 在钩子线程自身上释放时不能等待自己
        if thread.thread().id() == thread::current().id() {
            warn!("在钩子线程上释放钩子，跳过等待线程退出");
            return;
        }

        if thread.join().is_err() {
            error!(thread_id, "钩子线程异常退出");
        }
    }
}

/// 钩子线程主体：安装钩子、报告结果、运行消息循环、卸载钩子
fn run_hook_thread(dispatch: Arc<HookDispatch>, ready_tx: Sender<Result<u32, HookError>>) {
    let hook = match install(dispatch) {
        Ok(hook) => hook,
        Err(e) => {
            DISPATCH.with(|slot| slot.borrow_mut().take());
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let thread_id = unsafe { GetCurrentThreadId() };
    debug!(thread_id, "键盘钩子线程已启动");
    let _ = ready_tx.send(Ok(thread_id));

    // 运行消息循环（必须！否则钩子无法工作）
    run_message_loop();

    if let Err(e) = unsafe { UnhookWindowsHookEx(hook) } {
        warn!(error = ?e, "UnhookWindowsHookEx 失败");
    }
    // 钩子已注销，回调不会再被调用
    DISPATCH.with(|slot| slot.borrow_mut().take());
    debug!(thread_id, "键盘钩子线程已退出");
}

fn install(dispatch: Arc<HookDispatch>) -> Result<HHOOK, HookError> {
    unsafe {
        // 先创建线程消息队列，之后 PostThreadMessageW 才能送达
        let mut msg = MSG::default();
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);

        let module = GetModuleHandleW(None).map_err(|e| HookError::ModuleHandle(e.to_string()))?;
        let instance: HINSTANCE = module.into();

        DISPATCH.with(|slot| *slot.borrow_mut() = Some(dispatch));

        SetWindowsHookExW(WH_KEYBOARD_LL, Some(low_level_keyboard_proc), instance, 0)
            .map_err(|e| HookError::RegistrationFailed(e.to_string()))
    }
}

/// 低级键盘钩子回调函数
///
/// 快速返回，不做耗时操作；无论是否处理都调用 CallNextHookEx。
unsafe extern "system" fn low_level_keyboard_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let forward = || unsafe { CallNextHookEx(HHOOK::default(), code, wparam, lparam) }.0;

    let dispatch = DISPATCH.with(|slot| slot.borrow().clone());
    let Some(dispatch) = dispatch else {
        return LRESULT(forward());
    };

    // code 为负时 lparam 不保证指向有效结构
    let raw = if code >= 0 {
        (lparam.0 as *const KBDLLHOOKSTRUCT)
            .as_ref()
            .map(|kbd| RawKeyboardEvent {
                vk_code: kbd.vkCode,
                scan_code: kbd.scanCode,
                flags: kbd.flags.0,
                time: kbd.time,
                extra_info: kbd.dwExtraInfo,
            })
    } else {
        None
    };

    LRESULT(dispatch.handle(code, wparam.0 as u32, raw.as_ref(), forward))
}

/// 运行 Windows 消息循环
///
/// GetMessage 返回 0 表示收到 WM_QUIT，返回 -1 表示错误。
fn run_message_loop() {
    unsafe {
        let mut msg = MSG::default();
        loop {
            let result = GetMessageW(&mut msg, None, 0, 0).0;
            if result == 0 {
                break;
            }
            if result == -1 {
                error!("GetMessageW 失败，退出钩子消息循环");
                break;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}
