//! 通过模拟平台驱动 HookManager 的完整生命周期

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use keyhook::event::{WM_KEYDOWN, WM_KEYUP, WM_SYSKEYUP};
use keyhook::modifiers::VK_SHIFT;
use keyhook::{
    GlobalKeyEvent, HookConfig, HookDispatch, HookError, HookManager, HookPlatform,
    HookRegistration, KeyTransition, KeyboardState, RawKeyboardEvent,
};

/// 模拟的系统键盘状态
#[derive(Default)]
struct MockKeyboard {
    held: Mutex<Vec<u32>>,
}

impl MockKeyboard {
    fn hold(&self, keys: &[u32]) {
        *self.held.lock().unwrap() = keys.to_vec();
    }
}

impl KeyboardState for MockKeyboard {
    fn is_key_down(&self, virtual_key: u32) -> bool {
        self.held.lock().unwrap().contains(&virtual_key)
    }
}

/// 模拟的系统钩子接口：记录注册的处理器和注销次数
#[derive(Default)]
struct MockPlatform {
    keyboard: Arc<MockKeyboard>,
    dispatch: Mutex<Option<Arc<HookDispatch>>>,
    unregistered: Arc<AtomicUsize>,
    forwarded: AtomicUsize,
    refuse: bool,
}

struct MockRegistration {
    unregistered: Arc<AtomicUsize>,
}

impl HookRegistration for MockRegistration {
    fn unregister(self: Box<Self>) {
        self.unregistered.fetch_add(1, Ordering::SeqCst);
    }
}

impl HookPlatform for MockPlatform {
    fn keyboard_state(&self) -> Arc<dyn KeyboardState> {
        self.keyboard.clone()
    }

    fn register(
        &self,
        dispatch: Arc<HookDispatch>,
        _config: &HookConfig,
    ) -> Result<Option<Box<dyn HookRegistration>>, HookError> {
        if self.refuse {
            return Err(HookError::RegistrationFailed("拒绝访问".to_string()));
        }
        *self.dispatch.lock().unwrap() = Some(dispatch);
        Ok(Some(Box::new(MockRegistration {
            unregistered: Arc::clone(&self.unregistered),
        })))
    }
}

impl MockPlatform {
    /// 模拟系统调用一次钩子回调，返回转发结果
    fn fire(&self, code: i32, message: u32, raw: Option<&RawKeyboardEvent>) -> isize {
        let dispatch = self.dispatch.lock().unwrap().clone().expect("钩子未注册");
        dispatch.handle(code, message, raw, || {
            self.forwarded.fetch_add(1, Ordering::SeqCst);
            42
        })
    }

    fn forwarded(&self) -> usize {
        self.forwarded.load(Ordering::SeqCst)
    }

    fn unregistered(&self) -> usize {
        self.unregistered.load(Ordering::SeqCst)
    }
}

fn collect(manager: &HookManager) -> Arc<Mutex<Vec<GlobalKeyEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    manager.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

fn key(vk_code: u32, scan_code: u32) -> RawKeyboardEvent {
    RawKeyboardEvent { vk_code, scan_code, ..Default::default() }
}

#[test]
fn test_shift_a_key_down() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    assert!(manager.is_installed());
    let events = collect(&manager);

    platform.keyboard.hold(&[VK_SHIFT]);
    assert_eq!(platform.fire(0, WM_KEYDOWN, Some(&key(0x41, 0x1E))), 42);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.transition(), KeyTransition::KeyDown);
    assert_eq!(event.vk_code(), 0x41);
    assert_eq!(event.modifiers(), "Shift");
    assert_eq!(event.key_text(), "A");

    let line = event.to_string();
    assert!(line.starts_with('['));
    assert!(line.contains("] KeyDown VK=0x41 ('A') Scan=0x1E"));
    assert!(line.ends_with("Mods=Shift"));
}

#[test]
fn test_system_tab_key_up() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    let events = collect(&manager);

    platform.fire(0, WM_SYSKEYUP, Some(&key(0x09, 0x0F)));

    let events = events.lock().unwrap();
    let event = &events[0];
    assert_eq!(event.transition(), KeyTransition::SystemKeyUp);
    assert_eq!(event.key_text(), "");
    assert_eq!(event.modifiers(), "(none)");

    let line = event.to_string();
    assert!(line.contains("] SystemKeyUp VK=0x09 Scan=0x0F"));
    assert!(!line.contains("('"));
    assert!(line.ends_with("Mods=(none)"));
}

#[test]
fn test_forward_count_matches_invocations() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    let events = collect(&manager);

    platform.fire(0, WM_KEYDOWN, Some(&key(0x41, 0x1E)));
    platform.fire(-1, WM_KEYDOWN, Some(&key(0x41, 0x1E)));
    platform.fire(0, WM_KEYUP, None);
    platform.fire(0, 0x0200, Some(&key(0x41, 0x1E)));
    platform.fire(0, WM_KEYUP, Some(&key(0x41, 0x1E)));

    assert_eq!(platform.forwarded(), 5);
    assert_eq!(events.lock().unwrap().len(), 2);
}

#[test]
fn test_release_is_idempotent() {
    let platform = MockPlatform::default();
    let mut manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();

    manager.release();
    manager.release();
    assert!(manager.is_released());
    assert!(!manager.is_installed());

    drop(manager);
    assert_eq!(platform.unregistered(), 1);
}

#[test]
fn test_drop_releases() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    drop(manager);
    assert_eq!(platform.unregistered(), 1);
}

#[test]
fn test_no_events_after_release() {
    let platform = MockPlatform::default();
    let mut manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    let events = collect(&manager);

    manager.release();
    assert_eq!(platform.fire(0, WM_KEYDOWN, Some(&key(0x41, 0x1E))), 42);
    assert_eq!(platform.fire(0, WM_SYSKEYUP, Some(&key(0x09, 0x0F))), 42);

    assert!(events.lock().unwrap().is_empty());
    assert_eq!(platform.forwarded(), 2);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let id = manager.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    platform.fire(0, WM_KEYDOWN, Some(&key(0x41, 0x1E)));
    assert!(manager.unsubscribe(id));
    platform.fire(0, WM_KEYDOWN, Some(&key(0x41, 0x1E)));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(manager.subscriber_count(), 0);
}

#[test]
fn test_channel_subscriber_receives_on_other_thread() {
    let platform = MockPlatform::default();
    let manager = HookManager::with_platform(&platform, HookConfig::default()).unwrap();
    let (_, rx) = manager.subscribe_channel();

    let reader = std::thread::spawn(move || rx.recv().map(|event| event.vk_code()));
    platform.fire(0, WM_KEYDOWN, Some(&key(0x5A, 0x2C)));

    assert_eq!(reader.join().unwrap().unwrap(), 0x5A);
}

#[test]
fn test_registration_failure_is_reported() {
    let platform = MockPlatform { refuse: true, ..Default::default() };
    let result = HookManager::with_platform(&platform, HookConfig::default());

    assert!(matches!(result, Err(HookError::RegistrationFailed(_))));
    assert_eq!(platform.unregistered(), 0);
}
