//! 没有低级键盘钩子的平台：什么都不安装

use std::sync::Arc;

use crate::config::HookConfig;
use crate::error::HookError;
use crate::hook::{HookDispatch, HookPlatform, HookRegistration};
use crate::modifiers::KeyboardState;

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

struct NoKeysDown;

impl KeyboardState for NoKeysDown {
    fn is_key_down(&self, _virtual_key: u32) -> bool {
        false
    }
}

impl HookPlatform for UnsupportedPlatform {
    fn keyboard_state(&self) -> Arc<dyn KeyboardState> {
        Arc::new(NoKeysDown)
    }

    fn register(
        &self,
        _dispatch: Arc<HookDispatch>,
        _config: &HookConfig,
    ) -> Result<Option<Box<dyn HookRegistration>>, HookError> {
        Ok(None)
    }
}
