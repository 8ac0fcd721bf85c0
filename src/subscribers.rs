//! 订阅者列表
//!
//! 发布时先取出当前列表的快照（`Arc` 克隆），释放锁后再逐个通知，
//! 所以订阅者在回调里增删订阅不会破坏正在进行的遍历。

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{unbounded, Receiver};
use tracing::error;

use crate::event::GlobalKeyEvent;

/// 订阅回调
///
/// 在钩子线程上同步调用，必须很快返回。需要更新界面的订阅者应当自行
/// 把工作投递到自己的线程（例如发送到 channel）。
pub type KeyCallback = Arc<dyn Fn(&GlobalKeyEvent) + Send + Sync>;

/// 订阅标识，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SubscriberList = Arc<Vec<(SubscriptionId, KeyCallback)>>;

/// 写时复制的订阅者列表
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    list: Mutex<SubscriberList>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&GlobalKeyEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut list = self.lock_list();
        let mut next = Vec::with_capacity(list.len() + 1);
        next.extend(list.iter().cloned());
        next.push((id, Arc::new(callback) as KeyCallback));
        *list = Arc::new(next);
        id
    }

    /// 订阅一个 channel，事件以非阻塞方式发送
    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<GlobalKeyEvent>) {
        let (tx, rx) = unbounded();
        let id = self.subscribe(move |event| {
            // 接收端已经关闭时直接丢弃
            let _ = tx.try_send(event.clone());
        });
        (id, rx)
    }

    /// 取消订阅，返回该订阅是否存在
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut list = self.lock_list();
        if !list.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let next: Vec<_> = list
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *list = Arc::new(next);
        true
    }

    /// 当前订阅者列表的快照
    pub fn snapshot(&self) -> SubscriberList {
        Arc::clone(&self.lock_list())
    }

    /// 通知所有订阅者，返回被通知的数量
    ///
    /// 单个订阅者 panic 不会影响其他订阅者，也不会传播到系统回调。
    pub fn publish(&self, event: &GlobalKeyEvent) -> usize {
        let snapshot = self.snapshot();
        for (id, callback) in snapshot.iter() {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(subscription = ?id, vk_code = event.vk_code(), "订阅者回调 panic");
            }
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.lock_list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_list(&self) -> MutexGuard<'_, SubscriberList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
