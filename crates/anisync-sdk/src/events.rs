//! 事件系统模块 - 向 UI 客户端广播刷新事件
//!
//! 功能包括：
//! - 同步完成后的集合刷新事件
//! - 事件广播和订阅机制（fire-and-forget，不保证送达）

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// 离线中心事件类型
///
/// 同步通过后向 UI 客户端广播，提示其重新拉取远端集合。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubEvent {
    /// 动画集合已刷新
    RefreshedAnimeCollection,
    /// 漫画集合已刷新
    RefreshedMangaCollection,
}

impl HubEvent {
    /// 事件名称（用于跨进程投递时的命名）
    pub fn name(&self) -> &'static str {
        match self {
            HubEvent::RefreshedAnimeCollection => "refreshed-anime-collection",
            HubEvent::RefreshedMangaCollection => "refreshed-manga-collection",
        }
    }
}

/// 事件发送端 - fire-and-forget
///
/// 离线中心不关心是否有订阅者，也不等待送达。
pub trait EventSink: Send + Sync {
    fn send_event(&self, event: HubEvent);
}

/// 基于 tokio broadcast 的事件管理器
///
/// UI 客户端通过 `subscribe()` 获取接收端；没有订阅者时发送失败会被吞掉。
pub struct EventManager {
    sender: broadcast::Sender<HubEvent>,
}

impl EventManager {
    /// 创建事件管理器
    ///
    /// `capacity` 为广播通道容量，慢订阅者超出容量会丢失最早的事件。
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventSink for EventManager {
    fn send_event(&self, event: HubEvent) {
        debug!(event = event.name(), "事件广播");
        // 没有订阅者时 send 返回 Err，按 fire-and-forget 语义忽略
        let _ = self.sender.send(event);
    }
}
