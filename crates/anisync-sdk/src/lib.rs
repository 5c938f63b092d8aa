//! AniSync SDK - 离线优先的 AniList 追番/追漫 SDK
//!
//! 本 SDK 让用户在断网时继续维护自己的动画/漫画列表，包括：
//! - 📸 快照系统：捕获远端列表的时点副本，作为离线工作副本
//! - ✏️ 离线修改：进度、状态、评分、起止日期的字段级编辑
//! - 🔄 同步通道：恢复联网后只回放被修改的条目，部分失败不丢数据
//! - ⚙️ 事件系统：同步完成后向 UI 客户端广播刷新事件
//! - 🧵 并发安全：一把粗锁串行化全部中心操作
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anisync_sdk::{
//!     AnilistClient, EventManager, Hub, HubOptions, OfflineDatabase,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(OfflineDatabase::open(
//!         std::path::Path::new("/path/to/data"),
//!         "anisync-offline",
//!     )?);
//!     let client = Arc::new(AnilistClient::new("anilist-token")?);
//!     let events = Arc::new(EventManager::default());
//!
//!     let hub = Hub::new(HubOptions {
//!         store,
//!         media_list_client: client,
//!         event_sink: events,
//!         refresh_collections: Arc::new(|| {}),
//!         is_offline: false,
//!     });
//!
//!     // 恢复联网后回放离线修改
//!     hub.sync_list_data().await?;
//!
//!     Ok(())
//! }
//! ```

// 导出核心模块
pub mod anilist;
pub mod error;
pub mod events;
pub mod hub;
pub mod storage;

// 重新导出核心类型，方便使用
pub use anilist::{AnilistClient, FuzzyDateInput, MediaListClient, MediaListStatus};
pub use error::{AnisyncSDKError, Result};
pub use events::{EventManager, EventSink, HubEvent};
pub use hub::{Hub, HubOptions, RefreshCollectionsFn};
pub use storage::{
    AnimeEntry, ListData, MangaEntry, MediaType, OfflineDatabase, Snapshot, SnapshotEntryData,
    SnapshotMediaEntry, SnapshotStore,
};
