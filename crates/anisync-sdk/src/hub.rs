//! 离线中心模块 - 本 SDK 的核心
//!
//! 职责：
//! - 持有"当前快照"的内存缓存，作为离线期间的工作副本
//! - 提供请求处理器并发调用的字段级修改操作
//! - 恢复联网后执行同步通道，把本地修改回放到 AniList
//!
//! 并发纪律：一把粗粒度互斥锁守住每个公开操作的全程（包括同步通道
//! 内的网络调用），所有操作按全局调用顺序串行生效。同步通道只在
//! 重新联网时跑一次，锁被长占是可接受的代价。

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::anilist::{FuzzyDateInput, MediaListClient, MediaListStatus};
use crate::error::{AnisyncSDKError, Result};
use crate::events::{EventSink, HubEvent};
use crate::storage::{MediaType, Snapshot, SnapshotEntryData, SnapshotStore};

/// 同步成功后触发的集合刷新回调
pub type RefreshCollectionsFn = Arc<dyn Fn() + Send + Sync>;

/// 离线中心构造参数
pub struct HubOptions {
    pub store: Arc<dyn SnapshotStore>,
    pub media_list_client: Arc<dyn MediaListClient>,
    pub event_sink: Arc<dyn EventSink>,
    /// 同步成功后刷新远端集合的回调
    pub refresh_collections: RefreshCollectionsFn,
    /// 用户启用了离线模式；离线模式下同步通道不运行
    pub is_offline: bool,
}

/// 离线中心
pub struct Hub {
    store: Arc<dyn SnapshotStore>,
    media_list_client: Arc<dyn MediaListClient>,
    event_sink: Arc<dyn EventSink>,
    refresh_collections: RefreshCollectionsFn,
    is_offline: bool,

    current_snapshot: Mutex<Option<Snapshot>>,
}

impl Hub {
    /// 创建离线中心
    pub fn new(opts: HubOptions) -> Self {
        if opts.is_offline {
            info!("离线中心: 离线模式已启用");
        }
        Self {
            store: opts.store,
            media_list_client: opts.media_list_client,
            event_sink: opts.event_sink,
            refresh_collections: opts.refresh_collections,
            is_offline: opts.is_offline,
            current_snapshot: Mutex::new(None),
        }
    }

    /// 当前缓存的快照，不触发加载
    pub async fn get_current_snapshot(&self) -> Option<Snapshot> {
        let guard = self.current_snapshot.lock().await;
        guard.clone()
    }

    /// 当前快照，缓存未命中时从存储惰性加载
    ///
    /// 仅当库中完全没有快照时返回 `None`。
    pub async fn retrieve_current_snapshot(&self) -> Option<Snapshot> {
        let mut guard = self.current_snapshot.lock().await;
        if guard.is_none() {
            match self.store.get_latest_snapshot() {
                Ok(Some(snapshot)) => *guard = Some(snapshot),
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "离线中心: 加载最新快照失败");
                    return None;
                }
            }
        }
        guard.clone()
    }

    /// 更新动画条目的进度与状态
    pub async fn update_anime_list_status(
        &self,
        media_id: i64,
        progress: i64,
        status: MediaListStatus,
    ) -> Result<()> {
        let mut guard = self.current_snapshot.lock().await;

        debug!(media_id, progress, "离线中心: 更新动画列表状态");

        let snapshot_id = self.ensure_current(&mut guard)?;

        let mut entry = self
            .store
            .get_snapshot_media_entry(media_id, snapshot_id)?
            .ok_or_else(|| AnisyncSDKError::NotFound("anime entry not found".to_string()))?;

        let mut data = match entry.decode_data() {
            Ok(data @ SnapshotEntryData::Anime(_)) => data,
            _ => return Err(AnisyncSDKError::NotFound("anime entry not found".to_string())),
        };

        let list_data = data.list_data_mut();
        list_data.progress = progress;
        list_data.status = status;

        entry.set_data(&data)?;
        self.store.update_snapshot_media_entry(&entry)?;

        self.reload_cache(&mut guard)?;

        info!(media_id, "离线中心: 动画列表状态已更新");
        Ok(())
    }

    /// 更新漫画条目的进度与状态
    pub async fn update_manga_list_status(
        &self,
        media_id: i64,
        progress: i64,
        status: MediaListStatus,
    ) -> Result<()> {
        let mut guard = self.current_snapshot.lock().await;

        debug!(media_id, progress, "离线中心: 更新漫画列表状态");

        let snapshot_id = self.ensure_current(&mut guard)?;

        let mut entry = self
            .store
            .get_snapshot_media_entry(media_id, snapshot_id)?
            .ok_or_else(|| AnisyncSDKError::NotFound("manga entry not found".to_string()))?;

        let mut data = match entry.decode_data() {
            Ok(data @ SnapshotEntryData::Manga(_)) => data,
            _ => return Err(AnisyncSDKError::NotFound("manga entry not found".to_string())),
        };

        let list_data = data.list_data_mut();
        list_data.progress = progress;
        list_data.status = status;

        entry.set_data(&data)?;
        self.store.update_snapshot_media_entry(&entry)?;

        self.reload_cache(&mut guard)?;

        info!(media_id, "离线中心: 漫画列表状态已更新");
        Ok(())
    }

    /// 更新条目的任意列表字段
    ///
    /// 每个可选字段独立生效，`None` 表示保持原值；`kind` 选择
    /// 类型化解码路径，与行判别符不符时视作条目不存在。
    #[allow(clippy::too_many_arguments)]
    pub async fn update_entry_list_data(
        &self,
        media_id: i64,
        status: Option<MediaListStatus>,
        score: Option<i64>,
        progress: Option<i64>,
        start_date: Option<String>,
        end_date: Option<String>,
        kind: MediaType,
    ) -> Result<()> {
        let mut guard = self.current_snapshot.lock().await;

        debug!(media_id, %kind, "离线中心: 更新条目列表数据");

        let snapshot_id = self.ensure_current(&mut guard)?;

        let mut entry = self
            .store
            .get_snapshot_media_entry(media_id, snapshot_id)?
            .ok_or_else(|| AnisyncSDKError::NotFound("entry not found".to_string()))?;

        let mut data = match entry.decode_data() {
            Ok(data) if data.media_type() == kind => data,
            _ => return Err(AnisyncSDKError::NotFound("entry not found".to_string())),
        };

        let list_data = data.list_data_mut();
        if let Some(progress) = progress {
            list_data.progress = progress;
        }
        if let Some(status) = status {
            list_data.status = status;
        }
        if let Some(score) = score {
            list_data.score = score;
        }
        if let Some(start_date) = start_date {
            list_data.started_at = start_date;
        }
        if let Some(end_date) = end_date {
            list_data.completed_at = end_date;
        }

        entry.set_data(&data)?;
        self.store.update_snapshot_media_entry(&entry)?;

        self.reload_cache(&mut guard)?;

        info!(media_id, "离线中心: 条目列表数据已更新");
        Ok(())
    }

    /// 同步通道：把本地修改过的条目回放到 AniList，然后退役快照
    ///
    /// 全程持锁，与字段修改操作严格串行。失败策略是通道级
    /// all-or-nothing：任何一条推送失败都保留快照、不发事件，
    /// 下次整体重试（远端更新是幂等 upsert，重复推送安全）。
    pub async fn sync_list_data(&self) -> Result<()> {
        let mut guard = self.current_snapshot.lock().await;

        // 离线模式下同步永不运行，直接成功返回
        if self.is_offline {
            return Ok(());
        }

        let snapshot = self
            .store
            .get_latest_snapshot()
            .map_err(|_| AnisyncSDKError::NotFound("no snapshot found".to_string()))?
            .ok_or_else(|| AnisyncSDKError::NotFound("no snapshot found".to_string()))?;

        if snapshot.synced {
            return Err(AnisyncSDKError::Precondition("data already synced".to_string()));
        }
        if !snapshot.used {
            return Err(AnisyncSDKError::Precondition("snapshot not used".to_string()));
        }

        let entries = match self.store.get_snapshot_media_entries(snapshot.db_id) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "离线中心: 读取离线修改失败");
                return Err(e);
            }
        };

        // created_at == updated_at 即本地未修改，不回放
        let candidates: Vec<_> = entries.into_iter().filter(|e| e.is_modified()).collect();
        if candidates.is_empty() {
            return Ok(());
        }

        info!(count = candidates.len(), "离线中心: 开始同步列表数据");

        let mut last_err: Option<AnisyncSDKError> = None;
        for entry in &candidates {
            // 载荷损坏的条目跳过，不中断整个通道
            let Ok(data) = entry.decode_data() else {
                warn!(media_id = entry.media_id, "离线中心: 条目载荷解码失败，跳过");
                continue;
            };
            let list_data = data.list_data();

            // 本地 0–10 → 远端 0–100，只在推送时放大，放大值不落库
            let score = list_data.score * 10;

            let start_date = FuzzyDateInput::from_rfc3339(&list_data.started_at);
            let end_date = FuzzyDateInput::from_rfc3339(&list_data.completed_at);

            if let Err(e) = self
                .media_list_client
                .update_media_list_entry(
                    entry.media_id,
                    list_data.status,
                    score,
                    list_data.progress,
                    start_date,
                    end_date,
                )
                .await
            {
                warn!(media_id = entry.media_id, error = %e, "离线中心: 条目推送失败");
                last_err = Some(e);
            }
        }

        if let Some(e) = last_err {
            error!(error = %e, "离线中心: 部分数据同步失败，请重试");
            return Err(e);
        }

        // 全部成功：退役快照。删除失败不影响通道结果（下一轮会重删）。
        if let Err(e) = self.store.delete_snapshot(snapshot.db_id) {
            warn!(error = %e, "离线中心: 删除快照失败");
        }
        *guard = None;

        (self.refresh_collections)();

        self.event_sink.send_event(HubEvent::RefreshedAnimeCollection);
        self.event_sink.send_event(HubEvent::RefreshedMangaCollection);

        info!("离线中心: 列表数据同步完成");
        Ok(())
    }

    // ============================================================
    // 私有方法
    // ============================================================

    /// 缓存未命中时装入最新快照，返回当前快照主键
    fn ensure_current(&self, guard: &mut MutexGuard<'_, Option<Snapshot>>) -> Result<i64> {
        if let Some(snapshot) = guard.as_ref() {
            return Ok(snapshot.db_id);
        }
        let snapshot = self
            .store
            .get_latest_snapshot()
            .map_err(|_| AnisyncSDKError::NotFound("snapshot not found".to_string()))?
            .ok_or_else(|| AnisyncSDKError::NotFound("snapshot not found".to_string()))?;
        let db_id = snapshot.db_id;
        **guard = Some(snapshot);
        Ok(db_id)
    }

    /// 每次修改后无条件从存储重载缓存，保证内存与落盘一致
    /// （以每写一读的代价换实现简单，不做增量补丁）
    fn reload_cache(&self, guard: &mut MutexGuard<'_, Option<Snapshot>>) -> Result<()> {
        let snapshot = self
            .store
            .get_latest_snapshot()?
            .ok_or_else(|| AnisyncSDKError::NotFound("snapshot not found".to_string()))?;
        **guard = Some(snapshot);
        Ok(())
    }
}
