//! 存储模块 - 快照数据的持久化层
//!
//! 采用分层架构设计：
//! - OfflineDatabase: 统一的快照库管理器，持有连接并提供领域 API
//! - DAO Layer: 数据访问层，每张表一个专门的操作模块
//! - Entities: 数据实体定义，类型安全的数据传输
//! - Codec: 不透明条目载荷与类型化条目的互转

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{AnisyncSDKError, Result};

pub mod codec;
pub mod dao;
pub mod entities;

pub use codec::{anime_payload, manga_payload, SnapshotEntryData};
pub use entities::{AnimeEntry, ListData, MangaEntry, MediaType, Snapshot, SnapshotMediaEntry};

use dao::{SnapshotDao, SnapshotEntryDao};

/// 快照存储 - 离线中心消费的接口
///
/// 只包含中心需要的六个操作；捕获侧（插入快照/条目、标记使用）
/// 是 `OfflineDatabase` 的具体类型表面。
pub trait SnapshotStore: Send + Sync {
    /// 最新快照（条目已装入），库为空时返回 `None`
    fn get_latest_snapshot(&self) -> Result<Option<Snapshot>>;
    fn get_snapshot_media_entry(
        &self,
        media_id: i64,
        snapshot_db_id: i64,
    ) -> Result<Option<SnapshotMediaEntry>>;
    fn get_snapshot_media_entries(&self, snapshot_id: i64) -> Result<Vec<SnapshotMediaEntry>>;
    /// 持久化条目修改；存储层负责把 `updated_at` 推进到严格大于 `created_at`
    fn update_snapshot_media_entry(&self, entry: &SnapshotMediaEntry) -> Result<usize>;
    /// 删除快照及其全部条目
    fn delete_snapshot(&self, snapshot_id: i64) -> Result<()>;
    fn has_snapshots(&self) -> bool;
}

/// 快照数据库 - 基于 rusqlite 的嵌入式行存储
pub struct OfflineDatabase {
    conn: Mutex<Connection>,
}

impl OfflineDatabase {
    /// 打开（或创建）快照数据库
    ///
    /// # 参数
    /// - `dir`: 数据库所在目录，不存在时创建
    /// - `name`: 数据库文件名（不含扩展名）
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| AnisyncSDKError::IO(format!("创建离线数据目录失败: {}", e)))?;

        let db_path = dir.join(format!("{}.db", name));
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Self::init_schema(&conn)?;

        info!("✅ 快照数据库已打开: {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshot (
                db_id      INTEGER PRIMARY KEY AUTOINCREMENT,
                used       INTEGER NOT NULL DEFAULT 0,
                synced     INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS snapshot_media_entry (
                db_id       INTEGER PRIMARY KEY AUTOINCREMENT,
                snapshot_id INTEGER NOT NULL REFERENCES snapshot(db_id),
                media_id    INTEGER NOT NULL,
                kind        TEXT    NOT NULL,
                value       BLOB    NOT NULL,
                created_at  INTEGER NOT NULL,
                updated_at  INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entry_snapshot_media
                ON snapshot_media_entry (snapshot_id, media_id);",
        )?;
        Ok(())
    }

    // ============================================================
    // 捕获侧操作（快照的创建发生在中心之外）
    // ============================================================

    /// 插入一个新快照
    pub fn insert_snapshot(&self, used: bool) -> Result<Snapshot> {
        let conn = self.conn.lock();
        let now_ms = Utc::now().timestamp_millis();
        let db_id = SnapshotDao::new(&conn).insert(used, false, now_ms)?;
        debug!(db_id, "快照已创建");
        Ok(Snapshot {
            db_id,
            used,
            synced: false,
            created_at: now_ms,
            updated_at: now_ms,
            entries: Vec::new(),
        })
    }

    /// 向快照插入一个媒体条目
    pub fn insert_snapshot_media_entry(
        &self,
        snapshot_id: i64,
        media_id: i64,
        data: &SnapshotEntryData,
    ) -> Result<SnapshotMediaEntry> {
        let value = data.encode()?;
        let kind = data.media_type();
        let conn = self.conn.lock();
        let now_ms = Utc::now().timestamp_millis();
        let db_id =
            SnapshotEntryDao::new(&conn).insert(snapshot_id, media_id, kind, &value, now_ms)?;
        Ok(SnapshotMediaEntry {
            db_id,
            snapshot_id,
            media_id,
            kind,
            value,
            created_at: now_ms,
            updated_at: now_ms,
        })
    }

    /// 标记快照已被用作活动工作副本
    pub fn mark_snapshot_used(&self, snapshot_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        SnapshotDao::new(&conn).mark_used(snapshot_id, Utc::now().timestamp_millis())
    }

    /// 标记快照已同步（保留操作，见 `Snapshot::synced`）
    pub fn mark_snapshot_synced(&self, snapshot_id: i64) -> Result<()> {
        let conn = self.conn.lock();
        SnapshotDao::new(&conn).mark_synced(snapshot_id, Utc::now().timestamp_millis())
    }
}

impl SnapshotStore for OfflineDatabase {
    fn get_latest_snapshot(&self) -> Result<Option<Snapshot>> {
        let conn = self.conn.lock();
        let Some(mut snapshot) = SnapshotDao::new(&conn).get_latest()? else {
            return Ok(None);
        };
        snapshot.entries = SnapshotEntryDao::new(&conn).list_for_snapshot(snapshot.db_id)?;
        Ok(Some(snapshot))
    }

    fn get_snapshot_media_entry(
        &self,
        media_id: i64,
        snapshot_db_id: i64,
    ) -> Result<Option<SnapshotMediaEntry>> {
        let conn = self.conn.lock();
        SnapshotEntryDao::new(&conn).get_by_media(media_id, snapshot_db_id)
    }

    fn get_snapshot_media_entries(&self, snapshot_id: i64) -> Result<Vec<SnapshotMediaEntry>> {
        let conn = self.conn.lock();
        SnapshotEntryDao::new(&conn).list_for_snapshot(snapshot_id)
    }

    fn update_snapshot_media_entry(&self, entry: &SnapshotMediaEntry) -> Result<usize> {
        let conn = self.conn.lock();
        // 不变量：本地修改后 updated_at 严格大于 created_at。
        // 同一毫秒内的写入也要推进，所以取 max(now, created_at + 1)。
        let updated_at_ms = Utc::now().timestamp_millis().max(entry.created_at + 1);
        SnapshotEntryDao::new(&conn).update(entry, updated_at_ms)
    }

    fn delete_snapshot(&self, snapshot_id: i64) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        SnapshotEntryDao::new(&tx).delete_for_snapshot(snapshot_id)?;
        SnapshotDao::new(&tx).delete(snapshot_id)?;
        tx.commit()?;
        debug!(snapshot_id, "快照已删除");
        Ok(())
    }

    fn has_snapshots(&self) -> bool {
        let conn = self.conn.lock();
        SnapshotDao::new(&conn).has_any().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anilist::MediaListStatus;
    use tempfile::TempDir;

    fn open_db() -> (TempDir, OfflineDatabase) {
        let dir = TempDir::new().unwrap();
        let db = OfflineDatabase::open(dir.path(), "anisync-offline-test").unwrap();
        (dir, db)
    }

    fn list_data(score: i64, progress: i64) -> ListData {
        ListData {
            status: MediaListStatus::Current,
            score,
            progress,
            started_at: String::new(),
            completed_at: String::new(),
        }
    }

    #[test]
    fn test_empty_database() {
        let (_dir, db) = open_db();
        assert!(!db.has_snapshots());
        assert!(db.get_latest_snapshot().unwrap().is_none());
    }

    #[test]
    fn test_insert_and_latest() {
        let (_dir, db) = open_db();
        let first = db.insert_snapshot(true).unwrap();
        let second = db.insert_snapshot(false).unwrap();
        assert!(db.has_snapshots());

        let latest = db.get_latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.db_id, second.db_id);
        assert_ne!(latest.db_id, first.db_id);
        assert!(!latest.used);
        assert!(!latest.synced);
    }

    #[test]
    fn test_latest_snapshot_materializes_entries() {
        let (_dir, db) = open_db();
        let snapshot = db.insert_snapshot(true).unwrap();
        db.insert_snapshot_media_entry(snapshot.db_id, 100, &anime_payload(100, list_data(7, 3)))
            .unwrap();
        db.insert_snapshot_media_entry(snapshot.db_id, 200, &manga_payload(200, list_data(5, 10)))
            .unwrap();

        let latest = db.get_latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.entries.len(), 2);
        let anime = latest.entry(100).unwrap();
        assert_eq!(anime.kind, MediaType::Anime);
        assert!(!anime.is_modified());
    }

    #[test]
    fn test_update_bumps_updated_at_strictly() {
        let (_dir, db) = open_db();
        let snapshot = db.insert_snapshot(true).unwrap();
        let entry = db
            .insert_snapshot_media_entry(snapshot.db_id, 100, &anime_payload(100, list_data(7, 3)))
            .unwrap();

        // 同一毫秒内立即更新也必须推进 updated_at
        let affected = db.update_snapshot_media_entry(&entry).unwrap();
        assert_eq!(affected, 1);

        let reloaded = db
            .get_snapshot_media_entry(100, snapshot.db_id)
            .unwrap()
            .unwrap();
        assert!(reloaded.updated_at > reloaded.created_at);
        assert!(reloaded.is_modified());
    }

    #[test]
    fn test_delete_snapshot_cascades_entries() {
        let (_dir, db) = open_db();
        let snapshot = db.insert_snapshot(true).unwrap();
        db.insert_snapshot_media_entry(snapshot.db_id, 100, &anime_payload(100, list_data(7, 3)))
            .unwrap();

        db.delete_snapshot(snapshot.db_id).unwrap();
        assert!(!db.has_snapshots());
        assert!(db
            .get_snapshot_media_entries(snapshot.db_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mark_used() {
        let (_dir, db) = open_db();
        let snapshot = db.insert_snapshot(false).unwrap();
        db.mark_snapshot_used(snapshot.db_id).unwrap();
        let latest = db.get_latest_snapshot().unwrap().unwrap();
        assert!(latest.used);
    }

    #[test]
    fn test_missing_entry_is_none() {
        let (_dir, db) = open_db();
        let snapshot = db.insert_snapshot(true).unwrap();
        assert!(db
            .get_snapshot_media_entry(999, snapshot.db_id)
            .unwrap()
            .is_none());
    }
}
