//! 快照媒体条目数据访问层

use rusqlite::{params, Connection, Row};

use crate::error::{AnisyncSDKError, Result};
use crate::storage::entities::{MediaType, SnapshotMediaEntry};

/// 快照媒体条目数据访问对象
pub struct SnapshotEntryDao<'a> {
    conn: &'a Connection,
}

impl<'a> SnapshotEntryDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 插入条目，返回新行主键。created_at == updated_at，即"未修改"初始态。
    pub fn insert(
        &self,
        snapshot_id: i64,
        media_id: i64,
        kind: MediaType,
        value: &[u8],
        now_ms: i64,
    ) -> Result<i64> {
        let sql = "INSERT INTO snapshot_media_entry
                   (snapshot_id, media_id, kind, value, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?5)";
        self.conn.execute(
            sql,
            params![snapshot_id, media_id, kind.as_str(), value, now_ms],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 按 (media_id, snapshot_id) 查条目
    pub fn get_by_media(&self, media_id: i64, snapshot_id: i64) -> Result<Option<SnapshotMediaEntry>> {
        let sql = "SELECT db_id, snapshot_id, media_id, kind, value, created_at, updated_at
                   FROM snapshot_media_entry WHERE media_id = ?1 AND snapshot_id = ?2";

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query_map(params![media_id, snapshot_id], |row| {
            Ok(Self::row_to_entry(row)?)
        })?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 快照下的全部条目
    pub fn list_for_snapshot(&self, snapshot_id: i64) -> Result<Vec<SnapshotMediaEntry>> {
        let sql = "SELECT db_id, snapshot_id, media_id, kind, value, created_at, updated_at
                   FROM snapshot_media_entry WHERE snapshot_id = ?1 ORDER BY db_id";

        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![snapshot_id], |row| Ok(Self::row_to_entry(row)?))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// 更新条目载荷与修改时间，返回受影响行数
    pub fn update(&self, entry: &SnapshotMediaEntry, updated_at_ms: i64) -> Result<usize> {
        let sql = "UPDATE snapshot_media_entry SET value = ?1, updated_at = ?2 WHERE db_id = ?3";
        let affected = self
            .conn
            .execute(sql, params![entry.value, updated_at_ms, entry.db_id])?;
        Ok(affected)
    }

    /// 删除快照下的全部条目
    pub fn delete_for_snapshot(&self, snapshot_id: i64) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM snapshot_media_entry WHERE snapshot_id = ?1",
            params![snapshot_id],
        )?;
        Ok(affected)
    }

    fn row_to_entry(row: &Row) -> rusqlite::Result<SnapshotMediaEntry> {
        let kind_raw: String = row.get("kind")?;
        let kind = MediaType::parse(&kind_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(AnisyncSDKError::InvalidInput(format!(
                    "未知的媒体类型: {}",
                    kind_raw
                ))),
            )
        })?;

        Ok(SnapshotMediaEntry {
            db_id: row.get("db_id")?,
            snapshot_id: row.get("snapshot_id")?,
            media_id: row.get("media_id")?,
            kind,
            value: row.get("value")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
