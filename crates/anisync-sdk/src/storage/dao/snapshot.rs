//! 快照数据访问层 - 管理快照行的增删查

use rusqlite::{params, Connection, Row};

use crate::error::Result;
use crate::storage::entities::Snapshot;

/// 快照数据访问对象
pub struct SnapshotDao<'a> {
    conn: &'a Connection,
}

impl<'a> SnapshotDao<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 插入快照，返回新行主键
    pub fn insert(&self, used: bool, synced: bool, now_ms: i64) -> Result<i64> {
        let sql = "INSERT INTO snapshot (used, synced, created_at, updated_at)
                   VALUES (?1, ?2, ?3, ?3)";
        self.conn
            .execute(sql, params![used as i64, synced as i64, now_ms])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 最新快照（按主键倒序），条目由调用方另行装入
    pub fn get_latest(&self) -> Result<Option<Snapshot>> {
        let sql = "SELECT db_id, used, synced, created_at, updated_at
                   FROM snapshot ORDER BY db_id DESC LIMIT 1";

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query_map([], |row| Ok(Self::row_to_snapshot(row)?))?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// 标记快照已被用作活动工作副本
    pub fn mark_used(&self, db_id: i64, now_ms: i64) -> Result<()> {
        let sql = "UPDATE snapshot SET used = 1, updated_at = ?1 WHERE db_id = ?2";
        self.conn.execute(sql, params![now_ms, db_id])?;
        Ok(())
    }

    /// 标记快照已同步。当前成功路径直接删除快照，此标记留给
    /// 未来的部分同步设计，同步前置检查会读取它。
    pub fn mark_synced(&self, db_id: i64, now_ms: i64) -> Result<()> {
        let sql = "UPDATE snapshot SET synced = 1, updated_at = ?1 WHERE db_id = ?2";
        self.conn.execute(sql, params![now_ms, db_id])?;
        Ok(())
    }

    /// 删除快照行（条目由调用方在同一事务内删除）
    pub fn delete(&self, db_id: i64) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM snapshot WHERE db_id = ?1", params![db_id])?;
        Ok(affected)
    }

    /// 库内是否存在任何快照
    pub fn has_any(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snapshot", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn row_to_snapshot(row: &Row) -> rusqlite::Result<Snapshot> {
        Ok(Snapshot {
            db_id: row.get("db_id")?,
            used: row.get::<_, i64>("used")? != 0,
            synced: row.get::<_, i64>("synced")? != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            entries: Vec::new(),
        })
    }
}
