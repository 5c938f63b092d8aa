//! 数据实体定义 - 对应快照数据库表结构
//!
//! 这里定义了快照库所有表对应的 Rust 结构体，用于：
//! - 类型安全的数据传输
//! - 统一的数据表示
//! - 序列化/反序列化支持

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::anilist::MediaListStatus;

/// 媒体类型判别符 - 条目 `value` 载荷的解码路径由它决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Anime,
    Manga,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Anime => "anime",
            MediaType::Manga => "manga",
        }
    }

    /// 从数据库 TEXT 列解析
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "anime" => Some(MediaType::Anime),
            "manga" => Some(MediaType::Manga),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户可编辑的追番字段
///
/// `score` 为本地 0–10 刻度；远端期望 0–100，换算只发生在推送时，
/// 放大后的值永远不落库。日期为 RFC3339 字符串，缺席时为空串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    pub status: MediaListStatus,
    pub score: i64,
    pub progress: i64,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub completed_at: String,
}

impl Default for ListData {
    fn default() -> Self {
        Self {
            status: MediaListStatus::Planning,
            score: 0,
            progress: 0,
            started_at: String::new(),
            completed_at: String::new(),
        }
    }
}

/// 动画条目 - 快照内一部动画的完整状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeEntry {
    pub media_id: i64,
    pub list_data: ListData,
}

/// 漫画条目 - 快照内一部漫画的完整状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MangaEntry {
    pub media_id: i64,
    pub list_data: ListData,
}

/// 快照实体 - 对应 snapshot 表
///
/// 一次离线会话捕获一份远端列表的时点副本。`entries` 不是表列，
/// 由存储层在物化"最新快照"时一并装入，供离线中心缓存直接读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// 内部主键（SQLite 自增），与任何展示用 ID 无关
    pub db_id: i64,
    /// 快照是否已作为活动工作副本被使用过
    pub used: bool,
    /// 保留字段：成功同步后快照被整体删除，当前流程不会置 true。
    /// 留给未来的部分同步设计，作为同步前置检查存在。
    pub synced: bool,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub entries: Vec<SnapshotMediaEntry>,
}

impl Snapshot {
    /// 按媒体 ID 查找条目
    pub fn entry(&self, media_id: i64) -> Option<&SnapshotMediaEntry> {
        self.entries.iter().find(|e| e.media_id == media_id)
    }
}

/// 快照媒体条目实体 - 对应 snapshot_media_entry 表
///
/// 变更检测不变量：`created_at == updated_at` 即"本地未修改"；
/// 任何本地修改都必须让 `updated_at` 严格大于 `created_at`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMediaEntry {
    pub db_id: i64,
    /// 所属快照（条目归快照独占，不跨快照共享）
    pub snapshot_id: i64,
    /// 远端媒体 ID
    pub media_id: i64,
    pub kind: MediaType,
    /// 不透明序列化载荷（JSON），经 codec 解码为类型化条目
    pub value: Vec<u8>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SnapshotMediaEntry {
    /// 条目自捕获以来是否被本地修改过
    pub fn is_modified(&self) -> bool {
        self.created_at != self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_roundtrip() {
        assert_eq!(MediaType::parse("anime"), Some(MediaType::Anime));
        assert_eq!(MediaType::parse("manga"), Some(MediaType::Manga));
        assert_eq!(MediaType::parse("movie"), None);
        assert_eq!(MediaType::Anime.as_str(), "anime");
    }

    #[test]
    fn test_modified_flag() {
        let mut entry = SnapshotMediaEntry {
            db_id: 1,
            snapshot_id: 1,
            media_id: 100,
            kind: MediaType::Anime,
            value: Vec::new(),
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        };
        assert!(!entry.is_modified());
        entry.updated_at += 1;
        assert!(entry.is_modified());
    }
}
