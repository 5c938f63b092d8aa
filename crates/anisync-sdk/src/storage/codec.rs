//! 条目编解码 - 不透明 `value` 载荷与类型化条目之间的转换
//!
//! 判别符在解码时一次性解析为和类型，之后的代码只与
//! `SnapshotEntryData` 打交道，不再按字符串标签反复分支。

use crate::error::Result;
use crate::storage::entities::{AnimeEntry, ListData, MangaEntry, MediaType, SnapshotMediaEntry};

/// 类型化的快照条目数据
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotEntryData {
    Anime(AnimeEntry),
    Manga(MangaEntry),
}

impl SnapshotEntryData {
    /// 按行的判别符解码不透明载荷
    pub fn decode(kind: MediaType, value: &[u8]) -> Result<Self> {
        match kind {
            MediaType::Anime => Ok(SnapshotEntryData::Anime(serde_json::from_slice(value)?)),
            MediaType::Manga => Ok(SnapshotEntryData::Manga(serde_json::from_slice(value)?)),
        }
    }

    /// 序列化回不透明载荷
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            SnapshotEntryData::Anime(entry) => serde_json::to_vec(entry)?,
            SnapshotEntryData::Manga(entry) => serde_json::to_vec(entry)?,
        };
        Ok(bytes)
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            SnapshotEntryData::Anime(_) => MediaType::Anime,
            SnapshotEntryData::Manga(_) => MediaType::Manga,
        }
    }

    pub fn list_data(&self) -> &ListData {
        match self {
            SnapshotEntryData::Anime(entry) => &entry.list_data,
            SnapshotEntryData::Manga(entry) => &entry.list_data,
        }
    }

    pub fn list_data_mut(&mut self) -> &mut ListData {
        match self {
            SnapshotEntryData::Anime(entry) => &mut entry.list_data,
            SnapshotEntryData::Manga(entry) => &mut entry.list_data,
        }
    }
}

impl SnapshotMediaEntry {
    /// 解码本条目的类型化数据
    pub fn decode_data(&self) -> Result<SnapshotEntryData> {
        SnapshotEntryData::decode(self.kind, &self.value)
    }

    /// 动画条目视图，判别符不符或载荷损坏时返回 `None`
    pub fn get_anime_entry(&self) -> Option<AnimeEntry> {
        match self.decode_data() {
            Ok(SnapshotEntryData::Anime(entry)) => Some(entry),
            _ => None,
        }
    }

    /// 漫画条目视图，判别符不符或载荷损坏时返回 `None`
    pub fn get_manga_entry(&self) -> Option<MangaEntry> {
        match self.decode_data() {
            Ok(SnapshotEntryData::Manga(entry)) => Some(entry),
            _ => None,
        }
    }

    /// 写回类型化数据（只更新载荷，不动时间戳，落库由存储层负责）
    pub fn set_data(&mut self, data: &SnapshotEntryData) -> Result<()> {
        self.value = data.encode()?;
        Ok(())
    }
}

/// 测试与捕获流程共用的载荷构造
pub fn anime_payload(media_id: i64, list_data: ListData) -> SnapshotEntryData {
    SnapshotEntryData::Anime(AnimeEntry { media_id, list_data })
}

pub fn manga_payload(media_id: i64, list_data: ListData) -> SnapshotEntryData {
    SnapshotEntryData::Manga(MangaEntry { media_id, list_data })
}
