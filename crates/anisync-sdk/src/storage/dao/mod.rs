//! 数据访问层 - 每张表一个专门的操作模块

pub mod snapshot;
pub mod snapshot_entry;

pub use snapshot::SnapshotDao;
pub use snapshot_entry::SnapshotEntryDao;
