use std::fmt;
use rusqlite;

#[derive(Debug)]
pub enum AnisyncSDKError {
    SqliteError(rusqlite::Error),
    JsonError(String),
    NotFound(String),
    // 前置条件未满足（已同步、快照未使用等），调用方在状态变化前不应重试
    Precondition(String),
    Database(String),
    Remote(String),
    IO(String),
    InvalidInput(String),
    Other(String),
}

impl fmt::Display for AnisyncSDKError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnisyncSDKError::SqliteError(e) => write!(f, "SQLite error: {}", e),
            AnisyncSDKError::JsonError(e) => write!(f, "JSON error: {}", e),
            AnisyncSDKError::NotFound(e) => write!(f, "Not found: {}", e),
            AnisyncSDKError::Precondition(e) => write!(f, "Precondition failed: {}", e),
            AnisyncSDKError::Database(e) => write!(f, "Database error: {}", e),
            AnisyncSDKError::Remote(e) => write!(f, "Remote error: {}", e),
            AnisyncSDKError::IO(e) => write!(f, "IO error: {}", e),
            AnisyncSDKError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            AnisyncSDKError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl std::error::Error for AnisyncSDKError {}

impl From<rusqlite::Error> for AnisyncSDKError {
    fn from(error: rusqlite::Error) -> Self {
        AnisyncSDKError::SqliteError(error)
    }
}

impl From<serde_json::Error> for AnisyncSDKError {
    fn from(error: serde_json::Error) -> Self {
        AnisyncSDKError::JsonError(error.to_string())
    }
}

impl From<std::io::Error> for AnisyncSDKError {
    fn from(error: std::io::Error) -> Self {
        AnisyncSDKError::IO(error.to_string())
    }
}

impl AnisyncSDKError {
    /// 判断是否是"不存在"类错误（快照/条目不存在）
    pub fn is_not_found(&self) -> bool {
        matches!(self, AnisyncSDKError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AnisyncSDKError>;
